//! # World Timing & Range Constants
//!
//! Baseline tuning for the world server. Most of these are the `Default`
//! values of per-crate config structs and can be overridden from TOML at
//! startup; the ranges are protocol-level and baked in.

// =============================================================================
// SCHEDULING
// =============================================================================

/// Metronome period (milliseconds between actor scheduling ticks)
pub const TICK_MS: u64 = 100;

/// Mailbox capacity per actor (messages; overflow is dropped with a warning)
pub const MAILBOX_CAPACITY: usize = 1024;

// =============================================================================
// RANGES (in grid cells, compared against squared distance)
// =============================================================================

/// View range - actions inside this radius are fanned out to an entity
pub const RANGE_VIEW: i64 = 20;

/// Attack tracking range - targets beyond this radius are not chased
pub const RANGE_ATTACK: i64 = 10;

// =============================================================================
// COMBAT & LIFECYCLE TIMING
// =============================================================================

/// Tracked targets expire after this much silence (milliseconds)
pub const TARGET_EXPIRE_MS: u64 = 60_000;

/// Delay between death and the ghost transition (milliseconds)
pub const GHOST_DELAY_MS: u64 = 2_000;

/// A cached peer location older than this must be re-queried (milliseconds)
pub const LOCATION_STALENESS_MS: u64 = 1_000;

/// A pending reply older than this is abandoned and its lock released
/// (milliseconds); covers replies lost to a peer that sealed first
pub const PENDING_TIMEOUT_MS: u64 = 5_000;

/// Default walk cooldown between accepted moves (milliseconds)
pub const DEFAULT_WALK_WAIT_MS: u64 = 1_000;

/// Default attack cooldown between dispatched attacks (milliseconds)
pub const DEFAULT_ATTACK_WAIT_MS: u64 = 1_400;
