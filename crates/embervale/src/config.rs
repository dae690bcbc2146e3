//! # Server Configuration
//!
//! One TOML file configures the whole server: tick cadence, mailbox
//! sizing, the shared timing knobs and the step cost family. Every field
//! has a production default, so an empty file is a valid configuration
//! and a partial one overrides only what it names.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use embervale_path::PathCosts;
use embervale_shared::constants::MAILBOX_CAPACITY;
use embervale_shared::TICK_MS;
use embervale_world::WorldTuning;

/// Failures while loading a server configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The text is not valid TOML for this schema.
    #[error("config parse: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Complete server configuration.
///
/// Unknown top-level keys are rejected so a typo fails loud at boot
/// instead of silently running on defaults.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Scheduler cadence in milliseconds.
    pub tick_ms: u64,
    /// Mailbox depth for every spawned pod.
    pub mailbox_capacity: usize,
    /// Timing knobs shared by every creature.
    pub tuning: WorldTuning,
    /// Step cost family handed to every pathfinding creature.
    pub costs: PathCosts,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            tick_ms: TICK_MS,
            mailbox_capacity: MAILBOX_CAPACITY,
            tuning: WorldTuning::default(),
            costs: PathCosts::default(),
        }
    }
}

impl ServerConfig {
    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the text is not valid TOML or
    /// names an unknown top-level key.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }
}

// =============================================================================
// TESTS
// =============================================================================
