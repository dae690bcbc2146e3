//! # EMBERVALE World
//!
//! Entity state machines and world rules: everything that decides what a
//! message *means* once the actor substrate has delivered it.
//!
//! ## Layout
//!
//! ```text
//!   stats       monster profiles, tuning knobs, TOML overrides
//!   terrain     per-map occupancy grid + the atlas of live maps
//!   char_core   state shared by every creature (position, hp, aggro,
//!               the one-slot pending-reply machine)
//!   movement    request/commit stepping against the map keeper
//!   combat      swings, sighting queries, chase planning
//!   lifecycle   die -> ghost -> dispose, plus the pending watchdog
//!   monster     the AI creature: tick brain, wander, aggro
//!   player      the human creature: sessions, commands, map switches
//!   keeper      the per-map arbiter: grid commits and view fan-out
//!   service     the cross-map broker for switches
//! ```
//!
//! Creatures share [`CharCore`] by composition and the free functions in
//! [`movement`], [`combat`] and [`lifecycle`] operate on any [`Creature`].
//! The keeper and the service are plain actors; they own no core because
//! they are not on the grid themselves.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod char_core;
pub mod combat;
pub mod error;
pub mod keeper;
pub mod lifecycle;
pub mod monster;
pub mod movement;
pub mod player;
pub mod service;
pub mod stats;
pub mod terrain;

pub use char_core::{
    AttackIntent, CharCore, CoreConfig, Creature, LocationRecord, Pending, TargetRecord,
};
pub use error::{WorldError, WorldResult};
pub use keeper::MapKeeper;
pub use monster::{Monster, MonsterSpawn};
pub use player::{Player, PlayerSpawn, PLAYER_BASELINE};
pub use service::WorldService;
pub use stats::{AbilityScores, MonsterProfile, StatRegistry, WorldTuning};
pub use terrain::{MapAtlas, MapEntry, MapTerrain};
