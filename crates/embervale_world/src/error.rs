//! # World Errors
//!
//! Domain failures surfaced by entity code. Two classes are fatal for the
//! affected actor (a broken stat table and a session collision); everything
//! else is logged at the point of failure and the operation fails closed.

use thiserror::Error;

use embervale_shared::MonsterKind;

use embervale_actor::ActorError;

/// Result alias for world operations.
pub type WorldResult<T> = Result<T, WorldError>;

/// Errors produced by world rules.
#[derive(Debug, Error)]
pub enum WorldError {
    /// The monster stat table failed to parse.
    #[error("stat table parse: {0}")]
    StatTableParse(#[from] toml::de::Error),

    /// The monster stat table parsed but carries invalid data.
    #[error("stat table invalid: {0}")]
    StatTableInvalid(String),

    /// A monster was spawned for a kind with no stat-table entry.
    #[error("monster kind '{}' has no stat-table entry", kind.as_str())]
    MissingProfile {
        /// The kind that failed to resolve.
        kind: MonsterKind,
    },

    /// A second session tried to bind to an already-bound player.
    #[error("player already bound to session {existing}, rejected {rejected}")]
    SessionCollision {
        /// Session currently bound.
        existing: u64,
        /// Session that was refused.
        rejected: u64,
    },

    /// A spawn cell was blocked or already occupied.
    #[error("spawn cell ({x}, {y}) on map {map_id} is unavailable")]
    SpawnBlocked {
        /// Map that rejected the spawn.
        map_id: u32,
        /// Requested cell, x.
        x: i32,
        /// Requested cell, y.
        y: i32,
    },

    /// A map id with no atlas entry was named.
    #[error("map {map_id} is not in the atlas")]
    UnknownMap {
        /// The unregistered map.
        map_id: u32,
    },

    /// A second keeper tried to claim an already-kept map id.
    #[error("map {map_id} already has a keeper")]
    DuplicateMap {
        /// The contested map.
        map_id: u32,
    },

    /// A failure bubbled up from the actor substrate.
    #[error(transparent)]
    Actor(#[from] ActorError),
}
