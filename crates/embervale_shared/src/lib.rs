//! # EMBERVALE Shared
//!
//! Common types used by every crate in the world server.
//!
//! ## CRITICAL RULE
//!
//! This crate must NEVER depend on:
//! - channels or locks
//! - the actor runtime
//! - anything that can block
//!
//! If you need stateful machinery, put it in `embervale_actor` or
//! `embervale_world`.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod constants;
pub mod grid;
pub mod protocol;

pub use constants::{RANGE_ATTACK, RANGE_VIEW, TARGET_EXPIRE_MS, TICK_MS};
pub use grid::GridCell;
pub use protocol::{
    ActionKind, ActorKind, AttackMode, ClientCmd, DamageClass, DcCost, Direction, MonsterKind,
    Motion, Stance,
};
