//! # Wire Payload Structs
//!
//! One plain-old-data struct per message kind that carries data. All
//! structs are `#[repr(C)]`, explicitly padded to a multiple of 8 bytes,
//! and carry a `SIZE` constant that the tests pin down. Direction, action
//! and damage-class fields travel as `u32` and are re-validated by the
//! receiver; an unknown discriminant is a protocol error, not a panic.

use bytemuck::{Pod, Zeroable};

/// Payload of [`MessageKind::TryMove`](crate::MessageKind::TryMove).
///
/// `x`/`y` carry the mover's current cell so the keeper can cross-check
/// its occupancy table; `end_x`/`end_y` is the requested destination.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct AmTryMove {
    /// Mover identity.
    pub uid: u64,
    /// Map the step happens on.
    pub map_id: u32,
    /// Current cell, x.
    pub x: i32,
    /// Current cell, y.
    pub y: i32,
    /// Requested cell, x.
    pub end_x: i32,
    /// Requested cell, y.
    pub end_y: i32,
    /// Padding for alignment.
    pub _padding: u32,
}

impl AmTryMove {
    /// Serialized size in bytes.
    pub const SIZE: usize = 32;
}

/// Payload of [`MessageKind::MoveOk`](crate::MessageKind::MoveOk): the
/// committed destination.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct AmMoveOk {
    /// Mover identity.
    pub uid: u64,
    /// Map the step happened on.
    pub map_id: u32,
    /// Committed cell, x.
    pub x: i32,
    /// Committed cell, y.
    pub y: i32,
    /// Padding for alignment.
    pub _padding: u32,
}

impl AmMoveOk {
    /// Serialized size in bytes.
    pub const SIZE: usize = 24;
}

/// Payload of
/// [`MessageKind::QueryLocation`](crate::MessageKind::QueryLocation):
/// identifies the asker.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct AmQueryLocation {
    /// Asker identity.
    pub uid: u64,
    /// Map the asker believes the target is on.
    pub map_id: u32,
    /// Padding for alignment.
    pub _padding: u32,
}

impl AmQueryLocation {
    /// Serialized size in bytes.
    pub const SIZE: usize = 16;
}

/// Payload of [`MessageKind::Location`](crate::MessageKind::Location):
/// where the responder is right now.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct AmLocation {
    /// Responder identity.
    pub uid: u64,
    /// Map the responder stands on.
    pub map_id: u32,
    /// Current cell, x.
    pub x: i32,
    /// Current cell, y.
    pub y: i32,
    /// Facing as a [`Direction`](embervale_shared::Direction) discriminant.
    pub direction: u32,
}

impl AmLocation {
    /// Serialized size in bytes.
    pub const SIZE: usize = 24;
}

/// Payload of [`MessageKind::Action`](crate::MessageKind::Action): a
/// visible act relayed to everyone in view range.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct AmAction {
    /// Acting entity.
    pub uid: u64,
    /// Map the act happens on.
    pub map_id: u32,
    /// [`ActionKind`](embervale_shared::ActionKind) discriminant.
    pub action: u32,
    /// Kind-specific parameter. For attacks this is the
    /// [`Stance`](embervale_shared::Stance) discriminant.
    pub param: u32,
    /// Animation speed hint.
    pub speed: u32,
    /// Facing as a [`Direction`](embervale_shared::Direction) discriminant.
    pub direction: u32,
    /// Act origin cell, x.
    pub x: i32,
    /// Act origin cell, y.
    pub y: i32,
    /// Act destination cell, x (same as `x` for acts in place).
    pub end_x: i32,
    /// Act destination cell, y (same as `y` for acts in place).
    pub end_y: i32,
    /// Padding for alignment.
    pub _padding: u32,
}

impl AmAction {
    /// Serialized size in bytes.
    pub const SIZE: usize = 48;
}

/// Payload of [`MessageKind::Attack`](crate::MessageKind::Attack): a
/// strike landing on the receiver.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct AmAttack {
    /// Attacker identity.
    pub uid: u64,
    /// Map the strike happens on.
    pub map_id: u32,
    /// [`DamageClass`](embervale_shared::DamageClass) discriminant.
    pub damage_class: u32,
    /// Rolled attack power before the victim's defense applies.
    pub power: u32,
    /// Attacker cell at strike time, x.
    pub x: i32,
    /// Attacker cell at strike time, y.
    pub y: i32,
    /// Padding for alignment.
    pub _padding: u32,
}

impl AmAttack {
    /// Serialized size in bytes.
    pub const SIZE: usize = 32;
}

/// Payload of [`MessageKind::UpdateHp`](crate::MessageKind::UpdateHp).
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct AmUpdateHp {
    /// Entity whose health changed.
    pub uid: u64,
    /// Map the entity stands on.
    pub map_id: u32,
    /// Current health.
    pub hp: u32,
    /// Maximum health.
    pub hp_max: u32,
    /// Padding for alignment.
    pub _padding: u32,
}

impl AmUpdateHp {
    /// Serialized size in bytes.
    pub const SIZE: usize = 24;
}

/// Payload of
/// [`MessageKind::DeadFadeOut`](crate::MessageKind::DeadFadeOut): a corpse
/// leaving the world.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct AmDeadFadeOut {
    /// Fading entity.
    pub uid: u64,
    /// Map the corpse lies on.
    pub map_id: u32,
    /// Corpse cell, x.
    pub x: i32,
    /// Corpse cell, y.
    pub y: i32,
    /// Padding for alignment.
    pub _padding: u32,
}

impl AmDeadFadeOut {
    /// Serialized size in bytes.
    pub const SIZE: usize = 24;
}

/// Payload of [`MessageKind::Leave`](crate::MessageKind::Leave): silent
/// occupancy vacate when an entity moves to another map.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct AmLeave {
    /// Leaving entity.
    pub uid: u64,
    /// Map being left.
    pub map_id: u32,
    /// Vacated cell, x.
    pub x: i32,
    /// Vacated cell, y.
    pub y: i32,
    /// Padding for alignment.
    pub _padding: u32,
}

impl AmLeave {
    /// Serialized size in bytes.
    pub const SIZE: usize = 24;
}

/// Payload of [`MessageKind::MapSwitch`](crate::MessageKind::MapSwitch):
/// request to arrive on another map.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct AmMapSwitch {
    /// Switching entity.
    pub uid: u64,
    /// Destination map.
    pub map_id: u32,
    /// Requested arrival cell, x.
    pub x: i32,
    /// Requested arrival cell, y.
    pub y: i32,
    /// Padding for alignment.
    pub _padding: u32,
}

impl AmMapSwitch {
    /// Serialized size in bytes.
    pub const SIZE: usize = 24;
}

/// Payload of
/// [`MessageKind::MapSwitchOk`](crate::MessageKind::MapSwitchOk): arrival
/// committed. Carries the destination keeper's uid so the switcher can
/// resolve its new keeper address from the directory.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct AmMapSwitchOk {
    /// Switching entity.
    pub uid: u64,
    /// Keeper of the destination map.
    pub keeper_uid: u64,
    /// Destination map.
    pub map_id: u32,
    /// Committed arrival cell, x.
    pub x: i32,
    /// Committed arrival cell, y.
    pub y: i32,
    /// Padding for alignment.
    pub _padding: u32,
}

impl AmMapSwitchOk {
    /// Serialized size in bytes.
    pub const SIZE: usize = 32;
}

/// Payload of [`MessageKind::BindSession`](crate::MessageKind::BindSession).
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct AmBindSession {
    /// Player to bind.
    pub uid: u64,
    /// Session identity owned by the network layer.
    pub session_id: u64,
}

impl AmBindSession {
    /// Serialized size in bytes.
    pub const SIZE: usize = 16;
}

/// Payload of
/// [`MessageKind::ClientCommand`](crate::MessageKind::ClientCommand): a
/// decoded session command for a player actor.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct AmClientCommand {
    /// Commanded player.
    pub uid: u64,
    /// Target entity for attack commands, zero otherwise.
    pub target: u64,
    /// [`ClientCmd`](embervale_shared::ClientCmd) discriminant.
    pub command: u32,
    /// Command parameter. Map switch commands put the destination map id
    /// here; attack commands the damage class discriminant, zero for a
    /// plain swing.
    pub param: u32,
    /// Command cell, x (move destination or arrival cell).
    pub x: i32,
    /// Command cell, y.
    pub y: i32,
}

impl AmClientCommand {
    /// Serialized size in bytes.
    pub const SIZE: usize = 32;
}

// =============================================================================
// TESTS
// =============================================================================
