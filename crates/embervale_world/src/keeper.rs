//! # Map keeper
//!
//! One keeper actor owns one map: the authoritative occupancy grid and
//! the fan-out of everything that happens on it. Movement is arbitrated
//! here; a step is real the moment the grid flips, and the grant carries
//! the committed cell back to the mover.
//!
//! The keeper trusts nothing about a request except its correlation id.
//! Movers prefilter against their advisory terrain copy, but every cell
//! is re-validated against the live grid before it changes hands.
//!
//! Departures are silent on the old map: `Leave` and `DeadFadeOut` only
//! free the cell, and viewers' sighting caches age the ghost out on
//! their own staleness clock.

use std::sync::Arc;

use tracing::{debug, warn};

use embervale_actor::{
    Actor, ActorContext, AmAction, AmDeadFadeOut, AmLeave, AmMapSwitch, AmMapSwitchOk, AmMoveOk,
    AmTryMove, AmUpdateHp, Envelope, Message, MessageKind,
};
use embervale_path::OccupancyView;
use embervale_shared::{GridCell, RANGE_VIEW};

use crate::error::WorldError;
use crate::terrain::MapTerrain;

/// The actor that owns one map's grid.
pub struct MapKeeper {
    uid: u64,
    map_id: u32,
    terrain: Arc<MapTerrain>,
}

impl MapKeeper {
    /// Builds the keeper for `terrain`.
    #[must_use]
    pub fn new(uid: u64, terrain: Arc<MapTerrain>) -> Self {
        let map_id = terrain.map_id();
        Self {
            uid,
            map_id,
            terrain,
        }
    }

    /// The map this keeper arbitrates.
    #[must_use]
    pub fn map_id(&self) -> u32 {
        self.map_id
    }

    /// The grid this keeper writes.
    #[must_use]
    pub fn terrain(&self) -> &Arc<MapTerrain> {
        &self.terrain
    }

    /// One walk step, or a straight run double whose midpoint is free.
    fn step_allowed(&self, from: GridCell, to: GridCell) -> bool {
        if from.within_step(to, 1) {
            return true;
        }
        if !from.within_step(to, 2) {
            return false;
        }
        // A run passes through the midpoint cell as well.
        let mid = GridCell::new((from.x + to.x) / 2, (from.y + to.y) / 2);
        self.terrain.walkable(mid) && self.terrain.occupant_at(mid).is_none()
    }

    fn handle_try_move(&self, envelope: &Envelope, ctx: &ActorContext<'_, Self>) {
        if envelope.from.is_null() {
            return;
        }
        let Ok(am) = envelope.message.payload.decode::<AmTryMove>() else {
            warn!(keeper = self.uid, "malformed try-move dropped");
            return;
        };
        let from = GridCell::new(am.x, am.y);
        let to = GridCell::new(am.end_x, am.end_y);
        let granted = am.map_id == self.map_id
            && self.step_allowed(from, to)
            && self.terrain.move_occupant(am.uid, from, to);
        if granted {
            let ok = AmMoveOk {
                uid: am.uid,
                map_id: self.map_id,
                x: to.x,
                y: to.y,
                _padding: 0,
            };
            match Message::with_payload(MessageKind::MoveOk, &ok) {
                Ok(message) => {
                    ctx.forward(message.replying_to(envelope.message.request_id), envelope.from);
                }
                Err(error) => warn!(keeper = self.uid, %error, "move grant encode failed"),
            }
        } else {
            debug!(keeper = self.uid, uid = am.uid, ?from, ?to, "step refused");
            ctx.forward(
                Message::bare(MessageKind::MoveError).replying_to(envelope.message.request_id),
                envelope.from,
            );
        }
    }

    /// Relays a broadcast to every occupant within view of `center`,
    /// except the origin itself.
    fn fan_out(
        &self,
        origin: u64,
        center: GridCell,
        envelope: &Envelope,
        ctx: &ActorContext<'_, Self>,
    ) {
        const VIEW2: i64 = RANGE_VIEW * RANGE_VIEW;
        for (uid, cell) in self.terrain.occupant_cells() {
            if uid == origin || center.distance2(cell) > VIEW2 {
                continue;
            }
            let Some(record) = ctx.directory.resolve(uid) else {
                // Occupancy can outlive the directory record until the
                // next disposal sweep.
                continue;
            };
            ctx.forward(envelope.message, record.address);
        }
    }

    fn handle_action(&self, envelope: &Envelope, ctx: &ActorContext<'_, Self>) {
        let Ok(am) = envelope.message.payload.decode::<AmAction>() else {
            warn!(keeper = self.uid, "malformed action dropped");
            return;
        };
        if am.map_id != self.map_id {
            debug!(
                keeper = self.uid,
                uid = am.uid,
                map_id = am.map_id,
                "action for another map dropped"
            );
            return;
        }
        self.fan_out(am.uid, GridCell::new(am.end_x, am.end_y), envelope, ctx);
    }

    fn handle_update_hp(&self, envelope: &Envelope, ctx: &ActorContext<'_, Self>) {
        let Ok(am) = envelope.message.payload.decode::<AmUpdateHp>() else {
            warn!(keeper = self.uid, "malformed hp report dropped");
            return;
        };
        if am.map_id != self.map_id {
            debug!(keeper = self.uid, uid = am.uid, "hp report for another map dropped");
            return;
        }
        // Hp reports carry no cell; the authoritative grid supplies one.
        let Some(center) = self.terrain.position_of(am.uid) else {
            debug!(keeper = self.uid, uid = am.uid, "hp report from an entity not on the grid");
            return;
        };
        self.fan_out(am.uid, center, envelope, ctx);
    }

    fn handle_fade(&self, envelope: &Envelope) {
        let Ok(am) = envelope.message.payload.decode::<AmDeadFadeOut>() else {
            warn!(keeper = self.uid, "malformed fade dropped");
            return;
        };
        if let Some(cell) = self.terrain.vacate(am.uid) {
            debug!(keeper = self.uid, uid = am.uid, ?cell, "corpse faded, cell freed");
        }
    }

    fn handle_leave(&self, envelope: &Envelope) {
        let Ok(am) = envelope.message.payload.decode::<AmLeave>() else {
            warn!(keeper = self.uid, "malformed leave dropped");
            return;
        };
        if self.terrain.vacate(am.uid).is_none() {
            debug!(keeper = self.uid, uid = am.uid, "leave from an entity not on the grid");
        }
    }

    /// Seats a cross-map arrival. The cell must be free as requested;
    /// there is no nudging to a neighbor, the switcher retries with a
    /// different cell instead.
    fn handle_arrival(&self, envelope: &Envelope, ctx: &ActorContext<'_, Self>) {
        if envelope.from.is_null() {
            return;
        }
        let Ok(am) = envelope.message.payload.decode::<AmMapSwitch>() else {
            warn!(keeper = self.uid, "malformed arrival dropped");
            return;
        };
        let cell = GridCell::new(am.x, am.y);
        if am.map_id == self.map_id && self.terrain.occupy(am.uid, cell) {
            let ok = AmMapSwitchOk {
                uid: am.uid,
                keeper_uid: self.uid,
                map_id: self.map_id,
                x: cell.x,
                y: cell.y,
                _padding: 0,
            };
            match Message::with_payload(MessageKind::MapSwitchOk, &ok) {
                Ok(message) => {
                    ctx.forward(message.replying_to(envelope.message.request_id), envelope.from);
                }
                Err(error) => warn!(keeper = self.uid, %error, "arrival grant encode failed"),
            }
        } else {
            debug!(keeper = self.uid, uid = am.uid, ?cell, "arrival refused");
            ctx.forward(
                Message::bare(MessageKind::MapSwitchError).replying_to(envelope.message.request_id),
                envelope.from,
            );
        }
    }
}

impl Actor for MapKeeper {
    type Error = WorldError;

    fn uid(&self) -> u64 {
        self.uid
    }

    fn operate(&mut self, envelope: Envelope, ctx: &mut ActorContext<'_, Self>) {
        match envelope.message.kind {
            // The grid has no tick work; everything is demand-driven.
            MessageKind::Metronome => {}
            MessageKind::TryMove => self.handle_try_move(&envelope, ctx),
            MessageKind::Action => self.handle_action(&envelope, ctx),
            MessageKind::UpdateHp => self.handle_update_hp(&envelope, ctx),
            MessageKind::DeadFadeOut => self.handle_fade(&envelope),
            MessageKind::Leave => self.handle_leave(&envelope),
            MessageKind::MapSwitch => self.handle_arrival(&envelope, ctx),
            other => {
                warn!(keeper = self.uid, kind = ?other, "message not for a keeper");
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
