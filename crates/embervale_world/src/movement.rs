//! # Movement
//!
//! Movement is a request/commit protocol: the mover proposes one step with
//! `TryMove`, the map keeper validates it against authoritative occupancy
//! and answers `MoveOk` or `MoveError`. Position only changes when the
//! grant arrives; until then the move lock refuses any second step.
//!
//! A second `RequestMove` while one is in flight fails immediately and
//! changes nothing. Rejected requests are not queued or retried; the
//! caller decides what to do on the next tick.

use tracing::{debug, warn};

use embervale_actor::{
    ActorContext, AmAction, AmMoveOk, AmTryMove, Envelope, Message, MessageKind,
};
use embervale_shared::{ActionKind, Direction, GridCell, Motion};

use crate::char_core::{Creature, Pending};

/// Proposes a single step to the keeper. Returns `true` if the request
/// left; the step itself commits only when `MoveOk` arrives.
pub fn request_move<E: Creature>(
    e: &mut E,
    motion: Motion,
    destination: GridCell,
    ctx: &mut ActorContext<'_, E>,
) -> bool {
    let now_ms = ctx.now_ms;
    if !e.can_move(now_ms) {
        return false;
    }
    if e.core().pending != Pending::Idle {
        return false;
    }
    let origin = e.core().cell;
    if !origin.within_step(destination, motion.step()) {
        warn!(
            uid = e.uid(),
            ?origin,
            ?destination,
            step = motion.step(),
            "move request beyond reach refused"
        );
        return false;
    }
    let keeper = e.core().keeper_addr;
    if keeper.is_null() {
        warn!(uid = e.uid(), "move request with no keeper bound");
        return false;
    }

    let request_id = e.core_mut().next_request_id();
    let am = AmTryMove {
        uid: e.uid(),
        map_id: e.core().map_id,
        x: origin.x,
        y: origin.y,
        end_x: destination.x,
        end_y: destination.y,
        _padding: 0,
    };
    let message = match Message::with_payload(MessageKind::TryMove, &am) {
        Ok(message) => message.expecting_reply(request_id),
        Err(error) => {
            warn!(uid = e.uid(), %error, "try-move encode failed");
            return false;
        }
    };
    ctx.forward(message, keeper);

    let core = e.core_mut();
    core.move_lock = true;
    core.pending = Pending::AwaitingMoveAck {
        destination,
        request_id,
        issued_ms: now_ms,
    };
    true
}

/// Commits a granted step. Returns `true` if this ack matched the pending
/// request; stale or unsolicited grants are dropped.
pub fn handle_move_ok<E: Creature>(
    e: &mut E,
    envelope: &Envelope,
    ctx: &mut ActorContext<'_, E>,
) -> bool {
    let Ok(am) = envelope.message.payload.decode::<AmMoveOk>() else {
        warn!(uid = e.uid(), "malformed move grant dropped");
        return false;
    };
    let Pending::AwaitingMoveAck {
        destination,
        request_id,
        ..
    } = e.core().pending
    else {
        debug!(uid = e.uid(), "move grant with nothing pending");
        return false;
    };
    if envelope.message.response_id != request_id {
        debug!(
            uid = e.uid(),
            got = envelope.message.response_id,
            want = request_id,
            "stale move grant dropped"
        );
        return false;
    }

    // Death while the request was in flight: the grant no longer applies,
    // but the slot and lock must not leak.
    if e.core().dead {
        let core = e.core_mut();
        core.move_lock = false;
        core.pending = Pending::Idle;
        return false;
    }

    let granted = GridCell::new(am.x, am.y);
    if granted != destination {
        debug!(uid = e.uid(), ?granted, ?destination, "keeper granted a different cell");
    }
    let origin = e.core().cell;
    let core = e.core_mut();
    core.cell = granted;
    let facing = Direction::between(origin, granted);
    if facing != Direction::None {
        core.direction = facing;
    }
    core.last_move_ms = ctx.now_ms;
    core.move_lock = false;
    core.pending = Pending::Idle;

    dispatch_action(e, ctx, ActionKind::Move, 0, origin, granted);
    true
}

/// Releases the move lock after a keeper rejection. Returns `true` if the
/// rejection matched the pending request.
pub fn handle_move_error<E: Creature>(e: &mut E, envelope: &Envelope) -> bool {
    let Pending::AwaitingMoveAck { request_id, .. } = e.core().pending else {
        return false;
    };
    if envelope.message.response_id != request_id {
        return false;
    }
    let core = e.core_mut();
    core.move_lock = false;
    core.pending = Pending::Idle;
    true
}

/// Broadcasts a visible act through the keeper's view fan-out.
pub fn dispatch_action<E: Creature>(
    e: &mut E,
    ctx: &ActorContext<'_, E>,
    action: ActionKind,
    param: u32,
    from: GridCell,
    end: GridCell,
) {
    let core = e.core();
    if core.keeper_addr.is_null() {
        return;
    }
    let am = AmAction {
        uid: core.uid,
        map_id: core.map_id,
        action: action as u32,
        param,
        speed: core.speed,
        direction: core.direction as u32,
        x: from.x,
        y: from.y,
        end_x: end.x,
        end_y: end.y,
        _padding: 0,
    };
    match Message::with_payload(MessageKind::Action, &am) {
        Ok(message) => ctx.forward(message, core.keeper_addr),
        Err(error) => warn!(uid = core.uid, %error, "action encode failed"),
    }
}

// =============================================================================
// TESTS
// =============================================================================
