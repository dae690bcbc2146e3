//! # Lifecycle
//!
//! Death is staged so observers get an animation before the entity
//! disappears:
//!
//! ```text
//!   GoDie ──(ghost delay)──> GoGhost ──> GoSuicide
//!     │                        │             │
//!     Die action               DeadFadeOut   directory erasure
//!     locks released          + address seal  by the loop sweep
//! ```
//!
//! Each stage is idempotent and one-way. A sealed address still receives
//! nothing even if a peer holds a stale copy; the router drops and counts.
//!
//! The pending watchdog lives here too: it frees an entity whose awaited
//! reply will never come because the peer died first.

use tracing::warn;

use embervale_actor::{ActorContext, AmDeadFadeOut, Message, MessageKind};
use embervale_shared::ActionKind;

use crate::char_core::{Creature, Pending};
use crate::error::WorldError;
use crate::movement::dispatch_action;

/// Starts dying: sets the corpse state, releases every intent lock and
/// schedules the ghost transition. Returns whether the death started.
pub fn go_die<E: Creature>(e: &mut E, ctx: &mut ActorContext<'_, E>) -> bool {
    if e.core().dead || e.core().never_die {
        return false;
    }
    let core = e.core_mut();
    core.dead = true;
    core.move_lock = false;
    core.attack_lock = false;
    core.pending = Pending::Idle;
    let cell = core.cell;

    dispatch_action(e, ctx, ActionKind::Die, 0, cell, cell);

    let ghost_delay_ms = e.core().tuning.ghost_delay_ms;
    ctx.delay(ghost_delay_ms, |e, ctx| {
        go_ghost(e, ctx);
        Ok(())
    });
    true
}

/// Fades the corpse out: tells the keeper to free the cell, seals the
/// address and hands the identity to the disposal sweep. Only a dead
/// entity can ghost.
pub fn go_ghost<E: Creature>(e: &mut E, ctx: &mut ActorContext<'_, E>) -> bool {
    if e.core().ghost || !e.core().dead {
        return false;
    }
    e.core_mut().ghost = true;

    let core = e.core();
    if !core.keeper_addr.is_null() {
        let am = AmDeadFadeOut {
            uid: core.uid,
            map_id: core.map_id,
            x: core.cell.x,
            y: core.cell.y,
            _padding: 0,
        };
        match Message::with_payload(MessageKind::DeadFadeOut, &am) {
            Ok(message) => ctx.forward(message, core.keeper_addr),
            Err(error) => warn!(uid = core.uid, %error, "fade-out encode failed"),
        }
    }
    ctx.request_seal();
    go_suicide(e, ctx);
    true
}

/// Queues the identity for directory erasure. The record stays resolvable
/// until the world loop sweeps, so in-flight replies to the dead entity
/// fail at the sealed address rather than at the directory.
pub fn go_suicide<E: Creature>(e: &E, ctx: &ActorContext<'_, E>) {
    ctx.dispose(e.uid());
}

/// State hook that abandons a pending reply whose deadline passed.
///
/// A peer that sealed before answering leaves the asker waiting forever;
/// this frees the lock so the entity can act again. Install it on every
/// creature pod.
pub fn pending_watchdog<E: Creature>(
    e: &mut E,
    ctx: &mut ActorContext<'_, E>,
) -> Result<bool, WorldError> {
    let timeout_ms = e.core().tuning.pending_timeout_ms;
    match e.core().pending {
        Pending::Idle => Ok(false),
        Pending::AwaitingMoveAck { issued_ms, .. } => {
            if ctx.now_ms >= issued_ms.saturating_add(timeout_ms) {
                warn!(uid = e.uid(), issued_ms, "move ack never came, releasing");
                let core = e.core_mut();
                core.pending = Pending::Idle;
                core.move_lock = false;
                Ok(true)
            } else {
                Ok(false)
            }
        }
        Pending::AwaitingLocation { issued_ms, target, .. } => {
            if ctx.now_ms >= issued_ms.saturating_add(timeout_ms) {
                warn!(uid = e.uid(), target, issued_ms, "location reply never came, releasing");
                let core = e.core_mut();
                core.pending = Pending::Idle;
                core.attack_lock = false;
                // The usual cause is a peer that sealed before answering.
                core.evict_target(target);
                Ok(true)
            } else {
                Ok(false)
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
