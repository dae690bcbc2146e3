//! # Actor Trait and Tick Context
//!
//! [`Actor`] is what an entity implements; [`ActorContext`] is the
//! capability bundle the scheduler hands it for the duration of one tick.
//! Everything an entity does to the outside world (send, schedule, seal,
//! dispose) goes through the context, which keeps entity state itself
//! free of channels and locks.

use core::fmt;

use crate::address::Address;
use crate::delay::Command;
use crate::directory::{DisposalSender, UidDirectory};
use crate::message::Message;
use crate::router::{Envelope, Router};

/// A world entity driven by messages.
///
/// Implementors own all their state; the runtime guarantees `operate` and
/// every hook or delayed command run on one thread at a time.
pub trait Actor: Sized {
    /// Domain error surfaced by hooks and delayed commands. The pod logs
    /// it and drops the failing hook or command; it never crashes the
    /// actor.
    type Error: fmt::Display;

    /// Stable identity of this actor, as registered in the directory.
    fn uid(&self) -> u64;

    /// Handles one inbound envelope.
    fn operate(&mut self, envelope: Envelope, ctx: &mut ActorContext<'_, Self>);
}

/// Per-tick capability bundle passed to an actor's handlers.
///
/// Delayed commands queued through [`ActorContext::delay`] are collected
/// here and merged into the pod's delay queue when the tick ends, so a
/// handler can schedule follow-ups without aliasing the queue it may be
/// running from.
pub struct ActorContext<'a, E: Actor> {
    /// Timestamp of the current tick in milliseconds.
    pub now_ms: u64,
    /// The running actor's own address.
    pub address: Address,
    /// Delivery fabric for outbound messages.
    pub router: &'a Router,
    /// Identity lookup service.
    pub directory: &'a UidDirectory,
    disposal: &'a DisposalSender,
    queued: Vec<(u64, Command<E>)>,
    seal_requested: bool,
}

impl<'a, E: Actor> ActorContext<'a, E> {
    /// Builds a context for one tick. The runtime calls this; tests use it
    /// to drive entity methods directly.
    #[must_use]
    pub fn new(
        now_ms: u64,
        address: Address,
        router: &'a Router,
        directory: &'a UidDirectory,
        disposal: &'a DisposalSender,
    ) -> Self {
        Self {
            now_ms,
            address,
            router,
            directory,
            disposal,
            queued: Vec::new(),
            seal_requested: false,
        }
    }

    /// Sends a message with this actor as the sender. Fire-and-forget.
    pub fn forward(&self, message: Message, to: Address) {
        self.router.forward(message, to, self.address);
    }

    /// Schedules `action` to run against this actor once `delay_ms` has
    /// elapsed. The action runs inside a later tick of the same actor and
    /// may observe any state change that happened in between.
    pub fn delay<F>(&mut self, delay_ms: u64, action: F)
    where
        F: FnOnce(&mut E, &mut ActorContext<'_, E>) -> Result<(), E::Error> + Send + 'static,
    {
        self.queued
            .push((self.now_ms.saturating_add(delay_ms), Box::new(action)));
    }

    /// Asks the runtime to seal this actor's address at the end of the
    /// current tick. Remaining mailbox messages are not drained.
    pub fn request_seal(&mut self) {
        self.seal_requested = true;
    }

    /// Queues an identity for directory erasure by the world loop sweep.
    pub fn dispose(&self, uid: u64) {
        self.disposal.dispose(uid);
    }

    /// Number of delayed commands queued so far this tick.
    #[must_use]
    pub fn pending_delays(&self) -> usize {
        self.queued.len()
    }

    /// Whether a seal has been requested this tick.
    #[must_use]
    pub fn is_seal_requested(&self) -> bool {
        self.seal_requested
    }

    /// Harvests queued delays and the seal flag at end of tick.
    pub(crate) fn take_effects(self) -> (Vec<(u64, Command<E>)>, bool) {
        (self.queued, self.seal_requested)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::DisposalQueue;

    struct Probe {
        uid: u64,
    }

    impl Actor for Probe {
        type Error = String;

        fn uid(&self) -> u64 {
            self.uid
        }

        fn operate(&mut self, _envelope: Envelope, _ctx: &mut ActorContext<'_, Self>) {}
    }

    #[test]
    fn test_delay_queues_at_absolute_time() {
        let router = Router::new();
        let directory = UidDirectory::new();
        let disposal = DisposalQueue::new(4);
        let sender = disposal.sender();
        let mut ctx: ActorContext<'_, Probe> =
            ActorContext::new(1_000, Address::NULL, &router, &directory, &sender);

        ctx.delay(500, |_probe, _ctx| Ok(()));
        assert_eq!(ctx.pending_delays(), 1);
        let (queued, sealed) = ctx.take_effects();
        assert_eq!(queued[0].0, 1_500);
        assert!(!sealed);
    }

    #[test]
    fn test_seal_request_is_sticky() {
        let router = Router::new();
        let directory = UidDirectory::new();
        let disposal = DisposalQueue::new(4);
        let sender = disposal.sender();
        let mut ctx: ActorContext<'_, Probe> =
            ActorContext::new(0, Address::NULL, &router, &directory, &sender);

        assert!(!ctx.is_seal_requested());
        ctx.request_seal();
        ctx.request_seal();
        let (_, sealed) = ctx.take_effects();
        assert!(sealed);
    }
}
