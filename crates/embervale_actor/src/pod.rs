//! # Actor Pods
//!
//! An [`ActorPod`] wraps one entity with everything the scheduler needs:
//! its mailbox, its delayed-command queue, and its state hooks. The world
//! loop drives pods one tick at a time; within a tick a pod runs three
//! phases in a fixed order:
//!
//! ```text
//!   1. state hooks        (watchers, e.g. reply timeouts)
//!   2. delayed commands   (everything due at or before now)
//!   3. mailbox drain      (until empty or the actor seals)
//! ```
//!
//! A seal requested in any phase stops the later phases, retires the
//! address at the router, and leaves the pod inert until the sweep removes
//! it. Failing hooks and commands are logged and dropped; an actor is
//! never torn down by its own watchers.

use std::sync::Arc;

use crossbeam_channel::Receiver;
use tracing::{debug, warn};

use crate::address::Address;
use crate::context::{Actor, ActorContext};
use crate::delay::DelayQueue;
use crate::directory::{DisposalSender, UidDirectory};
use crate::hooks::HookSet;
use crate::router::{Envelope, Router};

/// Shared runtime services handed to every pod each tick.
#[derive(Clone)]
pub struct RuntimeShared {
    /// Delivery fabric.
    pub router: Arc<Router>,
    /// Identity directory.
    pub directory: Arc<UidDirectory>,
    /// Disposal queue handle.
    pub disposal: DisposalSender,
}

/// What one pod did during one tick.
#[derive(Clone, Copy, Debug, Default)]
pub struct TickWork {
    /// Hooks that reported doing work.
    pub hooks_ran: usize,
    /// Delayed commands executed.
    pub commands_run: usize,
    /// Mailbox messages handled.
    pub messages_handled: usize,
}

impl TickWork {
    /// Accumulates another pod's work into this tally.
    pub fn absorb(&mut self, other: Self) {
        self.hooks_ran += other.hooks_ran;
        self.commands_run += other.commands_run;
        self.messages_handled += other.messages_handled;
    }
}

/// Scheduling envelope around one entity.
pub struct ActorPod<E: Actor> {
    entity: E,
    capacity: usize,
    address: Address,
    mailbox: Option<Receiver<Envelope>>,
    hooks: HookSet<E>,
    delays: DelayQueue<E>,
    sealed: bool,
}

impl<E: Actor> ActorPod<E> {
    /// Wraps an entity with a mailbox of the given capacity. The pod is
    /// inert until [`Self::activate`] registers it with a router.
    #[must_use]
    pub fn new(entity: E, capacity: usize) -> Self {
        Self {
            entity,
            capacity,
            address: Address::NULL,
            mailbox: None,
            hooks: HookSet::new(),
            delays: DelayQueue::new(),
            sealed: false,
        }
    }

    /// Registers the pod's mailbox and returns its address. Activating an
    /// already-active pod returns the existing address unchanged.
    pub fn activate(&mut self, router: &Router) -> Address {
        if !self.address.is_null() {
            debug!(uid = self.entity.uid(), address = %self.address, "pod already active");
            return self.address;
        }
        let (address, mailbox) = router.register(self.capacity);
        self.address = address;
        self.mailbox = Some(mailbox);
        address
    }

    /// Installs a named state hook on this pod's entity.
    pub fn install_hook<F>(&mut self, name: &'static str, func: F)
    where
        F: FnMut(&mut E, &mut ActorContext<'_, E>) -> Result<bool, E::Error> + Send + 'static,
    {
        self.hooks.install(name, func);
    }

    /// Read access to the wrapped entity, for wiring and assertions.
    #[must_use]
    pub fn entity(&self) -> &E {
        &self.entity
    }

    /// Write access to the wrapped entity, for bootstrap wiring.
    pub fn entity_mut(&mut self) -> &mut E {
        &mut self.entity
    }

    /// This pod's address, null before activation.
    #[must_use]
    pub fn pod_address(&self) -> Address {
        self.address
    }

    /// Number of delayed commands waiting.
    #[must_use]
    pub fn pending_commands(&self) -> usize {
        self.delays.len()
    }
}

/// Type-erased pod interface for the world loop's heterogeneous pod list.
pub trait RunPod: Send {
    /// The wrapped entity's identity.
    fn uid(&self) -> u64;

    /// The pod's mailbox address.
    fn address(&self) -> Address;

    /// Whether the pod has sealed its address.
    fn is_sealed(&self) -> bool;

    /// Runs one scheduling tick.
    fn run_tick(&mut self, shared: &RuntimeShared, now_ms: u64) -> TickWork;
}

impl<E: Actor + Send> RunPod for ActorPod<E> {
    fn uid(&self) -> u64 {
        self.entity.uid()
    }

    fn address(&self) -> Address {
        self.address
    }

    fn is_sealed(&self) -> bool {
        self.sealed
    }

    fn run_tick(&mut self, shared: &RuntimeShared, now_ms: u64) -> TickWork {
        let mut work = TickWork::default();
        if self.sealed {
            return work;
        }
        let mut ctx = ActorContext::new(
            now_ms,
            self.address,
            &shared.router,
            &shared.directory,
            &shared.disposal,
        );

        work.hooks_ran = self.hooks.run_all(&mut self.entity, &mut ctx);

        if !ctx.is_seal_requested() {
            for command in self.delays.drain_due(now_ms) {
                if ctx.is_seal_requested() {
                    break;
                }
                if let Err(error) = command(&mut self.entity, &mut ctx) {
                    warn!(uid = self.entity.uid(), %error, "delayed command failed, dropped");
                }
                work.commands_run += 1;
            }
        }

        if !ctx.is_seal_requested() {
            if let Some(mailbox) = self.mailbox.as_ref() {
                while let Ok(envelope) = mailbox.try_recv() {
                    self.entity.operate(envelope, &mut ctx);
                    work.messages_handled += 1;
                    if ctx.is_seal_requested() {
                        break;
                    }
                }
            }
        }

        let (queued, seal) = ctx.take_effects();
        for (fire_ms, action) in queued {
            self.delays.schedule(fire_ms, action);
        }
        if seal {
            shared.router.seal(self.address);
            self.sealed = true;
        }
        work
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::DisposalQueue;
    use crate::message::{Message, MessageKind};

    struct Probe {
        uid: u64,
        log: Vec<&'static str>,
        seal_on_attack: bool,
    }

    impl Probe {
        fn new(uid: u64) -> Self {
            Self {
                uid,
                log: Vec::new(),
                seal_on_attack: false,
            }
        }
    }

    impl Actor for Probe {
        type Error = String;

        fn uid(&self) -> u64 {
            self.uid
        }

        fn operate(&mut self, envelope: Envelope, ctx: &mut ActorContext<'_, Self>) {
            match envelope.message.kind {
                MessageKind::Metronome => {
                    self.log.push("msg");
                    ctx.delay(0, |probe, _ctx| {
                        probe.log.push("cmd");
                        Ok(())
                    });
                }
                MessageKind::Attack if self.seal_on_attack => {
                    self.log.push("sealed");
                    ctx.request_seal();
                }
                _ => self.log.push("other"),
            }
        }
    }

    fn shared() -> (RuntimeShared, DisposalQueue) {
        let disposal = DisposalQueue::new(16);
        let shared = RuntimeShared {
            router: Arc::new(Router::new()),
            directory: Arc::new(UidDirectory::new()),
            disposal: disposal.sender(),
        };
        (shared, disposal)
    }

    #[test]
    fn test_activate_is_idempotent() {
        let (shared, _disposal) = shared();
        let mut pod = ActorPod::new(Probe::new(1), 8);
        let first = pod.activate(&shared.router);
        let second = pod.activate(&shared.router);
        assert_eq!(first, second);
        assert_eq!(shared.router.live_routes(), 1);
    }

    #[test]
    fn test_phases_run_hooks_then_commands_then_mailbox() {
        let (shared, _disposal) = shared();
        let mut pod = ActorPod::new(Probe::new(1), 8);
        pod.install_hook("logger", |probe: &mut Probe, _ctx| {
            probe.log.push("hook");
            Ok(false)
        });
        let addr = pod.activate(&shared.router);

        // Tick 1: the message queues a zero-delay command for later.
        shared
            .router
            .deliver(Message::bare(MessageKind::Metronome), addr, Address::NULL);
        let work = pod.run_tick(&shared, 100);
        assert_eq!(work.messages_handled, 1);
        assert_eq!(pod.entity().log, vec!["hook", "msg"]);
        assert_eq!(pod.pending_commands(), 1);

        // Tick 2: the command fires between the hook and the new message.
        shared
            .router
            .deliver(Message::bare(MessageKind::Metronome), addr, Address::NULL);
        let work = pod.run_tick(&shared, 200);
        assert_eq!(work.commands_run, 1);
        assert_eq!(
            pod.entity().log,
            vec!["hook", "msg", "hook", "cmd", "msg"]
        );
    }

    #[test]
    fn test_seal_stops_the_drain_and_later_sends_drop() {
        let (shared, _disposal) = shared();
        let mut probe = Probe::new(9);
        probe.seal_on_attack = true;
        let mut pod = ActorPod::new(probe, 8);
        let addr = pod.activate(&shared.router);

        for _ in 0..3 {
            shared
                .router
                .deliver(Message::bare(MessageKind::Attack), addr, Address::NULL);
        }
        let work = pod.run_tick(&shared, 100);
        assert_eq!(work.messages_handled, 1);
        assert!(pod.is_sealed());

        // The sealed pod does nothing on later ticks.
        let work = pod.run_tick(&shared, 200);
        assert_eq!(work.messages_handled, 0);

        // And the address no longer accepts mail.
        let before = shared.router.dropped_deliveries();
        assert!(!shared
            .router
            .deliver(Message::bare(MessageKind::Attack), addr, Address::NULL));
        assert_eq!(shared.router.dropped_deliveries(), before + 1);
    }

    #[test]
    fn test_failing_command_is_dropped_not_fatal() {
        let (shared, _disposal) = shared();
        let mut pod = ActorPod::new(Probe::new(3), 8);
        pod.activate(&shared.router);

        pod.delays.schedule(50, Box::new(|_probe, _ctx| Err("bad".to_owned())));
        pod.delays.schedule(
            60,
            Box::new(|probe: &mut Probe, _ctx| {
                probe.log.push("survivor");
                Ok(())
            }),
        );
        let work = pod.run_tick(&shared, 100);
        assert_eq!(work.commands_run, 2);
        assert_eq!(pod.entity().log, vec!["survivor"]);
    }
}
