//! # Message Router
//!
//! The router owns the slot table that maps an [`Address`] to a live
//! mailbox sender. Registration hands out an address and the matching
//! receiver; sealing retires the address by bumping the slot generation,
//! so any sender still holding the old address fails the generation check
//! instead of reaching whoever reuses the slot.
//!
//! ## Delivery contract
//!
//! Delivery is fire-and-forget. A send to a null, stale, sealed or full
//! destination is dropped, logged at warn level, and counted in
//! [`Router::dropped_deliveries`]. It is never an error at the send site:
//! in a world where entities die mid-flight, the sender cannot do anything
//! useful with a delivery failure anyway. Tests use the drop counter to
//! prove that late messages to a departed entity go nowhere.

use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use parking_lot::{Mutex, RwLock};
use tracing::warn;

use crate::address::Address;
use crate::message::Message;

/// A message together with its sender's address.
#[derive(Clone, Copy, Debug)]
pub struct Envelope {
    /// The delivered message.
    pub message: Message,
    /// Address of the sender. [`Address::NULL`] for system broadcasts.
    pub from: Address,
}

/// One entry in the slot table.
struct RouteSlot {
    /// Bumped on every seal. An address is live only while its generation
    /// matches the slot's.
    generation: u32,
    sender: Option<Sender<Envelope>>,
}

/// Address allocator and delivery fabric for all mailboxes.
pub struct Router {
    slots: RwLock<Vec<RouteSlot>>,
    free: Mutex<Vec<u32>>,
    dropped: AtomicU64,
}

impl Router {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: RwLock::new(Vec::new()),
            free: Mutex::new(Vec::new()),
            dropped: AtomicU64::new(0),
        }
    }

    /// Registers a new mailbox of the given capacity and returns its
    /// address together with the receiving end.
    pub fn register(&self, capacity: usize) -> (Address, Receiver<Envelope>) {
        let (tx, rx) = bounded(capacity);
        let index = self.free.lock().pop();
        let mut slots = self.slots.write();
        match index {
            Some(index) => {
                let slot = &mut slots[index as usize];
                slot.sender = Some(tx);
                (Address::from_parts(index, slot.generation), rx)
            }
            None => {
                let index = slots.len() as u32;
                slots.push(RouteSlot {
                    generation: 0,
                    sender: Some(tx),
                });
                (Address::from_parts(index, 0), rx)
            }
        }
    }

    /// Retires an address. Subsequent sends to it are dropped and counted.
    /// Sealing an already-stale address is a no-op.
    pub fn seal(&self, address: Address) {
        if address.is_null() {
            return;
        }
        let mut slots = self.slots.write();
        let Some(slot) = slots.get_mut(address.index() as usize) else {
            return;
        };
        if slot.generation != address.generation() || slot.sender.is_none() {
            return;
        }
        slot.sender = None;
        slot.generation = slot.generation.wrapping_add(1);
        drop(slots);
        self.free.lock().push(address.index());
    }

    /// Delivers a message, returning `true` if it reached a live mailbox.
    ///
    /// Failures (null or stale address, sealed slot, full mailbox) drop
    /// the message, log, and bump the drop counter.
    pub fn deliver(&self, message: Message, to: Address, from: Address) -> bool {
        if to.is_null() {
            self.count_drop(message, to, "null address");
            return false;
        }
        let slots = self.slots.read();
        let Some(slot) = slots.get(to.index() as usize) else {
            drop(slots);
            self.count_drop(message, to, "unknown slot");
            return false;
        };
        if slot.generation != to.generation() {
            drop(slots);
            self.count_drop(message, to, "stale generation");
            return false;
        }
        let Some(sender) = slot.sender.as_ref() else {
            drop(slots);
            self.count_drop(message, to, "sealed");
            return false;
        };
        match sender.try_send(Envelope { message, from }) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                drop(slots);
                self.count_drop(message, to, "mailbox full");
                false
            }
            Err(TrySendError::Disconnected(_)) => {
                drop(slots);
                self.count_drop(message, to, "receiver gone");
                false
            }
        }
    }

    /// Fire-and-forget delivery; the result is logged and counted inside
    /// [`Self::deliver`].
    pub fn forward(&self, message: Message, to: Address, from: Address) {
        let _ = self.deliver(message, to, from);
    }

    /// Total messages dropped since construction.
    #[must_use]
    pub fn dropped_deliveries(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Number of currently live mailboxes.
    #[must_use]
    pub fn live_routes(&self) -> usize {
        self.slots
            .read()
            .iter()
            .filter(|slot| slot.sender.is_some())
            .count()
    }

    fn count_drop(&self, message: Message, to: Address, reason: &str) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
        warn!(
            kind = ?message.kind,
            %to,
            reason,
            "dropped undeliverable message"
        );
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageKind;

    #[test]
    fn test_register_and_deliver() {
        let router = Router::new();
        let (addr, rx) = router.register(8);
        assert!(router.deliver(Message::bare(MessageKind::Metronome), addr, Address::NULL));
        let env = rx.try_recv().unwrap();
        assert_eq!(env.message.kind, MessageKind::Metronome);
        assert!(env.from.is_null());
        assert_eq!(router.dropped_deliveries(), 0);
    }

    #[test]
    fn test_sealed_address_drops_and_counts() {
        let router = Router::new();
        let (addr, rx) = router.register(8);
        router.seal(addr);
        assert!(!router.deliver(Message::bare(MessageKind::Attack), addr, Address::NULL));
        assert_eq!(router.dropped_deliveries(), 1);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_slot_reuse_keeps_old_address_stale() {
        let router = Router::new();
        let (old, _old_rx) = router.register(8);
        router.seal(old);
        let (new, new_rx) = router.register(8);
        assert_eq!(old.index(), new.index());
        assert_ne!(old, new);

        // A sender still holding the old address cannot reach the new tenant.
        assert!(!router.deliver(Message::bare(MessageKind::Attack), old, Address::NULL));
        assert!(new_rx.try_recv().is_err());
        assert!(router.deliver(Message::bare(MessageKind::Metronome), new, Address::NULL));
        assert!(new_rx.try_recv().is_ok());
    }

    #[test]
    fn test_null_address_drops() {
        let router = Router::new();
        assert!(!router.deliver(
            Message::bare(MessageKind::Metronome),
            Address::NULL,
            Address::NULL
        ));
        assert_eq!(router.dropped_deliveries(), 1);
    }

    #[test]
    fn test_full_mailbox_drops_overflow() {
        let router = Router::new();
        let (addr, rx) = router.register(2);
        assert!(router.deliver(Message::bare(MessageKind::Metronome), addr, Address::NULL));
        assert!(router.deliver(Message::bare(MessageKind::Metronome), addr, Address::NULL));
        assert!(!router.deliver(Message::bare(MessageKind::Metronome), addr, Address::NULL));
        assert_eq!(router.dropped_deliveries(), 1);
        assert_eq!(rx.len(), 2);
    }

    #[test]
    fn test_seal_is_idempotent_and_frees_slot() {
        let router = Router::new();
        let (addr, _rx) = router.register(8);
        assert_eq!(router.live_routes(), 1);
        router.seal(addr);
        router.seal(addr);
        assert_eq!(router.live_routes(), 0);
        let (again, _rx2) = router.register(8);
        assert_eq!(again.index(), addr.index());
        assert_eq!(router.live_routes(), 1);
    }
}
