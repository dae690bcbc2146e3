//! # Identity Directory
//!
//! The directory maps a uid to its current routing address and actor kind.
//! It is the single authority on "who exists": registration happens once
//! at spawn, erasure happens once during the disposal sweep, and every
//! uid-addressed send resolves here first.
//!
//! ## Disposal ordering
//!
//! A dying entity seals its own address first, then queues its uid for
//! disposal. The world loop erases the directory entry only after the
//! seal, so no resolve can return an address that still accepts messages
//! for an entity that is gone. Late sends resolve to a stale address and
//! die at the router's generation check.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use parking_lot::RwLock;
use tracing::warn;

use embervale_shared::ActorKind;

use crate::address::Address;
use crate::error::{ActorError, ActorResult};

/// Directory entry for one live actor.
#[derive(Clone, Copy, Debug)]
pub struct UidRecord {
    /// The registered identity.
    pub uid: u64,
    /// Current mailbox address.
    pub address: Address,
    /// What kind of actor owns the uid.
    pub kind: ActorKind,
}

/// Uid allocator and identity-to-address map.
pub struct UidDirectory {
    records: RwLock<HashMap<u64, UidRecord>>,
    next_uid: AtomicU64,
}

impl UidDirectory {
    /// Creates an empty directory. Uid zero is never handed out; zero is
    /// the "no entity" sentinel throughout the protocol.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            next_uid: AtomicU64::new(1),
        }
    }

    /// Allocates a fresh uid.
    pub fn allocate_uid(&self) -> u64 {
        self.next_uid.fetch_add(1, Ordering::Relaxed)
    }

    /// Registers an identity at an address.
    ///
    /// # Errors
    ///
    /// [`ActorError::DuplicateUid`] if the uid is already registered.
    /// Identity corruption has no safe recovery; callers treat this as
    /// fatal for the spawning entity.
    pub fn register(&self, uid: u64, address: Address, kind: ActorKind) -> ActorResult<()> {
        let mut records = self.records.write();
        if records.contains_key(&uid) {
            return Err(ActorError::DuplicateUid { uid });
        }
        records.insert(uid, UidRecord { uid, address, kind });
        Ok(())
    }

    /// Looks up the record for a uid.
    #[must_use]
    pub fn resolve(&self, uid: u64) -> Option<UidRecord> {
        self.records.read().get(&uid).copied()
    }

    /// Erases an identity. Returns `true` if it was registered.
    pub fn erase(&self, uid: u64) -> bool {
        self.records.write().remove(&uid).is_some()
    }

    /// Number of registered identities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Returns `true` when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl Default for UidDirectory {
    fn default() -> Self {
        Self::new()
    }
}

/// Queue of uids waiting for the world loop's disposal sweep.
pub struct DisposalQueue {
    tx: Sender<u64>,
    rx: Receiver<u64>,
}

impl DisposalQueue {
    /// Creates a disposal queue with the given capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = bounded(capacity);
        Self { tx, rx }
    }

    /// A cloneable sending handle for actor contexts.
    #[must_use]
    pub fn sender(&self) -> DisposalSender {
        DisposalSender {
            tx: self.tx.clone(),
        }
    }

    /// Drains every queued uid.
    pub fn drain(&self) -> Vec<u64> {
        let mut uids = Vec::new();
        while let Ok(uid) = self.rx.try_recv() {
            uids.push(uid);
        }
        uids
    }
}

/// Sending half of the disposal queue.
#[derive(Clone)]
pub struct DisposalSender {
    tx: Sender<u64>,
}

impl DisposalSender {
    /// Queues a uid for erasure. A full queue drops the request with a
    /// warning; the uid stays resolvable until a later disposal succeeds.
    pub fn dispose(&self, uid: u64) {
        match self.tx.try_send(uid) {
            Ok(()) => {}
            Err(TrySendError::Full(uid) | TrySendError::Disconnected(uid)) => {
                warn!(uid, "disposal queue rejected uid");
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
