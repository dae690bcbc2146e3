//! # Delayed Commands
//!
//! A [`DelayQueue`] holds closures scheduled to run against an actor at a
//! future tick. Ordering is a min-heap on `(fire_ms, seq)`: commands fire
//! in time order, and commands scheduled for the same instant fire in the
//! order they were scheduled. The sequence tie-break is what makes replays
//! deterministic.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use crate::context::{Actor, ActorContext};

/// A deferred, fallible action against an actor.
pub type Command<E> =
    Box<dyn FnOnce(&mut E, &mut ActorContext<'_, E>) -> Result<(), <E as Actor>::Error> + Send>;

struct DelayedCommand<E: Actor> {
    fire_ms: u64,
    seq: u64,
    action: Command<E>,
}

impl<E: Actor> PartialEq for DelayedCommand<E> {
    fn eq(&self, other: &Self) -> bool {
        self.fire_ms == other.fire_ms && self.seq == other.seq
    }
}

impl<E: Actor> Eq for DelayedCommand<E> {}

impl<E: Actor> PartialOrd for DelayedCommand<E> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<E: Actor> Ord for DelayedCommand<E> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.fire_ms
            .cmp(&other.fire_ms)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

/// Min-heap of delayed commands for one actor.
pub struct DelayQueue<E: Actor> {
    heap: BinaryHeap<Reverse<DelayedCommand<E>>>,
    next_seq: u64,
}

impl<E: Actor> DelayQueue<E> {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    /// Schedules `action` to fire at absolute time `fire_ms`.
    pub fn schedule(&mut self, fire_ms: u64, action: Command<E>) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(DelayedCommand {
            fire_ms,
            seq,
            action,
        }));
    }

    /// Removes and returns every command due at or before `now_ms`, in
    /// firing order. Taking a snapshot first means a command that
    /// schedules a zero-delay follow-up cannot starve the tick; the
    /// follow-up waits for the next one.
    pub fn drain_due(&mut self, now_ms: u64) -> Vec<Command<E>> {
        let mut due = Vec::new();
        while let Some(Reverse(head)) = self.heap.peek() {
            if head.fire_ms > now_ms {
                break;
            }
            if let Some(Reverse(cmd)) = self.heap.pop() {
                due.push(cmd.action);
            }
        }
        due
    }

    /// Number of commands waiting.
    #[must_use]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Returns `true` when nothing is scheduled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

impl<E: Actor> Default for DelayQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// TESTS
// =============================================================================
