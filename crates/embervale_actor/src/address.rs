//! # Routing Addresses
//!
//! An [`Address`] names a mailbox slot inside the [`Router`](crate::Router),
//! not an entity. Identity (uid) and routing (address) are deliberately
//! separate: a uid is forever, an address dies with its mailbox.
//!
//! The packing is a 32-bit slot index in the low half and a 32-bit
//! generation in the high half. Sealing a slot bumps its generation, so a
//! stale address held by a sender fails the generation check instead of
//! reaching whoever reuses the slot.

use core::fmt;

/// Packed mailbox handle: slot index in the low 32 bits, generation in the
/// high 32 bits.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address(u64);

impl Address {
    /// The null address. Sends to it are dropped and counted. Used as the
    /// `from` field of messages that expect no reply path, such as the
    /// metronome broadcast.
    pub const NULL: Self = Self(u64::MAX);

    /// Packs a slot index and generation into an address.
    #[must_use]
    pub(crate) const fn from_parts(index: u32, generation: u32) -> Self {
        Self(((generation as u64) << 32) | index as u64)
    }

    /// Returns `true` for the null address.
    #[must_use]
    #[inline]
    pub const fn is_null(self) -> bool {
        self.0 == u64::MAX
    }

    /// Slot index half of the packing.
    #[must_use]
    #[inline]
    pub(crate) const fn index(self) -> u32 {
        (self.0 & 0xFFFF_FFFF) as u32
    }

    /// Generation half of the packing.
    #[must_use]
    #[inline]
    pub(crate) const fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Raw packed value, for logs and diagnostics only.
    #[must_use]
    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl Default for Address {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "Address(null)")
        } else {
            write!(f, "Address({}v{})", self.index(), self.generation())
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "null")
        } else {
            write!(f, "{}v{}", self.index(), self.generation())
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
