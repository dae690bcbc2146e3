//! # Actor Substrate Errors
//!
//! Errors raised by the messaging layer itself: payload codec failures and
//! identity registration conflicts. Delivery failures are deliberately NOT
//! errors - a send to a dead address is dropped and counted, because by the
//! time the sender learns about it the receiver may be gone anyway.

use thiserror::Error;

/// Result alias for actor substrate operations.
pub type ActorResult<T> = Result<T, ActorError>;

/// Errors produced by the actor substrate.
#[derive(Debug, Error)]
pub enum ActorError {
    /// A payload struct does not fit the fixed inline buffer.
    #[error("payload of {size} bytes exceeds inline buffer of {max} bytes")]
    PayloadTooLarge {
        /// Size of the rejected payload in bytes.
        size: usize,
        /// Inline buffer capacity in bytes.
        max: usize,
    },

    /// A payload decoded against the wrong struct type.
    #[error("payload size mismatch: expected {expected} bytes, got {got}")]
    PayloadSizeMismatch {
        /// Byte size of the requested struct type.
        expected: usize,
        /// Byte size actually carried by the message.
        got: usize,
    },

    /// Two actors tried to register the same identity.
    #[error("uid {uid} is already registered in the directory")]
    DuplicateUid {
        /// The contested identity.
        uid: u64,
    },
}
