//! # Message Envelope
//!
//! Every interaction between actors is a [`Message`]: a kind tag, a small
//! inline payload, and a request/response correlation pair.
//!
//! ## Correlation
//!
//! A sender that expects a reply stamps a non-zero `request_id`; the
//! responder copies that value into the reply's `response_id`. Zero means
//! "no reply expected" / "not a reply". Receivers match `response_id`
//! against their one in-flight request and drop anything stale.
//!
//! ## Payload
//!
//! Payloads are plain-old-data structs copied into a fixed 64-byte inline
//! buffer, so a `Message` is `Copy` and never allocates. Decoding against
//! the wrong struct type fails with a size mismatch instead of
//! misinterpreting bytes.

use core::fmt;

use bytemuck::Pod;

use crate::error::{ActorError, ActorResult};

/// Inline payload capacity in bytes. Every wire struct fits in this.
pub const MAX_PAYLOAD: usize = 64;

/// Discriminates what a message means. The payload struct for each kind is
/// documented in [`crate::payload`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageKind {
    /// Scheduler heartbeat. Broadcast from the null address every tick.
    Metronome = 1,
    /// Ask a map keeper to commit a single step. Expects a reply.
    TryMove,
    /// Keeper reply: the step was committed.
    MoveOk,
    /// Keeper reply: the step was rejected. No state changed.
    MoveError,
    /// Ask an entity where it is. Expects a reply.
    QueryLocation,
    /// Reply carrying the responder's current location and facing.
    Location,
    /// Visible action broadcast (stand, move, attack swing, die animation).
    Action,
    /// A strike landing on the receiver.
    Attack,
    /// Health change announcement, relayed to viewers by the keeper.
    UpdateHp,
    /// Corpse fade notification. Vacates occupancy on the keeper.
    DeadFadeOut,
    /// Silent occupancy vacate when an entity leaves a map.
    Leave,
    /// Ask the world service to relocate an entity to another map.
    MapSwitch,
    /// Destination keeper reply: arrival committed.
    MapSwitchOk,
    /// Reply: the map switch was rejected.
    MapSwitchError,
    /// Bind a network session to a player actor.
    BindSession,
    /// A session-originated command for a player (move, attack, switch map).
    ClientCommand,
}

/// Fixed-capacity inline payload buffer.
#[derive(Clone, Copy)]
pub struct Payload {
    len: u8,
    bytes: [u8; MAX_PAYLOAD],
}

impl Payload {
    /// The zero-length payload.
    pub const EMPTY: Self = Self {
        len: 0,
        bytes: [0; MAX_PAYLOAD],
    };

    /// Copies a plain-old-data struct into an inline payload.
    ///
    /// # Errors
    ///
    /// [`ActorError::PayloadTooLarge`] if the struct exceeds
    /// [`MAX_PAYLOAD`] bytes.
    pub fn encode<T: Pod>(value: &T) -> ActorResult<Self> {
        let raw = bytemuck::bytes_of(value);
        if raw.len() > MAX_PAYLOAD {
            return Err(ActorError::PayloadTooLarge {
                size: raw.len(),
                max: MAX_PAYLOAD,
            });
        }
        let mut bytes = [0_u8; MAX_PAYLOAD];
        bytes[..raw.len()].copy_from_slice(raw);
        Ok(Self {
            len: raw.len() as u8,
            bytes,
        })
    }

    /// Reads the payload back as a plain-old-data struct.
    ///
    /// # Errors
    ///
    /// [`ActorError::PayloadSizeMismatch`] if the carried length does not
    /// equal the size of `T`. This is the guard against decoding a message
    /// with the wrong struct.
    pub fn decode<T: Pod>(&self) -> ActorResult<T> {
        let want = core::mem::size_of::<T>();
        let got = self.len as usize;
        if want != got {
            return Err(ActorError::PayloadSizeMismatch {
                expected: want,
                got,
            });
        }
        Ok(bytemuck::pod_read_unaligned(&self.bytes[..got]))
    }

    /// Number of payload bytes carried.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// Returns `true` when no payload is carried.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for Payload {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Payload({} bytes)", self.len)
    }
}

/// One unit of actor communication.
#[derive(Clone, Copy, Debug)]
pub struct Message {
    /// What this message means.
    pub kind: MessageKind,
    /// Non-zero when the sender expects exactly one reply.
    pub request_id: u32,
    /// Non-zero when this message is a reply; carries the request it
    /// answers.
    pub response_id: u32,
    /// Kind-specific payload bytes.
    pub payload: Payload,
}

impl Message {
    /// A message with no payload and no correlation.
    #[must_use]
    pub fn bare(kind: MessageKind) -> Self {
        Self {
            kind,
            request_id: 0,
            response_id: 0,
            payload: Payload::EMPTY,
        }
    }

    /// A message carrying an encoded payload struct.
    ///
    /// # Errors
    ///
    /// Propagates [`ActorError::PayloadTooLarge`] from the encoder.
    pub fn with_payload<T: Pod>(kind: MessageKind, value: &T) -> ActorResult<Self> {
        Ok(Self {
            kind,
            request_id: 0,
            response_id: 0,
            payload: Payload::encode(value)?,
        })
    }

    /// Marks this message as expecting one reply correlated by
    /// `request_id`. Zero would mean "no reply"; callers allocate ids from
    /// a counter that skips zero.
    #[must_use]
    pub fn expecting_reply(mut self, request_id: u32) -> Self {
        self.request_id = request_id;
        self
    }

    /// Marks this message as the reply to `response_id`.
    #[must_use]
    pub fn replying_to(mut self, response_id: u32) -> Self {
        self.response_id = response_id;
        self
    }
}

// =============================================================================
// TESTS
// =============================================================================
