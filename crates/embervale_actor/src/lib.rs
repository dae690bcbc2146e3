//! # EMBERVALE Actor Substrate
//!
//! Mailbox-based actor runtime for the world server. Every living entity
//! (player, monster, map keeper, world service) owns exactly one actor:
//! private state, an inbound mailbox, and a cooperative scheduling slot.
//!
//! ## Architecture
//!
//! ```text
//!   sender                router                 receiver pod
//!   ------                ------                 ------------
//!   forward(msg, to) ---> slot[to.index]   +---> hooks phase
//!                         generation check |     delayed commands
//!                         try_send --------+     mailbox drain
//!                                                (one thread at a time)
//! ```
//!
//! Delivery is fire-and-forget: a send to a sealed or missing address is
//! dropped, counted, and logged, never an error at the send site. Replies
//! are correlated by `request_id` / `response_id` pairs carried on every
//! [`Message`].
//!
//! ## Scheduling
//!
//! [`ActorPod`] runs one tick in three phases: named state hooks, due
//! delayed commands, then a mailbox drain. All mutation of the entity
//! happens inside its own tick, which is what makes actor state lock-free.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod address;
pub mod clock;
pub mod context;
pub mod delay;
pub mod directory;
pub mod error;
pub mod hooks;
pub mod message;
pub mod payload;
pub mod pod;
pub mod router;

pub use address::Address;
pub use clock::{Clock, SimClock, SystemClock};
pub use context::{Actor, ActorContext};
pub use delay::{Command, DelayQueue};
pub use directory::{DisposalQueue, DisposalSender, UidDirectory, UidRecord};
pub use error::{ActorError, ActorResult};
pub use hooks::HookSet;
pub use message::{Message, MessageKind, Payload, MAX_PAYLOAD};
pub use payload::{
    AmAction, AmAttack, AmBindSession, AmClientCommand, AmDeadFadeOut, AmLeave, AmLocation,
    AmMapSwitch, AmMapSwitchOk, AmMoveOk, AmQueryLocation, AmTryMove, AmUpdateHp,
};
pub use pod::{ActorPod, RunPod, RuntimeShared, TickWork};
pub use router::{Envelope, Router};
