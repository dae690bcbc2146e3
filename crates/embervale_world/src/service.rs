//! # World service
//!
//! The one cross-map broker. A map switch cannot be answered by either
//! keeper alone: the mover's keeper does not know the destination grid,
//! and the destination keeper does not know the mover exists yet. The
//! service holds the atlas and relays each switch request to the
//! destination keeper with the original sender and correlation id
//! preserved, so the keeper's grant flows straight back to the switcher
//! without a return hop through here.

use std::sync::Arc;

use tracing::{debug, warn};

use embervale_actor::{Actor, ActorContext, AmMapSwitch, Envelope, Message, MessageKind};

use crate::error::WorldError;
use crate::terrain::MapAtlas;

/// The actor that brokers cross-map traffic.
pub struct WorldService {
    uid: u64,
    atlas: Arc<MapAtlas>,
}

impl WorldService {
    /// Builds the service over the shared atlas.
    #[must_use]
    pub fn new(uid: u64, atlas: Arc<MapAtlas>) -> Self {
        Self { uid, atlas }
    }

    fn route_switch(&self, envelope: &Envelope, ctx: &ActorContext<'_, Self>) {
        if envelope.from.is_null() {
            return;
        }
        let Ok(am) = envelope.message.payload.decode::<AmMapSwitch>() else {
            warn!(service = self.uid, "malformed map switch dropped");
            return;
        };
        let Some(entry) = self.atlas.entry(am.map_id) else {
            debug!(
                service = self.uid,
                uid = am.uid,
                map_id = am.map_id,
                "switch to unknown map refused"
            );
            ctx.forward(
                Message::bare(MessageKind::MapSwitchError).replying_to(envelope.message.request_id),
                envelope.from,
            );
            return;
        };
        // Relay the request as-is, with the switcher still the sender.
        ctx.router.forward(envelope.message, entry.keeper_addr, envelope.from);
    }
}

impl Actor for WorldService {
    type Error = WorldError;

    fn uid(&self) -> u64 {
        self.uid
    }

    fn operate(&mut self, envelope: Envelope, ctx: &mut ActorContext<'_, Self>) {
        match envelope.message.kind {
            MessageKind::Metronome => {}
            MessageKind::MapSwitch => self.route_switch(&envelope, ctx),
            other => {
                warn!(service = self.uid, kind = ?other, "message not for the service");
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
