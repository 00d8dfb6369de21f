//! Change Relay - fan-out of edit deltas to session members
//!
//! Deltas are opaque payloads produced by the client's editing surface.
//! The relay rebroadcasts them verbatim to every other member of the
//! document's session; it attaches no ordering metadata and keeps no
//! copy. Per-sender FIFO falls out of each connection handling its
//! inbound events sequentially and each recipient draining a FIFO
//! queue.

use crate::document::DocumentId;
use crate::session::{ParticipantId, SessionRegistry};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// An opaque incremental change payload, meaningful only to the client
/// application. Relayed verbatim, never parsed or validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Delta(pub serde_json::Value);

impl Delta {
    pub fn into_inner(self) -> serde_json::Value {
        self.0
    }
}

impl From<serde_json::Value> for Delta {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

/// Delivers deltas to every session member except the sender.
///
/// Delivery is fire-and-forget: a recipient whose channel is closed or
/// backed up never fails the sender and never blocks other recipients.
#[derive(Clone)]
pub struct ChangeRelay {
    registry: Arc<SessionRegistry>,
}

impl ChangeRelay {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry }
    }

    /// Relay a delta to the other members of a document's session.
    ///
    /// Returns the number of recipients the delta was queued for.
    pub fn relay(&self, document_id: &DocumentId, sender: &ParticipantId, delta: Delta) -> usize {
        let targets = self.registry.broadcast_targets(document_id, sender);
        let mut delivered = 0;

        for (recipient, tx) in targets {
            // A send failure means the recipient's channel already
            // closed; its disconnect cleanup will drop the membership.
            if tx.send(delta.clone()).is_ok() {
                delivered += 1;
            } else {
                debug!(
                    doc = %document_id,
                    recipient = %recipient,
                    "Dropped delta for closed channel"
                );
            }
        }

        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::ParticipantHandle;
    use serde_json::json;

    fn setup() -> (Arc<SessionRegistry>, ChangeRelay, DocumentId) {
        let registry = Arc::new(SessionRegistry::new());
        let relay = ChangeRelay::new(registry.clone());
        (registry, relay, DocumentId::generate())
    }

    #[test]
    fn test_relay_excludes_sender() {
        let (registry, relay, doc) = setup();
        let (alice, mut rx_a) = ParticipantHandle::channel(ParticipantId::new("alice"));
        let (bob, mut rx_b) = ParticipantHandle::channel(ParticipantId::new("bob"));

        registry.join(&doc, &alice);
        registry.join(&doc, &bob);

        let delivered = relay.relay(&doc, alice.id(), Delta(json!({"insert": "hi"})));

        assert_eq!(delivered, 1);
        assert_eq!(rx_b.try_recv().unwrap(), Delta(json!({"insert": "hi"})));
        assert!(rx_a.try_recv().is_err());
    }

    #[test]
    fn test_per_sender_fifo() {
        let (registry, relay, doc) = setup();
        let (alice, _rx_a) = ParticipantHandle::channel(ParticipantId::new("alice"));
        let (bob, mut rx_b) = ParticipantHandle::channel(ParticipantId::new("bob"));

        registry.join(&doc, &alice);
        registry.join(&doc, &bob);

        relay.relay(&doc, alice.id(), Delta(json!({"seq": 1})));
        relay.relay(&doc, alice.id(), Delta(json!({"seq": 2})));
        relay.relay(&doc, alice.id(), Delta(json!({"seq": 3})));

        assert_eq!(rx_b.try_recv().unwrap(), Delta(json!({"seq": 1})));
        assert_eq!(rx_b.try_recv().unwrap(), Delta(json!({"seq": 2})));
        assert_eq!(rx_b.try_recv().unwrap(), Delta(json!({"seq": 3})));
    }

    #[test]
    fn test_closed_recipient_does_not_affect_others() {
        let (registry, relay, doc) = setup();
        let (alice, _rx_a) = ParticipantHandle::channel(ParticipantId::new("alice"));
        let (bob, rx_b) = ParticipantHandle::channel(ParticipantId::new("bob"));
        let (carol, mut rx_c) = ParticipantHandle::channel(ParticipantId::new("carol"));

        registry.join(&doc, &alice);
        registry.join(&doc, &bob);
        registry.join(&doc, &carol);

        // Bob's receiving end is gone, as if his task already exited
        drop(rx_b);

        let delivered = relay.relay(&doc, alice.id(), Delta(json!("x")));

        assert_eq!(delivered, 1);
        assert_eq!(rx_c.try_recv().unwrap(), Delta(json!("x")));
    }

    #[test]
    fn test_relay_to_empty_session() {
        let (_registry, relay, doc) = setup();

        let delivered = relay.relay(&doc, &ParticipantId::new("alice"), Delta(json!("x")));
        assert_eq!(delivered, 0);
    }

    #[test]
    fn test_relay_from_non_member_still_delivers() {
        // A sender that never joined is simply not in the membership
        // set; members still receive its deltas.
        let (registry, relay, doc) = setup();
        let (bob, mut rx_b) = ParticipantHandle::channel(ParticipantId::new("bob"));

        registry.join(&doc, &bob);

        let delivered = relay.relay(&doc, &ParticipantId::new("ghost"), Delta(json!("x")));

        assert_eq!(delivered, 1);
        assert_eq!(rx_b.try_recv().unwrap(), Delta(json!("x")));
    }
}
