//! Session Registry - per-document membership tracking
//!
//! A session is the set of live connections currently editing one
//! document. Sessions are created implicitly on first join and never
//! explicitly destroyed; an empty membership set is harmless.

use crate::document::DocumentId;
use crate::relay::Delta;
use dashmap::DashMap;
use std::collections::HashMap;
use tokio::sync::mpsc;

/// Opaque identifier for one live connection
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParticipantId(String);

impl ParticipantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sending half of a participant's delta queue
pub type DeltaSender = mpsc::UnboundedSender<Delta>;
/// Receiving half of a participant's delta queue, owned by the transport
pub type DeltaReceiver = mpsc::UnboundedReceiver<Delta>;

/// A live connection as seen by the session core: an identifier plus
/// the queue that relayed deltas are delivered on.
///
/// Owned by the connection's lifecycle handler; the registry keeps only
/// a clone of the sender.
#[derive(Debug, Clone)]
pub struct ParticipantHandle {
    id: ParticipantId,
    sender: DeltaSender,
}

impl ParticipantHandle {
    pub fn new(id: ParticipantId, sender: DeltaSender) -> Self {
        Self { id, sender }
    }

    /// Create a handle together with the receiving end of its delta queue
    pub fn channel(id: ParticipantId) -> (Self, DeltaReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(id, tx), rx)
    }

    pub fn id(&self) -> &ParticipantId {
        &self.id
    }

    pub fn sender(&self) -> &DeltaSender {
        &self.sender
    }
}

/// Process-wide map from document ID to session membership
///
/// Constructed once per process (or per test) and passed around as an
/// owned service. The sharded map gives mutual exclusion between
/// mutation and snapshot for the same document while leaving different
/// documents free to proceed in parallel.
pub struct SessionRegistry {
    sessions: DashMap<DocumentId, HashMap<ParticipantId, DeltaSender>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// Add a participant to a document's session; idempotent.
    ///
    /// Joining a second document does not leave the first - membership
    /// is additive until the participant disconnects.
    pub fn join(&self, document_id: &DocumentId, participant: &ParticipantHandle) {
        self.sessions
            .entry(document_id.clone())
            .or_default()
            .insert(participant.id().clone(), participant.sender().clone());
    }

    /// Remove a participant from every session that contains it.
    ///
    /// No-op for unknown participants; must be called exactly once per
    /// connection close, but calling it again changes nothing.
    pub fn leave(&self, participant: &ParticipantId) {
        for mut entry in self.sessions.iter_mut() {
            entry.value_mut().remove(participant);
        }
    }

    /// Snapshot of a document's membership minus the excluded participant.
    ///
    /// Reflects membership at call time; joins and leaves racing with
    /// delivery are not transactional with it.
    pub fn broadcast_targets(
        &self,
        document_id: &DocumentId,
        excluding: &ParticipantId,
    ) -> Vec<(ParticipantId, DeltaSender)> {
        match self.sessions.get(document_id) {
            Some(members) => members
                .iter()
                .filter(|(id, _)| *id != excluding)
                .map(|(id, tx)| (id.clone(), tx.clone()))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Whether a participant is currently a member of a document's session
    pub fn is_member(&self, document_id: &DocumentId, participant: &ParticipantId) -> bool {
        self.sessions
            .get(document_id)
            .map(|members| members.contains_key(participant))
            .unwrap_or(false)
    }

    /// Number of participants currently in a document's session
    pub fn member_count(&self, document_id: &DocumentId) -> usize {
        self.sessions
            .get(document_id)
            .map(|members| members.len())
            .unwrap_or(0)
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn participant(id: &str) -> (ParticipantHandle, DeltaReceiver) {
        ParticipantHandle::channel(ParticipantId::new(id))
    }

    #[test]
    fn test_join_and_targets() {
        let registry = SessionRegistry::new();
        let doc = DocumentId::generate();
        let (alice, _rx_a) = participant("alice");
        let (bob, _rx_b) = participant("bob");

        registry.join(&doc, &alice);
        registry.join(&doc, &bob);

        let targets = registry.broadcast_targets(&doc, alice.id());
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].0, *bob.id());
    }

    #[test]
    fn test_targets_never_include_excluded() {
        let registry = SessionRegistry::new();
        let doc = DocumentId::generate();
        let (alice, _rx) = participant("alice");

        registry.join(&doc, &alice);

        assert!(registry.broadcast_targets(&doc, alice.id()).is_empty());
    }

    #[test]
    fn test_join_idempotent() {
        let registry = SessionRegistry::new();
        let doc = DocumentId::generate();
        let (alice, _rx) = participant("alice");

        registry.join(&doc, &alice);
        registry.join(&doc, &alice);

        assert_eq!(registry.member_count(&doc), 1);
    }

    #[test]
    fn test_leave_idempotent() {
        let registry = SessionRegistry::new();
        let doc = DocumentId::generate();
        let (alice, _rx) = participant("alice");

        registry.join(&doc, &alice);
        registry.leave(alice.id());
        registry.leave(alice.id());

        assert_eq!(registry.member_count(&doc), 0);
    }

    #[test]
    fn test_leave_unknown_participant_is_noop() {
        let registry = SessionRegistry::new();
        let doc = DocumentId::generate();
        let (alice, _rx) = participant("alice");

        registry.join(&doc, &alice);
        registry.leave(&ParticipantId::new("nobody"));

        assert!(registry.is_member(&doc, alice.id()));
    }

    #[test]
    fn test_rejoin_keeps_prior_membership() {
        let registry = SessionRegistry::new();
        let doc_a = DocumentId::generate();
        let doc_b = DocumentId::generate();
        let (alice, _rx) = participant("alice");

        registry.join(&doc_a, &alice);
        registry.join(&doc_b, &alice);

        // A connection can belong to multiple sessions until disconnect
        assert!(registry.is_member(&doc_a, alice.id()));
        assert!(registry.is_member(&doc_b, alice.id()));

        registry.leave(alice.id());
        assert!(!registry.is_member(&doc_a, alice.id()));
        assert!(!registry.is_member(&doc_b, alice.id()));
    }

    #[test]
    fn test_unknown_document_has_no_targets() {
        let registry = SessionRegistry::new();
        let doc = DocumentId::generate();

        assert!(registry
            .broadcast_targets(&doc, &ParticipantId::new("alice"))
            .is_empty());
        assert_eq!(registry.member_count(&doc), 0);
    }
}
