//! Connection lifecycle handler
//!
//! Drives one client channel through its states: connected, in session,
//! closed. Each inbound event is handled to completion before the next
//! frame of the same connection is read, which is what gives relayed
//! deltas their per-sender FIFO order.

use std::sync::Arc;
use tracing::{debug, warn};

use coedit_core::{ChangeRelay, Delta, DocumentId, ParticipantHandle, ParticipantId, SessionRegistry};
use coedit_protocol::{ClientEvent, ServerEvent};
use coedit_storage::{DocumentStore, StoreError};

/// Handles the events of a single client connection
pub struct ConnectionHandler {
    participant: ParticipantHandle,
    registry: Arc<SessionRegistry>,
    relay: ChangeRelay,
    store: Arc<dyn DocumentStore>,
}

impl ConnectionHandler {
    pub fn new(
        participant: ParticipantHandle,
        registry: Arc<SessionRegistry>,
        store: Arc<dyn DocumentStore>,
    ) -> Self {
        let relay = ChangeRelay::new(registry.clone());
        Self {
            participant,
            registry,
            relay,
            store,
        }
    }

    pub fn participant_id(&self) -> &ParticipantId {
        self.participant.id()
    }

    /// Decode and handle one inbound text frame.
    ///
    /// Returns the reply to push to this client, if any. Errors are
    /// always addressed to this client alone.
    pub async fn process(&self, frame: &str) -> Option<ServerEvent> {
        match ClientEvent::decode(frame) {
            Ok(event) => self.handle_event(event).await,
            Err(e) => {
                debug!(client = %self.participant.id(), error = %e, "Rejected frame");
                Some(ServerEvent::rejected(&e))
            }
        }
    }

    /// Handle one decoded client event
    pub async fn handle_event(&self, event: ClientEvent) -> Option<ServerEvent> {
        match event {
            ClientEvent::Join { document_id } => self.handle_join(document_id).await,
            ClientEvent::Change { document_id, delta } => {
                self.handle_change(document_id, delta);
                None
            }
            ClientEvent::Save {
                document_id,
                content,
            } => self.handle_save(document_id, &content).await,
        }
    }

    /// join: register membership, then push the content to this client.
    ///
    /// A join for an identifier the store does not know is a silent
    /// no-op: membership is still registered and no load-document is
    /// emitted. Known gap, preserved from the original behavior.
    async fn handle_join(&self, document_id: DocumentId) -> Option<ServerEvent> {
        self.registry.join(&document_id, &self.participant);

        match self.store.load(&document_id).await {
            Ok(Some(document)) => {
                debug!(
                    client = %self.participant.id(),
                    doc = %document_id,
                    "Joined session"
                );
                Some(ServerEvent::load_document(document.content))
            }
            Ok(None) => {
                debug!(
                    client = %self.participant.id(),
                    doc = %document_id,
                    "Join for unknown document"
                );
                None
            }
            Err(e) => {
                warn!(
                    client = %self.participant.id(),
                    doc = %document_id,
                    error = %e,
                    "Load failed on join"
                );
                Some(ServerEvent::store_unavailable(e))
            }
        }
    }

    /// change: fan the delta out to the rest of the session
    fn handle_change(&self, document_id: DocumentId, delta: Delta) {
        let delivered = self
            .relay
            .relay(&document_id, self.participant.id(), delta);
        debug!(
            client = %self.participant.id(),
            doc = %document_id,
            delivered = delivered,
            "Relayed change"
        );
    }

    /// save: write through to the store; no success acknowledgement
    async fn handle_save(&self, document_id: DocumentId, content: &str) -> Option<ServerEvent> {
        match self.store.save(&document_id, content).await {
            Ok(()) => None,
            Err(StoreError::NotFound(_)) => Some(ServerEvent::not_found(&document_id)),
            Err(e) => {
                warn!(
                    client = %self.participant.id(),
                    doc = %document_id,
                    error = %e,
                    "Save failed"
                );
                Some(ServerEvent::store_unavailable(e))
            }
        }
    }

    /// Clean up when the connection closes.
    ///
    /// Unconditional and idempotent; touches only the session registry,
    /// never the store, so it cannot fail even with the backend down.
    pub fn cleanup(&self) {
        self.registry.leave(self.participant.id());
    }
}
