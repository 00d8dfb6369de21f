//! Server event encoding

use crate::error::{ProtocolError, ProtocolResult};
use coedit_core::{Delta, DocumentId};
use serde_json::{json, Value};

/// A server->client event
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    /// load-document: the document content pushed to a joining client
    LoadDocument { content: String },

    /// receive-changes: a relayed delta from another session member
    ReceiveChanges { delta: Delta },

    /// error: surfaced to the requesting client only, never broadcast
    Error { code: String, message: String },
}

impl ServerEvent {
    pub fn load_document(content: impl Into<String>) -> Self {
        ServerEvent::LoadDocument {
            content: content.into(),
        }
    }

    pub fn receive_changes(delta: Delta) -> Self {
        ServerEvent::ReceiveChanges { delta }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        ServerEvent::Error {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn not_found(id: &DocumentId) -> Self {
        Self::error("NOT_FOUND", format!("Document not found: {}", id))
    }

    pub fn store_unavailable(message: impl std::fmt::Display) -> Self {
        Self::error("STORE_UNAVAILABLE", message.to_string())
    }

    pub fn rejected(err: &ProtocolError) -> Self {
        Self::error(err.code(), err.to_string())
    }

    /// Encode the event as a text frame
    pub fn encode(&self) -> String {
        match self {
            ServerEvent::LoadDocument { content } => json!({
                "event": "load-document",
                "content": content,
            }),
            ServerEvent::ReceiveChanges { delta } => json!({
                "event": "receive-changes",
                "delta": delta.0,
            }),
            ServerEvent::Error { code, message } => json!({
                "event": "error",
                "code": code,
                "message": message,
            }),
        }
        .to_string()
    }

    /// Decode one text frame (client side and tests)
    pub fn decode(frame: &str) -> ProtocolResult<Self> {
        let value: Value =
            serde_json::from_str(frame).map_err(|e| ProtocolError::InvalidJson(e.to_string()))?;

        let event = value
            .get("event")
            .and_then(Value::as_str)
            .ok_or_else(|| ProtocolError::MissingField("event".into()))?;

        match event {
            "load-document" => {
                let content = value
                    .get("content")
                    .and_then(Value::as_str)
                    .ok_or_else(|| ProtocolError::MissingField("content".into()))?;
                Ok(ServerEvent::load_document(content))
            }
            "receive-changes" => {
                let delta = value
                    .get("delta")
                    .cloned()
                    .ok_or_else(|| ProtocolError::MissingField("delta".into()))?;
                Ok(ServerEvent::receive_changes(Delta(delta)))
            }
            "error" => {
                let code = value
                    .get("code")
                    .and_then(Value::as_str)
                    .ok_or_else(|| ProtocolError::MissingField("code".into()))?;
                let message = value
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                Ok(ServerEvent::error(code, message))
            }
            other => Err(ProtocolError::UnknownEvent(other.to_string())),
        }
    }
}
