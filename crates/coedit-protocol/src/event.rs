//! Client event decoding

use crate::error::{ProtocolError, ProtocolResult};
use coedit_core::{Delta, DocumentId};
use serde_json::{json, Value};

/// Maximum frame size (1MB)
pub const MAX_FRAME_SIZE: usize = 1024 * 1024;

/// A decoded client->server event
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// join-document: enter a document's session and request its content
    Join { document_id: DocumentId },

    /// send-changes: relay an opaque edit delta to the session
    Change { document_id: DocumentId, delta: Delta },

    /// save-document: persist the authoritative content snapshot
    Save {
        document_id: DocumentId,
        content: String,
    },
}

impl ClientEvent {
    /// Decode one text frame.
    ///
    /// Malformed frames are rejected here, before anything reaches the
    /// store or the relay.
    pub fn decode(frame: &str) -> ProtocolResult<Self> {
        if frame.len() > MAX_FRAME_SIZE {
            return Err(ProtocolError::FrameTooLarge {
                size: frame.len(),
                max: MAX_FRAME_SIZE,
            });
        }

        let value: Value =
            serde_json::from_str(frame).map_err(|e| ProtocolError::InvalidJson(e.to_string()))?;

        let event = value
            .get("event")
            .and_then(Value::as_str)
            .ok_or_else(|| ProtocolError::MissingField("event".into()))?;

        match event {
            "join-document" => Ok(ClientEvent::Join {
                document_id: require_document_id(&value)?,
            }),
            "send-changes" => Ok(ClientEvent::Change {
                document_id: require_document_id(&value)?,
                delta: Delta(require_field(&value, "delta")?.clone()),
            }),
            "save-document" => Ok(ClientEvent::Save {
                document_id: require_document_id(&value)?,
                content: require_str(&value, "content")?.to_string(),
            }),
            other => Err(ProtocolError::UnknownEvent(other.to_string())),
        }
    }

    /// Encode the event as a text frame (client side and tests)
    pub fn encode(&self) -> String {
        match self {
            ClientEvent::Join { document_id } => json!({
                "event": "join-document",
                "documentId": document_id.as_str(),
            }),
            ClientEvent::Change { document_id, delta } => json!({
                "event": "send-changes",
                "documentId": document_id.as_str(),
                "delta": delta.0,
            }),
            ClientEvent::Save {
                document_id,
                content,
            } => json!({
                "event": "save-document",
                "documentId": document_id.as_str(),
                "content": content,
            }),
        }
        .to_string()
    }
}

fn require_field<'a>(value: &'a Value, field: &str) -> ProtocolResult<&'a Value> {
    value
        .get(field)
        .ok_or_else(|| ProtocolError::MissingField(field.into()))
}

fn require_str<'a>(value: &'a Value, field: &str) -> ProtocolResult<&'a str> {
    require_field(value, field)?
        .as_str()
        .ok_or_else(|| ProtocolError::InvalidField {
            field: field.into(),
            reason: "expected a string".into(),
        })
}

fn require_document_id(value: &Value) -> ProtocolResult<DocumentId> {
    let raw = require_str(value, "documentId")?;
    DocumentId::new(raw).map_err(|e| ProtocolError::InvalidField {
        field: "documentId".into(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_join() {
        let event = ClientEvent::decode(r#"{"event":"join-document","documentId":"doc-1"}"#);
        assert_eq!(
            event.unwrap(),
            ClientEvent::Join {
                document_id: DocumentId::new("doc-1").unwrap()
            }
        );
    }

    #[test]
    fn test_decode_change() {
        let frame = r#"{"event":"send-changes","documentId":"doc-1","delta":{"insert":"hi"}}"#;
        let event = ClientEvent::decode(frame).unwrap();
        assert_eq!(
            event,
            ClientEvent::Change {
                document_id: DocumentId::new("doc-1").unwrap(),
                delta: Delta(json!({"insert": "hi"})),
            }
        );
    }

    #[test]
    fn test_decode_save() {
        let frame = r#"{"event":"save-document","documentId":"doc-1","content":"hi"}"#;
        let event = ClientEvent::decode(frame).unwrap();
        assert_eq!(
            event,
            ClientEvent::Save {
                document_id: DocumentId::new("doc-1").unwrap(),
                content: "hi".into(),
            }
        );
    }

    #[test]
    fn test_decode_unknown_event() {
        let err = ClientEvent::decode(r#"{"event":"self-destruct"}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownEvent(_)));
        assert_eq!(err.code(), "UNKNOWN_EVENT");
    }

    #[test]
    fn test_decode_missing_field() {
        let err = ClientEvent::decode(r#"{"event":"send-changes","documentId":"doc-1"}"#)
            .unwrap_err();
        assert!(matches!(err, ProtocolError::MissingField(ref f) if f == "delta"));
        assert_eq!(err.code(), "MALFORMED_INPUT");
    }

    #[test]
    fn test_decode_invalid_document_id() {
        let err =
            ClientEvent::decode(r#"{"event":"join-document","documentId":"no/slashes"}"#)
                .unwrap_err();
        assert_eq!(err.code(), "MALFORMED_INPUT");
    }

    #[test]
    fn test_decode_invalid_json() {
        let err = ClientEvent::decode("not json").unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidJson(_)));
    }

    #[test]
    fn test_decode_oversized_frame() {
        let frame = format!(
            r#"{{"event":"save-document","documentId":"doc-1","content":"{}"}}"#,
            "x".repeat(MAX_FRAME_SIZE)
        );
        let err = ClientEvent::decode(&frame).unwrap_err();
        assert!(matches!(err, ProtocolError::FrameTooLarge { .. }));
    }

    #[test]
    fn test_encode_decode() {
        let event = ClientEvent::Change {
            document_id: DocumentId::new("doc-1").unwrap(),
            delta: Delta(json!({"retain": 3, "insert": "x"})),
        };
        assert_eq!(ClientEvent::decode(&event.encode()).unwrap(), event);
    }
}
