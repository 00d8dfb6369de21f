//! Document records and identifiers

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Document identifier - UTF-8 string, max 128 bytes
///
/// Assigned by the document store on creation; opaque to the session core.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(String);

impl DocumentId {
    /// Create a document ID from an existing string, validating the format
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();

        if id.is_empty() {
            return Err(Error::InvalidDocumentId("Document ID cannot be empty".into()));
        }

        if id.len() > 128 {
            return Err(Error::InvalidDocumentId("Document ID exceeds 128 bytes".into()));
        }

        // Validate pattern: [a-zA-Z0-9:_-]+
        if !id.chars().all(|c| c.is_ascii_alphanumeric() || c == ':' || c == '_' || c == '-') {
            return Err(Error::InvalidDocumentId(
                "Document ID must match pattern [a-zA-Z0-9:_-]+".into(),
            ));
        }

        Ok(Self(id))
    }

    /// Mint a fresh random identifier (used by stores on create)
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Current wall-clock time in milliseconds since the Unix epoch
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// A full document record as held by the store
///
/// The session core never keeps a canonical copy of this; it is a
/// pass-through between the store and the client channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: DocumentId,
    pub title: String,
    /// Opaque text blob; the core does not interpret it
    pub content: String,
    pub last_modified: u64,
}

impl Document {
    /// Create a new empty document with a freshly minted ID
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: DocumentId::generate(),
            title: title.into(),
            content: String::new(),
            last_modified: now_ms(),
        }
    }

    /// The content-free record returned by list operations
    pub fn meta(&self) -> DocumentMeta {
        DocumentMeta {
            id: self.id.clone(),
            title: self.title.clone(),
            last_modified: self.last_modified,
        }
    }
}

/// Document metadata (identifier, title, timestamp - no content)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMeta {
    pub id: DocumentId,
    pub title: String,
    pub last_modified: u64,
}
