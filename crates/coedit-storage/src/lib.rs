//! Coedit Storage Backends
//!
//! Provides pluggable persistence for document records:
//! - Memory (default): Fast, volatile storage
//! - SQLite: Embedded persistence
//!
//! The store owns all durable state; the session core never caches
//! content beyond the lifetime of a single load or save call. Saves are
//! unconditional overwrites - last writer wins, with no concurrency
//! check, matching the relay's lack of ordering guarantees.

pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

use async_trait::async_trait;
use coedit_core::{Document, DocumentId, DocumentMeta};

/// Document store trait
///
/// `create`, `list`, and `load` are also the only touch points exposed
/// to the CRUD layer; they carry no session semantics.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Allocate a new document with empty content and the given title
    async fn create(&self, title: &str) -> Result<Document, StoreError>;

    /// Load a document record; `Ok(None)` when the ID does not exist
    async fn load(&self, id: &DocumentId) -> Result<Option<Document>, StoreError>;

    /// Overwrite a document's content and refresh its timestamp.
    ///
    /// Fails with `NotFound` when the ID does not exist; save never
    /// creates a document.
    async fn save(&self, id: &DocumentId, content: &str) -> Result<(), StoreError>;

    /// List all document records, content omitted
    async fn list(&self) -> Result<Vec<DocumentMeta>, StoreError>;
}

/// Store error types
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub use memory::MemoryStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;
