//! In-memory storage backend

use crate::{DocumentStore, StoreError};
use async_trait::async_trait;
use coedit_core::{document::now_ms, Document, DocumentId, DocumentMeta};
use dashmap::DashMap;

/// In-memory document store
///
/// Fast, volatile storage suitable for development and testing.
/// Data is lost when the process exits.
pub struct MemoryStore {
    documents: DashMap<DocumentId, Document>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            documents: DashMap::new(),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn create(&self, title: &str) -> Result<Document, StoreError> {
        let doc = Document::new(title);
        self.documents.insert(doc.id.clone(), doc.clone());
        Ok(doc)
    }

    async fn load(&self, id: &DocumentId) -> Result<Option<Document>, StoreError> {
        Ok(self.documents.get(id).map(|entry| entry.value().clone()))
    }

    async fn save(&self, id: &DocumentId, content: &str) -> Result<(), StoreError> {
        match self.documents.get_mut(id) {
            Some(mut entry) => {
                let doc = entry.value_mut();
                doc.content = content.to_string();
                doc.last_modified = now_ms();
                Ok(())
            }
            None => Err(StoreError::NotFound(id.to_string())),
        }
    }

    async fn list(&self) -> Result<Vec<DocumentMeta>, StoreError> {
        Ok(self
            .documents
            .iter()
            .map(|entry| entry.value().meta())
            .collect())
    }
}
