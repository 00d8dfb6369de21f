//! SQLite storage backend

use crate::{DocumentStore, StoreError};
use async_trait::async_trait;
use coedit_core::{document::now_ms, Document, DocumentId, DocumentMeta};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;

/// SQLite document store
///
/// Embedded persistence suitable for single-node deployments.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a SQLite database at the given path
    pub fn new(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(db_err)?;

        let store = Self {
            conn: Mutex::new(conn),
        };

        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory SQLite database (for testing)
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(db_err)?;

        let store = Self {
            conn: Mutex::new(conn),
        };

        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        let conn = self.lock_conn();

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                content TEXT NOT NULL DEFAULT '',
                last_modified INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_documents_last_modified
                ON documents(last_modified);
            "#,
        )
        .map_err(db_err)?;

        Ok(())
    }

    fn lock_conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        // A poisoned lock means a prior panic mid-statement; the
        // connection itself is still usable.
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn create(&self, title: &str) -> Result<Document, StoreError> {
        let doc = Document::new(title);
        let conn = self.lock_conn();

        conn.execute(
            "INSERT INTO documents (id, title, content, last_modified) VALUES (?1, ?2, ?3, ?4)",
            params![
                doc.id.as_str(),
                doc.title,
                doc.content,
                doc.last_modified as i64
            ],
        )
        .map_err(db_err)?;

        Ok(doc)
    }

    async fn load(&self, id: &DocumentId) -> Result<Option<Document>, StoreError> {
        let conn = self.lock_conn();

        let row: Option<(String, String, i64)> = conn
            .query_row(
                "SELECT title, content, last_modified FROM documents WHERE id = ?1",
                params![id.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()
            .map_err(db_err)?;

        Ok(row.map(|(title, content, last_modified)| Document {
            id: id.clone(),
            title,
            content,
            last_modified: last_modified as u64,
        }))
    }

    async fn save(&self, id: &DocumentId, content: &str) -> Result<(), StoreError> {
        let conn = self.lock_conn();

        let affected = conn
            .execute(
                "UPDATE documents SET content = ?2, last_modified = ?3 WHERE id = ?1",
                params![id.as_str(), content, now_ms() as i64],
            )
            .map_err(db_err)?;

        if affected == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }

        Ok(())
    }

    async fn list(&self) -> Result<Vec<DocumentMeta>, StoreError> {
        let conn = self.lock_conn();

        let mut stmt = conn
            .prepare("SELECT id, title, last_modified FROM documents ORDER BY last_modified DESC")
            .map_err(db_err)?;

        let metas = stmt
            .query_map([], |row| {
                let id: String = row.get(0)?;
                let title: String = row.get(1)?;
                let last_modified: i64 = row.get(2)?;
                Ok((id, title, last_modified))
            })
            .map_err(db_err)?
            .filter_map(|r| r.ok())
            .filter_map(|(id, title, last_modified)| {
                Some(DocumentMeta {
                    id: DocumentId::new(id).ok()?,
                    title,
                    last_modified: last_modified as u64,
                })
            })
            .collect();

        Ok(metas)
    }
}

fn db_err(e: rusqlite::Error) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sqlite_create_load_save() {
        let store = SqliteStore::in_memory().unwrap();

        let doc = store.create("Notes").await.unwrap();
        assert_eq!(doc.content, "");

        store.save(&doc.id, "hi").await.unwrap();

        let loaded = store.load(&doc.id).await.unwrap().unwrap();
        assert_eq!(loaded.id, doc.id);
        assert_eq!(loaded.title, "Notes");
        assert_eq!(loaded.content, "hi");
    }

    #[tokio::test]
    async fn test_sqlite_load_missing_is_none() {
        let store = SqliteStore::in_memory().unwrap();

        let missing = store.load(&DocumentId::generate()).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_sqlite_save_missing_fails_without_creating() {
        let store = SqliteStore::in_memory().unwrap();
        let id = DocumentId::generate();

        let err = store.save(&id, "hi").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));

        assert!(store.load(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sqlite_list() {
        let store = SqliteStore::in_memory().unwrap();

        store.create("One").await.unwrap();
        store.create("Two").await.unwrap();
        store.create("Three").await.unwrap();

        let metas = store.list().await.unwrap();
        assert_eq!(metas.len(), 3);
    }

    #[tokio::test]
    async fn test_sqlite_last_writer_wins() {
        let store = SqliteStore::in_memory().unwrap();
        let doc = store.create("Notes").await.unwrap();

        store.save(&doc.id, "first").await.unwrap();
        store.save(&doc.id, "second").await.unwrap();

        let loaded = store.load(&doc.id).await.unwrap().unwrap();
        assert_eq!(loaded.content, "second");
    }
}
