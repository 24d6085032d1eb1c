use rusqlite::{Connection, OptionalExtension, params};
use std::sync::{Mutex, MutexGuard};
use chrono::Utc;
use tracing::debug;
use crate::{
    draft::{model::ProgramDraft, store::DraftStore},
    error::{GrantError, Result},
};

/// SQLite-backed draft store; one JSON snapshot per key
pub struct SqliteDraftStore {
    conn: Mutex<Connection>,
    key: String,
}

impl SqliteDraftStore {
    pub fn new(path: &str, key: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn, key)
    }

    pub fn in_memory(key: &str) -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?, key)
    }

    fn with_connection(conn: Connection, key: &str) -> Result<Self> {
        let store = Self {
            conn: Mutex::new(conn),
            key: key.to_string(),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn()?.execute(
            "CREATE TABLE IF NOT EXISTS drafts (
                key TEXT PRIMARY KEY,
                snapshot TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| GrantError::Storage("draft database lock poisoned".to_string()))
    }

    /// Timestamp of the last save, if a draft exists
    pub fn updated_at(&self) -> Result<Option<String>> {
        let updated_at = self
            .conn()?
            .query_row(
                "SELECT updated_at FROM drafts WHERE key = ?1",
                [&self.key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(updated_at)
    }
}

impl DraftStore for SqliteDraftStore {
    fn get(&self) -> Result<Option<ProgramDraft>> {
        let snapshot: Option<String> = self
            .conn()?
            .query_row(
                "SELECT snapshot FROM drafts WHERE key = ?1",
                [&self.key],
                |row| row.get(0),
            )
            .optional()?;

        match snapshot {
            Some(json) => {
                debug!("Loaded draft '{}' ({} bytes)", self.key, json.len());
                Ok(Some(serde_json::from_str(&json)?))
            }
            None => Ok(None),
        }
    }

    fn set(&self, draft: &ProgramDraft) -> Result<()> {
        let json = serde_json::to_string(&draft.snapshot())?;
        self.conn()?.execute(
            "INSERT OR REPLACE INTO drafts (key, snapshot, updated_at) VALUES (?1, ?2, ?3)",
            params![self.key, json, Utc::now().to_rfc3339()],
        )?;
        debug!("Saved draft '{}'", self.key);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.conn()?
            .execute("DELETE FROM drafts WHERE key = ?1", [&self.key])?;
        debug!("Cleared draft '{}'", self.key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::model::{Description, ImageFile};

    #[test]
    fn test_persists_across_connections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("drafts.db");
        let path = path.to_str().unwrap();

        let mut draft = ProgramDraft {
            name: "Storage Grants".into(),
            price: "10.5".into(),
            description: Description::paragraph("Durable drafts"),
            keywords: vec!["sqlite".into()],
            ..Default::default()
        };
        draft.image = Some(ImageFile {
            file_name: "a.png".into(),
            bytes: vec![1],
        });

        {
            let store = SqliteDraftStore::new(path, "program-draft").unwrap();
            store.set(&draft).unwrap();
            assert!(store.updated_at().unwrap().is_some());
        }

        let store = SqliteDraftStore::new(path, "program-draft").unwrap();
        let restored = store.get().unwrap().unwrap();
        assert_eq!(restored, draft.snapshot());
    }

    #[test]
    fn test_keys_are_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("drafts.db");
        let path = path.to_str().unwrap();

        let first = SqliteDraftStore::new(path, "a").unwrap();
        let second = SqliteDraftStore::new(path, "b").unwrap();
        first
            .set(&ProgramDraft {
                name: "A".into(),
                ..Default::default()
            })
            .unwrap();

        assert!(second.get().unwrap().is_none());
        assert_eq!(first.get().unwrap().unwrap().name, "A");
    }

    #[test]
    fn test_clear_then_get_is_empty() {
        let store = SqliteDraftStore::in_memory("k").unwrap();
        store.set(&ProgramDraft::default()).unwrap();
        store.clear().unwrap();
        assert!(store.get().unwrap().is_none());
        assert!(store.updated_at().unwrap().is_none());
    }
}
