//! # redb-backed Store
//!
//! A disk-backed key-value store using the redb embedded database.
//!
//! redb provides:
//! - ACID transactions (each `put` is one committed write transaction)
//! - Crash safety (copy-on-write B-trees)
//! - Zero configuration
//!
//! Both collections live in a single table keyed by collection name.

use super::KeyValueStore;
use crate::LarderError;
use redb::{Database, ReadableDatabase, TableDefinition};
use std::path::Path;

/// Table for collections: key string -> JSON document
const COLLECTIONS: TableDefinition<&str, &str> = TableDefinition::new("collections");

/// A disk-backed key-value store using redb.
pub struct RedbStore {
    /// The redb database handle.
    db: Database,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore").finish_non_exhaustive()
    }
}

impl RedbStore {
    /// Open or create a store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LarderError> {
        let db =
            Database::create(path.as_ref()).map_err(|e| LarderError::IoError(e.to_string()))?;

        // Initialize the table if it doesn't exist
        {
            let write_txn = db
                .begin_write()
                .map_err(|e| LarderError::IoError(e.to_string()))?;
            let _ = write_txn
                .open_table(COLLECTIONS)
                .map_err(|e| LarderError::IoError(e.to_string()))?;
            write_txn
                .commit()
                .map_err(|e| LarderError::IoError(e.to_string()))?;
        }

        Ok(Self { db })
    }
}

impl KeyValueStore for RedbStore {
    fn get(&self, key: &str) -> Result<Option<String>, LarderError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| LarderError::IoError(e.to_string()))?;
        let table = read_txn
            .open_table(COLLECTIONS)
            .map_err(|e| LarderError::IoError(e.to_string()))?;

        let value = table
            .get(key)
            .map_err(|e| LarderError::IoError(e.to_string()))?
            .map(|guard| guard.value().to_string());
        Ok(value)
    }

    fn put(&mut self, key: &str, value: &str) -> Result<(), LarderError> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| LarderError::IoError(e.to_string()))?;
        {
            let mut table = write_txn
                .open_table(COLLECTIONS)
                .map_err(|e| LarderError::IoError(e.to_string()))?;
            table
                .insert(key, value)
                .map_err(|e| LarderError::IoError(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| LarderError::IoError(e.to_string()))
    }

    fn put_many(&mut self, entries: &[(&str, &str)]) -> Result<(), LarderError> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| LarderError::IoError(e.to_string()))?;
        {
            let mut table = write_txn
                .open_table(COLLECTIONS)
                .map_err(|e| LarderError::IoError(e.to_string()))?;
            for (key, value) in entries {
                table
                    .insert(*key, *value)
                    .map_err(|e| LarderError::IoError(e.to_string()))?;
            }
        }
        write_txn
            .commit()
            .map_err(|e| LarderError::IoError(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn get_missing_key_is_none() {
        let temp = tempdir().expect("temp dir");
        let store = RedbStore::open(temp.path().join("test.redb")).expect("open db");
        assert_eq!(store.get("ingredients").expect("get"), None);
    }

    #[test]
    fn put_then_get() {
        let temp = tempdir().expect("temp dir");
        let mut store = RedbStore::open(temp.path().join("test.redb")).expect("open db");

        store.put("recipes", "[]").expect("put");
        store.put("recipes", r#"[{"id":2}]"#).expect("put");

        assert_eq!(
            store.get("recipes").expect("get").as_deref(),
            Some(r#"[{"id":2}]"#)
        );
    }

    #[test]
    fn put_many_commits_together() {
        let temp = tempdir().expect("temp dir");
        let db_path = temp.path().join("test.redb");

        {
            let mut store = RedbStore::open(&db_path).expect("open db");
            store
                .put_many(&[("ingredients", "[1]"), ("recipes", "[2]")])
                .expect("put_many");
        }

        let store = RedbStore::open(&db_path).expect("reopen db");
        assert_eq!(store.get("ingredients").expect("get").as_deref(), Some("[1]"));
        assert_eq!(store.get("recipes").expect("get").as_deref(), Some("[2]"));
    }

    #[test]
    fn recovery_persistence_after_reopen() {
        let temp = tempdir().expect("temp dir");
        let db_path = temp.path().join("test.redb");

        // Phase 1: write both collections
        {
            let mut store = RedbStore::open(&db_path).expect("open db");
            store.put("ingredients", r#"[{"id":1}]"#).expect("put");
            store.put("recipes", "[]").expect("put");
        }
        // Store dropped here, simulating process exit

        // Phase 2: reopen and verify
        {
            let store = RedbStore::open(&db_path).expect("reopen db");
            assert_eq!(
                store.get("ingredients").expect("get").as_deref(),
                Some(r#"[{"id":1}]"#)
            );
            assert_eq!(store.get("recipes").expect("get").as_deref(), Some("[]"));
        }
    }
}
