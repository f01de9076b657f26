//! # Storage
//!
//! The durable key-value store behind the repositories.
//!
//! The store holds exactly two logical records, `ingredients` and `recipes`,
//! each a JSON-serialized ordered sequence. Repositories read a collection
//! once when they are loaded and write the whole collection back after every
//! mutation.
//!
//! ## Backends
//!
//! - `MemoryStore`: volatile, for tests and scratch sessions
//! - `JsonFileStore`: one JSON document on disk holding both keys
//! - `RedbStore`: a redb database (ACID, crash safe)

mod file_store;
mod redb_store;

pub use file_store::JsonFileStore;
pub use redb_store::RedbStore;

use crate::LarderError;
use std::collections::BTreeMap;

// =============================================================================
// KEY-VALUE STORE TRAIT
// =============================================================================

/// A durable string-to-string store.
///
/// Writes replace the whole value for a key. A `put` either fully succeeds or
/// leaves the previous value in place.
pub trait KeyValueStore {
    /// Read the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>, LarderError>;

    /// Replace the value stored under `key`.
    fn put(&mut self, key: &str, value: &str) -> Result<(), LarderError>;

    /// Replace several keys at once.
    ///
    /// Either every entry is written or none is.
    fn put_many(&mut self, entries: &[(&str, &str)]) -> Result<(), LarderError>;
}

// =============================================================================
// IN-MEMORY STORE
// =============================================================================

/// A volatile store backed by a `BTreeMap`.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys present.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, LarderError> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: &str) -> Result<(), LarderError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn put_many(&mut self, entries: &[(&str, &str)]) -> Result<(), LarderError> {
        for (key, value) in entries {
            self.entries.insert((*key).to_string(), (*value).to_string());
        }
        Ok(())
    }
}

// =============================================================================
// STORAGE BACKEND
// =============================================================================

/// The store a Session writes through.
#[derive(Debug)]
pub enum StorageBackend {
    /// Volatile map, lost when the session is dropped.
    InMemory(MemoryStore),
    /// A single JSON document on disk.
    File(JsonFileStore),
    /// A redb database on disk.
    Persistent(RedbStore),
}

impl Default for StorageBackend {
    fn default() -> Self {
        Self::InMemory(MemoryStore::new())
    }
}

impl StorageBackend {
    /// Whether writes survive the process.
    #[must_use]
    pub fn is_durable(&self) -> bool {
        !matches!(self, Self::InMemory(_))
    }

    /// Short backend name for status output.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InMemory(_) => "memory",
            Self::File(_) => "file",
            Self::Persistent(_) => "redb",
        }
    }
}

impl KeyValueStore for StorageBackend {
    fn get(&self, key: &str) -> Result<Option<String>, LarderError> {
        match self {
            Self::InMemory(store) => store.get(key),
            Self::File(store) => store.get(key),
            Self::Persistent(store) => store.get(key),
        }
    }

    fn put(&mut self, key: &str, value: &str) -> Result<(), LarderError> {
        match self {
            Self::InMemory(store) => store.put(key, value),
            Self::File(store) => store.put(key, value),
            Self::Persistent(store) => store.put(key, value),
        }
    }

    fn put_many(&mut self, entries: &[(&str, &str)]) -> Result<(), LarderError> {
        match self {
            Self::InMemory(store) => store.put_many(entries),
            Self::File(store) => store.put_many(entries),
            Self::Persistent(store) => store.put_many(entries),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_put_replaces() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get("ingredients").expect("get"), None);

        store.put("ingredients", "[]").expect("put");
        store.put("ingredients", "[1]").expect("put");

        assert_eq!(store.get("ingredients").expect("get").as_deref(), Some("[1]"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn backend_dispatches_to_memory() {
        let mut backend = StorageBackend::default();
        assert_eq!(backend.kind(), "memory");
        assert!(!backend.is_durable());

        backend.put("recipes", "[]").expect("put");
        assert_eq!(backend.get("recipes").expect("get").as_deref(), Some("[]"));
    }

    #[test]
    fn put_many_writes_every_entry() {
        let mut backend = StorageBackend::default();
        backend
            .put_many(&[("ingredients", "[1]"), ("recipes", "[2]")])
            .expect("put_many");

        assert_eq!(backend.get("ingredients").expect("get").as_deref(), Some("[1]"));
        assert_eq!(backend.get("recipes").expect("get").as_deref(), Some("[2]"));
    }
}
