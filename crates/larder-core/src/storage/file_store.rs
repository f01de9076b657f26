//! # JSON File Store
//!
//! A single JSON object on disk mapping each key to its string value.
//!
//! The whole document is rewritten on every `put`. The new content goes to a
//! sibling temporary file first and is renamed over the original, so a failed
//! write leaves the previous document intact.

use super::KeyValueStore;
use crate::LarderError;
use crate::primitives::MAX_COLLECTION_PAYLOAD_SIZE;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A key-value store persisted as one JSON document.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl JsonFileStore {
    /// Open the document at `path`, or start empty if it does not exist.
    ///
    /// Nothing is written until the first `put`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LarderError> {
        let path = path.as_ref().to_path_buf();

        let entries = if path.exists() {
            let metadata = std::fs::metadata(&path)
                .map_err(|e| LarderError::IoError(format!("Cannot read file metadata: {}", e)))?;
            // Both collections share one document
            if metadata.len() > (2 * MAX_COLLECTION_PAYLOAD_SIZE) as u64 {
                return Err(LarderError::DeserializationError(format!(
                    "Store file size {} bytes exceeds maximum allowed {} bytes",
                    metadata.len(),
                    2 * MAX_COLLECTION_PAYLOAD_SIZE
                )));
            }

            let data = std::fs::read(&path)
                .map_err(|e| LarderError::IoError(format!("Read store: {}", e)))?;
            if data.is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_slice(&data).map_err(|e| {
                    LarderError::DeserializationError(format!("Store file: {}", e))
                })?
            }
        } else {
            BTreeMap::new()
        };

        Ok(Self { path, entries })
    }

    /// Location of the backing document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<(), LarderError> {
        let data = serde_json::to_vec_pretty(entries)
            .map_err(|e| LarderError::SerializationError(e.to_string()))?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        std::fs::write(&tmp, &data)
            .map_err(|e| LarderError::IoError(format!("Write store: {}", e)))?;
        std::fs::rename(&tmp, &self.path)
            .map_err(|e| LarderError::IoError(format!("Replace store: {}", e)))
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, LarderError> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: &str) -> Result<(), LarderError> {
        let mut next = self.entries.clone();
        next.insert(key.to_string(), value.to_string());
        self.flush(&next)?;
        self.entries = next;
        Ok(())
    }

    fn put_many(&mut self, entries: &[(&str, &str)]) -> Result<(), LarderError> {
        let mut next = self.entries.clone();
        for (key, value) in entries {
            next.insert((*key).to_string(), (*value).to_string());
        }
        self.flush(&next)?;
        self.entries = next;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_opens_empty() {
        let temp = tempdir().expect("temp dir");
        let store = JsonFileStore::open(temp.path().join("larder.json")).expect("open");
        assert_eq!(store.get("ingredients").expect("get"), None);
        assert!(!store.path().exists());
    }

    #[test]
    fn values_survive_reopen() {
        let temp = tempdir().expect("temp dir");
        let path = temp.path().join("larder.json");

        {
            let mut store = JsonFileStore::open(&path).expect("open");
            store.put("ingredients", r#"[{"id":1}]"#).expect("put");
            store.put("recipes", "[]").expect("put");
        }

        let store = JsonFileStore::open(&path).expect("reopen");
        assert_eq!(
            store.get("ingredients").expect("get").as_deref(),
            Some(r#"[{"id":1}]"#)
        );
        assert_eq!(store.get("recipes").expect("get").as_deref(), Some("[]"));
    }

    #[test]
    fn corrupted_document_rejected() {
        let temp = tempdir().expect("temp dir");
        let path = temp.path().join("larder.json");
        std::fs::write(&path, b"{not json").expect("write");

        let result = JsonFileStore::open(&path);
        assert!(matches!(result, Err(LarderError::DeserializationError(_))));
    }

    #[test]
    fn no_temporary_file_left_behind() {
        let temp = tempdir().expect("temp dir");
        let path = temp.path().join("larder.json");

        let mut store = JsonFileStore::open(&path).expect("open");
        store.put("recipes", "[]").expect("put");

        assert!(path.exists());
        assert!(!temp.path().join("larder.json.tmp").exists());
    }

    #[test]
    fn put_many_is_one_document_write() {
        let temp = tempdir().expect("temp dir");
        let path = temp.path().join("larder.json");

        {
            let mut store = JsonFileStore::open(&path).expect("open");
            store
                .put_many(&[("ingredients", "[]"), ("recipes", "[]")])
                .expect("put_many");
        }

        let store = JsonFileStore::open(&path).expect("reopen");
        assert_eq!(store.get("ingredients").expect("get").as_deref(), Some("[]"));
        assert_eq!(store.get("recipes").expect("get").as_deref(), Some("[]"));
    }

    #[test]
    fn failed_put_many_keeps_previous_entries() {
        let temp = tempdir().expect("temp dir");
        let path = temp.path().join("larder.json");

        let mut store = JsonFileStore::open(&path).expect("open");
        store.put("ingredients", "[1]").expect("put");

        // A directory where the temporary file should go makes the flush fail
        std::fs::create_dir(temp.path().join("larder.json.tmp")).expect("mkdir");
        let result = store.put_many(&[("ingredients", "[2]"), ("recipes", "[3]")]);

        assert!(matches!(result, Err(LarderError::IoError(_))));
        assert_eq!(store.get("ingredients").expect("get").as_deref(), Some("[1]"));
        assert_eq!(store.get("recipes").expect("get"), None);
    }
}
