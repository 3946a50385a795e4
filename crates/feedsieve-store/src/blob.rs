//! Keyed JSON blob storage

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::StoreError;

/// Minimal key/value storage the rule store is built on
pub trait BlobStore {
    /// Read the value stored under `key`, `None` if never written
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Replace the value stored under `key`
    fn set(&mut self, key: &str, value: Value) -> Result<(), StoreError>;
}

/// Blobs held in memory, lost on drop
#[derive(Debug, Default, Clone)]
pub struct MemoryBlobStore {
    blobs: BTreeMap<String, Value>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobStore for MemoryBlobStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.blobs.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), StoreError> {
        self.blobs.insert(key.to_string(), value);
        Ok(())
    }
}

/// All blobs in one JSON object on disk
///
/// The file is re-read on every access so that changes written by another
/// process are picked up, and replaced atomically on every write.
#[derive(Debug, Clone)]
pub struct JsonFileBlobStore {
    path: PathBuf,
}

impl JsonFileBlobStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn read_all(&self) -> Result<Map<String, Value>, StoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(self.io_error(e)),
        };

        if contents.trim().is_empty() {
            return Ok(Map::new());
        }

        let value: Value = serde_json::from_str(&contents).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })?;

        match value {
            Value::Object(map) => Ok(map),
            _ => Err(StoreError::NotAnObject {
                path: self.path.clone(),
            }),
        }
    }

    fn write_all(&self, blobs: &Map<String, Value>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let contents = serde_json::to_string_pretty(blobs).map_err(|source| StoreError::Encode {
            key: "*".to_string(),
            source,
        })?;

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, contents).map_err(|e| self.io_error(e))?;
        fs::rename(&tmp_path, &self.path).map_err(|e| self.io_error(e))?;
        Ok(())
    }
}

impl BlobStore for JsonFileBlobStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let mut blobs = self.read_all()?;
        Ok(blobs.remove(key))
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut blobs = self.read_all()?;
        blobs.insert(key.to_string(), value);
        self.write_all(&blobs)?;
        tracing::debug!(path = %self.path.display(), key, "store updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_memory_store() {
        let mut store = MemoryBlobStore::new();
        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", json!([1, 2])).unwrap();
        assert_eq!(store.get("k").unwrap(), Some(json!([1, 2])));
    }

    #[test]
    fn test_missing_file_is_empty() {
        let temp = TempDir::new().unwrap();
        let store = JsonFileBlobStore::new(temp.path().join("store.json"));
        assert_eq!(store.get("cf_rules").unwrap(), None);
    }

    #[test]
    fn test_file_store_keeps_other_keys() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("store.json");
        let mut store = JsonFileBlobStore::new(&path);

        store.set("a", json!(1)).unwrap();
        store.set("b", json!({"x": true})).unwrap();

        let reopened = JsonFileBlobStore::new(&path);
        assert_eq!(reopened.get("a").unwrap(), Some(json!(1)));
        assert_eq!(reopened.get("b").unwrap(), Some(json!({"x": true})));
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_corrupt_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("store.json");
        fs::write(&path, "{broken").unwrap();
        let store = JsonFileBlobStore::new(&path);
        assert!(matches!(store.get("a"), Err(StoreError::Parse { .. })));

        fs::write(&path, "[1, 2]").unwrap();
        assert!(matches!(store.get("a"), Err(StoreError::NotAnObject { .. })));
    }
}
