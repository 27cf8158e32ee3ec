//! Key-value persistence for the last successful collection.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

pub const LAST_COMPLETION_KEY: &str = "lastCompletion";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store i/o failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("store file {path} is not valid JSON: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("store file {0} does not hold a JSON object")]
    NotAnObject(PathBuf),
    #[error("failed to encode store contents: {0}")]
    Encode(#[from] serde_json::Error),
}

#[async_trait]
pub trait CompletionStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;
    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;
}

/// Stores every key in one JSON object file, rewritten on each `set`.
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<Map<String, Value>, StoreError> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        if raw.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str(&raw) {
            Ok(Value::Object(entries)) => Ok(entries),
            Ok(_) => Err(StoreError::NotAnObject(self.path.clone())),
            Err(source) => Err(StoreError::Corrupt {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl CompletionStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.read_all().await?.remove(key))
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.read_all().await?;
        entries.insert(key.to_string(), value);
        let encoded = serde_json::to_vec_pretty(&Value::Object(entries))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|err| self.io_error(err))?;
        }
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, encoded)
            .await
            .map_err(|err| self.io_error(err))?;
        fs::rename(&staging, &self.path)
            .await
            .map_err(|err| self.io_error(err))?;
        debug!(target: "reelscout::storage", path = %self.path.display(), key, "stored value");
        Ok(())
    }
}

/// Process-local store, used when nothing should touch the disk.
#[derive(Default)]
pub struct MemoryStore {
    entries: DashMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CompletionStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[tokio::test]
    async fn missing_file_reads_as_empty() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("absent.json"));
        assert_eq!(store.get(LAST_COMPLETION_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn set_overwrites_and_keeps_other_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.json");
        let store = JsonFileStore::new(&path);

        store.set("other", json!("kept")).await.unwrap();
        store.set(LAST_COMPLETION_KEY, json!({"scroll_count": 1})).await.unwrap();
        store.set(LAST_COMPLETION_KEY, json!({"scroll_count": 2})).await.unwrap();

        let reopened = JsonFileStore::new(&path);
        assert_eq!(
            reopened.get(LAST_COMPLETION_KEY).await.unwrap(),
            Some(json!({"scroll_count": 2}))
        );
        assert_eq!(reopened.get("other").await.unwrap(), Some(json!("kept")));
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn corrupt_file_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = JsonFileStore::new(&path).get(LAST_COMPLETION_KEY).await.unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));

        std::fs::write(&path, "[1, 2]").unwrap();
        let err = JsonFileStore::new(&path).get(LAST_COMPLETION_KEY).await.unwrap_err();
        assert!(matches!(err, StoreError::NotAnObject(_)));
    }

    #[tokio::test]
    async fn memory_store_round_trip() {
        let store = MemoryStore::new();
        assert_eq!(store.get(LAST_COMPLETION_KEY).await.unwrap(), None);
        store.set(LAST_COMPLETION_KEY, json!({"ok": true})).await.unwrap();
        assert_eq!(
            store.get(LAST_COMPLETION_KEY).await.unwrap(),
            Some(json!({"ok": true}))
        );
    }
}
