//! Durable string-keyed snapshot storage.
//!
//! The cart persists its serialized snapshot under a well-known key in a
//! small local key-value store, mirroring the browser localStorage the
//! storefront originally used. [`FileStore`] keeps the whole store in one
//! JSON object file; [`MemoryStore`] backs tests.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;

/// Errors that can occur reading or writing the snapshot store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path the operation touched.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The store file exists but does not hold a valid key-value map.
    #[error("Corrupt storage file at {path}: {source}")]
    Corrupt {
        /// Path of the corrupt file.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },
}

/// Interface for durable string-keyed snapshot persistence.
///
/// The cart store reads its key once at initialization and writes it after
/// every committed state change. Implementations must make `set` replace
/// any existing value for the key.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Retrieve the value stored under `key`.
    ///
    /// Returns `None` if the key has never been written.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

// =============================================================================
// FileStore
// =============================================================================

/// File-backed snapshot store.
///
/// All keys live in a single JSON object file. Writes go to a sibling temp
/// file which is then renamed over the store, so a crash mid-write never
/// leaves a torn file. Read-modify-write cycles are serialized by an
/// internal mutex; concurrent *processes* are not coordinated.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Create a store backed by the given file.
    ///
    /// The file and its parent directory are created lazily on first write.
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    /// Read the whole key-value map from disk.
    ///
    /// A missing file is an empty map.
    async fn read_map(&self) -> Result<HashMap<String, String>, StorageError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(HashMap::new());
            }
            Err(err) => {
                return Err(StorageError::Io {
                    path: self.path.clone(),
                    source: err,
                });
            }
        };

        serde_json::from_str(&raw).map_err(|err| StorageError::Corrupt {
            path: self.path.clone(),
            source: err,
        })
    }

    /// Write the whole key-value map atomically (temp file + rename).
    async fn write_map(&self, map: &HashMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_err(e))?;
        }

        // Infallible: String keys and values always serialize
        let raw = serde_json::to_string_pretty(map).unwrap_or_default();

        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, raw.as_bytes())
            .await
            .map_err(|e| self.io_err(e))?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| self.io_err(e))?;

        Ok(())
    }

    fn io_err(&self, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl SnapshotStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let map = self.read_map().await?;
        Ok(map.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;

        // A corrupt store is replaced rather than propagated: losing stale
        // sibling keys beats never being able to persist again.
        let mut map = match self.read_map().await {
            Ok(map) => map,
            Err(err @ StorageError::Corrupt { .. }) => {
                tracing::warn!(error = %err, "resetting corrupt snapshot store");
                HashMap::new()
            }
            Err(err) => return Err(err),
        };

        map.insert(key.to_string(), value.to_string());
        self.write_map(&map).await
    }
}

// =============================================================================
// MemoryStore
// =============================================================================

/// In-memory snapshot store for tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with one entry.
    #[must_use]
    pub fn with_entry(key: &str, value: &str) -> Self {
        let mut entries = HashMap::new();
        entries.insert(key.to_string(), value.to_string());
        Self {
            entries: Mutex::new(entries),
        }
    }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
