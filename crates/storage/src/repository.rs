use async_trait::async_trait;
use sabelo_core::model::Progress;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::snapshot::ProgressSnapshot;

/// Key the progress snapshot is stored under.
pub const PROGRESS_KEY: &str = "sabeloTodoProgress";

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Repository contract for the single persisted progress value.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Load the stored progress, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` for a corrupt snapshot, or other
    /// storage errors.
    async fn load_progress(&self) -> Result<Option<Progress>, StorageError>;

    /// Persist progress, replacing whatever was stored.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the snapshot cannot be stored.
    async fn save_progress(&self, progress: &Progress) -> Result<(), StorageError>;
}

/// Simple in-memory key/value store for tests and prototyping.
///
/// Values are kept as JSON text, the same as the `SQLite` backend, so decoding
/// failures surface the same way.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Store a raw value under `key`, bypassing encoding.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn insert_raw(&self, key: &str, value: impl Into<String>) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(key.to_string(), value.into());
        Ok(())
    }

    /// Raw value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn get_raw(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(key).cloned())
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn load_progress(&self) -> Result<Option<Progress>, StorageError> {
        let Some(raw) = self.get_raw(PROGRESS_KEY)? else {
            return Ok(None);
        };
        ProgressSnapshot::from_json(&raw)?.into_progress().map(Some)
    }

    async fn save_progress(&self, progress: &Progress) -> Result<(), StorageError> {
        let raw = ProgressSnapshot::from_progress(progress).to_json()?;
        self.insert_raw(PROGRESS_KEY, raw)
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub progress: Arc<dyn ProgressRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let progress: Arc<dyn ProgressRepository> = Arc::new(InMemoryRepository::new());
        Self { progress }
    }
}
