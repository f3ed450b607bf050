use async_trait::async_trait;
use chrono::Utc;
use sabelo_core::model::Progress;
use sqlx::Row;

use crate::repository::{PROGRESS_KEY, ProgressRepository, StorageError};
use crate::snapshot::ProgressSnapshot;

use super::SqliteRepository;

impl SqliteRepository {
    /// Raw JSON stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the query fails.
    pub async fn get_value(&self, key: &str) -> Result<Option<String>, StorageError> {
        let row = sqlx::query("SELECT value FROM kv_store WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };
        row.try_get::<String, _>("value")
            .map(Some)
            .map_err(|err| StorageError::Serialization(err.to_string()))
    }

    /// Insert or replace the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the write fails.
    pub async fn put_value(&self, key: &str, value: &str) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO kv_store (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            ",
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        Ok(())
    }
}

#[async_trait]
impl ProgressRepository for SqliteRepository {
    async fn load_progress(&self) -> Result<Option<Progress>, StorageError> {
        let Some(raw) = self.get_value(PROGRESS_KEY).await? else {
            return Ok(None);
        };
        ProgressSnapshot::from_json(&raw)?.into_progress().map(Some)
    }

    async fn save_progress(&self, progress: &Progress) -> Result<(), StorageError> {
        let raw = ProgressSnapshot::from_progress(progress).to_json()?;
        self.put_value(PROGRESS_KEY, &raw).await
    }
}
