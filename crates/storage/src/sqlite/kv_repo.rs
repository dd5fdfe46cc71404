use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;

use crate::repository::{KeyValueStore, PersistedValue, StorageError};

use super::SqliteRepository;
use super::mapping::{decode_value, encode_value};

#[async_trait]
impl KeyValueStore for SqliteRepository {
    async fn get(&self, key: &str) -> Result<Option<PersistedValue>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT kind, value
            FROM kv_entries
            WHERE key = ?1
            ",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let kind: String = row
            .try_get("kind")
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        let raw: String = row
            .try_get("value")
            .map_err(|err| StorageError::Serialization(err.to_string()))?;

        decode_value(&kind, raw).map(Some)
    }

    async fn set(&self, key: &str, value: &PersistedValue) -> Result<(), StorageError> {
        let (kind, raw) = encode_value(value)?;

        sqlx::query(
            r"
            INSERT INTO kv_entries (key, kind, value, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(key) DO UPDATE SET
                kind = excluded.kind,
                value = excluded.value,
                updated_at = excluded.updated_at
            ",
        )
        .bind(key)
        .bind(kind)
        .bind(raw)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        Ok(())
    }
}
