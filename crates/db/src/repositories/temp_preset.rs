use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{Pool, Postgres};

use shiftboard_core::errors::ShiftResult;
use shiftboard_core::models::preset::TemporaryPreset;
use shiftboard_core::temp_presets::TemporaryPresetStore;

use crate::models::DbTemporaryPreset;
use crate::repositories::db_error;

/// [`TemporaryPresetStore`] backed by the `temporary_presets` table.
#[derive(Debug, Clone)]
pub struct PgTemporaryPresetStore {
    pool: Pool<Postgres>,
}

impl PgTemporaryPresetStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TemporaryPresetStore for PgTemporaryPresetStore {
    async fn get(&self, key: &str) -> ShiftResult<Option<TemporaryPreset>> {
        let row = sqlx::query_as::<_, DbTemporaryPreset>(
            "SELECT key, preset, created_at FROM temporary_presets WHERE key = $1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(row.map(|r| r.into_keyed().1))
    }

    async fn set(&self, key: &str, preset: TemporaryPreset) -> ShiftResult<()> {
        sqlx::query(
            r#"
            INSERT INTO temporary_presets (key, preset, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (key) DO UPDATE SET preset = $2, created_at = $3
            "#,
        )
        .bind(key)
        .bind(Json(&preset.preset))
        .bind(preset.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> ShiftResult<bool> {
        let result = sqlx::query("DELETE FROM temporary_presets WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self) -> ShiftResult<Vec<(String, TemporaryPreset)>> {
        let rows = sqlx::query_as::<_, DbTemporaryPreset>(
            "SELECT key, preset, created_at FROM temporary_presets ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(rows.into_iter().map(DbTemporaryPreset::into_keyed).collect())
    }

    async fn list_expired(&self, cutoff: DateTime<Utc>) -> ShiftResult<Vec<String>> {
        let keys = sqlx::query_scalar::<_, String>(
            "SELECT key FROM temporary_presets WHERE created_at <= $1 ORDER BY key",
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(keys)
    }
}
