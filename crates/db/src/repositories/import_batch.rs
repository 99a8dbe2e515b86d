use chrono::{DateTime, Utc};
use eyre::Result;
use sqlx::{PgConnection, Pool, Postgres};
use uuid::Uuid;

use shiftboard_core::errors::{ShiftError, ShiftResult};
use shiftboard_core::models::import::{ImportBatch, ImportKind, RollbackResponse};

use crate::models::DbImportBatch;
use crate::repositories::db_error;

const BATCH_COLUMNS: &str = "id, kind, row_count, created_by, created_at, rolled_back_at";

/// Inserts the batch record on an open connection, usually inside the import transaction.
pub async fn insert_batch(
    conn: &mut PgConnection,
    kind: ImportKind,
    row_count: usize,
    created_by: Option<&str>,
) -> Result<DbImportBatch> {
    let batch = sqlx::query_as::<_, DbImportBatch>(&format!(
        r#"
        INSERT INTO import_batches (id, kind, row_count, created_by, created_at)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {}
        "#,
        BATCH_COLUMNS
    ))
    .bind(Uuid::new_v4())
    .bind(kind.as_str())
    .bind(i32::try_from(row_count).unwrap_or(i32::MAX))
    .bind(created_by)
    .bind(Utc::now())
    .fetch_one(conn)
    .await?;

    Ok(batch)
}

/// Newest first.
pub async fn list_batches(pool: &Pool<Postgres>, limit: i64) -> Result<Vec<DbImportBatch>> {
    let batches = sqlx::query_as::<_, DbImportBatch>(&format!(
        "SELECT {} FROM import_batches ORDER BY created_at DESC LIMIT $1",
        BATCH_COLUMNS
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(batches)
}

/// Deletes everything the batch created and marks it rolled back, all or nothing.
///
/// Staff rows created by the batch are only removed when no schedule or pending
/// entry still references them.
pub async fn rollback_batch(
    pool: &Pool<Postgres>,
    id: Uuid,
    now: DateTime<Utc>,
) -> ShiftResult<RollbackResponse> {
    let mut tx = pool.begin().await.map_err(db_error)?;

    let row = sqlx::query_as::<_, DbImportBatch>(&format!(
        "SELECT {} FROM import_batches WHERE id = $1 FOR UPDATE",
        BATCH_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&mut *tx)
    .await
    .map_err(db_error)?
    .ok_or_else(|| ShiftError::NotFound(format!("Import batch {}", id)))?;

    let batch = ImportBatch::try_from(row)?;
    batch.ensure_rollback_allowed(now)?;

    let deleted_schedules = sqlx::query("DELETE FROM schedules WHERE import_batch_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?
        .rows_affected();

    let deleted_pending =
        sqlx::query("DELETE FROM pending_schedules WHERE import_batch_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?
            .rows_affected();

    let deleted_staff = sqlx::query(
        r#"
        DELETE FROM staff s
        WHERE s.import_batch_id = $1
          AND NOT EXISTS (SELECT 1 FROM schedules sc WHERE sc.staff_id = s.id)
          AND NOT EXISTS (SELECT 1 FROM pending_schedules p WHERE p.staff_id = s.id)
        "#,
    )
    .bind(id)
    .execute(&mut *tx)
    .await
    .map_err(db_error)?
    .rows_affected();

    sqlx::query("UPDATE import_batches SET rolled_back_at = $2 WHERE id = $1")
        .bind(id)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

    tx.commit().await.map_err(db_error)?;

    tracing::info!(
        "Rolled back import batch {}: {} schedules, {} pending, {} staff",
        id,
        deleted_schedules,
        deleted_pending,
        deleted_staff
    );

    Ok(RollbackResponse {
        batch_id: id,
        deleted_schedules,
        deleted_pending,
        deleted_staff,
    })
}
