use chrono::{NaiveDate, Utc};
use eyre::{Result, eyre};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use shiftboard_core::models::import::{ImportKind, ScheduleImportRow};
use shiftboard_core::models::schedule::ScheduleLayer;

use crate::models::{DbImportBatch, DbSchedule};
use crate::repositories::import_batch;

const SCHEDULE_COLUMNS: &str = "id, staff_id, date, status, start_hour, end_hour, memo, layer, \
                                import_batch_id, created_at, updated_at";

pub struct NewSchedule<'a> {
    pub staff_id: i32,
    pub date: NaiveDate,
    pub status: &'a str,
    pub start: f64,
    pub end: f64,
    pub memo: Option<&'a str>,
    pub layer: ScheduleLayer,
}

pub async fn create_schedule(pool: &Pool<Postgres>, new: &NewSchedule<'_>) -> Result<DbSchedule> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    tracing::debug!(
        "Creating schedule: id={}, staff_id={}, date={}, status={}, {}-{}",
        id, new.staff_id, new.date, new.status, new.start, new.end
    );

    let schedule = sqlx::query_as::<_, DbSchedule>(&format!(
        r#"
        INSERT INTO schedules (id, staff_id, date, status, start_hour, end_hour, memo, layer,
                               created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
        RETURNING {}
        "#,
        SCHEDULE_COLUMNS
    ))
    .bind(id)
    .bind(new.staff_id)
    .bind(new.date)
    .bind(new.status)
    .bind(new.start)
    .bind(new.end)
    .bind(new.memo)
    .bind(new.layer.as_str())
    .bind(now)
    .fetch_one(pool)
    .await?;

    Ok(schedule)
}

pub async fn get_schedule_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<DbSchedule>> {
    tracing::debug!("Getting schedule by id: {}", id);

    let schedule = sqlx::query_as::<_, DbSchedule>(&format!(
        "SELECT {} FROM schedules WHERE id = $1",
        SCHEDULE_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(schedule)
}

/// Entries of all staff on one day, in insertion order.
pub async fn list_schedules_for_date(
    pool: &Pool<Postgres>,
    date: NaiveDate,
) -> Result<Vec<DbSchedule>> {
    let schedules = sqlx::query_as::<_, DbSchedule>(&format!(
        "SELECT {} FROM schedules WHERE date = $1 ORDER BY staff_id, created_at",
        SCHEDULE_COLUMNS
    ))
    .bind(date)
    .fetch_all(pool)
    .await?;

    Ok(schedules)
}

pub async fn list_schedules_for_staff(
    pool: &Pool<Postgres>,
    staff_id: i32,
    date: NaiveDate,
) -> Result<Vec<DbSchedule>> {
    let schedules = sqlx::query_as::<_, DbSchedule>(&format!(
        "SELECT {} FROM schedules WHERE staff_id = $1 AND date = $2 ORDER BY created_at",
        SCHEDULE_COLUMNS
    ))
    .bind(staff_id)
    .bind(date)
    .fetch_all(pool)
    .await?;

    Ok(schedules)
}

/// Entries whose date falls in `from..=to`, for duplicate checks during import.
pub async fn list_schedules_between(
    pool: &Pool<Postgres>,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<DbSchedule>> {
    let schedules = sqlx::query_as::<_, DbSchedule>(&format!(
        "SELECT {} FROM schedules WHERE date BETWEEN $1 AND $2",
        SCHEDULE_COLUMNS
    ))
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await?;

    Ok(schedules)
}

pub async fn update_schedule(
    pool: &Pool<Postgres>,
    id: Uuid,
    status: &str,
    start: f64,
    end: f64,
    memo: Option<&str>,
) -> Result<DbSchedule> {
    let schedule = sqlx::query_as::<_, DbSchedule>(&format!(
        r#"
        UPDATE schedules
        SET status = $2, start_hour = $3, end_hour = $4, memo = $5, updated_at = $6
        WHERE id = $1
        RETURNING {}
        "#,
        SCHEDULE_COLUMNS
    ))
    .bind(id)
    .bind(status)
    .bind(start)
    .bind(end)
    .bind(memo)
    .bind(Utc::now())
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| eyre!("Schedule not found"))?;

    Ok(schedule)
}

/// Returns whether a row was deleted.
pub async fn delete_schedule(pool: &Pool<Postgres>, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM schedules WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Inserts resolved import rows as adjustment entries in one transaction.
pub async fn import_schedules(
    pool: &Pool<Postgres>,
    rows: &[(i32, ScheduleImportRow)],
    row_count: usize,
    created_by: Option<&str>,
) -> Result<DbImportBatch> {
    let now = Utc::now();
    let mut tx = pool.begin().await?;

    let batch =
        import_batch::insert_batch(&mut *tx, ImportKind::Schedules, row_count, created_by).await?;

    for (staff_id, row) in rows {
        sqlx::query(
            r#"
            INSERT INTO schedules (id, staff_id, date, status, start_hour, end_hour, memo, layer,
                                   import_batch_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(staff_id)
        .bind(row.date)
        .bind(&row.status)
        .bind(row.start)
        .bind(row.end)
        .bind(row.memo.as_deref())
        .bind(ScheduleLayer::Adjustment.as_str())
        .bind(batch.id)
        .bind(now)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    tracing::info!("Imported {} schedules in batch {}", rows.len(), batch.id);
    Ok(batch)
}
