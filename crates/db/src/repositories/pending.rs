//! Monthly-plan pending entries.
//!
//! Submissions for one cell (staff x date) are serialized with a transaction-scoped
//! advisory lock, so the "one unresolved entry per cell" check and the insert see
//! the same state.

use chrono::{Datelike, DateTime, NaiveDate, Utc};
use eyre::Result;
use sqlx::{PgConnection, Pool, Postgres};
use uuid::Uuid;

use shiftboard_core::approval::{ensure_cell_accepts_submission, ensure_cell_accepts_transition};
use shiftboard_core::errors::{ShiftError, ShiftResult};
use shiftboard_core::models::pending::{PendingSchedule, PendingSegment, PendingType};

use crate::models::DbPendingSchedule;
use crate::repositories::db_error;

const PENDING_COLUMNS: &str = "id, staff_id, date, status, start_hour, end_hour, memo, pending_type, \
                               approved_by, approved_at, approval_note, rejected_by, rejected_at, \
                               rejection_reason, unapproval_reason, created_by, import_batch_id, \
                               created_at, updated_at";

pub struct Submission<'a> {
    pub staff_id: i32,
    pub date: NaiveDate,
    pub pending_type: PendingType,
    pub segments: &'a [PendingSegment],
    pub created_by: Option<&'a str>,
}

pub async fn get_pending_by_id(
    pool: &Pool<Postgres>,
    id: Uuid,
) -> Result<Option<DbPendingSchedule>> {
    let pending = sqlx::query_as::<_, DbPendingSchedule>(&format!(
        "SELECT {} FROM pending_schedules WHERE id = $1",
        PENDING_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(pending)
}

/// Entries dated within `[from, until)`, optionally for one staff member.
pub async fn list_pending_between(
    pool: &Pool<Postgres>,
    from: NaiveDate,
    until: NaiveDate,
    staff_id: Option<i32>,
) -> Result<Vec<DbPendingSchedule>> {
    let pending = sqlx::query_as::<_, DbPendingSchedule>(&format!(
        r#"
        SELECT {}
        FROM pending_schedules
        WHERE date >= $1 AND date < $2 AND ($3::INTEGER IS NULL OR staff_id = $3)
        ORDER BY date, staff_id, start_hour
        "#,
        PENDING_COLUMNS
    ))
    .bind(from)
    .bind(until)
    .bind(staff_id)
    .fetch_all(pool)
    .await?;

    Ok(pending)
}

async fn cell_entries(
    conn: &mut PgConnection,
    staff_id: i32,
    date: NaiveDate,
) -> Result<Vec<DbPendingSchedule>, sqlx::Error> {
    sqlx::query_as::<_, DbPendingSchedule>(&format!(
        "SELECT {} FROM pending_schedules WHERE staff_id = $1 AND date = $2 ORDER BY start_hour",
        PENDING_COLUMNS
    ))
    .bind(staff_id)
    .bind(date)
    .fetch_all(conn)
    .await
}

async fn lock_cell(conn: &mut PgConnection, staff_id: i32, date: NaiveDate) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT pg_advisory_xact_lock($1, $2)")
        .bind(staff_id)
        .bind(date.num_days_from_ce())
        .execute(conn)
        .await?;
    Ok(())
}

/// Validates the submission against its cell and inserts every segment, atomically.
pub async fn create_submission(
    pool: &Pool<Postgres>,
    submission: &Submission<'_>,
) -> ShiftResult<Vec<DbPendingSchedule>> {
    let now = Utc::now();
    let mut tx = pool.begin().await.map_err(db_error)?;

    lock_cell(&mut tx, submission.staff_id, submission.date)
        .await
        .map_err(db_error)?;

    let cell: Vec<PendingSchedule> = cell_entries(&mut tx, submission.staff_id, submission.date)
        .await
        .map_err(db_error)?
        .into_iter()
        .map(PendingSchedule::from)
        .collect();
    ensure_cell_accepts_submission(&cell)?;

    let mut created = Vec::with_capacity(submission.segments.len());
    for segment in submission.segments {
        let row = sqlx::query_as::<_, DbPendingSchedule>(&format!(
            r#"
            INSERT INTO pending_schedules (id, staff_id, date, status, start_hour, end_hour, memo,
                                           pending_type, created_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)
            RETURNING {}
            "#,
            PENDING_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(submission.staff_id)
        .bind(submission.date)
        .bind(&segment.status)
        .bind(segment.start)
        .bind(segment.end)
        .bind(segment.memo.as_deref().filter(|m| !m.is_empty()))
        .bind(submission.pending_type.as_str())
        .bind(submission.created_by)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error)?;
        created.push(row);
    }

    tx.commit().await.map_err(db_error)?;

    tracing::debug!(
        "Created {} pending entries for staff {} on {}",
        created.len(),
        submission.staff_id,
        submission.date
    );
    Ok(created)
}

/// Writes back a transitioned entry. `expected_updated_at` is the timestamp the
/// caller read; a concurrent change makes the write fail with a conflict.
///
/// Runs under the cell lock so an entry leaving Rejected is checked against the
/// rest of its cell the same way a new submission is.
pub async fn save_pending(
    pool: &Pool<Postgres>,
    entry: &PendingSchedule,
    expected_updated_at: DateTime<Utc>,
) -> ShiftResult<DbPendingSchedule> {
    let mut tx = pool.begin().await.map_err(db_error)?;

    lock_cell(&mut tx, entry.staff_id, entry.date)
        .await
        .map_err(db_error)?;

    let (stored, others): (Vec<PendingSchedule>, Vec<PendingSchedule>) =
        cell_entries(&mut tx, entry.staff_id, entry.date)
            .await
            .map_err(db_error)?
            .into_iter()
            .map(PendingSchedule::from)
            .partition(|p| p.id == entry.id);
    let before = match stored.first() {
        Some(current) if current.updated_at == expected_updated_at => current.state(),
        _ => return Err(changed_concurrently()),
    };
    ensure_cell_accepts_transition(before, entry, &others)?;

    let row = sqlx::query_as::<_, DbPendingSchedule>(&format!(
        r#"
        UPDATE pending_schedules
        SET status = $2, start_hour = $3, end_hour = $4, memo = $5,
            approved_by = $6, approved_at = $7, approval_note = $8,
            rejected_by = $9, rejected_at = $10, rejection_reason = $11,
            unapproval_reason = $12, updated_at = $13
        WHERE id = $1 AND updated_at = $14
        RETURNING {}
        "#,
        PENDING_COLUMNS
    ))
    .bind(entry.id)
    .bind(&entry.status)
    .bind(entry.start)
    .bind(entry.end)
    .bind(entry.memo.as_deref())
    .bind(entry.approved_by.as_deref())
    .bind(entry.approved_at)
    .bind(entry.approval_note.as_deref())
    .bind(entry.rejected_by.as_deref())
    .bind(entry.rejected_at)
    .bind(entry.rejection_reason.as_deref())
    .bind(entry.unapproval_reason.as_deref())
    .bind(entry.updated_at)
    .bind(expected_updated_at)
    .fetch_optional(&mut *tx)
    .await
    .map_err(db_error)?
    .ok_or_else(changed_concurrently)?;

    tx.commit().await.map_err(db_error)?;
    Ok(row)
}

fn changed_concurrently() -> ShiftError {
    ShiftError::Conflict("The entry was changed by someone else; reload and retry".to_string())
}

/// Deletes an entry that is still as the caller read it. Approved entries are
/// never deleted, even when the approval landed after the read.
pub async fn delete_pending(
    pool: &Pool<Postgres>,
    id: Uuid,
    expected_updated_at: DateTime<Utc>,
) -> ShiftResult<()> {
    let result = sqlx::query(
        "DELETE FROM pending_schedules WHERE id = $1 AND updated_at = $2 AND approved_at IS NULL",
    )
    .bind(id)
    .bind(expected_updated_at)
    .execute(pool)
    .await
    .map_err(db_error)?;

    if result.rows_affected() > 0 {
        return Ok(());
    }
    match get_pending_by_id(pool, id).await? {
        Some(_) => Err(changed_concurrently()),
        None => Err(ShiftError::NotFound(format!("Pending entry {}", id))),
    }
}

/// Approved entries of one day, optionally for one staff member. These are the
/// monthly-plan contributions to the adjustment layer.
pub async fn list_approved_for_date(
    pool: &Pool<Postgres>,
    date: NaiveDate,
    staff_id: Option<i32>,
) -> Result<Vec<DbPendingSchedule>> {
    let approved = sqlx::query_as::<_, DbPendingSchedule>(&format!(
        r#"
        SELECT {}
        FROM pending_schedules
        WHERE date = $1 AND approved_at IS NOT NULL AND ($2::INTEGER IS NULL OR staff_id = $2)
        ORDER BY staff_id, approved_at
        "#,
        PENDING_COLUMNS
    ))
    .bind(date)
    .bind(staff_id)
    .fetch_all(pool)
    .await?;

    Ok(approved)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::mock::create_test_pool;
    use crate::repositories::staff;

    #[tokio::test]
    #[ignore = "needs a PostgreSQL test database"]
    async fn second_submission_for_a_cell_conflicts() {
        let pool = create_test_pool().await;
        let employee_id = format!("pc-{}", Uuid::new_v4().simple());
        let member = staff::create_staff(&pool, &employee_id, "Cell Test", "Support", "A")
            .await
            .unwrap();

        let segments = vec![PendingSegment {
            status: "online".to_string(),
            start: 9.0,
            end: 12.0,
            memo: None,
        }];
        let submission = Submission {
            staff_id: member.id,
            date: NaiveDate::from_ymd_opt(2025, 6, 23).unwrap(),
            pending_type: PendingType::Custom,
            segments: &segments,
            created_by: Some("planner@example.com"),
        };

        let created = create_submission(&pool, &submission).await.unwrap();
        assert_eq!(created.len(), 1);

        let again = create_submission(&pool, &submission).await;
        assert!(matches!(again, Err(ShiftError::Conflict(_))));

        delete_pending(&pool, created[0].id, created[0].updated_at)
            .await
            .unwrap();
    }

    async fn submit_remote(pool: &Pool<Postgres>, staff_id: i32, date: NaiveDate) -> PendingSchedule {
        let segments = vec![PendingSegment {
            status: "remote".to_string(),
            start: 10.0,
            end: 19.0,
            memo: None,
        }];
        let submission = Submission {
            staff_id,
            date,
            pending_type: PendingType::Custom,
            segments: &segments,
            created_by: Some("planner@example.com"),
        };
        create_submission(pool, &submission).await.unwrap()[0]
            .clone()
            .into()
    }

    async fn save(pool: &Pool<Postgres>, entry: &PendingSchedule, read_at: DateTime<Utc>) -> ShiftResult<PendingSchedule> {
        save_pending(pool, entry, read_at).await.map(PendingSchedule::from)
    }

    #[tokio::test]
    #[ignore = "needs a PostgreSQL test database"]
    async fn rejected_entry_cannot_come_back_next_to_a_new_submission() {
        let pool = create_test_pool().await;
        let employee_id = format!("rv-{}", Uuid::new_v4().simple());
        let member = staff::create_staff(&pool, &employee_id, "Revive Test", "Support", "A")
            .await
            .unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 6, 24).unwrap();

        let first = submit_remote(&pool, member.id, date).await;
        let mut rejected = first.clone();
        rejected.reject("admin@example.com", "too long", Utc::now()).unwrap();
        let rejected = save(&pool, &rejected, first.updated_at).await.unwrap();

        // The cell only holds a rejected entry, so a new submission is accepted.
        submit_remote(&pool, member.id, date).await;

        let mut edited = rejected.clone();
        edited
            .apply_update(
                &shiftboard_core::models::pending::UpdatePendingRequest {
                    end: Some(17.0),
                    ..Default::default()
                },
                Utc::now(),
            )
            .unwrap();
        assert!(matches!(
            save(&pool, &edited, rejected.updated_at).await,
            Err(ShiftError::Conflict(_))
        ));

        let mut approved = rejected.clone();
        approved.approve("admin@example.com", None, Utc::now()).unwrap();
        assert!(matches!(
            save(&pool, &approved, rejected.updated_at).await,
            Err(ShiftError::Conflict(_))
        ));
    }

    #[tokio::test]
    #[ignore = "needs a PostgreSQL test database"]
    async fn approved_submission_is_listed_for_its_day_until_unapproved() {
        let pool = create_test_pool().await;
        let employee_id = format!("ap-{}", Uuid::new_v4().simple());
        let member = staff::create_staff(&pool, &employee_id, "Approve Test", "Support", "A")
            .await
            .unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 6, 23).unwrap();

        let submitted = submit_remote(&pool, member.id, date).await;
        let mut approved = submitted.clone();
        approved.approve("admin@example.com", None, Utc::now()).unwrap();
        let approved = save(&pool, &approved, submitted.updated_at).await.unwrap();

        let listed = list_approved_for_date(&pool, date, Some(member.id)).await.unwrap();
        assert_eq!(listed.len(), 1);
        let entry = PendingSchedule::from(listed[0].clone()).approved_entry().unwrap();
        assert_eq!(entry.status, "remote");
        assert!(entry.approved_at.is_some());

        // Re-applying the identical preset adds nothing to the resolved day.
        let day = shiftboard_core::layers::resolve_day(
            vec![entry],
            date,
            &shiftboard_core::layers::HolidayCalendar::default(),
        );
        let preset = [shiftboard_core::models::preset::PresetEntry {
            status: "remote".to_string(),
            start_time: 10.0,
            end_time: 19.0,
            memo: None,
        }];
        assert!(shiftboard_core::presets::filter_duplicate_entries(&preset, &day).is_empty());

        assert!(matches!(
            delete_pending(&pool, approved.id, approved.updated_at).await,
            Err(ShiftError::Conflict(_))
        ));

        let mut reverted = approved.clone();
        reverted.unapprove("wrong day", Utc::now()).unwrap();
        save(&pool, &reverted, approved.updated_at).await.unwrap();
        assert!(list_approved_for_date(&pool, date, Some(member.id)).await.unwrap().is_empty());
    }
}
