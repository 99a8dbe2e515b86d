use chrono::{DateTime, NaiveDate, Utc};
use mockall::predicate;
use pretty_assertions::assert_eq;
use rstest::rstest;
use shiftboard_api::{
    handlers::pending::{ensure_may_delete, month_bounds, prepare_segments},
    middleware::{auth::AuthUser, error_handling::AppError},
};
use shiftboard_core::{
    errors::{ShiftError, ShiftResult},
    models::{
        auth::UserRole,
        pending::{ApprovalState, PendingSchedule, PendingSegment, PendingType},
    },
};
use shiftboard_db::models::DbPendingSchedule;
use uuid::Uuid;

use crate::test_utils::{TestContext, db_pending};

fn caller(role: UserRole, email: &str) -> AuthUser {
    AuthUser {
        user_id: Uuid::new_v4(),
        email: email.to_string(),
        role,
        staff_id: Some(3),
        issued_at: Utc::now(),
    }
}

fn segment(status: &str, start: f64, end: f64) -> PendingSegment {
    PendingSegment {
        status: status.to_string(),
        start,
        end,
        memo: None,
    }
}

// Mirrors the approval handlers: load, transition, write back guarded by the
// timestamp that was read.
async fn test_transition_wrapper<F>(
    ctx: &TestContext,
    id: Uuid,
    change: F,
) -> Result<PendingSchedule, AppError>
where
    F: FnOnce(&mut PendingSchedule, DateTime<Utc>) -> ShiftResult<()>,
{
    let mut entry: PendingSchedule = ctx
        .pending_repo
        .get_pending_by_id(id)
        .await?
        .map(PendingSchedule::from)
        .ok_or(AppError(ShiftError::NotFound(format!("Pending entry {}", id))))?;
    let read_at = entry.updated_at;

    change(&mut entry, Utc::now())?;
    let saved = ctx.pending_repo.save_pending(entry, read_at).await?;
    Ok(saved.into())
}

fn echo_saved(entry: PendingSchedule) -> DbPendingSchedule {
    DbPendingSchedule {
        id: entry.id,
        staff_id: entry.staff_id,
        date: entry.date,
        status: entry.status,
        start_hour: entry.start,
        end_hour: entry.end,
        memo: entry.memo,
        pending_type: entry.pending_type.as_str().to_string(),
        approved_by: entry.approved_by,
        approved_at: entry.approved_at,
        approval_note: entry.approval_note,
        rejected_by: entry.rejected_by,
        rejected_at: entry.rejected_at,
        rejection_reason: entry.rejection_reason,
        unapproval_reason: entry.unapproval_reason,
        created_by: entry.created_by,
        import_batch_id: entry.import_batch_id,
        created_at: entry.created_at,
        updated_at: entry.updated_at,
    }
}

#[tokio::test]
async fn test_approve_saves_with_read_timestamp() {
    let mut ctx = TestContext::new();
    let row = db_pending("staff@example.com");
    let id = row.id;
    let read_at = row.updated_at;

    ctx.pending_repo
        .expect_get_pending_by_id()
        .with(predicate::eq(id))
        .returning(move |_| Ok(Some(row.clone())));
    ctx.pending_repo
        .expect_save_pending()
        .withf(move |entry, expected| *expected == read_at && entry.approved_at.is_some())
        .times(1)
        .returning(|entry, _| Ok(echo_saved(entry)));

    let saved = test_transition_wrapper(&ctx, id, |entry, now| {
        entry.approve("admin@example.com", Some("ok"), now)
    })
    .await
    .unwrap();

    assert_eq!(saved.state(), ApprovalState::Approved);
    assert_eq!(saved.approval_note.as_deref(), Some("ok"));
}

#[tokio::test]
async fn test_concurrent_change_is_a_conflict() {
    let mut ctx = TestContext::new();
    let row = db_pending("staff@example.com");
    let id = row.id;

    ctx.pending_repo
        .expect_get_pending_by_id()
        .returning(move |_| Ok(Some(row.clone())));
    ctx.pending_repo.expect_save_pending().returning(|_, _| {
        Err(ShiftError::Conflict(
            "The entry was changed by someone else; reload and retry".to_string(),
        ))
    });

    let err = test_transition_wrapper(&ctx, id, |entry, now| {
        entry.reject("admin@example.com", "overlaps training", now)
    })
    .await
    .unwrap_err();

    assert!(matches!(err.0, ShiftError::Conflict(_)));
}

#[tokio::test]
async fn test_invalid_transition_is_never_saved() {
    let mut ctx = TestContext::new();
    let row = db_pending("staff@example.com");
    let id = row.id;

    ctx.pending_repo
        .expect_get_pending_by_id()
        .returning(move |_| Ok(Some(row.clone())));
    ctx.pending_repo.expect_save_pending().times(0);

    let err = test_transition_wrapper(&ctx, id, |entry, now| {
        entry.reject("admin@example.com", "   ", now)
    })
    .await
    .unwrap_err();

    assert!(matches!(err.0, ShiftError::Validation(_)));
}

#[tokio::test]
async fn test_missing_entry_is_not_found() {
    let mut ctx = TestContext::new();
    ctx.pending_repo
        .expect_get_pending_by_id()
        .returning(|_| Ok(None));

    let err = test_transition_wrapper(&ctx, Uuid::new_v4(), |entry, now| {
        entry.approve("admin@example.com", None, now)
    })
    .await
    .unwrap_err();

    assert!(matches!(err.0, ShiftError::NotFound(_)));
}

#[test]
fn test_creator_or_admin_may_delete() {
    let entry: PendingSchedule = db_pending("staff@example.com").into();

    assert!(ensure_may_delete(&entry, &caller(UserRole::Staff, "staff@example.com")).is_ok());
    assert!(ensure_may_delete(&entry, &caller(UserRole::Admin, "admin@example.com")).is_ok());
    assert!(matches!(
        ensure_may_delete(&entry, &caller(UserRole::Staff, "other@example.com")),
        Err(ShiftError::Authorization(_))
    ));
}

#[test]
fn test_approved_entry_cannot_be_deleted_even_by_admin() {
    let mut entry: PendingSchedule = db_pending("staff@example.com").into();
    entry.approve("admin@example.com", None, Utc::now()).unwrap();

    assert!(matches!(
        ensure_may_delete(&entry, &caller(UserRole::Admin, "admin@example.com")),
        Err(ShiftError::Conflict(_))
    ));
}

// Mirrors the delete handler: permission check on the read entry, then a delete
// guarded by the timestamp that was read.
async fn test_delete_wrapper(ctx: &TestContext, id: Uuid, caller: &AuthUser) -> Result<(), AppError> {
    let entry: PendingSchedule = ctx
        .pending_repo
        .get_pending_by_id(id)
        .await?
        .map(PendingSchedule::from)
        .ok_or(AppError(ShiftError::NotFound(format!("Pending entry {}", id))))?;
    ensure_may_delete(&entry, caller)?;
    ctx.pending_repo.delete_pending(id, entry.updated_at).await?;
    Ok(())
}

#[tokio::test]
async fn test_delete_is_guarded_by_read_timestamp() {
    let mut ctx = TestContext::new();
    let row = db_pending("staff@example.com");
    let id = row.id;
    let read_at = row.updated_at;

    ctx.pending_repo
        .expect_get_pending_by_id()
        .returning(move |_| Ok(Some(row.clone())));
    ctx.pending_repo
        .expect_delete_pending()
        .with(predicate::eq(id), predicate::eq(read_at))
        .times(1)
        .returning(|_, _| Ok(()));

    test_delete_wrapper(&ctx, id, &caller(UserRole::Staff, "staff@example.com"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_approval_after_read_blocks_delete() {
    let mut ctx = TestContext::new();
    let row = db_pending("staff@example.com");
    let id = row.id;

    ctx.pending_repo
        .expect_get_pending_by_id()
        .returning(move |_| Ok(Some(row.clone())));
    ctx.pending_repo.expect_delete_pending().returning(|_, _| {
        Err(ShiftError::Conflict(
            "The entry was changed by someone else; reload and retry".to_string(),
        ))
    });

    let err = test_delete_wrapper(&ctx, id, &caller(UserRole::Admin, "admin@example.com"))
        .await
        .unwrap_err();

    assert!(matches!(err.0, ShiftError::Conflict(_)));
}

#[rstest]
#[case(PendingType::Custom, 1, PendingType::Custom)]
#[case(PendingType::Preset, 1, PendingType::Preset)]
#[case(PendingType::Custom, 2, PendingType::Composite)]
#[case(PendingType::Preset, 3, PendingType::Composite)]
fn test_segment_count_sets_type(
    #[case] requested: PendingType,
    #[case] count: usize,
    #[case] expected: PendingType,
) {
    let segments: Vec<PendingSegment> = (0..count)
        .map(|i| segment("online", 9.0 + i as f64, 10.0 + i as f64))
        .collect();

    assert_eq!(prepare_segments(&segments, requested).unwrap(), expected);
}

#[test]
fn test_bad_segments_are_rejected() {
    assert!(prepare_segments(&[], PendingType::Custom).is_err());
    assert!(prepare_segments(&[segment("online", 12.0, 10.0)], PendingType::Custom).is_err());
    assert!(prepare_segments(&[segment(" ", 9.0, 10.0)], PendingType::Custom).is_err());
}

#[rstest]
#[case(2025, 6, (2025, 6, 1), (2025, 7, 1))]
#[case(2025, 12, (2025, 12, 1), (2026, 1, 1))]
fn test_month_bounds(
    #[case] year: i32,
    #[case] month: u32,
    #[case] from: (i32, u32, u32),
    #[case] until: (i32, u32, u32),
) {
    let (f, u) = month_bounds(year, month).unwrap();
    assert_eq!(f, NaiveDate::from_ymd_opt(from.0, from.1, from.2).unwrap());
    assert_eq!(u, NaiveDate::from_ymd_opt(until.0, until.1, until.2).unwrap());
}

#[test]
fn test_month_out_of_range() {
    assert!(month_bounds(2025, 13).is_err());
    assert!(month_bounds(2025, 0).is_err());
}
