use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use mockall::predicate;
use pretty_assertions::assert_eq;
use shiftboard_api::{handlers::import::resolve_staff_ids, middleware::error_handling::AppError};
use shiftboard_core::{
    errors::ShiftError,
    import::{parse_staff_upload, plan_staff_sync, validate_staff_rows},
    models::{
        import::{RollbackResponse, ScheduleImportRow},
        staff::{Staff, StaffSyncResponse},
    },
};
use uuid::Uuid;

use crate::test_utils::{TestContext, db_batch, db_staff};

// Mirrors the staff sync handler with the repository calls going to mocks.
async fn test_sync_wrapper(
    ctx: &TestContext,
    upload: &str,
) -> Result<StaffSyncResponse, AppError> {
    let rows = parse_staff_upload(upload)?;
    validate_staff_rows(&rows)?;

    let existing: Vec<Staff> = ctx
        .staff_repo
        .list_all_staff()
        .await?
        .into_iter()
        .map(Staff::from)
        .collect();
    let plan = plan_staff_sync(&existing, &rows)?;
    let (added, updated, deactivated) = (
        plan.to_create.len(),
        plan.to_update.len(),
        plan.to_deactivate.len(),
    );

    let batch = ctx
        .staff_repo
        .apply_staff_sync(plan, rows.len(), Some("admin@example.com"))
        .await?;

    Ok(StaffSyncResponse {
        batch_id: batch.id,
        added,
        updated,
        deactivated,
    })
}

#[tokio::test]
async fn test_sync_creates_updates_and_deactivates() {
    let mut ctx = TestContext::new();
    ctx.staff_repo.expect_list_all_staff().returning(|| {
        Ok(vec![
            db_staff(1, "1001", "Sato", true),
            db_staff(2, "1002", "Suzuki", true),
            db_staff(3, "1003", "Tanaka", false),
        ])
    });
    ctx.staff_repo
        .expect_apply_staff_sync()
        .withf(|plan, row_count, created_by| {
            *row_count == 3
                && plan.to_create.len() == 1
                && plan.to_deactivate == vec![2]
                && *created_by == Some("admin@example.com")
        })
        .times(1)
        .returning(|_, row_count, _| Ok(db_batch("staff", row_count as i32)));

    let upload = r#"{"employeeData": [
        {"empNo": "1001", "name": "Sato"},
        {"empNo": "1003", "name": "Tanaka"},
        {"empNo": "1004", "name": "Ito"}
    ]}"#;
    let response = test_sync_wrapper(&ctx, upload).await.unwrap();

    assert_eq!(response.added, 1);
    assert_eq!(response.updated, 2);
    assert_eq!(response.deactivated, 1);
}

#[tokio::test]
async fn test_rejected_characters_touch_nothing() {
    let mut ctx = TestContext::new();
    ctx.staff_repo.expect_list_all_staff().times(0);
    ctx.staff_repo.expect_apply_staff_sync().times(0);

    let upload = "employeeId,name\n1001,Sato\n1002,bad@name\n";
    let err = test_sync_wrapper(&ctx, upload).await.unwrap_err();

    match err.0 {
        ShiftError::ImportRejected(violations) => {
            assert_eq!(violations.len(), 1);
            assert_eq!(violations[0].row, 2);
            assert_eq!(violations[0].field, "name");
        }
        other => panic!("expected an import rejection, got {:?}", other),
    }
}

#[tokio::test]
async fn test_rollback_refusal_is_passed_through() {
    let mut ctx = TestContext::new();
    let id = Uuid::new_v4();
    ctx.import_batch_repo
        .expect_rollback_batch()
        .with(predicate::eq(id), predicate::always())
        .returning(|id, _| {
            Err(ShiftError::Conflict(format!(
                "Import batch {} was already rolled back",
                id
            )))
        });

    let result: Result<RollbackResponse, AppError> = ctx
        .import_batch_repo
        .rollback_batch(id, Utc::now())
        .await
        .map_err(AppError);

    assert!(matches!(result, Err(AppError(ShiftError::Conflict(_)))));
}

fn row(employee_id: &str) -> ScheduleImportRow {
    ScheduleImportRow {
        employee_id: employee_id.to_string(),
        date: NaiveDate::from_ymd_opt(2025, 6, 23).unwrap(),
        status: "online".to_string(),
        start: 9.0,
        end: 18.0,
        memo: None,
    }
}

#[test]
fn test_rows_resolve_to_staff_ids() {
    let known = HashMap::from([("1001".to_string(), 11), ("1002".to_string(), 12)]);

    let resolved = resolve_staff_ids(vec![row("1002"), row("1001")], &known).unwrap();

    assert_eq!(
        resolved.iter().map(|(id, _)| *id).collect::<Vec<_>>(),
        vec![12, 11]
    );
}

#[test]
fn test_unknown_employee_names_the_row() {
    let known = HashMap::from([("1001".to_string(), 11)]);

    let err = resolve_staff_ids(vec![row("1001"), row("9999")], &known).unwrap_err();

    assert_eq!(err.to_string(), "Validation error: Row 2: unknown employee 9999");
}
