use axum::{Json, extract::State};
use chrono::Utc;
use serde_json::json;
use std::{collections::HashMap, sync::Arc};

use shiftboard_core::{
    errors::{ShiftError, ShiftResult},
    import::{schedule_rows_from_csv, split_duplicate_rows},
    models::{
        audit::AuditEntry,
        import::{
            ImportBatch, RollbackRequest, RollbackResponse, ScheduleImportResponse,
            ScheduleImportRow,
        },
        schedule::ScheduleEntry,
    },
};
use shiftboard_db::repositories::{import_batch, schedule, staff};

use crate::{
    ApiState,
    handlers::audit,
    middleware::{auth::AuthUser, error_handling::AppError},
};

const HISTORY_LIMIT: i64 = 50;

/// Attaches staff ids to import rows. Any unknown employee number rejects the file.
pub fn resolve_staff_ids(
    rows: Vec<ScheduleImportRow>,
    known: &HashMap<String, i32>,
) -> ShiftResult<Vec<(i32, ScheduleImportRow)>> {
    rows.into_iter()
        .enumerate()
        .map(|(i, row)| match known.get(&row.employee_id) {
            Some(id) => Ok((*id, row)),
            None => Err(ShiftError::Validation(format!(
                "Row {}: unknown employee {}",
                i + 1,
                row.employee_id
            ))),
        })
        .collect()
}

#[axum::debug_handler]
pub async fn import_schedules(
    State(state): State<Arc<ApiState>>,
    caller: AuthUser,
    body: String,
) -> Result<Json<ScheduleImportResponse>, AppError> {
    caller.require_admin()?;

    let rows = schedule_rows_from_csv(&body)?;
    let row_count = rows.len();
    if rows.is_empty() {
        return Err(ShiftError::Validation("The file has no data rows".to_string()).into());
    }

    let mut employee_ids: Vec<String> = rows.iter().map(|r| r.employee_id.clone()).collect();
    employee_ids.sort();
    employee_ids.dedup();
    let known: HashMap<String, i32> = staff::staff_ids_by_employee_id(&state.db_pool, &employee_ids)
        .await?
        .into_iter()
        .collect();
    let resolved = resolve_staff_ids(rows, &known)?;

    // `resolved` is non-empty here.
    let from = resolved.iter().map(|(_, r)| r.date).min().unwrap_or_default();
    let to = resolved.iter().map(|(_, r)| r.date).max().unwrap_or_default();
    let existing: Vec<ScheduleEntry> = schedule::list_schedules_between(&state.db_pool, from, to)
        .await?
        .into_iter()
        .map(ScheduleEntry::from)
        .collect();

    let (kept, skipped_duplicates) = split_duplicate_rows(resolved, &existing);
    let batch =
        schedule::import_schedules(&state.db_pool, &kept, row_count, Some(&caller.email)).await?;

    let response = ScheduleImportResponse {
        batch_id: batch.id,
        imported: kept.len(),
        skipped_duplicates,
    };
    audit(
        &state,
        AuditEntry::success(
            Some(caller.email.clone()),
            "schedule_import",
            "schedules",
            json!(response),
        ),
    )
    .await;

    Ok(Json(response))
}

#[axum::debug_handler]
pub async fn rollback(
    State(state): State<Arc<ApiState>>,
    caller: AuthUser,
    Json(payload): Json<RollbackRequest>,
) -> Result<Json<RollbackResponse>, AppError> {
    caller.require_admin()?;

    match import_batch::rollback_batch(&state.db_pool, payload.batch_id, Utc::now()).await {
        Ok(result) => {
            audit(
                &state,
                AuditEntry::success(
                    Some(caller.email.clone()),
                    "rollback",
                    "import_batches",
                    json!(result),
                ),
            )
            .await;
            Ok(Json(result))
        }
        Err(err) => {
            audit(
                &state,
                AuditEntry::failure(
                    Some(caller.email.clone()),
                    "rollback",
                    "import_batches",
                    json!({ "batchId": payload.batch_id }),
                    err.to_string(),
                ),
            )
            .await;
            Err(err.into())
        }
    }
}

#[axum::debug_handler]
pub async fn history(
    State(state): State<Arc<ApiState>>,
    caller: AuthUser,
) -> Result<Json<Vec<ImportBatch>>, AppError> {
    caller.require_admin()?;

    let batches = import_batch::list_batches(&state.db_pool, HISTORY_LIMIT)
        .await?
        .into_iter()
        .map(ImportBatch::try_from)
        .collect::<eyre::Result<Vec<_>>>()?;

    Ok(Json(batches))
}
