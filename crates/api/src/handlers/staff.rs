use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde_json::json;
use std::sync::Arc;

use shiftboard_core::{
    errors::ShiftError,
    import::{parse_staff_upload, plan_staff_sync, validate_staff_rows},
    models::{
        audit::AuditEntry,
        contract::{Contract, UpsertContractRequest},
        import::{StaffImportPayload, StaffImportRow},
        staff::{CreateStaffRequest, Staff, StaffSyncResponse, UpdateStaffRequest},
    },
};
use shiftboard_db::repositories::{contract, staff};

use crate::{
    ApiState,
    handlers::audit,
    middleware::{auth::AuthUser, error_handling::AppError},
};

#[axum::debug_handler]
pub async fn list_staff(
    State(state): State<Arc<ApiState>>,
    _caller: AuthUser,
) -> Result<Json<Vec<Staff>>, AppError> {
    let staff = staff::list_active_staff(&state.db_pool)
        .await?
        .into_iter()
        .map(Staff::from)
        .collect();

    Ok(Json(staff))
}

#[axum::debug_handler]
pub async fn create_staff(
    State(state): State<Arc<ApiState>>,
    caller: AuthUser,
    Json(payload): Json<CreateStaffRequest>,
) -> Result<(StatusCode, Json<Staff>), AppError> {
    caller.require_admin()?;

    let employee_id = payload.employee_id.trim();
    if employee_id.is_empty() || payload.name.trim().is_empty() {
        return Err(ShiftError::Validation("employeeId and name are required".into()).into());
    }
    validate_staff_rows(&[StaffImportRow {
        employee_id: employee_id.to_string(),
        name: payload.name.clone(),
        department: payload.department.clone(),
        group: payload.group.clone(),
    }])?;

    if staff::get_staff_by_employee_id(&state.db_pool, employee_id)
        .await?
        .is_some()
    {
        return Err(ShiftError::Conflict(format!(
            "Employee {} already exists",
            employee_id
        ))
        .into());
    }

    let created = staff::create_staff(
        &state.db_pool,
        employee_id,
        payload.name.trim(),
        payload.department.trim(),
        payload.group.trim(),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(created.into())))
}

#[axum::debug_handler]
pub async fn update_staff(
    State(state): State<Arc<ApiState>>,
    caller: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateStaffRequest>,
) -> Result<Json<Staff>, AppError> {
    caller.require_admin()?;

    // Only the fields being changed are checked.
    validate_staff_rows(&[StaffImportRow {
        employee_id: String::new(),
        name: payload.name.clone().unwrap_or_default(),
        department: payload.department.clone().unwrap_or_default(),
        group: payload.group.clone().unwrap_or_default(),
    }])?;

    let updated = staff::update_staff(&state.db_pool, id, &payload)
        .await?
        .ok_or_else(|| ShiftError::NotFound(format!("Staff {}", id)))?;

    Ok(Json(updated.into()))
}

#[axum::debug_handler]
pub async fn upsert_contract(
    State(state): State<Arc<ApiState>>,
    caller: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<UpsertContractRequest>,
) -> Result<Json<Contract>, AppError> {
    caller.require_admin()?;
    payload.validate()?;

    if staff::get_staff_by_id(&state.db_pool, id).await?.is_none() {
        return Err(ShiftError::NotFound(format!("Staff {}", id)).into());
    }
    let saved = contract::upsert_contract(&state.db_pool, id, &payload).await?;

    Ok(Json(saved.into()))
}

/// Validates, plans and applies a roster sync, then audits it.
async fn sync_staff(
    state: &ApiState,
    caller: &AuthUser,
    rows: Vec<StaffImportRow>,
) -> Result<Json<StaffSyncResponse>, AppError> {
    if let Err(err) = validate_staff_rows(&rows) {
        audit(
            state,
            AuditEntry::failure(
                Some(caller.email.clone()),
                "staff_sync",
                "staff",
                json!({ "rows": rows.len() }),
                err.to_string(),
            ),
        )
        .await;
        return Err(err.into());
    }

    let existing: Vec<Staff> = staff::list_all_staff(&state.db_pool)
        .await?
        .into_iter()
        .map(Staff::from)
        .collect();
    let plan = plan_staff_sync(&existing, &rows)?;

    let batch =
        staff::apply_staff_sync(&state.db_pool, &plan, rows.len(), Some(&caller.email)).await?;

    let response = StaffSyncResponse {
        batch_id: batch.id,
        added: plan.to_create.len(),
        updated: plan.to_update.len(),
        deactivated: plan.to_deactivate.len(),
    };
    audit(
        state,
        AuditEntry::success(
            Some(caller.email.clone()),
            "staff_sync",
            "staff",
            json!(response),
        ),
    )
    .await;

    Ok(Json(response))
}

/// Accepts the uploaded file as the raw body, JSON or CSV.
#[axum::debug_handler]
pub async fn sync_from_upload(
    State(state): State<Arc<ApiState>>,
    caller: AuthUser,
    body: String,
) -> Result<Json<StaffSyncResponse>, AppError> {
    caller.require_admin()?;
    let rows = parse_staff_upload(&body)?;
    sync_staff(&state, &caller, rows).await
}

#[axum::debug_handler]
pub async fn sync_from_json_body(
    State(state): State<Arc<ApiState>>,
    caller: AuthUser,
    Json(payload): Json<StaffImportPayload>,
) -> Result<Json<StaffSyncResponse>, AppError> {
    caller.require_admin()?;
    sync_staff(&state, &caller, payload.into_rows()).await
}
