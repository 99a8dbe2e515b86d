//! # Monthly Plan Handlers
//!
//! Submissions of pending entries (custom, composite or from a preset) and the
//! approval workflow on top of them. Approval actions are admin only; a cell that
//! holds an approved entry refuses further submissions.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use shiftboard_core::{
    errors::{ShiftError, ShiftResult},
    models::{
        audit::AuditEntry,
        pending::{
            ApplyPresetRequest, ApplyPresetResponse, ApprovalRequest, CreatePendingRequest,
            MonthlyPendingQuery, PendingSchedule, PendingSegment, PendingType, ReasonRequest,
            UpdatePendingRequest,
        },
        preset::Preset,
        schedule::{validate_status, validate_time_range},
    },
    presets::{default_presets, filter_duplicate_entries, find_preset},
};
use shiftboard_db::repositories::pending::{self, Submission};

use crate::{
    ApiState,
    handlers::{audit, schedule::resolved_staff_day},
    middleware::{auth::AuthUser, error_handling::AppError},
};

/// First day of the month and first day of the next one.
pub fn month_bounds(year: i32, month: u32) -> ShiftResult<(NaiveDate, NaiveDate)> {
    let invalid = || ShiftError::Validation(format!("Invalid month {}-{}", year, month));
    let from = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
    let until = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(invalid)?;
    Ok((from, until))
}

/// Checks every segment of a submission and picks its type. More than one segment
/// is always a composite entry.
pub fn prepare_segments(
    segments: &[PendingSegment],
    requested: PendingType,
) -> ShiftResult<PendingType> {
    if segments.is_empty() {
        return Err(ShiftError::Validation(
            "A submission needs at least one segment".to_string(),
        ));
    }
    for segment in segments {
        validate_status(&segment.status)?;
        validate_time_range(segment.start, segment.end)?;
    }
    Ok(if segments.len() > 1 {
        PendingType::Composite
    } else {
        requested
    })
}

fn ensure_own_cell(caller: &AuthUser, staff_id: i32) -> Result<(), ShiftError> {
    if caller.is_admin() || caller.staff_id == Some(staff_id) {
        Ok(())
    } else {
        Err(ShiftError::Authorization(
            "You can only submit entries for yourself".to_string(),
        ))
    }
}

async fn submit(
    state: &ApiState,
    caller: &AuthUser,
    staff_id: i32,
    date: NaiveDate,
    pending_type: PendingType,
    segments: &[PendingSegment],
) -> Result<Vec<PendingSchedule>, AppError> {
    let created = pending::create_submission(
        &state.db_pool,
        &Submission {
            staff_id,
            date,
            pending_type,
            segments,
            created_by: Some(&caller.email),
        },
    )
    .await?;

    Ok(created.into_iter().map(PendingSchedule::from).collect())
}

#[axum::debug_handler]
pub async fn create_pending(
    State(state): State<Arc<ApiState>>,
    caller: AuthUser,
    Json(payload): Json<CreatePendingRequest>,
) -> Result<(StatusCode, Json<Vec<PendingSchedule>>), AppError> {
    ensure_own_cell(&caller, payload.staff_id)?;
    let pending_type = prepare_segments(&payload.segments, payload.pending_type)?;

    let created = submit(
        &state,
        &caller,
        payload.staff_id,
        payload.date,
        pending_type,
        &payload.segments,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

async fn lookup_preset(state: &ApiState, id: &str) -> Result<Preset, AppError> {
    if let Some(preset) = find_preset(&default_presets(), id) {
        return Ok(preset.clone());
    }
    state
        .temp_presets
        .get(id)
        .await?
        .map(|t| t.preset)
        .ok_or_else(|| ShiftError::NotFound(format!("Preset {}", id)).into())
}

/// Applies a preset to a cell. Segments that would exactly recreate what the day
/// already shows are skipped; the rest go in as one submission.
#[axum::debug_handler]
pub async fn apply_preset(
    State(state): State<Arc<ApiState>>,
    caller: AuthUser,
    Json(payload): Json<ApplyPresetRequest>,
) -> Result<Json<ApplyPresetResponse>, AppError> {
    ensure_own_cell(&caller, payload.staff_id)?;
    let preset = lookup_preset(&state, &payload.preset_id).await?;

    let existing = resolved_staff_day(&state, payload.staff_id, payload.date).await?;
    let kept = filter_duplicate_entries(&preset.entries, &existing);
    let skipped = preset.entries.len() - kept.len();

    if kept.is_empty() {
        tracing::debug!(
            "Preset {} adds nothing for staff {} on {}",
            preset.id,
            payload.staff_id,
            payload.date
        );
        return Ok(Json(ApplyPresetResponse {
            created: Vec::new(),
            skipped,
        }));
    }

    let segments: Vec<PendingSegment> = kept
        .into_iter()
        .map(|e| PendingSegment {
            status: e.status,
            start: e.start_time,
            end: e.end_time,
            memo: e.memo,
        })
        .collect();
    let pending_type = prepare_segments(&segments, PendingType::Preset)?;
    let created = submit(
        &state,
        &caller,
        payload.staff_id,
        payload.date,
        pending_type,
        &segments,
    )
    .await?;

    Ok(Json(ApplyPresetResponse { created, skipped }))
}

#[axum::debug_handler]
pub async fn list_monthly(
    State(state): State<Arc<ApiState>>,
    _caller: AuthUser,
    Query(query): Query<MonthlyPendingQuery>,
) -> Result<Json<Vec<PendingSchedule>>, AppError> {
    let (from, until) = month_bounds(query.year, query.month)?;

    let entries = pending::list_pending_between(&state.db_pool, from, until, query.staff_id)
        .await?
        .into_iter()
        .map(PendingSchedule::from)
        .collect();

    Ok(Json(entries))
}

async fn load(state: &ApiState, id: Uuid) -> Result<PendingSchedule, AppError> {
    pending::get_pending_by_id(&state.db_pool, id)
        .await?
        .map(PendingSchedule::from)
        .ok_or_else(|| ShiftError::NotFound(format!("Pending entry {}", id)).into())
}

/// Loads an entry, applies `change` and writes it back guarded by the timestamp
/// that was read. The outcome is audited either way.
async fn transition<F>(
    state: &ApiState,
    caller: &AuthUser,
    id: Uuid,
    action: &str,
    change: F,
) -> Result<Json<PendingSchedule>, AppError>
where
    F: FnOnce(&mut PendingSchedule, DateTime<Utc>) -> ShiftResult<()>,
{
    let mut entry = load(state, id).await?;
    let read_at = entry.updated_at;

    let result = match change(&mut entry, Utc::now()) {
        Ok(()) => pending::save_pending(&state.db_pool, &entry, read_at).await,
        Err(err) => Err(err),
    };

    let detail = json!({
        "id": id,
        "staffId": entry.staff_id,
        "date": entry.date,
    });
    match result {
        Ok(saved) => {
            audit(
                state,
                AuditEntry::success(Some(caller.email.clone()), action, "pending", detail),
            )
            .await;
            tracing::info!("{} applied to pending entry {} by {}", action, id, caller.email);
            Ok(Json(saved.into()))
        }
        Err(err) => {
            audit(
                state,
                AuditEntry::failure(
                    Some(caller.email.clone()),
                    action,
                    "pending",
                    detail,
                    err.to_string(),
                ),
            )
            .await;
            Err(err.into())
        }
    }
}

#[axum::debug_handler]
pub async fn approve(
    State(state): State<Arc<ApiState>>,
    caller: AuthUser,
    Path(id): Path<Uuid>,
    payload: Option<Json<ApprovalRequest>>,
) -> Result<Json<PendingSchedule>, AppError> {
    caller.require_admin()?;
    let reason = payload.and_then(|Json(p)| p.reason);
    let approver = caller.email.clone();

    transition(&state, &caller, id, "approve", |entry, now| {
        entry.approve(&approver, reason.as_deref(), now)
    })
    .await
}

#[axum::debug_handler]
pub async fn reject(
    State(state): State<Arc<ApiState>>,
    caller: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReasonRequest>,
) -> Result<Json<PendingSchedule>, AppError> {
    caller.require_admin()?;
    let rejector = caller.email.clone();

    transition(&state, &caller, id, "reject", |entry, now| {
        entry.reject(&rejector, &payload.reason, now)
    })
    .await
}

#[axum::debug_handler]
pub async fn unapprove(
    State(state): State<Arc<ApiState>>,
    caller: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReasonRequest>,
) -> Result<Json<PendingSchedule>, AppError> {
    caller.require_admin()?;

    transition(&state, &caller, id, "unapprove", |entry, now| {
        entry.unapprove(&payload.reason, now)
    })
    .await
}

#[axum::debug_handler]
pub async fn update_pending(
    State(state): State<Arc<ApiState>>,
    caller: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePendingRequest>,
) -> Result<Json<PendingSchedule>, AppError> {
    let entry = load(&state, id).await?;
    ensure_own_cell(&caller, entry.staff_id)?;

    transition(&state, &caller, id, "update", |entry, now| {
        entry.apply_update(&payload, now)
    })
    .await
}

/// Only the creator or an admin may delete, and never an approved entry.
pub fn ensure_may_delete(entry: &PendingSchedule, caller: &AuthUser) -> ShiftResult<()> {
    let is_creator = entry.created_by.as_deref() == Some(caller.email.as_str());
    if !is_creator && !caller.is_admin() {
        return Err(ShiftError::Authorization(
            "Only the creator or an administrator can delete this entry".to_string(),
        ));
    }
    entry.ensure_deletable()
}

#[axum::debug_handler]
pub async fn delete_pending(
    State(state): State<Arc<ApiState>>,
    caller: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let entry = load(&state, id).await?;

    let result = match ensure_may_delete(&entry, &caller) {
        Ok(()) => pending::delete_pending(&state.db_pool, id, entry.updated_at).await,
        Err(err) => Err(err),
    };

    let detail = json!({ "id": id, "staffId": entry.staff_id, "date": entry.date });
    match result {
        Ok(()) => {
            audit(
                &state,
                AuditEntry::success(Some(caller.email.clone()), "delete", "pending", detail),
            )
            .await;
            Ok(StatusCode::NO_CONTENT)
        }
        Err(err) => {
            audit(
                &state,
                AuditEntry::failure(
                    Some(caller.email.clone()),
                    "delete",
                    "pending",
                    detail,
                    err.to_string(),
                ),
            )
            .await;
            Err(err.into())
        }
    }
}
