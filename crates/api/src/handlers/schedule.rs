//! # Schedule Handlers
//!
//! The daily grid and the per-staff unified view, both built from the two layers:
//! contract entries derived from standing contracts, and adjustment entries. The
//! adjustment layer holds stored rows plus approved monthly-plan submissions. Only
//! stored adjustment rows can be created, edited or deleted here.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::NaiveDate;
use std::sync::Arc;
use uuid::Uuid;

use shiftboard_core::{
    errors::ShiftError,
    layers::{HolidayCalendar, contract_entries, resolve_day, resolve_grid, resolve_unified},
    models::{
        contract::Contract,
        pending::PendingSchedule,
        schedule::{
            CreateScheduleRequest, Holiday, LayeredScheduleQuery, LayeredScheduleResponse,
            ScheduleEntry, ScheduleLayer, UnifiedScheduleQuery, UnifiedScheduleResponse,
            UpdateScheduleRequest, validate_status, validate_time_range,
        },
        staff::Staff,
    },
};
use shiftboard_db::repositories::{
    contract, holiday, pending,
    schedule::{self, NewSchedule},
    staff,
};

use crate::{
    ApiState,
    middleware::{auth::AuthUser, error_handling::AppError},
};

/// Approved submissions for the day, as adjustment-layer entries.
async fn approved_entries(
    state: &ApiState,
    date: NaiveDate,
    staff_id: Option<i32>,
) -> Result<Vec<ScheduleEntry>, AppError> {
    Ok(pending::list_approved_for_date(&state.db_pool, date, staff_id)
        .await?
        .into_iter()
        .filter_map(|row| PendingSchedule::from(row).approved_entry())
        .collect())
}

async fn calendar_for(state: &ApiState, date: NaiveDate) -> Result<HolidayCalendar, AppError> {
    let holiday = holiday::get_holiday(&state.db_pool, date)
        .await?
        .map(Holiday::from);
    Ok(HolidayCalendar::new(holiday))
}

/// Both layers of one staff member's day, unresolved, with the day's calendar.
async fn staff_day(
    state: &ApiState,
    staff_id: i32,
    date: NaiveDate,
) -> Result<(Vec<ScheduleEntry>, HolidayCalendar), AppError> {
    let mut entries: Vec<ScheduleEntry> =
        schedule::list_schedules_for_staff(&state.db_pool, staff_id, date)
            .await?
            .into_iter()
            .map(ScheduleEntry::from)
            .collect();
    entries.extend(approved_entries(state, date, Some(staff_id)).await?);

    if let Some(row) = contract::get_contract(&state.db_pool, staff_id).await? {
        entries.extend(contract_entries(&Contract::from(row), date));
    }

    Ok((entries, calendar_for(state, date).await?))
}

/// The visible entries of one staff member's day, in paint order.
pub(crate) async fn resolved_staff_day(
    state: &ApiState,
    staff_id: i32,
    date: NaiveDate,
) -> Result<Vec<ScheduleEntry>, AppError> {
    let (entries, calendar) = staff_day(state, staff_id, date).await?;
    Ok(resolve_day(entries, date, &calendar))
}

fn ensure_can_edit(caller: &AuthUser, staff_id: i32) -> Result<(), ShiftError> {
    if caller.is_admin() || caller.staff_id == Some(staff_id) {
        Ok(())
    } else {
        Err(ShiftError::Authorization(
            "You can only edit your own schedule".to_string(),
        ))
    }
}

#[axum::debug_handler]
pub async fn get_layered(
    State(state): State<Arc<ApiState>>,
    _caller: AuthUser,
    Query(query): Query<LayeredScheduleQuery>,
) -> Result<Json<LayeredScheduleResponse>, AppError> {
    let date = query.date;

    let staff: Vec<Staff> = staff::list_active_staff(&state.db_pool)
        .await?
        .into_iter()
        .map(Staff::from)
        .collect();

    let mut entries: Vec<ScheduleEntry> = schedule::list_schedules_for_date(&state.db_pool, date)
        .await?
        .into_iter()
        .map(ScheduleEntry::from)
        .collect();
    entries.extend(approved_entries(&state, date, None).await?);
    for row in contract::list_active_contracts(&state.db_pool).await? {
        entries.extend(contract_entries(&Contract::from(row), date));
    }

    let calendar = calendar_for(&state, date).await?;
    let schedules = resolve_grid(entries, date, &calendar);

    Ok(Json(LayeredScheduleResponse {
        date,
        holiday_name: calendar.name_of(date).map(str::to_string),
        staff,
        schedules,
    }))
}

#[axum::debug_handler]
pub async fn get_unified(
    State(state): State<Arc<ApiState>>,
    _caller: AuthUser,
    Query(query): Query<UnifiedScheduleQuery>,
) -> Result<Json<UnifiedScheduleResponse>, AppError> {
    let (entries, calendar) = staff_day(&state, query.staff_id, query.date).await?;

    Ok(Json(UnifiedScheduleResponse {
        staff_id: query.staff_id,
        date: query.date,
        is_holiday: calendar.is_holiday(query.date),
        entries: resolve_unified(entries, query.date, &calendar, query.include_masking),
    }))
}

#[axum::debug_handler]
pub async fn create_schedule(
    State(state): State<Arc<ApiState>>,
    caller: AuthUser,
    Json(payload): Json<CreateScheduleRequest>,
) -> Result<(StatusCode, Json<ScheduleEntry>), AppError> {
    ensure_can_edit(&caller, payload.staff_id)?;
    validate_status(&payload.status)?;
    validate_time_range(payload.start, payload.end)?;

    if staff::get_staff_by_id(&state.db_pool, payload.staff_id)
        .await?
        .is_none()
    {
        return Err(ShiftError::NotFound(format!("Staff {}", payload.staff_id)).into());
    }

    let created = schedule::create_schedule(
        &state.db_pool,
        &NewSchedule {
            staff_id: payload.staff_id,
            date: payload.date,
            status: &payload.status,
            start: payload.start,
            end: payload.end,
            memo: payload.memo.as_deref().filter(|m| !m.is_empty()),
            layer: ScheduleLayer::Adjustment,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(created.into())))
}

async fn editable_entry(
    state: &ApiState,
    caller: &AuthUser,
    id: Uuid,
) -> Result<ScheduleEntry, AppError> {
    let entry: ScheduleEntry = schedule::get_schedule_by_id(&state.db_pool, id)
        .await?
        .map(ScheduleEntry::from)
        .ok_or_else(|| ShiftError::NotFound(format!("Schedule {}", id)))?;

    if entry.layer != ScheduleLayer::Adjustment {
        return Err(ShiftError::Validation(
            "Contract entries are derived from the contract and cannot be edited".to_string(),
        )
        .into());
    }
    ensure_can_edit(caller, entry.staff_id)?;
    Ok(entry)
}

#[axum::debug_handler]
pub async fn update_schedule(
    State(state): State<Arc<ApiState>>,
    caller: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateScheduleRequest>,
) -> Result<Json<ScheduleEntry>, AppError> {
    let current = editable_entry(&state, &caller, id).await?;

    let status = payload.status.unwrap_or(current.status);
    let start = payload.start.unwrap_or(current.start);
    let end = payload.end.unwrap_or(current.end);
    let memo = payload.memo.or(current.memo);
    validate_status(&status)?;
    validate_time_range(start, end)?;

    let updated = schedule::update_schedule(
        &state.db_pool,
        id,
        &status,
        start,
        end,
        memo.as_deref().filter(|m| !m.is_empty()),
    )
    .await?;

    Ok(Json(updated.into()))
}

#[axum::debug_handler]
pub async fn delete_schedule(
    State(state): State<Arc<ApiState>>,
    caller: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    editable_entry(&state, &caller, id).await?;

    if !schedule::delete_schedule(&state.db_pool, id).await? {
        return Err(ShiftError::NotFound(format!("Schedule {}", id)).into());
    }
    Ok(StatusCode::NO_CONTENT)
}
