use axum::{
    Json,
    extract::{Query, State},
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;

use shiftboard_core::{errors::ShiftError, models::schedule::Holiday};
use shiftboard_db::repositories::holiday;

use crate::{
    ApiState,
    middleware::{auth::AuthUser, error_handling::AppError},
};

#[derive(Debug, Deserialize)]
pub struct HolidayQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

#[axum::debug_handler]
pub async fn list_holidays(
    State(state): State<Arc<ApiState>>,
    _caller: AuthUser,
    Query(query): Query<HolidayQuery>,
) -> Result<Json<Vec<Holiday>>, AppError> {
    if query.from > query.to {
        return Err(ShiftError::Validation("from must not be after to".to_string()).into());
    }

    let holidays = holiday::list_holidays_between(&state.db_pool, query.from, query.to)
        .await?
        .into_iter()
        .map(Holiday::from)
        .collect();

    Ok(Json(holidays))
}
