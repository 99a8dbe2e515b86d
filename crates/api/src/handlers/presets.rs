//! # Preset Handlers
//!
//! The built-in preset catalogue with display colors, and planners' temporary
//! presets. Temporary presets expire after seven days; expired ones are collected
//! whenever the list is read.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use shiftboard_core::{
    errors::{ShiftError, ShiftResult},
    models::{
        preset::{Preset, PresetView, TemporaryPreset},
        schedule::{validate_status, validate_time_range},
    },
    presets::default_presets,
    temp_presets::{collect_garbage, temporary_preset_ttl},
};

use crate::{
    ApiState,
    middleware::{auth::AuthUser, error_handling::AppError},
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemporaryPresetItem {
    pub key: String,
    pub preset: PresetView,
    pub created_at: DateTime<Utc>,
}

impl TemporaryPresetItem {
    fn new(key: String, stored: TemporaryPreset) -> Self {
        Self {
            key,
            preset: stored.preset.view(),
            created_at: stored.created_at,
        }
    }
}

/// Checks a planner-built preset before it is stored.
pub fn validate_preset(preset: &Preset) -> ShiftResult<()> {
    if preset.name.trim().is_empty() {
        return Err(ShiftError::Validation("Preset name is required".to_string()));
    }
    if preset.entries.is_empty() {
        return Err(ShiftError::Validation(
            "A preset needs at least one entry".to_string(),
        ));
    }
    for entry in &preset.entries {
        validate_status(&entry.status)?;
        validate_time_range(entry.start_time, entry.end_time)?;
    }
    Ok(())
}

#[axum::debug_handler(state = Arc<ApiState>)]
pub async fn list_presets(_caller: AuthUser) -> Json<Vec<PresetView>> {
    Json(default_presets().iter().map(Preset::view).collect())
}

#[axum::debug_handler]
pub async fn list_temporary(
    State(state): State<Arc<ApiState>>,
    _caller: AuthUser,
) -> Result<Json<Vec<TemporaryPresetItem>>, AppError> {
    let removed = collect_garbage(state.temp_presets.as_ref(), Utc::now()).await?;
    if !removed.is_empty() {
        tracing::info!("Removed {} expired temporary presets", removed.len());
    }

    let items = state
        .temp_presets
        .list()
        .await?
        .into_iter()
        .map(|(key, stored)| TemporaryPresetItem::new(key, stored))
        .collect();

    Ok(Json(items))
}

#[axum::debug_handler]
pub async fn get_temporary(
    State(state): State<Arc<ApiState>>,
    _caller: AuthUser,
    Path(key): Path<String>,
) -> Result<Json<TemporaryPresetItem>, AppError> {
    let stored = state
        .temp_presets
        .get(&key)
        .await?
        .filter(|t| Utc::now() - t.created_at < temporary_preset_ttl())
        .ok_or_else(|| ShiftError::NotFound(format!("Temporary preset {}", key)))?;

    Ok(Json(TemporaryPresetItem::new(key, stored)))
}

#[axum::debug_handler]
pub async fn put_temporary(
    State(state): State<Arc<ApiState>>,
    _caller: AuthUser,
    Path(key): Path<String>,
    Json(mut preset): Json<Preset>,
) -> Result<Json<TemporaryPresetItem>, AppError> {
    validate_preset(&preset)?;
    preset.id = key.clone();

    let stored = TemporaryPreset {
        preset,
        created_at: Utc::now(),
    };
    state.temp_presets.set(&key, stored.clone()).await?;

    Ok(Json(TemporaryPresetItem::new(key, stored)))
}

#[axum::debug_handler]
pub async fn delete_temporary(
    State(state): State<Arc<ApiState>>,
    _caller: AuthUser,
    Path(key): Path<String>,
) -> Result<StatusCode, AppError> {
    if !state.temp_presets.delete(&key).await? {
        return Err(ShiftError::NotFound(format!("Temporary preset {}", key)).into());
    }
    Ok(StatusCode::NO_CONTENT)
}
