use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{ShiftError, ShiftResult};
use crate::models::staff::Staff;
use crate::timeline::{DAY_END_HOUR, DAY_START_HOUR};

/// Well-known status values. Any other string is accepted as a custom status.
pub mod status {
    pub const ONLINE: &str = "online";
    pub const REMOTE: &str = "remote";
    pub const MEETING: &str = "meeting";
    pub const TRAINING: &str = "training";
    pub const BREAK: &str = "break";
    pub const OFF: &str = "off";
    pub const UNPLANNED: &str = "unplanned";
    pub const NIGHT_DUTY: &str = "night-duty";

    pub const ALL: [&str; 8] = [
        ONLINE, REMOTE, MEETING, TRAINING, BREAK, OFF, UNPLANNED, NIGHT_DUTY,
    ];
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleLayer {
    Contract,
    #[default]
    Adjustment,
}

impl ScheduleLayer {
    /// Paint order: lower values render first and lose to higher ones.
    pub fn priority(self) -> u8 {
        match self {
            ScheduleLayer::Contract => 1,
            ScheduleLayer::Adjustment => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ScheduleLayer::Contract => "contract",
            ScheduleLayer::Adjustment => "adjustment",
        }
    }
}

impl std::fmt::Display for ScheduleLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ScheduleLayer {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "contract" => Ok(ScheduleLayer::Contract),
            "adjustment" | "" => Ok(ScheduleLayer::Adjustment),
            other => Err(format!("Unknown schedule layer: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    pub id: Uuid,
    pub staff_id: i32,
    pub date: NaiveDate,
    pub status: String,
    pub start: f64,
    pub end: f64,
    pub memo: Option<String>,
    #[serde(default)]
    pub layer: ScheduleLayer,
    pub import_batch_id: Option<Uuid>,
    /// Set on entries that come from an approved monthly-plan submission.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ScheduleEntry {
    pub fn overlaps(&self, start: f64, end: f64) -> bool {
        start < self.end && end > self.start
    }

    /// Memo with `None` and `""` collapsed to the same value.
    pub fn memo_text(&self) -> &str {
        self.memo.as_deref().unwrap_or("")
    }
}

/// Checks that `start < end` and both lie on the 8:00 to 21:00 timeline.
pub fn validate_time_range(start: f64, end: f64) -> ShiftResult<()> {
    if !start.is_finite() || !end.is_finite() {
        return Err(ShiftError::Validation("Start and end must be numbers".to_string()));
    }
    if start < DAY_START_HOUR || end > DAY_END_HOUR {
        return Err(ShiftError::Validation(format!(
            "Times must be between {} and {}",
            DAY_START_HOUR, DAY_END_HOUR
        )));
    }
    if start >= end {
        return Err(ShiftError::Validation(
            "Start time must be before end time".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_status(status: &str) -> ShiftResult<()> {
    if status.trim().is_empty() {
        return Err(ShiftError::Validation("Status is required".to_string()));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateScheduleRequest {
    pub staff_id: i32,
    pub date: NaiveDate,
    pub status: String,
    pub start: f64,
    pub end: f64,
    pub memo: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateScheduleRequest {
    pub status: Option<String>,
    pub start: Option<f64>,
    pub end: Option<f64>,
    pub memo: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayeredScheduleQuery {
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayeredScheduleResponse {
    pub date: NaiveDate,
    pub holiday_name: Option<String>,
    pub staff: Vec<Staff>,
    pub schedules: Vec<ScheduleEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnifiedScheduleQuery {
    pub staff_id: i32,
    pub date: NaiveDate,
    #[serde(default)]
    pub include_masking: bool,
}

/// One row of the unified view. `masked` marks contract entries hidden by a holiday.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnifiedEntry {
    #[serde(flatten)]
    pub entry: ScheduleEntry,
    pub masked: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnifiedScheduleResponse {
    pub staff_id: i32,
    pub date: NaiveDate,
    pub is_holiday: bool,
    pub entries: Vec<UnifiedEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holiday {
    pub date: NaiveDate,
    pub name: String,
}
