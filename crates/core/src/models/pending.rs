use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Where a pending entry came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PendingType {
    Preset,
    #[default]
    Custom,
    Composite,
    Import,
}

impl PendingType {
    pub fn as_str(self) -> &'static str {
        match self {
            PendingType::Preset => "preset",
            PendingType::Custom => "custom",
            PendingType::Composite => "composite",
            PendingType::Import => "import",
        }
    }
}

impl std::fmt::Display for PendingType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PendingType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "preset" => Ok(PendingType::Preset),
            "custom" => Ok(PendingType::Custom),
            "composite" => Ok(PendingType::Composite),
            "import" => Ok(PendingType::Import),
            other => Err(format!("Unknown pending type: {}", other)),
        }
    }
}

/// Approval state derived from the audit columns of a [`PendingSchedule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalState {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingSchedule {
    pub id: Uuid,
    pub staff_id: i32,
    pub date: NaiveDate,
    pub status: String,
    pub start: f64,
    pub end: f64,
    pub memo: Option<String>,
    pub pending_type: PendingType,
    pub approved_by: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub approval_note: Option<String>,
    pub rejected_by: Option<String>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub unapproval_reason: Option<String>,
    pub created_by: Option<String>,
    pub import_batch_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingSegment {
    pub status: String,
    pub start: f64,
    pub end: f64,
    pub memo: Option<String>,
}

/// One planner submission for a cell. Several segments form a composite entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePendingRequest {
    pub staff_id: i32,
    pub date: NaiveDate,
    #[serde(default)]
    pub pending_type: PendingType,
    pub segments: Vec<PendingSegment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyPresetRequest {
    pub staff_id: i32,
    pub date: NaiveDate,
    pub preset_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyPresetResponse {
    pub created: Vec<PendingSchedule>,
    pub skipped: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePendingRequest {
    pub status: Option<String>,
    pub start: Option<f64>,
    pub end: Option<f64>,
    pub memo: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApprovalRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReasonRequest {
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyPendingQuery {
    pub year: i32,
    pub month: u32,
    pub staff_id: Option<i32>,
}
