use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportKind {
    Staff,
    Schedules,
}

impl ImportKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ImportKind::Staff => "staff",
            ImportKind::Schedules => "schedules",
        }
    }
}

impl std::str::FromStr for ImportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "staff" => Ok(ImportKind::Staff),
            "schedules" => Ok(ImportKind::Schedules),
            other => Err(format!("Unknown import kind: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportBatch {
    pub id: Uuid,
    pub kind: ImportKind,
    pub row_count: i32,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub rolled_back_at: Option<DateTime<Utc>>,
}

/// Canonical staff row produced by every accepted upload shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffImportRow {
    #[serde(alias = "empNo", alias = "empId", deserialize_with = "string_or_number")]
    pub employee_id: String,
    pub name: String,
    #[serde(alias = "dept", default)]
    pub department: String,
    #[serde(alias = "team", default)]
    pub group: String,
}

/// The JSON shapes accepted by the staff sync endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StaffImportPayload {
    Bare(Vec<StaffImportRow>),
    EmployeeData {
        #[serde(rename = "employeeData")]
        employee_data: Vec<StaffImportRow>,
    },
    Staff {
        staff: Vec<StaffImportRow>,
    },
}

impl StaffImportPayload {
    pub fn into_rows(self) -> Vec<StaffImportRow> {
        match self {
            StaffImportPayload::Bare(rows) => rows,
            StaffImportPayload::EmployeeData { employee_data } => employee_data,
            StaffImportPayload::Staff { staff } => staff,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleImportRow {
    pub employee_id: String,
    pub date: NaiveDate,
    pub status: String,
    pub start: f64,
    pub end: f64,
    pub memo: Option<String>,
}

/// A field holding characters outside the allowed set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterViolation {
    /// One-based number of the data row (the CSV header is not counted).
    pub row: usize,
    pub field: String,
    pub value: String,
    pub invalid_chars: Vec<char>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleImportResponse {
    pub batch_id: Uuid,
    pub imported: usize,
    pub skipped_duplicates: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollbackRequest {
    pub batch_id: Uuid,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollbackResponse {
    pub batch_id: Uuid,
    pub deleted_schedules: u64,
    pub deleted_pending: u64,
    pub deleted_staff: u64,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected employee number, found {}",
            other
        ))),
    }
}
