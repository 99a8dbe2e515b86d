//! Bulk import: upload parsing, character validation, staff sync planning and the
//! rollback window for import batches.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::errors::{ShiftError, ShiftResult};
use crate::models::import::{
    CharacterViolation, ImportBatch, ScheduleImportRow, StaffImportPayload, StaffImportRow,
};
use crate::models::preset::PresetEntry;
use crate::models::schedule::{ScheduleEntry, validate_status, validate_time_range};
use crate::models::staff::Staff;
use crate::presets::is_exact_duplicate;
use crate::timeline::parse_hhmm;

/// How long after creation a batch can still be rolled back.
pub fn rollback_window() -> Duration {
    Duration::hours(24)
}

/// One CSV data row keyed by header name.
pub type CsvRecord = BTreeMap<String, String>;

/// Splits CSV text into records. The first non-empty line is the header.
///
/// Fields are split on commas without quoting support; surrounding whitespace and
/// a UTF-8 BOM are removed. Short rows get empty values for missing columns.
pub fn parse_csv(text: &str) -> ShiftResult<Vec<CsvRecord>> {
    let text = text.trim_start_matches('\u{feff}');
    let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());

    let header: Vec<String> = lines
        .next()
        .ok_or_else(|| ShiftError::Validation("CSV file is empty".to_string()))?
        .split(',')
        .map(|h| h.trim().to_string())
        .collect();

    Ok(lines
        .map(|line| {
            let values: Vec<&str> = line.split(',').map(str::trim).collect();
            header
                .iter()
                .enumerate()
                .map(|(i, name)| (name.clone(), values.get(i).unwrap_or(&"").to_string()))
                .collect()
        })
        .collect())
}

fn field<'a>(record: &'a CsvRecord, names: &[&str]) -> Option<&'a str> {
    names
        .iter()
        .find_map(|n| record.get(*n))
        .map(String::as_str)
        .filter(|v| !v.is_empty())
}

fn missing(row: usize, name: &str) -> ShiftError {
    ShiftError::Validation(format!("Row {}: missing {}", row, name))
}

pub fn staff_rows_from_csv(text: &str) -> ShiftResult<Vec<StaffImportRow>> {
    parse_csv(text)?
        .iter()
        .enumerate()
        .map(|(i, record)| -> ShiftResult<StaffImportRow> {
            let row = i + 1;
            Ok(StaffImportRow {
                employee_id: field(record, &["employeeId", "empNo", "empId"])
                    .ok_or_else(|| missing(row, "employeeId"))?
                    .to_string(),
                name: field(record, &["name"])
                    .ok_or_else(|| missing(row, "name"))?
                    .to_string(),
                department: field(record, &["department", "dept"]).unwrap_or("").to_string(),
                group: field(record, &["group", "team"]).unwrap_or("").to_string(),
            })
        })
        .collect()
}

/// Parses a staff upload, JSON or CSV, into canonical rows.
pub fn parse_staff_upload(content: &str) -> ShiftResult<Vec<StaffImportRow>> {
    let trimmed = content.trim_start_matches('\u{feff}').trim_start();
    if trimmed.starts_with('[') || trimmed.starts_with('{') {
        let payload: StaffImportPayload = serde_json::from_str(trimmed)
            .map_err(|e| ShiftError::Validation(format!("Invalid staff JSON: {}", e)))?;
        Ok(payload.into_rows())
    } else {
        staff_rows_from_csv(content)
    }
}

/// Parses `employeeId,date,status,startTime,endTime[,memo]` rows.
pub fn schedule_rows_from_csv(text: &str) -> ShiftResult<Vec<ScheduleImportRow>> {
    parse_csv(text)?
        .iter()
        .enumerate()
        .map(|(i, record)| -> ShiftResult<ScheduleImportRow> {
            let row = i + 1;
            let employee_id = field(record, &["employeeId", "empNo", "empId"])
                .ok_or_else(|| missing(row, "employeeId"))?;
            let date = field(record, &["date"]).ok_or_else(|| missing(row, "date"))?;
            let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| {
                ShiftError::Validation(format!("Row {}: invalid date {}", row, date))
            })?;
            let status = field(record, &["status"]).ok_or_else(|| missing(row, "status"))?;
            let start = field(record, &["startTime", "start"])
                .and_then(parse_hhmm)
                .ok_or_else(|| missing(row, "startTime"))?;
            let end = field(record, &["endTime", "end"])
                .and_then(parse_hhmm)
                .ok_or_else(|| missing(row, "endTime"))?;
            validate_status(status)?;
            validate_time_range(start, end)
                .map_err(|e| ShiftError::Validation(format!("Row {}: {}", row, e)))?;
            Ok(ScheduleImportRow {
                employee_id: employee_id.to_string(),
                date,
                status: status.to_string(),
                start,
                end,
                memo: field(record, &["memo"]).map(str::to_string),
            })
        })
        .collect()
}

/// Whether `c` may appear in an imported name, department or group.
pub fn is_allowed_char(c: char) -> bool {
    matches!(c,
        'a'..='z' | 'A'..='Z' | '0'..='9' | ' '
        // hiragana, katakana (includes ・ and ー)
        | '\u{3040}'..='\u{309F}' | '\u{30A0}'..='\u{30FF}'
        // CJK ideographs, extension A and compatibility ideographs
        | '\u{4E00}'..='\u{9FFF}' | '\u{3400}'..='\u{4DBF}' | '\u{F900}'..='\u{FAFF}'
        // full-width digits and letters, half-width katakana
        | '\u{FF10}'..='\u{FF19}' | '\u{FF21}'..='\u{FF3A}' | '\u{FF41}'..='\u{FF5A}'
        | '\u{FF65}'..='\u{FF9F}'
        | '々' | '\u{3000}' | '-' | '－' | '_' | '.' | '．' | '(' | ')' | '（' | '）'
        | '/' | '／' | '&' | '＆' | '〜' | '～'
    )
}

fn invalid_chars(value: &str) -> Vec<char> {
    let mut seen = Vec::new();
    for c in value.chars().filter(|c| !is_allowed_char(*c)) {
        if !seen.contains(&c) {
            seen.push(c);
        }
    }
    seen
}

/// Checks every text field of every row. Any violation rejects the whole batch.
pub fn validate_staff_rows(rows: &[StaffImportRow]) -> ShiftResult<()> {
    let violations: Vec<CharacterViolation> = rows
        .iter()
        .enumerate()
        .flat_map(|(i, row)| {
            [
                ("name", &row.name),
                ("department", &row.department),
                ("group", &row.group),
            ]
            .into_iter()
            .filter_map(move |(name, value)| {
                let bad = invalid_chars(value);
                (!bad.is_empty()).then(|| CharacterViolation {
                    row: i + 1,
                    field: name.to_string(),
                    value: value.clone(),
                    invalid_chars: bad,
                })
            })
        })
        .collect();

    if violations.is_empty() {
        Ok(())
    } else {
        Err(ShiftError::ImportRejected(violations))
    }
}

/// What a staff sync will change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaffSyncPlan {
    pub to_create: Vec<StaffImportRow>,
    /// Existing staff id with the row that replaces its fields.
    pub to_update: Vec<(i32, StaffImportRow)>,
    pub to_deactivate: Vec<i32>,
}

/// Matches uploaded rows to the current roster by employee number.
///
/// Listed staff are created or updated (and reactivated); active staff missing
/// from the upload are deactivated. Unchanged active staff are left alone.
pub fn plan_staff_sync(existing: &[Staff], rows: &[StaffImportRow]) -> ShiftResult<StaffSyncPlan> {
    let mut seen = HashSet::new();
    for row in rows {
        if row.employee_id.trim().is_empty() {
            return Err(ShiftError::Validation("Employee number is required".to_string()));
        }
        if !seen.insert(row.employee_id.as_str()) {
            return Err(ShiftError::Validation(format!(
                "Employee number {} appears more than once",
                row.employee_id
            )));
        }
    }

    let by_employee: HashMap<&str, &Staff> =
        existing.iter().map(|s| (s.employee_id.as_str(), s)).collect();

    let mut plan = StaffSyncPlan::default();
    for row in rows {
        match by_employee.get(row.employee_id.as_str()) {
            Some(staff) => {
                let changed = staff.name != row.name
                    || staff.department != row.department
                    || staff.group != row.group
                    || !staff.is_active;
                if changed {
                    plan.to_update.push((staff.id, row.clone()));
                }
            }
            None => plan.to_create.push(row.clone()),
        }
    }
    plan.to_deactivate = existing
        .iter()
        .filter(|s| s.is_active && !seen.contains(s.employee_id.as_str()))
        .map(|s| s.id)
        .collect();
    Ok(plan)
}

/// Splits resolved import rows into rows to insert and a count of exact duplicates,
/// either of an existing entry or of an earlier row in the same file.
pub fn split_duplicate_rows(
    rows: Vec<(i32, ScheduleImportRow)>,
    existing: &[ScheduleEntry],
) -> (Vec<(i32, ScheduleImportRow)>, usize) {
    let mut kept: Vec<(i32, ScheduleImportRow)> = Vec::new();
    let mut skipped = 0;
    for (staff_id, row) in rows {
        let candidate = PresetEntry {
            status: row.status.clone(),
            start_time: row.start,
            end_time: row.end,
            memo: row.memo.clone(),
        };
        let in_db = existing
            .iter()
            .filter(|e| e.staff_id == staff_id && e.date == row.date)
            .any(|e| is_exact_duplicate(&candidate, e));
        let in_file = kept.iter().any(|(id, k)| {
            *id == staff_id
                && k.date == row.date
                && k.status == row.status
                && k.start == row.start
                && k.end == row.end
                && k.memo.as_deref().unwrap_or("") == row.memo.as_deref().unwrap_or("")
        });
        if in_db || in_file {
            skipped += 1;
        } else {
            kept.push((staff_id, row));
        }
    }
    (kept, skipped)
}

impl ImportBatch {
    /// Fails when the batch was already rolled back or is outside the rollback window.
    pub fn ensure_rollback_allowed(&self, now: DateTime<Utc>) -> ShiftResult<()> {
        if self.rolled_back_at.is_some() {
            return Err(ShiftError::Conflict(format!(
                "Import batch {} was already rolled back",
                self.id
            )));
        }
        if now - self.created_at >= rollback_window() {
            return Err(ShiftError::Conflict(format!(
                "Import batch {} is older than 24 hours and can no longer be rolled back",
                self.id
            )));
        }
        Ok(())
    }
}
