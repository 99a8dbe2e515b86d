use chrono::{DateTime, NaiveDate, Utc};
use eyre::{Report, eyre};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use uuid::Uuid;

use shiftboard_core::models::{
    auth::{PasswordResetToken, UserAuth},
    contract::Contract,
    import::ImportBatch,
    pending::PendingSchedule,
    preset::{Preset, TemporaryPreset},
    schedule::{Holiday, ScheduleEntry},
    staff::Staff,
};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbStaff {
    pub id: i32,
    pub employee_id: String,
    pub name: String,
    pub department: String,
    pub group_name: String,
    pub is_active: bool,
    pub import_batch_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DbStaff> for Staff {
    fn from(row: DbStaff) -> Self {
        Staff {
            id: row.id,
            employee_id: row.employee_id,
            name: row.name,
            department: row.department,
            group: row.group_name,
            is_active: row.is_active,
            import_batch_id: row.import_batch_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbContract {
    pub staff_id: i32,
    pub monday_hours: Option<String>,
    pub tuesday_hours: Option<String>,
    pub wednesday_hours: Option<String>,
    pub thursday_hours: Option<String>,
    pub friday_hours: Option<String>,
    pub saturday_hours: Option<String>,
    pub sunday_hours: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<DbContract> for Contract {
    fn from(row: DbContract) -> Self {
        Contract {
            staff_id: row.staff_id,
            monday_hours: row.monday_hours,
            tuesday_hours: row.tuesday_hours,
            wednesday_hours: row.wednesday_hours,
            thursday_hours: row.thursday_hours,
            friday_hours: row.friday_hours,
            saturday_hours: row.saturday_hours,
            sunday_hours: row.sunday_hours,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbSchedule {
    pub id: Uuid,
    pub staff_id: i32,
    pub date: NaiveDate,
    pub status: String,
    pub start_hour: f64,
    pub end_hour: f64,
    pub memo: Option<String>,
    pub layer: String,
    pub import_batch_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DbSchedule> for ScheduleEntry {
    fn from(row: DbSchedule) -> Self {
        ScheduleEntry {
            id: row.id,
            staff_id: row.staff_id,
            date: row.date,
            status: row.status,
            start: row.start_hour,
            end: row.end_hour,
            memo: row.memo,
            // Unknown tags fall back to the adjustment layer.
            layer: row.layer.parse().unwrap_or_default(),
            import_batch_id: row.import_batch_id,
            approved_at: None,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbPendingSchedule {
    pub id: Uuid,
    pub staff_id: i32,
    pub date: NaiveDate,
    pub status: String,
    pub start_hour: f64,
    pub end_hour: f64,
    pub memo: Option<String>,
    pub pending_type: String,
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

impl From<DbPendingSchedule> for PendingSchedule {
    fn from(row: DbPendingSchedule) -> Self {
        PendingSchedule {
            id: row.id,
            staff_id: row.staff_id,
            date: row.date,
            status: row.status,
            start: row.start_hour,
            end: row.end_hour,
            memo: row.memo,
            pending_type: row.pending_type.parse().unwrap_or_default(),
            approved_by: row.approved_by,
            approved_at: row.approved_at,
            approval_note: row.approval_note,
            rejected_by: row.rejected_by,
            rejected_at: row.rejected_at,
            rejection_reason: row.rejection_reason,
            unapproval_reason: row.unapproval_reason,
            created_by: row.created_by,
            import_batch_id: row.import_batch_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbImportBatch {
    pub id: Uuid,
    pub kind: String,
    pub row_count: i32,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub rolled_back_at: Option<DateTime<Utc>>,
}

impl TryFrom<DbImportBatch> for ImportBatch {
    type Error = Report;

    fn try_from(row: DbImportBatch) -> Result<Self, Self::Error> {
        Ok(ImportBatch {
            id: row.id,
            kind: row.kind.parse().map_err(|e: String| eyre!(e))?,
            row_count: row.row_count,
            created_by: row.created_by,
            created_at: row.created_at,
            rolled_back_at: row.rolled_back_at,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbUserAuth {
    pub id: Uuid,
    pub email: String,
    pub password_hash: Option<String>,
    pub role: String,
    pub login_attempts: i32,
    pub locked_at: Option<DateTime<Utc>>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub staff_id: Option<i32>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<DbUserAuth> for UserAuth {
    fn from(row: DbUserAuth) -> Self {
        UserAuth {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            // An unreadable role grants the least privilege.
            role: row.role.parse().unwrap_or_default(),
            login_attempts: row.login_attempts,
            locked_at: row.locked_at,
            last_login_at: row.last_login_at,
            staff_id: row.staff_id,
            is_active: row.is_active,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbResetToken {
    pub token: String,
    pub token_type: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<DbResetToken> for PasswordResetToken {
    type Error = Report;

    fn try_from(row: DbResetToken) -> Result<Self, Self::Error> {
        Ok(PasswordResetToken {
            token: row.token,
            token_type: row.token_type.parse().map_err(|e: String| eyre!(e))?,
            user_id: row.user_id,
            expires_at: row.expires_at,
            used: row.used,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbHoliday {
    pub date: NaiveDate,
    pub name: String,
}

impl From<DbHoliday> for Holiday {
    fn from(row: DbHoliday) -> Self {
        Holiday {
            date: row.date,
            name: row.name,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DbTemporaryPreset {
    pub key: String,
    pub preset: Json<Preset>,
    pub created_at: DateTime<Utc>,
}

impl DbTemporaryPreset {
    pub fn into_keyed(self) -> (String, TemporaryPreset) {
        (
            self.key,
            TemporaryPreset {
                preset: self.preset.0,
                created_at: self.created_at,
            },
        )
    }
}
