use chrono::{DateTime, Utc};
use mockall::mock;
use uuid::Uuid;

use shiftboard_core::errors::ShiftResult;
use shiftboard_core::import::StaffSyncPlan;
use shiftboard_core::lockout::LoginAttempts;
use shiftboard_core::models::import::RollbackResponse;
use shiftboard_core::models::pending::PendingSchedule;

use crate::models::{DbImportBatch, DbPendingSchedule, DbStaff, DbUserAuth};

// Mock repositories for testing
mock! {
    pub StaffRepo {
        pub async fn list_all_staff(&self) -> eyre::Result<Vec<DbStaff>>;

        pub async fn apply_staff_sync(
            &self,
            plan: StaffSyncPlan,
            row_count: usize,
            created_by: Option<&'static str>,
        ) -> eyre::Result<DbImportBatch>;
    }
}

mock! {
    pub PendingRepo {
        pub async fn get_pending_by_id(
            &self,
            id: Uuid,
        ) -> eyre::Result<Option<DbPendingSchedule>>;

        pub async fn save_pending(
            &self,
            entry: PendingSchedule,
            expected_updated_at: DateTime<Utc>,
        ) -> ShiftResult<DbPendingSchedule>;

        pub async fn delete_pending(
            &self,
            id: Uuid,
            expected_updated_at: DateTime<Utc>,
        ) -> ShiftResult<()>;
    }
}

mock! {
    pub UserAuthRepo {
        pub async fn get_user_by_email(
            &self,
            email: &'static str,
        ) -> eyre::Result<Option<DbUserAuth>>;

        pub async fn record_login_failure(
            &self,
            id: Uuid,
            now: DateTime<Utc>,
        ) -> eyre::Result<LoginAttempts>;

        pub async fn record_login_success(
            &self,
            id: Uuid,
            now: DateTime<Utc>,
        ) -> eyre::Result<()>;
    }
}

mock! {
    pub ImportBatchRepo {
        pub async fn rollback_batch(
            &self,
            id: Uuid,
            now: DateTime<Utc>,
        ) -> ShiftResult<RollbackResponse>;
    }
}
