pub mod auth;
pub mod holidays;
pub mod import;
pub mod pending;
pub mod presets;
pub mod schedule;
pub mod staff;

use shiftboard_core::models::audit::AuditEntry;

use crate::ApiState;

/// Writes an audit record. A failed write is logged and otherwise ignored.
pub(crate) async fn audit(state: &ApiState, entry: AuditEntry) {
    if let Err(e) =
        shiftboard_db::repositories::audit::insert_audit_log(&state.db_pool, &entry).await
    {
        tracing::warn!(
            "Failed to write audit log for {} on {}: {}",
            entry.action,
            entry.resource,
            e
        );
    }
}
