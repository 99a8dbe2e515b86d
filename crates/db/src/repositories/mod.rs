pub mod audit;
pub mod contract;
pub mod holiday;
pub mod import_batch;
pub mod pending;
pub mod reset_token;
pub mod schedule;
pub mod staff;
pub mod temp_preset;
pub mod user_auth;

use shiftboard_core::errors::ShiftError;

/// For repositories that return domain errors from inside a transaction.
pub(crate) fn db_error(e: sqlx::Error) -> ShiftError {
    ShiftError::Database(e.into())
}
