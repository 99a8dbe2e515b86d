//! # Error Handling Middleware
//!
//! Maps domain errors to HTTP status codes and JSON bodies so every handler
//! reports failures the same way.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use shiftboard_core::errors::ShiftError;

/// Application error wrapper that provides HTTP status code mapping
///
/// `AppError` wraps [`ShiftError`] and implements `IntoResponse`. The body is
/// `{"error": message}` plus structured fields for lockout and import failures.
/// Server-side failures are logged and reported with a generic message.
#[derive(Debug)]
pub struct AppError(pub ShiftError);

pub fn status_code(err: &ShiftError) -> StatusCode {
    match err {
        ShiftError::NotFound(_) => StatusCode::NOT_FOUND,
        ShiftError::Validation(_) | ShiftError::ImportRejected(_) => StatusCode::BAD_REQUEST,
        ShiftError::Conflict(_) => StatusCode::CONFLICT,
        ShiftError::Authentication(_) | ShiftError::InvalidCredentials { .. } => {
            StatusCode::UNAUTHORIZED
        }
        ShiftError::Authorization(_) => StatusCode::FORBIDDEN,
        ShiftError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        ShiftError::Database(_) | ShiftError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn body(err: &ShiftError) -> Value {
    match err {
        ShiftError::Database(_) | ShiftError::Internal(_) => {
            json!({ "error": "Internal server error" })
        }
        ShiftError::ImportRejected(violations) => json!({
            "error": err.to_string(),
            "violations": violations,
        }),
        ShiftError::InvalidCredentials { remaining_attempts } => json!({
            "error": "Invalid email or password",
            "remainingAttempts": remaining_attempts,
        }),
        ShiftError::RateLimited {
            message,
            remaining_attempts,
            next_attempt_allowed,
        } => json!({
            "error": message,
            "remainingAttempts": remaining_attempts,
            "nextAttemptAllowed": next_attempt_allowed,
        }),
        other => json!({ "error": other.to_string() }),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = status_code(&self.0);
        if self.0.is_server_error() {
            tracing::error!("Request failed: {:?}", self.0);
        }
        (status, Json(body(&self.0))).into_response()
    }
}

/// Allows `?` on functions returning `Result<T, ShiftError>` inside handlers.
impl From<ShiftError> for AppError {
    fn from(err: ShiftError) -> Self {
        AppError(err)
    }
}

/// Repository failures surface as database errors.
impl From<eyre::Report> for AppError {
    fn from(err: eyre::Report) -> Self {
        AppError(ShiftError::Database(err))
    }
}

/// Maps a ShiftError straight to an HTTP response.
pub fn map_error(err: ShiftError) -> Response {
    AppError(err).into_response()
}
