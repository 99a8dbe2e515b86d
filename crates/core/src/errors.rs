use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::import::CharacterViolation;

#[derive(Error, Debug)]
pub enum ShiftError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Import rejected: {} field(s) contain disallowed characters", .0.len())]
    ImportRejected(Vec<CharacterViolation>),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Authentication error: invalid email or password")]
    InvalidCredentials { remaining_attempts: u32 },

    #[error("Authorization error: {0}")]
    Authorization(String),

    #[error("Too many failed attempts: {message}")]
    RateLimited {
        message: String,
        remaining_attempts: u32,
        next_attempt_allowed: Option<DateTime<Utc>>,
    },

    #[error("Database error: {0}")]
    Database(#[from] eyre::Report),

    #[error("Internal server error: {0}")]
    Internal(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl ShiftError {
    /// Whether the error is caused by the server rather than the request.
    pub fn is_server_error(&self) -> bool {
        matches!(self, ShiftError::Database(_) | ShiftError::Internal(_))
    }
}

pub type ShiftResult<T> = Result<T, ShiftError>;
