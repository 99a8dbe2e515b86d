//! Per-account login lockout.
//!
//! Five consecutive failures lock the account for fifteen minutes. Once the window
//! has passed the counter starts over.

use chrono::{DateTime, Duration, Utc};

use crate::errors::ShiftError;

/// Consecutive failures that lock an account.
pub const MAX_LOGIN_ATTEMPTS: i32 = 5;

/// How long a lock lasts.
pub fn lockout_window() -> Duration {
    Duration::minutes(15)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoginAttempts {
    pub login_attempts: i32,
    pub locked_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockCheck {
    /// The attempt may proceed. `lock_expired` is set when an old lock was just cleared.
    Allowed { lock_expired: bool },
    Locked { next_attempt_allowed: DateTime<Utc> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailureOutcome {
    pub remaining_attempts: u32,
    pub locked: bool,
}

impl LoginAttempts {
    pub fn new(login_attempts: i32, locked_at: Option<DateTime<Utc>>) -> Self {
        Self {
            login_attempts,
            locked_at,
        }
    }

    /// Checks whether an attempt may proceed, clearing an expired lock.
    pub fn check(&mut self, now: DateTime<Utc>) -> LockCheck {
        match self.locked_at {
            Some(locked_at) => {
                let unlock_at = locked_at + lockout_window();
                if now < unlock_at {
                    LockCheck::Locked {
                        next_attempt_allowed: unlock_at,
                    }
                } else {
                    self.login_attempts = 0;
                    self.locked_at = None;
                    LockCheck::Allowed { lock_expired: true }
                }
            }
            None => LockCheck::Allowed {
                lock_expired: false,
            },
        }
    }

    pub fn record_failure(&mut self, now: DateTime<Utc>) -> FailureOutcome {
        self.login_attempts += 1;
        let locked = self.login_attempts >= MAX_LOGIN_ATTEMPTS;
        if locked && self.locked_at.is_none() {
            self.locked_at = Some(now);
        }
        FailureOutcome {
            remaining_attempts: self.remaining_attempts(),
            locked,
        }
    }

    pub fn record_success(&mut self) {
        self.login_attempts = 0;
        self.locked_at = None;
    }

    pub fn remaining_attempts(&self) -> u32 {
        (MAX_LOGIN_ATTEMPTS - self.login_attempts).max(0) as u32
    }

    /// The error a failed attempt reports, given the counter after that failure.
    pub fn failure_error(&self) -> ShiftError {
        match self.locked_at {
            Some(locked_at) => ShiftError::RateLimited {
                message: "Account is locked after repeated failed logins".to_string(),
                remaining_attempts: 0,
                next_attempt_allowed: Some(locked_at + lockout_window()),
            },
            None => ShiftError::InvalidCredentials {
                remaining_attempts: self.remaining_attempts(),
            },
        }
    }
}
