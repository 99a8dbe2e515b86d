//! # Authentication Handlers
//!
//! Login with per-account lockout, password changes and the one-time link flows
//! for first-time setup and password reset. Link delivery is mocked: the link is
//! written to the log.

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde_json::json;
use std::sync::Arc;

use shiftboard_core::{
    errors::{ShiftError, ShiftResult},
    lockout::{LockCheck, LoginAttempts, MAX_LOGIN_ATTEMPTS},
    models::{
        audit::AuditEntry,
        auth::{
            EmailRequest, LoginRequest, LoginResponse, MessageResponse, SetPasswordRequest,
            SetupPasswordRequest, TokenType, UserAuth, validate_password_strength,
        },
    },
};
use shiftboard_db::repositories::{reset_token, user_auth};

use crate::{
    ApiState,
    handlers::audit,
    middleware::{
        auth::{self, AuthUser, generate_link_token, issue_token},
        error_handling::AppError,
    },
};

const LINK_SENT: &str = "If the account exists, a link has been sent to its e-mail address";

/// Checks a password against an account and its lockout state.
///
/// A locked account is refused before the password is looked at. Otherwise
/// returns whether the password matched; a mismatch still has to be counted.
pub fn check_credentials(
    user: &UserAuth,
    password: &str,
    now: DateTime<Utc>,
) -> ShiftResult<bool> {
    let mut attempts = LoginAttempts::new(user.login_attempts, user.locked_at);
    if let LockCheck::Locked {
        next_attempt_allowed,
    } = attempts.check(now)
    {
        return Err(ShiftError::RateLimited {
            message: "Account is locked after repeated failed logins".to_string(),
            remaining_attempts: 0,
            next_attempt_allowed: Some(next_attempt_allowed),
        });
    }

    match (&user.password_hash, user.is_active) {
        (Some(hash), true) => auth::verify_password(password, hash)
            .map_err(|e| ShiftError::Internal(e.to_string().into())),
        _ => Ok(false),
    }
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<Arc<ApiState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let now = Utc::now();
    let email = payload.email.trim().to_lowercase();

    let Some(user) = user_auth::get_user_by_email(&state.db_pool, &email)
        .await?
        .map(UserAuth::from)
    else {
        audit(
            &state,
            AuditEntry::failure(Some(email), "login", "auth", json!({}), "unknown account"),
        )
        .await;
        return Err(ShiftError::InvalidCredentials {
            remaining_attempts: MAX_LOGIN_ATTEMPTS as u32,
        }
        .into());
    };

    let outcome = match check_credentials(&user, &payload.password, now) {
        Ok(true) => Ok(()),
        Ok(false) => {
            let stored = user_auth::record_login_failure(&state.db_pool, user.id, now).await?;
            Err(stored.failure_error())
        }
        Err(err) => Err(err),
    };
    if let Err(err) = outcome {
        audit(
            &state,
            AuditEntry::failure(Some(email), "login", "auth", json!({}), err.to_string()),
        )
        .await;
        return Err(err.into());
    }

    user_auth::record_login_success(&state.db_pool, user.id, now).await?;
    let (token, expires_at) = issue_token(&user, &state.jwt, now)?;
    audit(
        &state,
        AuditEntry::success(Some(email), "login", "auth", json!({ "userId": user.id })),
    )
    .await;
    tracing::info!("User {} logged in", user.id);

    let user = UserAuth {
        login_attempts: 0,
        locked_at: None,
        last_login_at: Some(now),
        ..user
    };
    Ok(Json(LoginResponse {
        token,
        expires_at,
        user,
    }))
}

#[axum::debug_handler]
pub async fn set_password(
    State(state): State<Arc<ApiState>>,
    caller: AuthUser,
    Json(payload): Json<SetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let user = user_auth::get_user_by_id(&state.db_pool, caller.user_id)
        .await?
        .map(UserAuth::from)
        .ok_or_else(|| ShiftError::NotFound(format!("User {}", caller.user_id)))?;

    if let Some(hash) = &user.password_hash {
        let current = payload.current_password.as_deref().unwrap_or_default();
        if !auth::verify_password(current, hash)? {
            return Err(ShiftError::Authentication("Current password is incorrect".into()).into());
        }
    }
    validate_password_strength(&payload.new_password)?;

    let hash = auth::hash_password(&payload.new_password)?;
    user_auth::set_password_hash(&state.db_pool, user.id, &hash).await?;
    audit(
        &state,
        AuditEntry::success(Some(user.email), "set_password", "auth", json!({})),
    )
    .await;

    Ok(Json(MessageResponse::new("Password updated")))
}

async fn issue_link(
    state: &ApiState,
    user: &UserAuth,
    token_type: TokenType,
    path: &str,
) -> Result<(), AppError> {
    let token = generate_link_token();
    let row =
        reset_token::create_token(&state.db_pool, &token, token_type, user.id, Utc::now()).await?;
    tracing::info!(
        "Link for {} ({}), valid until {}: {}/{}?token={}",
        user.email,
        token_type.as_str(),
        row.expires_at,
        state.app_base_url,
        path,
        token
    );
    audit(
        state,
        AuditEntry::success(
            Some(user.email.clone()),
            "issue_link",
            "auth",
            json!({ "tokenType": token_type.as_str() }),
        ),
    )
    .await;
    Ok(())
}

/// Always answers the same way so the response does not reveal which e-mail
/// addresses have accounts.
#[axum::debug_handler]
pub async fn request_password_reset(
    State(state): State<Arc<ApiState>>,
    Json(payload): Json<EmailRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let user = user_auth::get_user_by_email(&state.db_pool, &payload.email)
        .await?
        .map(UserAuth::from);

    match user {
        Some(user) if user.is_active && user.password_hash.is_some() => {
            issue_link(&state, &user, TokenType::Reset, "reset-password").await?;
        }
        _ => tracing::debug!("Password reset requested for an ineligible address"),
    }

    Ok(Json(MessageResponse::new(LINK_SENT)))
}

#[axum::debug_handler]
pub async fn request_initial_setup(
    State(state): State<Arc<ApiState>>,
    Json(payload): Json<EmailRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let user = user_auth::get_user_by_email(&state.db_pool, &payload.email)
        .await?
        .map(UserAuth::from);

    match user {
        Some(user) if user.is_active && user.password_hash.is_none() => {
            issue_link(&state, &user, TokenType::InitialSetup, "setup-password").await?;
        }
        _ => tracing::debug!("Initial setup requested for an ineligible address"),
    }

    Ok(Json(MessageResponse::new(LINK_SENT)))
}

#[axum::debug_handler]
pub async fn setup_password(
    State(state): State<Arc<ApiState>>,
    Json(payload): Json<SetupPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    validate_password_strength(&payload.password)?;
    let hash = auth::hash_password(&payload.password)?;

    let user_id =
        reset_token::consume_token(&state.db_pool, payload.token.trim(), &hash, Utc::now())
            .await?;
    audit(
        &state,
        AuditEntry::success(None, "setup_password", "auth", json!({ "userId": user_id })),
    )
    .await;

    Ok(Json(MessageResponse::new("Password set; you can now log in")))
}
