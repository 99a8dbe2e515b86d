//! # Authentication Module
//!
//! Password hashing (Argon2, PHC strings), HS256 bearer tokens, one-time link
//! tokens and the [`AuthUser`] extractor used by protected handlers.

use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use chrono::{DateTime, Duration, TimeZone, Utc};
use eyre::{Result, eyre};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shiftboard_core::errors::ShiftError;
use shiftboard_core::models::auth::{UserAuth, UserRole};

use crate::{ApiState, middleware::error_handling::AppError};

/// Hashes a password with Argon2 and a fresh random salt.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| eyre!("Error hashing password: {}", e))?
        .to_string();

    Ok(password_hash)
}

/// Checks `password` against a stored PHC hash. A malformed hash is an error,
/// a mismatch is `Ok(false)`.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| eyre!("Invalid password hash: {}", e))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(eyre!("Error verifying password: {}", e)),
    }
}

/// 32 random bytes, hex encoded. Used for setup and reset links.
pub fn generate_link_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expiry_hours: i64,
}

/// Claims carried by every bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub role: UserRole,
    pub staff_id: Option<i32>,
    pub iat: i64,
    pub exp: i64,
}

/// Signs a bearer token for `user`. Returns the token and its expiry.
pub fn issue_token(
    user: &UserAuth,
    config: &JwtConfig,
    now: DateTime<Utc>,
) -> Result<(String, DateTime<Utc>)> {
    let expires_at = now + Duration::hours(config.expiry_hours);
    let claims = Claims {
        sub: user.id,
        email: user.email.clone(),
        role: user.role,
        staff_id: user.staff_id,
        iat: now.timestamp(),
        exp: expires_at.timestamp(),
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(|e| eyre!("Error signing token: {}", e))?;

    Ok((token, expires_at))
}

/// Verifies signature and expiry.
pub fn validate_token(token: &str, config: &JwtConfig) -> Result<Claims> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| eyre!("Invalid token: {}", e))?;

    Ok(data.claims)
}

/// The caller, taken from a valid `Authorization: Bearer` header.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
    pub role: UserRole,
    pub staff_id: Option<i32>,
    pub issued_at: DateTime<Utc>,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    pub fn require_admin(&self) -> Result<(), ShiftError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(ShiftError::Authorization(
                "This action requires an administrator".to_string(),
            ))
        }
    }
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        AuthUser {
            user_id: claims.sub,
            email: claims.email,
            role: claims.role,
            staff_id: claims.staff_id,
            issued_at: Utc.timestamp_opt(claims.iat, 0).single().unwrap_or_default(),
        }
    }
}

#[async_trait]
impl FromRequestParts<Arc<ApiState>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<ApiState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError(ShiftError::Authentication(
                    "Missing Authorization header".to_string(),
                ))
            })?;

        let token = header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError(ShiftError::Authentication(
                "Expected: Bearer <token>".to_string(),
            ))
        })?;

        let claims = validate_token(token, &state.jwt).map_err(|_| {
            AppError(ShiftError::Authentication(
                "Invalid or expired token".to_string(),
            ))
        })?;

        Ok(claims.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret-that-is-long-enough".to_string(),
            expiry_hours: 24,
        }
    }

    fn user(role: UserRole) -> UserAuth {
        UserAuth {
            id: Uuid::new_v4(),
            email: "planner@example.com".to_string(),
            password_hash: None,
            role,
            login_attempts: 0,
            locked_at: None,
            last_login_at: None,
            staff_id: Some(7),
            is_active: true,
        }
    }

    #[test]
    fn token_round_trip_keeps_claims() {
        let user = user(UserRole::Admin);
        let (token, expires_at) = issue_token(&user, &config(), Utc::now()).unwrap();
        let claims = validate_token(&token, &config()).unwrap();

        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.role, UserRole::Admin);
        assert_eq!(claims.staff_id, Some(7));
        assert_eq!(claims.exp, expires_at.timestamp());
    }

    #[test]
    fn expired_token_is_rejected() {
        let issued = Utc::now() - Duration::hours(48);
        let (token, _) = issue_token(&user(UserRole::Staff), &config(), issued).unwrap();
        assert!(validate_token(&token, &config()).is_err());
    }

    #[test]
    fn link_tokens_are_64_hex_chars_and_unique() {
        let a = generate_link_token();
        let b = generate_link_token();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn staff_role_cannot_act_as_admin() {
        let claims = Claims {
            sub: Uuid::new_v4(),
            email: "staff@example.com".to_string(),
            role: UserRole::Staff,
            staff_id: None,
            iat: 0,
            exp: 0,
        };
        let caller = AuthUser::from(claims);
        assert!(matches!(
            caller.require_admin(),
            Err(ShiftError::Authorization(_))
        ));
    }
}
