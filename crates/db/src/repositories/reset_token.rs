use chrono::{DateTime, Utc};
use eyre::Result;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use shiftboard_core::errors::{ShiftError, ShiftResult};
use shiftboard_core::models::auth::{PasswordResetToken, TokenType};

use crate::models::DbResetToken;
use crate::repositories::db_error;

const TOKEN_COLUMNS: &str = "token, token_type, user_id, expires_at, used, created_at";

/// Stores a freshly issued token. Older unused tokens of the same type are retired.
pub async fn create_token(
    pool: &Pool<Postgres>,
    token: &str,
    token_type: TokenType,
    user_id: Uuid,
    now: DateTime<Utc>,
) -> Result<DbResetToken> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "UPDATE password_reset_tokens SET used = TRUE WHERE user_id = $1 AND token_type = $2 AND used = FALSE",
    )
    .bind(user_id)
    .bind(token_type.as_str())
    .execute(&mut *tx)
    .await?;

    let row = sqlx::query_as::<_, DbResetToken>(&format!(
        r#"
        INSERT INTO password_reset_tokens (token, token_type, user_id, expires_at, used, created_at)
        VALUES ($1, $2, $3, $4, FALSE, $5)
        RETURNING {}
        "#,
        TOKEN_COLUMNS
    ))
    .bind(token)
    .bind(token_type.as_str())
    .bind(user_id)
    .bind(now + token_type.lifetime())
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(row)
}

/// Consumes a token and stores the new password hash in one transaction.
///
/// Returns the id of the account whose password was set.
pub async fn consume_token(
    pool: &Pool<Postgres>,
    token: &str,
    password_hash: &str,
    now: DateTime<Utc>,
) -> ShiftResult<Uuid> {
    let mut tx = pool.begin().await.map_err(db_error)?;

    let row = sqlx::query_as::<_, DbResetToken>(&format!(
        "SELECT {} FROM password_reset_tokens WHERE token = $1 FOR UPDATE",
        TOKEN_COLUMNS
    ))
    .bind(token)
    .fetch_optional(&mut *tx)
    .await
    .map_err(db_error)?
    .ok_or_else(|| ShiftError::Authentication("Invalid or unknown link".to_string()))?;

    let token = PasswordResetToken::try_from(row)?;
    token.ensure_usable(now)?;

    sqlx::query("UPDATE password_reset_tokens SET used = TRUE WHERE token = $1")
        .bind(&token.token)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

    sqlx::query(
        "UPDATE user_auth SET password_hash = $2, login_attempts = 0, locked_at = NULL WHERE id = $1",
    )
    .bind(token.user_id)
    .bind(password_hash)
    .execute(&mut *tx)
    .await
    .map_err(db_error)?;

    tx.commit().await.map_err(db_error)?;

    tracing::info!(
        "Password set through {} token for user {}",
        token.token_type.as_str(),
        token.user_id
    );
    Ok(token.user_id)
}
