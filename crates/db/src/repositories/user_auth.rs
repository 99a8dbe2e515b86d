use chrono::{DateTime, Utc};
use eyre::Result;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use shiftboard_core::lockout::{LoginAttempts, MAX_LOGIN_ATTEMPTS, lockout_window};
use shiftboard_core::models::auth::UserRole;

use crate::models::DbUserAuth;

const USER_COLUMNS: &str = "id, email, password_hash, role, login_attempts, locked_at, \
                            last_login_at, staff_id, is_active, created_at";

/// Looks up an account by e-mail, case-insensitively.
pub async fn get_user_by_email(pool: &Pool<Postgres>, email: &str) -> Result<Option<DbUserAuth>> {
    let user = sqlx::query_as::<_, DbUserAuth>(&format!(
        "SELECT {} FROM user_auth WHERE LOWER(email) = LOWER($1)",
        USER_COLUMNS
    ))
    .bind(email.trim())
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

pub async fn get_user_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<DbUserAuth>> {
    let user = sqlx::query_as::<_, DbUserAuth>(&format!(
        "SELECT {} FROM user_auth WHERE id = $1",
        USER_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

/// Counts a failed login in one statement, so parallel failures are all counted.
///
/// A lock older than the lockout window starts the count over. The counter
/// reaching the limit sets `locked_at`. Returns the stored counter.
pub async fn record_login_failure(
    pool: &Pool<Postgres>,
    id: Uuid,
    now: DateTime<Utc>,
) -> Result<LoginAttempts> {
    let (login_attempts, locked_at): (i32, Option<DateTime<Utc>>) = sqlx::query_as(
        r#"
        UPDATE user_auth
        SET login_attempts = CASE WHEN locked_at <= $3 THEN 1 ELSE login_attempts + 1 END,
            locked_at = CASE
                WHEN locked_at > $3 THEN locked_at
                WHEN (CASE WHEN locked_at <= $3 THEN 1 ELSE login_attempts + 1 END) >= $4 THEN $2
                ELSE NULL
            END
        WHERE id = $1
        RETURNING login_attempts, locked_at
        "#,
    )
    .bind(id)
    .bind(now)
    .bind(now - lockout_window())
    .bind(MAX_LOGIN_ATTEMPTS)
    .fetch_one(pool)
    .await?;

    tracing::debug!("Login failure {} recorded for user {}", login_attempts, id);
    Ok(LoginAttempts::new(login_attempts, locked_at))
}

pub async fn record_login_success(
    pool: &Pool<Postgres>,
    id: Uuid,
    now: DateTime<Utc>,
) -> Result<()> {
    sqlx::query(
        "UPDATE user_auth SET login_attempts = 0, locked_at = NULL, last_login_at = $2 WHERE id = $1",
    )
    .bind(id)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(())
}

/// Stores a new password hash and clears any lockout.
pub async fn set_password_hash(pool: &Pool<Postgres>, id: Uuid, password_hash: &str) -> Result<()> {
    sqlx::query(
        "UPDATE user_auth SET password_hash = $2, login_attempts = 0, locked_at = NULL WHERE id = $1",
    )
    .bind(id)
    .bind(password_hash)
    .execute(pool)
    .await?;

    Ok(())
}

/// Creates an account without a password unless the e-mail is already taken.
/// Returns the stored account either way.
pub async fn ensure_user(
    pool: &Pool<Postgres>,
    email: &str,
    role: UserRole,
    staff_id: Option<i32>,
) -> Result<DbUserAuth> {
    let email = email.trim().to_lowercase();

    sqlx::query(
        r#"
        INSERT INTO user_auth (id, email, role, staff_id, login_attempts, is_active, created_at)
        VALUES ($1, $2, $3, $4, 0, TRUE, $5)
        ON CONFLICT (email) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&email)
    .bind(role.as_str())
    .bind(staff_id)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    get_user_by_email(pool, &email)
        .await?
        .ok_or_else(|| eyre::eyre!("User {} vanished after insert", email))
}
