use chrono::{DateTime, Duration, Utc};
use mockall::predicate;
use shiftboard_api::{handlers::auth::check_credentials, middleware::error_handling::AppError};
use shiftboard_core::{
    errors::ShiftError,
    lockout::{LoginAttempts, MAX_LOGIN_ATTEMPTS},
    models::auth::UserAuth,
};

use crate::test_utils::{TestContext, db_user};

// Mirrors the login handler with the repository calls going to mocks.
async fn test_login_wrapper(
    ctx: &TestContext,
    email: &'static str,
    password: &str,
    now: DateTime<Utc>,
) -> Result<UserAuth, AppError> {
    let user = ctx
        .user_auth_repo
        .get_user_by_email(email)
        .await?
        .map(UserAuth::from)
        .ok_or(AppError(ShiftError::InvalidCredentials {
            remaining_attempts: MAX_LOGIN_ATTEMPTS as u32,
        }))?;

    if check_credentials(&user, password, now)? {
        ctx.user_auth_repo.record_login_success(user.id, now).await?;
        Ok(user)
    } else {
        let stored = ctx.user_auth_repo.record_login_failure(user.id, now).await?;
        Err(AppError(stored.failure_error()))
    }
}

#[tokio::test]
async fn test_login_success_resets_counter() {
    let mut ctx = TestContext::new();
    let row = db_user("s3cret-pass", 3);
    let id = row.id;

    ctx.user_auth_repo
        .expect_get_user_by_email()
        .with(predicate::eq("planner@example.com"))
        .times(1)
        .returning(move |_| Ok(Some(row.clone())));
    ctx.user_auth_repo
        .expect_record_login_success()
        .withf(move |user_id, _| *user_id == id)
        .times(1)
        .returning(|_, _| Ok(()));
    ctx.user_auth_repo.expect_record_login_failure().times(0);

    let user = test_login_wrapper(&ctx, "planner@example.com", "s3cret-pass", Utc::now())
        .await
        .unwrap();
    assert_eq!(user.id, id);
}

#[tokio::test]
async fn test_wrong_password_counts_down() {
    let mut ctx = TestContext::new();
    let row = db_user("s3cret-pass", 1);
    let id = row.id;

    ctx.user_auth_repo
        .expect_get_user_by_email()
        .returning(move |_| Ok(Some(row.clone())));
    ctx.user_auth_repo
        .expect_record_login_failure()
        .withf(move |user_id, _| *user_id == id)
        .times(1)
        .returning(|_, _| Ok(LoginAttempts::new(2, None)));

    let err = test_login_wrapper(&ctx, "planner@example.com", "nope", Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(
        err.0,
        ShiftError::InvalidCredentials {
            remaining_attempts: 3
        }
    ));
}

#[tokio::test]
async fn test_fifth_failure_locks_account() {
    let mut ctx = TestContext::new();
    let row = db_user("s3cret-pass", 4);
    let now = Utc::now();

    ctx.user_auth_repo
        .expect_get_user_by_email()
        .returning(move |_| Ok(Some(row.clone())));
    ctx.user_auth_repo
        .expect_record_login_failure()
        .times(1)
        .returning(move |_, at| Ok(LoginAttempts::new(5, Some(at))));

    let err = test_login_wrapper(&ctx, "planner@example.com", "nope", now)
        .await
        .unwrap_err();
    match err.0 {
        ShiftError::RateLimited {
            remaining_attempts,
            next_attempt_allowed,
            ..
        } => {
            assert_eq!(remaining_attempts, 0);
            assert_eq!(next_attempt_allowed, Some(now + Duration::minutes(15)));
        }
        other => panic!("expected a rate limit, got {:?}", other),
    }
}

#[tokio::test]
async fn test_failures_counted_in_parallel_lock_from_stored_counter() {
    // The account was read with one failure, but parallel requests already
    // pushed the stored counter to the limit.
    let mut ctx = TestContext::new();
    let row = db_user("s3cret-pass", 1);
    let now = Utc::now();
    let locked_at = now - Duration::seconds(2);

    ctx.user_auth_repo
        .expect_get_user_by_email()
        .returning(move |_| Ok(Some(row.clone())));
    ctx.user_auth_repo
        .expect_record_login_failure()
        .times(1)
        .returning(move |_, _| Ok(LoginAttempts::new(7, Some(locked_at))));

    let err = test_login_wrapper(&ctx, "planner@example.com", "nope", now)
        .await
        .unwrap_err();
    match err.0 {
        ShiftError::RateLimited {
            next_attempt_allowed,
            ..
        } => assert_eq!(next_attempt_allowed, Some(locked_at + Duration::minutes(15))),
        other => panic!("expected a rate limit, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unknown_email_is_generic() {
    let mut ctx = TestContext::new();
    ctx.user_auth_repo
        .expect_get_user_by_email()
        .returning(|_| Ok(None));
    ctx.user_auth_repo.expect_record_login_failure().times(0);

    let err = test_login_wrapper(&ctx, "ghost@example.com", "whatever", Utc::now())
        .await
        .unwrap_err();
    assert_eq!(err.0.to_string(), "Authentication error: invalid email or password");
}

#[tokio::test]
async fn test_locked_account_refuses_correct_password() {
    let mut ctx = TestContext::new();
    let now = Utc::now();
    let mut row = db_user("s3cret-pass", 5);
    row.locked_at = Some(now - Duration::minutes(5));

    ctx.user_auth_repo
        .expect_get_user_by_email()
        .returning(move |_| Ok(Some(row.clone())));
    ctx.user_auth_repo.expect_record_login_failure().times(0);
    ctx.user_auth_repo.expect_record_login_success().times(0);

    let err = test_login_wrapper(&ctx, "planner@example.com", "s3cret-pass", now)
        .await
        .unwrap_err();
    match err.0 {
        ShiftError::RateLimited {
            next_attempt_allowed,
            ..
        } => assert_eq!(next_attempt_allowed, Some(now + Duration::minutes(10))),
        other => panic!("expected a rate limit, got {:?}", other),
    }
}

#[test]
fn test_expired_lock_allows_login() {
    let now = Utc::now();
    let mut user: UserAuth = db_user("s3cret-pass", 5).into();
    user.locked_at = Some(now - Duration::minutes(16));

    assert!(check_credentials(&user, "s3cret-pass", now).unwrap());
}

#[test]
fn test_inactive_account_cannot_log_in() {
    let mut user: UserAuth = db_user("s3cret-pass", 0).into();
    user.is_active = false;

    assert!(!check_credentials(&user, "s3cret-pass", Utc::now()).unwrap());
}
