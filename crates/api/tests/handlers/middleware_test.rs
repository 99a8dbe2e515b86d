use axum::{body::to_bytes, http::StatusCode};
use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::Value;
use shiftboard_api::middleware::{
    auth::{self, validate_token},
    error_handling::{map_error, status_code},
};
use shiftboard_core::{errors::ShiftError, models::auth::UserRole, models::import::CharacterViolation};

use crate::test_utils::{jwt_config, user};

async fn body_json(err: ShiftError) -> (StatusCode, Value) {
    let response = map_error(err);
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[rstest]
#[case(ShiftError::NotFound("x".into()), StatusCode::NOT_FOUND)]
#[case(ShiftError::Validation("x".into()), StatusCode::BAD_REQUEST)]
#[case(ShiftError::ImportRejected(Vec::new()), StatusCode::BAD_REQUEST)]
#[case(ShiftError::Conflict("x".into()), StatusCode::CONFLICT)]
#[case(ShiftError::Authentication("x".into()), StatusCode::UNAUTHORIZED)]
#[case(ShiftError::InvalidCredentials { remaining_attempts: 3 }, StatusCode::UNAUTHORIZED)]
#[case(ShiftError::Authorization("x".into()), StatusCode::FORBIDDEN)]
#[case(
    ShiftError::RateLimited { message: "x".into(), remaining_attempts: 0, next_attempt_allowed: None },
    StatusCode::TOO_MANY_REQUESTS
)]
#[case(ShiftError::Database(eyre::eyre!("down")), StatusCode::INTERNAL_SERVER_ERROR)]
fn test_status_mapping(#[case] err: ShiftError, #[case] expected: StatusCode) {
    assert_eq!(status_code(&err), expected);
}

#[tokio::test]
async fn test_server_errors_hide_details() {
    let (status, body) = body_json(ShiftError::Database(eyre::eyre!("password=hunter2"))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Internal server error");
}

#[tokio::test]
async fn test_invalid_credentials_report_remaining_attempts() {
    let (status, body) = body_json(ShiftError::InvalidCredentials {
        remaining_attempts: 2,
    })
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["remainingAttempts"], 2);
}

#[tokio::test]
async fn test_rate_limited_reports_next_attempt() {
    let next = Utc::now() + Duration::minutes(15);
    let (status, body) = body_json(ShiftError::RateLimited {
        message: "locked".into(),
        remaining_attempts: 0,
        next_attempt_allowed: Some(next),
    })
    .await;

    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["remainingAttempts"], 0);
    assert!(body["nextAttemptAllowed"].is_string());
}

#[tokio::test]
async fn test_import_rejection_lists_violations() {
    let (_, body) = body_json(ShiftError::ImportRejected(vec![CharacterViolation {
        row: 2,
        field: "name".into(),
        value: "a@b".into(),
        invalid_chars: vec!['@'],
    }]))
    .await;

    assert_eq!(body["violations"][0]["row"], 2);
    assert_eq!(body["violations"][0]["invalidChars"][0], "@");
}

#[test]
fn test_password_hash_round_trip() {
    let hashed = auth::hash_password("correct horse").unwrap();

    assert!(hashed.starts_with("$argon2"));
    assert!(auth::verify_password("correct horse", &hashed).unwrap());
    assert!(!auth::verify_password("wrong horse", &hashed).unwrap());
}

#[test]
fn test_malformed_hash_is_an_error() {
    assert!(auth::verify_password("anything", "not-a-phc-string").is_err());
}

#[test]
fn test_token_signed_with_other_secret_is_rejected() {
    let (token, _) = auth::issue_token(&user(UserRole::Admin, None), &jwt_config(), Utc::now())
        .unwrap();
    let mut other = jwt_config();
    other.secret = "another-secret".into();

    assert!(validate_token(&token, &jwt_config()).is_ok());
    assert!(validate_token(&token, &other).is_err());
}
