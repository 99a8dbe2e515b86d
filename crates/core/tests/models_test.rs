use chrono::{Duration, NaiveDate, Utc};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::{from_str, json, to_value};
use shiftboard_core::models::{
    auth::{PasswordResetToken, TokenType, UserAuth, UserRole, validate_password_strength},
    pending::{CreatePendingRequest, PendingType},
    schedule::{ScheduleLayer, UnifiedScheduleQuery},
    staff::Staff,
};
use uuid::Uuid;

#[test]
fn test_staff_serialization_uses_camel_case() {
    let staff = Staff {
        id: 12,
        employee_id: "1001".to_string(),
        name: "Alice".to_string(),
        department: "Support".to_string(),
        group: "A".to_string(),
        is_active: true,
        import_batch_id: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    let value = to_value(&staff).expect("Failed to serialize staff");
    assert_eq!(value["employeeId"], "1001");
    assert_eq!(value["isActive"], true);
    assert!(value.get("employee_id").is_none());
}

#[test]
fn test_user_auth_never_serializes_password_hash() {
    let user = UserAuth {
        id: Uuid::new_v4(),
        email: "admin@example.com".to_string(),
        password_hash: Some("$argon2id$secret".to_string()),
        role: UserRole::Admin,
        login_attempts: 0,
        locked_at: None,
        last_login_at: None,
        staff_id: None,
        is_active: true,
    };

    let value = to_value(&user).expect("Failed to serialize user");
    assert!(value.get("passwordHash").is_none());
    assert_eq!(value["role"], "admin");
}

#[test]
fn test_create_pending_request_defaults_to_custom() {
    let request: CreatePendingRequest = from_str(
        r#"{"staffId": 3, "date": "2025-07-14",
            "segments": [{"status": "online", "start": 9, "end": 12, "memo": null}]}"#,
    )
    .expect("Failed to deserialize pending request");

    assert_eq!(request.pending_type, PendingType::Custom);
    assert_eq!(request.segments.len(), 1);
    assert_eq!(request.date, NaiveDate::from_ymd_opt(2025, 7, 14).unwrap());
}

#[test]
fn test_unified_query_masking_flag_is_optional() {
    let query: UnifiedScheduleQuery =
        serde_json::from_value(json!({"staffId": 1, "date": "2025-07-14"})).unwrap();
    assert!(!query.include_masking);
}

#[rstest]
#[case("contract", ScheduleLayer::Contract)]
#[case("Adjustment", ScheduleLayer::Adjustment)]
#[case("", ScheduleLayer::Adjustment)]
fn test_layer_from_str(#[case] raw: &str, #[case] expected: ScheduleLayer) {
    assert_eq!(raw.parse::<ScheduleLayer>().unwrap(), expected);
}

#[rstest]
#[case(TokenType::InitialSetup, 24)]
#[case(TokenType::Reset, 1)]
fn test_token_lifetimes(#[case] token_type: TokenType, #[case] hours: i64) {
    assert_eq!(token_type.lifetime(), Duration::hours(hours));
    assert_eq!(token_type.as_str().parse::<TokenType>().unwrap(), token_type);
}

#[test]
fn test_reset_token_is_single_use_and_expires() {
    let now = Utc::now();
    let mut token = PasswordResetToken {
        token: "ab".repeat(32),
        token_type: TokenType::Reset,
        user_id: Uuid::new_v4(),
        expires_at: now + TokenType::Reset.lifetime(),
        used: false,
        created_at: now,
    };

    assert!(token.ensure_usable(now).is_ok());
    assert!(token.ensure_usable(now + Duration::hours(1)).is_err());

    token.used = true;
    assert!(token.ensure_usable(now).is_err());
}

#[rstest]
#[case("short", false)]
#[case("longenough", true)]
fn test_password_strength(#[case] password: &str, #[case] ok: bool) {
    assert_eq!(validate_password_strength(password).is_ok(), ok);
}
