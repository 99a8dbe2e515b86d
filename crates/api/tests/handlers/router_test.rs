use axum::http::{HeaderName, HeaderValue, StatusCode, header};
use axum_test::TestServer;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use shiftboard_api::build_router;
use shiftboard_core::models::auth::UserRole;

use crate::test_utils::{TestContext, bearer};

fn server() -> TestServer {
    let state = TestContext::new().build_state();
    TestServer::new(build_router(state)).unwrap()
}

fn auth(role: UserRole) -> (HeaderName, HeaderValue) {
    (
        header::AUTHORIZATION,
        HeaderValue::from_str(&bearer(role, Some(3))).unwrap(),
    )
}

#[tokio::test]
async fn test_health_is_public() {
    let server = server();

    let response = server.get("/health").await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["status"], "ok");
}

#[tokio::test]
async fn test_protected_route_requires_token() {
    let server = server();

    let response = server.get("/api/presets").expect_failure().await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_garbage_token_is_rejected() {
    let server = server();

    let response = server
        .get("/api/presets")
        .add_header(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer not.a.token"),
        )
        .expect_failure()
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_preset_catalogue_carries_colors() {
    let server = server();
    let (name, value) = auth(UserRole::Staff);

    let response = server.get("/api/presets").add_header(name, value).await;

    response.assert_status_ok();
    let presets = response.json::<Vec<Value>>();
    assert!(!presets.is_empty());
    for preset in presets {
        assert!(preset["backgroundColor"].as_str().unwrap().starts_with('#'));
        assert!(preset["textColor"].as_str().unwrap().starts_with('#'));
    }
}

#[tokio::test]
async fn test_admin_routes_refuse_staff() {
    let server = server();
    let (name, value) = auth(UserRole::Staff);

    let response = server
        .post("/api/staff")
        .add_header(name.clone(), value.clone())
        .json(&json!({
            "employeeId": "1001",
            "name": "Sato",
            "department": "Support",
            "group": "A"
        }))
        .expect_failure()
        .await;
    response.assert_status(StatusCode::FORBIDDEN);

    let response = server
        .get("/api/csv-import/history")
        .add_header(name, value)
        .expect_failure()
        .await;
    response.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_temporary_presets_round_trip() {
    let server = server();
    let (name, value) = auth(UserRole::Admin);

    let preset = json!({
        "name": "Morning + meeting",
        "entries": [
            { "status": "online", "startTime": 9.0, "endTime": 12.0 },
            { "status": "meeting", "startTime": 12.0, "endTime": 13.0, "memo": "weekly" }
        ]
    });
    let response = server
        .put("/api/presets/temporary/planner-1")
        .add_header(name.clone(), value.clone())
        .json(&preset)
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["preset"]["id"], "planner-1");

    let listed = server
        .get("/api/presets/temporary")
        .add_header(name.clone(), value.clone())
        .await
        .json::<Vec<Value>>();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["key"], "planner-1");

    server
        .delete("/api/presets/temporary/planner-1")
        .add_header(name.clone(), value.clone())
        .await
        .assert_status(StatusCode::NO_CONTENT);
    server
        .get("/api/presets/temporary/planner-1")
        .add_header(name, value)
        .expect_failure()
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_temporary_preset_is_rejected() {
    let server = server();
    let (name, value) = auth(UserRole::Admin);

    let response = server
        .put("/api/presets/temporary/bad")
        .add_header(name, value)
        .json(&json!({ "name": "Backwards", "entries": [
            { "status": "online", "startTime": 12.0, "endTime": 9.0 }
        ]}))
        .expect_failure()
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}
