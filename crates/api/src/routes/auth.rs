use axum::{Router, routing::post};
use std::sync::Arc;

use crate::{ApiState, handlers};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/set-password", post(handlers::auth::set_password))
        .route(
            "/api/auth/request-password-reset",
            post(handlers::auth::request_password_reset),
        )
        .route(
            "/api/auth/request-initial-setup",
            post(handlers::auth::request_initial_setup),
        )
        .route("/api/auth/setup-password", post(handlers::auth::setup_password))
}
