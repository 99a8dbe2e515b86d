use axum::{
    Router,
    routing::{get, patch, post, put},
};
use std::sync::Arc;

use crate::{ApiState, handlers};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route(
            "/api/staff",
            get(handlers::staff::list_staff).post(handlers::staff::create_staff),
        )
        .route("/api/staff/:id", patch(handlers::staff::update_staff))
        .route("/api/staff/:id/contract", put(handlers::staff::upsert_contract))
        .route(
            "/api/staff/sync-from-json",
            post(handlers::staff::sync_from_upload),
        )
        .route(
            "/api/staff/sync-from-json-body",
            post(handlers::staff::sync_from_json_body),
        )
}
