use axum::{
    Router,
    routing::{delete, get, post},
};
use std::sync::Arc;

use crate::{ApiState, handlers};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route(
            "/api/csv-import/schedules",
            post(handlers::import::import_schedules),
        )
        .route("/api/csv-import/rollback", delete(handlers::import::rollback))
        .route("/api/csv-import/history", get(handlers::import::history))
}
