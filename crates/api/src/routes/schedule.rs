use axum::{
    Router,
    routing::{get, patch, post},
};
use std::sync::Arc;

use crate::{ApiState, handlers};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/api/schedules", post(handlers::schedule::create_schedule))
        .route(
            "/api/schedules/:id",
            patch(handlers::schedule::update_schedule).delete(handlers::schedule::delete_schedule),
        )
        .route("/api/schedules/layered", get(handlers::schedule::get_layered))
        .route("/api/schedules/unified", get(handlers::schedule::get_unified))
}
