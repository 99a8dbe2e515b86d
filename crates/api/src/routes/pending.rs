use axum::{
    Router,
    routing::{patch, post},
};
use std::sync::Arc;

use crate::{ApiState, handlers};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route(
            "/api/schedules/pending",
            post(handlers::pending::create_pending).get(handlers::pending::list_monthly),
        )
        .route(
            "/api/schedules/pending/preset",
            post(handlers::pending::apply_preset),
        )
        .route(
            "/api/schedules/pending/:id",
            patch(handlers::pending::update_pending).delete(handlers::pending::delete_pending),
        )
        .route(
            "/api/schedules/pending/:id/approve",
            post(handlers::pending::approve),
        )
        .route(
            "/api/schedules/pending/:id/reject",
            post(handlers::pending::reject),
        )
        .route(
            "/api/schedules/pending/:id/unapprove",
            post(handlers::pending::unapprove),
        )
}
