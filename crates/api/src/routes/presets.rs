use axum::{Router, routing::get};
use std::sync::Arc;

use crate::{ApiState, handlers};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/api/presets", get(handlers::presets::list_presets))
        .route(
            "/api/presets/temporary",
            get(handlers::presets::list_temporary),
        )
        .route(
            "/api/presets/temporary/:key",
            get(handlers::presets::get_temporary)
                .put(handlers::presets::put_temporary)
                .delete(handlers::presets::delete_temporary),
        )
}
