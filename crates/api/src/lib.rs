//! # Shiftboard API
//!
//! The API crate provides the web server for the Shiftboard shift planner.
//! It exposes the daily grid, the monthly approval workflow, bulk imports and the
//! credential flows over JSON.
//!
//! ## Architecture
//!
//! This crate follows a layered architecture:
//!
//! - **Routes**: Define API endpoints and URL structure
//! - **Handlers**: Implement request processing logic
//! - **Middleware**: Authentication, password hashing and error mapping
//! - **Config**: Handle environment and application configuration
//!
//! Business rules live in `shiftboard-core`; persistence in `shiftboard-db`.

/// Configuration module for API settings
pub mod config;
/// Request handlers that implement business logic
pub mod handlers;
/// Middleware for authentication and error handling
pub mod middleware;
/// Route definitions and API endpoint structure
pub mod routes;

use std::sync::Arc;

use axum::{
    Router,
    http::{HeaderValue, Method, header},
};
use eyre::Result;
use shiftboard_core::temp_presets::TemporaryPresetStore;
use shiftboard_db::{DbPool, repositories::temp_preset::PgTemporaryPresetStore};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::middleware::auth::JwtConfig;

/// Shared application state that is accessible to all request handlers
pub struct ApiState {
    /// PostgreSQL connection pool for database operations
    pub db_pool: DbPool,

    /// Signing settings for bearer tokens
    pub jwt: JwtConfig,

    /// Web client address used in setup and reset links
    pub app_base_url: String,

    /// Planners' temporary presets
    pub temp_presets: Arc<dyn TemporaryPresetStore>,
}

impl ApiState {
    /// State backed by PostgreSQL for everything, including temporary presets.
    pub fn new(config: &config::ApiConfig, db_pool: DbPool) -> Self {
        let temp_presets = Arc::new(PgTemporaryPresetStore::new(db_pool.clone()));
        Self {
            db_pool,
            jwt: JwtConfig {
                secret: config.jwt_secret.clone(),
                expiry_hours: config.jwt_expiry_hours,
            },
            app_base_url: config.app_base_url.clone(),
            temp_presets,
        }
    }
}

/// Builds the application router with every route group and request tracing.
pub fn build_router(state: Arc<ApiState>) -> Router {
    Router::new()
        .merge(routes::health::routes())
        .merge(routes::auth::routes())
        .merge(routes::staff::routes())
        .merge(routes::schedule::routes())
        .merge(routes::pending::routes())
        .merge(routes::import::routes())
        .merge(routes::presets::routes())
        .merge(routes::holidays::routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .allow_origin(allowed)
        .allow_credentials(true)
}

/// Starts the API server with the provided configuration and database connection
///
/// # Arguments
///
/// * `config` - API configuration including host, port, and other settings
/// * `db_pool` - PostgreSQL connection pool for database operations
pub async fn start_server(config: config::ApiConfig, db_pool: DbPool) -> Result<()> {
    let state = Arc::new(ApiState::new(&config, db_pool));
    let app = build_router(state);

    // Apply CORS configuration if origins are specified
    let app = match &config.cors_origins {
        Some(origins) => app.layer(cors_layer(origins)),
        None => app,
    };

    // Add request timeout middleware
    let app = app.layer(
        tower::ServiceBuilder::new()
            .layer(axum::error_handling::HandleErrorLayer::new(
                |_: tower::BoxError| async { axum::http::StatusCode::REQUEST_TIMEOUT },
            ))
            .timeout(std::time::Duration::from_secs(config.request_timeout)),
    );

    let addr = config.server_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
