//! edt-api library interface
//!
//! HTTP service for the emergency dispatch tracker. Exposes the router and
//! workflow operations for integration testing.

pub mod api;
pub mod db;
pub mod error;
pub mod extract;
pub mod seed;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::http::HeaderValue;
use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Allowed CORS origin; `None` allows any
    pub cors_origin: Option<String>,
}

impl AppState {
    pub fn new(db: SqlitePool) -> Self {
        Self {
            db,
            startup_time: Utc::now(),
            cors_origin: None,
        }
    }

    pub fn with_cors_origin(mut self, origin: Option<String>) -> Self {
        self.cors_origin = origin;
        self
    }
}

fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let Some(origin) = origin else {
        return CorsLayer::permissive();
    };

    match HeaderValue::from_str(origin) {
        Ok(value) => CorsLayer::new()
            .allow_origin(value)
            .allow_methods(Any)
            .allow_headers(Any),
        Err(e) => {
            warn!(origin = %origin, error = %e, "Invalid CORS origin, allowing any");
            CorsLayer::permissive()
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(state.cors_origin.as_deref());

    Router::new()
        .merge(api::health_routes())
        .merge(api::caller_routes())
        .merge(api::location_routes())
        .merge(api::responder_routes())
        .merge(api::session_routes())
        .merge(api::dispatch_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
