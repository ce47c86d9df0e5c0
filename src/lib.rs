//! booklog library interface
//!
//! Personal reading-log backend: ISBN metadata lookup against Open
//! Library and Google Books, an optional SQLite cache, a
//! backlog/in-progress/finished reading pipeline, and reading-activity
//! statistics.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod time;

pub use crate::error::{ApiError, ApiResult};

use axum::http::{header::HeaderValue, Method};
use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::services::lookup::CatalogLookup;
use crate::time::AppTimezone;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Optional persistence; `None` runs the service cache-less.
    pub store: Option<SqlitePool>,
    /// Combined Open Library / Google Books lookup.
    pub catalog: CatalogLookup,
    /// Timezone defining "today" for reading-log dates.
    pub timezone: AppTimezone,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(store: Option<SqlitePool>, catalog: CatalogLookup, timezone: AppTimezone) -> Self {
        Self {
            store,
            catalog,
            timezone,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState, allowed_origins: &[String]) -> Router {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "skipping unparseable CORS origin");
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers(Any);

    Router::new()
        .merge(api::books::routes())
        .merge(api::articles::routes())
        .merge(api::activity::routes())
        .merge(api::health::routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
