//! HTTP API handlers

pub mod activity;
pub mod articles;
pub mod books;
pub mod health;

use sqlx::SqlitePool;

use crate::error::ApiError;
use crate::AppState;

/// The store, or a 503 for operations that cannot run without one.
/// Read-only endpoints degrade to empty responses instead of calling this.
pub(crate) fn require_store(state: &AppState) -> Result<&SqlitePool, ApiError> {
    state.store.as_ref().ok_or_else(|| {
        ApiError::BackendUnavailable("no database configured".to_string())
    })
}
