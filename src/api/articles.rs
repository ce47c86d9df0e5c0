//! Manual article/poem entry endpoint
//!
//! Articles and poems have no ISBN, so they are created directly with a
//! generated `article-<uuid>` id and flow through the same reading
//! pipeline as books.

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use super::require_store;
use crate::db::books as db;
use crate::error::{ApiError, ApiResult};
use crate::models::{BookRecord, BookStatus, EntryType, ARTICLE_ID_PREFIX};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/articles", post(create_article))
}

fn default_status() -> Option<BookStatus> {
    Some(BookStatus::Backlog)
}

#[derive(Debug, Deserialize)]
struct CreateArticleRequest {
    title: String,
    #[serde(default)]
    authors: Vec<String>,
    #[serde(default)]
    entry_type: Option<String>,
    number_of_pages: Option<i64>,
    description: Option<String>,
    #[serde(default = "default_status")]
    status: Option<BookStatus>,
}

/// `POST /api/articles` — create a manual entry. Defaults to the backlog;
/// a finished entry gets today's finished date stamped.
async fn create_article(
    State(state): State<AppState>,
    Json(request): Json<CreateArticleRequest>,
) -> ApiResult<(StatusCode, Json<BookRecord>)> {
    let pool = require_store(&state)?;

    let title = request.title.trim().to_string();
    if title.is_empty() {
        return Err(ApiError::InvalidInput("title must not be empty".to_string()));
    }

    let entry_type = request
        .entry_type
        .as_deref()
        .map(EntryType::article_kind)
        .unwrap_or(EntryType::Article);

    let id = format!("{ARTICLE_ID_PREFIX}{}", Uuid::new_v4());
    let mut record = BookRecord::new(id, entry_type);
    record.title = title;
    if !request.authors.is_empty() {
        record.authors = request.authors;
    }
    record.number_of_pages = request.number_of_pages;
    record.description = request.description.filter(|d| !d.trim().is_empty());
    record.status = request.status;

    let today = state.timezone.today();
    let record = db::create_article(pool, record, today, Utc::now()).await?;
    info!(id = %record.id, kind = entry_type.as_str(), "created manual entry");
    Ok((StatusCode::CREATED, Json(record)))
}
