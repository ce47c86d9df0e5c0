//! Book lookup and reading-pipeline endpoints

use axum::{
    extract::{Path, Query, State},
    routing::{get, put},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::require_store;
use crate::db::books as db;
use crate::error::{ApiError, ApiResult};
use crate::models::{BookRecord, BookStatus, BookUpdate, ARTICLE_ID_PREFIX};
use crate::AppState;

const DEFAULT_HISTORY_LIMIT: i64 = 20;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/books/isbn/:id", get(lookup_book))
        .route("/api/books/history", get(history))
        .route("/api/books/backlog", get(backlog_list).post(add_to_backlog))
        .route("/api/books/backlog/order", put(reorder_backlog))
        .route("/api/books/in-progress", get(in_progress_list))
        .route("/api/books/finished", get(finished_list))
        .route("/api/books/:id", axum::routing::patch(update_book).delete(delete_book))
}

/// Normalize a raw id: article ids pass through untouched, ISBNs are
/// stripped of separators and validated.
pub(crate) fn normalize_id(raw: &str) -> Result<String, ApiError> {
    let trimmed = raw.trim();
    if trimmed.starts_with(ARTICLE_ID_PREFIX) {
        return Ok(trimmed.to_string());
    }

    let cleaned: String = trimmed
        .chars()
        .filter(|c| !matches!(c, ' ' | '-'))
        .map(|c| c.to_ascii_uppercase())
        .collect();

    if is_valid_isbn(&cleaned) {
        Ok(cleaned)
    } else {
        Err(ApiError::InvalidInput(format!("not a valid ISBN: {raw:?}")))
    }
}

/// ISBN-13 is all digits; ISBN-10 allows a trailing X check character.
fn is_valid_isbn(isbn: &str) -> bool {
    let bytes = isbn.as_bytes();
    match bytes.len() {
        13 => bytes.iter().all(u8::is_ascii_digit),
        10 => {
            bytes[..9].iter().all(u8::is_ascii_digit)
                && (bytes[9].is_ascii_digit() || bytes[9] == b'X')
        }
        _ => false,
    }
}

/// `GET /api/books/isbn/{id}` — cached record if present (refreshing its
/// lookup timestamp), otherwise an external catalog lookup. Article ids
/// only ever resolve from the cache.
async fn lookup_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<BookRecord>> {
    let id = normalize_id(&id)?;

    if let Some(pool) = &state.store {
        if let Some(record) = db::get_book(pool, &id).await? {
            db::touch_last_looked_up(pool, &id, Utc::now()).await?;
            return Ok(Json(record));
        }
    }

    if id.starts_with(ARTICLE_ID_PREFIX) {
        return Err(ApiError::NotFound(format!("no record for {id}")));
    }

    let record = state.catalog.lookup_isbn(&id).await?;
    if let Some(pool) = &state.store {
        db::upsert_lookup(pool, &record, Utc::now()).await?;
    }
    info!(id = %id, title = %record.title, "book lookup complete");
    Ok(Json(record))
}

#[derive(Debug, Deserialize)]
struct HistoryParams {
    limit: Option<i64>,
}

/// `GET /api/books/history?limit=N` — recently looked-up records.
async fn history(
    State(state): State<AppState>,
    Query(params): Query<HistoryParams>,
) -> ApiResult<Json<Vec<BookRecord>>> {
    let Some(pool) = &state.store else {
        return Ok(Json(Vec::new()));
    };
    let limit = params.limit.unwrap_or(DEFAULT_HISTORY_LIMIT).max(1);
    Ok(Json(db::get_history(pool, limit).await?))
}

async fn status_list(state: &AppState, status: BookStatus) -> ApiResult<Json<Vec<BookRecord>>> {
    let Some(pool) = &state.store else {
        return Ok(Json(Vec::new()));
    };
    Ok(Json(db::list_by_status(pool, status).await?))
}

/// `GET /api/books/backlog` — backlog in user order.
async fn backlog_list(State(state): State<AppState>) -> ApiResult<Json<Vec<BookRecord>>> {
    status_list(&state, BookStatus::Backlog).await
}

/// `GET /api/books/in-progress`
async fn in_progress_list(State(state): State<AppState>) -> ApiResult<Json<Vec<BookRecord>>> {
    status_list(&state, BookStatus::InProgress).await
}

/// `GET /api/books/finished`
async fn finished_list(State(state): State<AppState>) -> ApiResult<Json<Vec<BookRecord>>> {
    status_list(&state, BookStatus::Finished).await
}

#[derive(Debug, Deserialize)]
struct AddToBacklogRequest {
    id: String,
}

/// `POST /api/books/backlog` — move an already-looked-up record into the
/// backlog at the end of the list.
async fn add_to_backlog(
    State(state): State<AppState>,
    Json(request): Json<AddToBacklogRequest>,
) -> ApiResult<Json<BookRecord>> {
    let pool = require_store(&state)?;
    let id = normalize_id(&request.id)?;
    let today = state.timezone.today();

    match db::add_to_backlog(pool, &id, today, Utc::now()).await? {
        Some(record) => {
            info!(id = %id, "added to backlog");
            Ok(Json(record))
        }
        None => Err(ApiError::NotFound(format!(
            "no record for {id}; look it up before adding to the backlog"
        ))),
    }
}

#[derive(Debug, Deserialize)]
struct ReorderRequest {
    ids: Vec<String>,
}

/// `PUT /api/books/backlog/order` — rewrite backlog positions from the
/// given id order; returns the reordered backlog.
async fn reorder_backlog(
    State(state): State<AppState>,
    Json(request): Json<ReorderRequest>,
) -> ApiResult<Json<Vec<BookRecord>>> {
    let pool = require_store(&state)?;
    db::reorder_backlog(pool, &request.ids).await?;
    Ok(Json(db::list_by_status(pool, BookStatus::Backlog).await?))
}

/// `PATCH /api/books/{id}` — partial update with status-transition rules.
async fn update_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<BookUpdate>,
) -> ApiResult<Json<BookRecord>> {
    let pool = require_store(&state)?;
    let id = normalize_id(&id)?;
    let today = state.timezone.today();

    match db::update_book(pool, &id, &update, today).await? {
        Some(record) => Ok(Json(record)),
        None => Err(ApiError::NotFound(format!("no record for {id}"))),
    }
}

/// `DELETE /api/books/{id}` — idempotent delete.
async fn delete_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let pool = require_store(&state)?;
    let id = normalize_id(&id)?;
    let deleted = db::delete_book(pool, &id).await?;
    if deleted {
        info!(id = %id, "deleted record");
    }
    Ok(Json(json!({ "deleted": deleted })))
}
