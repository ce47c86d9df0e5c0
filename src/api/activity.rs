//! Statistics and reading-activity calendar endpoints

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::require_store;
use crate::db::overrides;
use crate::error::{ApiError, ApiResult};
use crate::services::stats::{self, MonthSummary, StatsReport};
use crate::time::CalendarDate;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/books/stats", get(get_stats))
        .route("/api/reading-activity/dates", get(get_activity_dates))
        .route("/api/reading-activity/month/:year/:month", get(get_month_summary))
        .route(
            "/api/reading-activity/overrides",
            get(get_overrides).put(put_override),
        )
}

#[derive(Debug, Deserialize)]
struct StatsParams {
    as_of: Option<String>,
}

/// `GET /api/books/stats?as_of=YYYY-MM-DD` — totals for the month and
/// year containing the reference date (default: today).
async fn get_stats(
    State(state): State<AppState>,
    Query(params): Query<StatsParams>,
) -> ApiResult<Json<StatsReport>> {
    let as_of = match params.as_of.as_deref() {
        Some(raw) => CalendarDate::parse(raw)
            .ok_or_else(|| ApiError::InvalidInput(format!("invalid as_of date: {raw:?}")))?,
        None => state.timezone.today(),
    };
    Ok(Json(stats::compute(state.store.as_ref(), as_of).await?))
}

/// `GET /api/reading-activity/dates` — every day with reading activity,
/// overrides applied, sorted ascending.
async fn get_activity_dates(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let dates = match &state.store {
        Some(pool) => stats::activity_dates(pool, state.timezone.today()).await?,
        None => Vec::new(),
    };
    Ok(Json(json!({ "dates": dates })))
}

/// `GET /api/reading-activity/month/{year}/{month}` — calendar detail for
/// one month, derived purely from book records.
async fn get_month_summary(
    State(state): State<AppState>,
    Path((year, month)): Path<(i32, u32)>,
) -> ApiResult<Json<MonthSummary>> {
    let summary = match &state.store {
        Some(pool) => stats::month_summary(pool, year, month).await?,
        None => crate::time::month_window_of(year, month).map(|_| MonthSummary {
            year,
            month,
            pages_from_finished: 0,
            pages_recorded: 0,
            finished: Vec::new(),
            activity_dates: Vec::new(),
        }),
    };
    summary
        .map(Json)
        .ok_or_else(|| ApiError::InvalidInput(format!("invalid month: {year}-{month}")))
}

/// `GET /api/reading-activity/overrides` — the stored override map.
async fn get_overrides(State(state): State<AppState>) -> ApiResult<Json<overrides::OverrideMap>> {
    let map = match &state.store {
        Some(pool) => overrides::get_overrides(pool).await?,
        None => overrides::OverrideMap::new(),
    };
    Ok(Json(map))
}

#[derive(Debug, Deserialize)]
struct OverrideRequest {
    date: CalendarDate,
    /// `true` forces the day shown, `false` forces it hidden, absent
    /// clears the override.
    shown: Option<bool>,
}

/// `PUT /api/reading-activity/overrides` — set or clear one day's
/// override; returns the updated map.
async fn put_override(
    State(state): State<AppState>,
    Json(request): Json<OverrideRequest>,
) -> ApiResult<Json<overrides::OverrideMap>> {
    let pool = require_store(&state)?;
    let map = overrides::set_override(pool, request.date, request.shown).await?;
    Ok(Json(map))
}
