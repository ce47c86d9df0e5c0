//! Reading statistics and activity-calendar aggregation
//!
//! Two page counters run in parallel: pages attributed to finished items
//! (the full page count, credited on the finish date) and pages actually
//! recorded through progress updates. Calendar aggregation unions the
//! stored activity dates and applies the manual overrides last, so an
//! override always wins.

use anyhow::Result;
use serde::Serialize;
use sqlx::SqlitePool;

use crate::db::{books, overrides};
use crate::models::{BookRecord, BookStatus};
use crate::time::{month_window, month_window_of, year_window, CalendarDate};

/// Totals as of a reference date.
#[derive(Debug, Clone, Serialize)]
pub struct StatsReport {
    pub as_of: CalendarDate,
    pub pages_from_finished_this_month: i64,
    pub pages_from_finished_this_year: i64,
    pub pages_recorded_this_month: i64,
    pub pages_recorded_this_year: i64,
    pub items_finished_count: i64,
}

impl StatsReport {
    fn empty(as_of: CalendarDate) -> Self {
        Self {
            as_of,
            pages_from_finished_this_month: 0,
            pages_from_finished_this_year: 0,
            pages_recorded_this_month: 0,
            pages_recorded_this_year: 0,
            items_finished_count: 0,
        }
    }
}

/// One month of the activity calendar.
#[derive(Debug, Clone, Serialize)]
pub struct MonthSummary {
    pub year: i32,
    pub month: u32,
    pub pages_from_finished: i64,
    pub pages_recorded: i64,
    pub finished: Vec<BookRecord>,
    pub activity_dates: Vec<CalendarDate>,
}

fn finished_in_window(
    records: &[BookRecord],
    from: CalendarDate,
    to: CalendarDate,
) -> Vec<&BookRecord> {
    records
        .iter()
        .filter(|r| matches!(r.finished_date, Some(d) if d >= from && d <= to))
        .collect()
}

fn page_total<'a>(records: impl IntoIterator<Item = &'a BookRecord>) -> i64 {
    records
        .into_iter()
        .filter_map(|r| r.number_of_pages)
        .sum()
}

/// Aggregate totals for the month and year containing `as_of`. Without a
/// store everything is zero.
pub async fn compute(store: Option<&SqlitePool>, as_of: CalendarDate) -> Result<StatsReport> {
    let Some(pool) = store else {
        return Ok(StatsReport::empty(as_of));
    };

    let finished = books::list_by_status(pool, BookStatus::Finished).await?;
    let (month_start, month_end) = month_window(as_of);
    let (year_start, year_end) = year_window(as_of);

    Ok(StatsReport {
        as_of,
        pages_from_finished_this_month: page_total(finished_in_window(
            &finished,
            month_start,
            month_end,
        )),
        pages_from_finished_this_year: page_total(finished_in_window(
            &finished,
            year_start,
            year_end,
        )),
        pages_recorded_this_month: books::sum_progress_deltas(pool, month_start, month_end).await?,
        pages_recorded_this_year: books::sum_progress_deltas(pool, year_start, year_end).await?,
        items_finished_count: finished.len() as i64,
    })
}

/// All calendar days with reading activity, up to and including `today`.
///
/// Future-dated entries are purged from storage first, then the manual
/// overrides are applied: `true` adds a day, `false` removes it. Sorted
/// ascending, no duplicates.
pub async fn activity_dates(pool: &SqlitePool, today: CalendarDate) -> Result<Vec<CalendarDate>> {
    books::clear_future_activity_dates(pool, today).await?;

    let mut dates: Vec<CalendarDate> = books::collect_activity_dates(pool)
        .await?
        .into_iter()
        .filter(|d| *d <= today)
        .collect();

    for (raw, shown) in overrides::get_overrides(pool).await? {
        let Some(date) = CalendarDate::parse(&raw) else {
            continue;
        };
        if shown {
            dates.push(date);
        } else {
            dates.retain(|d| *d != date);
        }
    }

    dates.sort();
    dates.dedup();
    Ok(dates)
}

/// Summary of a specific month, or `None` for an out-of-range month
/// number. Derived purely from book records; overrides do not apply here.
pub async fn month_summary(
    pool: &SqlitePool,
    year: i32,
    month: u32,
) -> Result<Option<MonthSummary>> {
    let Some((start, end)) = month_window_of(year, month) else {
        return Ok(None);
    };

    let finished_all = books::list_by_status(pool, BookStatus::Finished).await?;
    let finished: Vec<BookRecord> = finished_in_window(&finished_all, start, end)
        .into_iter()
        .cloned()
        .collect();
    let pages_from_finished = page_total(&finished);
    let pages_recorded = books::sum_progress_deltas(pool, start, end).await?;

    let mut activity: Vec<CalendarDate> = books::collect_activity_dates(pool)
        .await?
        .into_iter()
        .filter(|d| *d >= start && *d <= end)
        .collect();
    activity.sort();
    activity.dedup();

    Ok(Some(MonthSummary {
        year,
        month,
        pages_from_finished,
        pages_recorded,
        finished,
        activity_dates: activity,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BookUpdate, EntryType};
    use chrono::Utc;

    async fn setup_test_db() -> SqlitePool {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        crate::db::init_tables(&pool).await.unwrap();
        pool
    }

    fn day(year: i32, month: u32, d: u32) -> CalendarDate {
        CalendarDate::from_ymd(year, month, d).unwrap()
    }

    async fn finish_book(pool: &SqlitePool, id: &str, pages: i64, finished: CalendarDate) {
        let mut record = BookRecord::new(id, EntryType::Book);
        record.number_of_pages = Some(pages);
        books::upsert_lookup(pool, &record, Utc::now()).await.unwrap();
        let update = BookUpdate {
            status: Some(BookStatus::Finished),
            finished_date: Some(finished),
            ..BookUpdate::default()
        };
        books::update_book(pool, id, &update, finished).await.unwrap();
    }

    #[tokio::test]
    async fn storeless_stats_are_zero() {
        let report = compute(None, day(2024, 3, 10)).await.unwrap();
        assert_eq!(report.pages_from_finished_this_year, 0);
        assert_eq!(report.items_finished_count, 0);
    }

    #[tokio::test]
    async fn finished_pages_partition_by_month_and_year() {
        let pool = setup_test_db().await;
        finish_book(&pool, "march", 496, day(2024, 3, 31)).await;
        finish_book(&pool, "feb", 200, day(2024, 2, 15)).await;
        finish_book(&pool, "last-year", 300, day(2023, 12, 31)).await;

        let report = compute(Some(&pool), day(2024, 3, 10)).await.unwrap();
        // The month boundary is inclusive on both ends.
        assert_eq!(report.pages_from_finished_this_month, 496);
        assert_eq!(report.pages_from_finished_this_year, 696);
        assert_eq!(report.items_finished_count, 3);
    }

    #[tokio::test]
    async fn recorded_pages_follow_the_ledger() {
        let pool = setup_test_db().await;
        let mut record = BookRecord::new("1", EntryType::Book);
        record.number_of_pages = Some(400);
        books::upsert_lookup(&pool, &record, Utc::now()).await.unwrap();

        books::record_progress_event(&pool, "1", day(2024, 2, 28), 40)
            .await
            .unwrap();
        books::record_progress_event(&pool, "1", day(2024, 3, 5), 60)
            .await
            .unwrap();
        books::record_progress_event(&pool, "1", day(2024, 3, 9), -10)
            .await
            .unwrap();

        let report = compute(Some(&pool), day(2024, 3, 10)).await.unwrap();
        assert_eq!(report.pages_recorded_this_month, 50);
        assert_eq!(report.pages_recorded_this_year, 90);
        // Nothing finished yet.
        assert_eq!(report.pages_from_finished_this_year, 0);
    }

    #[tokio::test]
    async fn books_without_page_counts_contribute_zero() {
        let pool = setup_test_db().await;
        let mut record = BookRecord::new("pageless", EntryType::Book);
        record.number_of_pages = None;
        books::upsert_lookup(&pool, &record, Utc::now()).await.unwrap();
        let update = BookUpdate {
            status: Some(BookStatus::Finished),
            finished_date: Some(day(2024, 3, 5)),
            ..BookUpdate::default()
        };
        books::update_book(&pool, "pageless", &update, day(2024, 3, 5))
            .await
            .unwrap();

        let report = compute(Some(&pool), day(2024, 3, 10)).await.unwrap();
        assert_eq!(report.pages_from_finished_this_month, 0);
        assert_eq!(report.items_finished_count, 1);
    }

    #[tokio::test]
    async fn activity_dates_union_and_dedupe() {
        let pool = setup_test_db().await;
        finish_book(&pool, "1", 100, day(2024, 3, 5)).await;

        let mut record = BookRecord::new("2", EntryType::Book);
        record.number_of_pages = Some(200);
        books::upsert_lookup(&pool, &record, Utc::now()).await.unwrap();
        let update = BookUpdate {
            status: Some(BookStatus::InProgress),
            started_date: Some(day(2024, 3, 5)),
            current_page: Some(20),
            ..BookUpdate::default()
        };
        books::update_book(&pool, "2", &update, day(2024, 3, 8))
            .await
            .unwrap();

        let dates = activity_dates(&pool, day(2024, 3, 10)).await.unwrap();
        assert_eq!(dates, vec![day(2024, 3, 5), day(2024, 3, 8)]);
    }

    #[tokio::test]
    async fn overrides_win_over_derived_activity() {
        let pool = setup_test_db().await;
        finish_book(&pool, "1", 100, day(2024, 3, 5)).await;
        overrides::set_override(&pool, day(2024, 3, 5), Some(false))
            .await
            .unwrap();
        overrides::set_override(&pool, day(2024, 3, 7), Some(true))
            .await
            .unwrap();

        let dates = activity_dates(&pool, day(2024, 3, 10)).await.unwrap();
        assert_eq!(dates, vec![day(2024, 3, 7)]);
    }

    #[tokio::test]
    async fn future_activity_is_purged_not_just_hidden() {
        let pool = setup_test_db().await;
        finish_book(&pool, "future", 100, day(2030, 1, 1)).await;

        let dates = activity_dates(&pool, day(2024, 3, 10)).await.unwrap();
        assert!(dates.is_empty());

        let record = books::get_book(&pool, "future").await.unwrap().unwrap();
        assert_eq!(record.finished_date, None);
    }

    #[tokio::test]
    async fn month_summary_scopes_to_the_month() {
        let pool = setup_test_db().await;
        finish_book(&pool, "in", 496, day(2024, 3, 31)).await;
        finish_book(&pool, "out", 200, day(2024, 4, 1)).await;
        books::record_progress_event(&pool, "in", day(2024, 3, 2), 25)
            .await
            .unwrap();

        let summary = month_summary(&pool, 2024, 3).await.unwrap().unwrap();
        assert_eq!(summary.pages_from_finished, 496);
        assert_eq!(summary.pages_recorded, 25);
        assert_eq!(summary.finished.len(), 1);
        assert_eq!(summary.finished[0].id, "in");
        assert_eq!(summary.activity_dates, vec![day(2024, 3, 31)]);
    }

    #[tokio::test]
    async fn month_summary_rejects_invalid_month() {
        let pool = setup_test_db().await;
        assert!(month_summary(&pool, 2024, 13).await.unwrap().is_none());
        assert!(month_summary(&pool, 2024, 0).await.unwrap().is_none());
    }
}
