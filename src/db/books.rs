//! Book record persistence and reading-log state transitions
//!
//! One row per book/article keyed by id (upsert semantics). Status
//! transitions are unrestricted; the rules layered on top of plain field
//! assignment (backlog ordering, date stamping, the progress ledger) live
//! here so every caller gets the same behavior.

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use crate::models::{BookRecord, BookStatus, BookUpdate, EntryType};
use crate::time::CalendarDate;

const COLUMNS: &str = "id, entry_type, title, authors, publishers, publish_date, \
     number_of_pages, cover_url, subjects, description, last_looked_up, status, \
     backlog_order, backlog_date, started_date, current_page, last_progress_date, \
     finished_date";

fn json_list(value: &str) -> Vec<String> {
    serde_json::from_str(value).unwrap_or_default()
}

fn date_column(row: &SqliteRow, name: &str) -> Result<Option<CalendarDate>> {
    let raw: Option<String> = row.try_get(name)?;
    Ok(raw.as_deref().and_then(CalendarDate::from_storage))
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn record_from_row(row: &SqliteRow) -> Result<BookRecord> {
    let entry_type: String = row.try_get("entry_type")?;
    let authors: String = row.try_get("authors")?;
    let publishers: String = row.try_get("publishers")?;
    let subjects: String = row.try_get("subjects")?;
    let status: Option<String> = row.try_get("status")?;
    let last_looked_up: String = row.try_get("last_looked_up")?;

    Ok(BookRecord {
        id: row.try_get("id")?,
        entry_type: EntryType::parse(&entry_type).unwrap_or_default(),
        title: row.try_get("title")?,
        authors: json_list(&authors),
        publishers: json_list(&publishers),
        publish_date: row.try_get("publish_date")?,
        number_of_pages: row.try_get("number_of_pages")?,
        cover_url: row.try_get("cover_url")?,
        subjects: json_list(&subjects),
        description: row.try_get("description")?,
        last_looked_up: parse_timestamp(&last_looked_up),
        status: status.as_deref().and_then(BookStatus::parse),
        backlog_order: row.try_get("backlog_order")?,
        backlog_date: date_column(row, "backlog_date")?,
        started_date: date_column(row, "started_date")?,
        current_page: row.try_get("current_page")?,
        last_progress_date: date_column(row, "last_progress_date")?,
        finished_date: date_column(row, "finished_date")?,
    })
}

fn records_from_rows(rows: &[SqliteRow]) -> Result<Vec<BookRecord>> {
    rows.iter().map(record_from_row).collect()
}

/// Load a record by id.
pub async fn get_book(pool: &SqlitePool, id: &str) -> Result<Option<BookRecord>> {
    let sql = format!("SELECT {COLUMNS} FROM books WHERE id = ?");
    let row = sqlx::query(&sql).bind(id).fetch_optional(pool).await?;
    row.as_ref().map(record_from_row).transpose()
}

/// Upsert a freshly looked-up record and stamp `last_looked_up`. On
/// conflict only the external metadata is replaced; reading-log state
/// survives a re-lookup.
pub async fn upsert_lookup(
    pool: &SqlitePool,
    record: &BookRecord,
    now: DateTime<Utc>,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO books (id, entry_type, title, authors, publishers, publish_date,
                           number_of_pages, cover_url, subjects, description, last_looked_up,
                           status, backlog_order, backlog_date, started_date, current_page,
                           last_progress_date, finished_date)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            entry_type = excluded.entry_type,
            title = excluded.title,
            authors = excluded.authors,
            publishers = excluded.publishers,
            publish_date = excluded.publish_date,
            number_of_pages = excluded.number_of_pages,
            cover_url = excluded.cover_url,
            subjects = excluded.subjects,
            description = excluded.description,
            last_looked_up = excluded.last_looked_up
        "#,
    )
    .bind(&record.id)
    .bind(record.entry_type.as_str())
    .bind(&record.title)
    .bind(serde_json::to_string(&record.authors)?)
    .bind(serde_json::to_string(&record.publishers)?)
    .bind(&record.publish_date)
    .bind(record.number_of_pages)
    .bind(&record.cover_url)
    .bind(serde_json::to_string(&record.subjects)?)
    .bind(&record.description)
    .bind(now.to_rfc3339())
    .bind(record.status.map(BookStatus::as_str))
    .bind(record.backlog_order)
    .bind(record.backlog_date.map(CalendarDate::to_storage))
    .bind(record.started_date.map(CalendarDate::to_storage))
    .bind(record.current_page)
    .bind(record.last_progress_date.map(CalendarDate::to_storage))
    .bind(record.finished_date.map(CalendarDate::to_storage))
    .execute(pool)
    .await?;

    Ok(())
}

/// Refresh `last_looked_up` after serving a record from cache.
pub async fn touch_last_looked_up(
    pool: &SqlitePool,
    id: &str,
    now: DateTime<Utc>,
) -> Result<()> {
    sqlx::query("UPDATE books SET last_looked_up = ? WHERE id = ?")
        .bind(now.to_rfc3339())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Most recently looked-up records, descending.
pub async fn get_history(pool: &SqlitePool, limit: i64) -> Result<Vec<BookRecord>> {
    let sql = format!("SELECT {COLUMNS} FROM books ORDER BY last_looked_up DESC LIMIT ?");
    let rows = sqlx::query(&sql).bind(limit).fetch_all(pool).await?;
    records_from_rows(&rows)
}

/// Status-filtered list in its canonical order: backlog by position,
/// in-progress by recency, finished by finish date.
pub async fn list_by_status(pool: &SqlitePool, status: BookStatus) -> Result<Vec<BookRecord>> {
    let order_by = match status {
        BookStatus::Backlog => "backlog_order ASC",
        BookStatus::InProgress => "last_looked_up DESC",
        BookStatus::Finished => "finished_date DESC",
    };
    let sql = format!("SELECT {COLUMNS} FROM books WHERE status = ? ORDER BY {order_by}");
    let rows = sqlx::query(&sql)
        .bind(status.as_str())
        .fetch_all(pool)
        .await?;
    records_from_rows(&rows)
}

async fn next_backlog_order(pool: &SqlitePool) -> Result<i64> {
    let max: Option<i64> =
        sqlx::query_scalar("SELECT MAX(backlog_order) FROM books WHERE status = 'backlog'")
            .fetch_one(pool)
            .await?;
    Ok(max.map_or(0, |m| m + 1))
}

/// Move an existing record into the backlog: next order slot, backlog date
/// stamped today, `last_looked_up` refreshed. Returns `None` when the
/// record does not exist (metadata must be looked up first).
pub async fn add_to_backlog(
    pool: &SqlitePool,
    id: &str,
    today: CalendarDate,
    now: DateTime<Utc>,
) -> Result<Option<BookRecord>> {
    if get_book(pool, id).await?.is_none() {
        return Ok(None);
    }

    let order = next_backlog_order(pool).await?;
    sqlx::query(
        "UPDATE books SET status = 'backlog', backlog_order = ?, backlog_date = ?, \
         last_looked_up = ? WHERE id = ?",
    )
    .bind(order)
    .bind(today.to_storage())
    .bind(now.to_rfc3339())
    .bind(id)
    .execute(pool)
    .await?;

    get_book(pool, id).await
}

/// Rewrite backlog order by list position. Ids not currently in the
/// backlog are silently ignored; callers send the complete ordering.
pub async fn reorder_backlog(pool: &SqlitePool, ids: &[String]) -> Result<()> {
    for (position, id) in ids.iter().enumerate() {
        sqlx::query("UPDATE books SET backlog_order = ? WHERE id = ? AND status = 'backlog'")
            .bind(position as i64)
            .bind(id)
            .execute(pool)
            .await?;
    }
    Ok(())
}

/// Append one entry to the progress ledger.
pub async fn record_progress_event(
    pool: &SqlitePool,
    book_id: &str,
    date: CalendarDate,
    page_delta: i64,
) -> Result<()> {
    sqlx::query("INSERT INTO progress_events (book_id, event_date, page_delta) VALUES (?, ?, ?)")
        .bind(book_id)
        .bind(date.to_storage())
        .bind(page_delta)
        .execute(pool)
        .await?;
    Ok(())
}

/// Apply a partial update. Moving to in-progress without a started date
/// (provided or stored) stamps today; a `current_page` change stamps
/// `last_progress_date` and appends the signed delta to the progress
/// ledger. Returns `None` when the record does not exist.
pub async fn update_book(
    pool: &SqlitePool,
    id: &str,
    update: &BookUpdate,
    today: CalendarDate,
) -> Result<Option<BookRecord>> {
    let Some(existing) = get_book(pool, id).await? else {
        return Ok(None);
    };
    if update.is_empty() {
        return Ok(Some(existing));
    }

    let mut merged = existing.clone();
    if let Some(title) = &update.title {
        merged.title = title.clone();
    }
    if let Some(authors) = &update.authors {
        merged.authors = authors.clone();
    }
    if let Some(publishers) = &update.publishers {
        merged.publishers = publishers.clone();
    }
    if let Some(publish_date) = &update.publish_date {
        merged.publish_date = Some(publish_date.clone());
    }
    if let Some(pages) = update.number_of_pages {
        merged.number_of_pages = Some(pages);
    }
    if let Some(cover_url) = &update.cover_url {
        merged.cover_url = Some(cover_url.clone());
    }
    if let Some(subjects) = &update.subjects {
        merged.subjects = subjects.clone();
    }
    if let Some(description) = &update.description {
        merged.description = Some(description.clone());
    }
    if let Some(status) = update.status {
        merged.status = Some(status);
    }
    if let Some(date) = update.backlog_date {
        merged.backlog_date = Some(date);
    }
    if let Some(date) = update.started_date {
        merged.started_date = Some(date);
    }
    if let Some(date) = update.finished_date {
        merged.finished_date = Some(date);
    }

    if update.status == Some(BookStatus::InProgress)
        && update.started_date.is_none()
        && existing.started_date.is_none()
    {
        merged.started_date = Some(today);
    }

    if let Some(new_page) = update.current_page {
        merged.current_page = Some(new_page);
        merged.last_progress_date = Some(today);
        let old_page = existing.current_page.unwrap_or(0);
        if new_page != old_page {
            record_progress_event(pool, id, today, new_page - old_page).await?;
        }
    }

    sqlx::query(
        "UPDATE books SET title = ?, authors = ?, publishers = ?, publish_date = ?, \
         number_of_pages = ?, cover_url = ?, subjects = ?, description = ?, status = ?, \
         backlog_order = ?, backlog_date = ?, started_date = ?, current_page = ?, \
         last_progress_date = ?, finished_date = ? WHERE id = ?",
    )
    .bind(&merged.title)
    .bind(serde_json::to_string(&merged.authors)?)
    .bind(serde_json::to_string(&merged.publishers)?)
    .bind(&merged.publish_date)
    .bind(merged.number_of_pages)
    .bind(&merged.cover_url)
    .bind(serde_json::to_string(&merged.subjects)?)
    .bind(&merged.description)
    .bind(merged.status.map(BookStatus::as_str))
    .bind(merged.backlog_order)
    .bind(merged.backlog_date.map(CalendarDate::to_storage))
    .bind(merged.started_date.map(CalendarDate::to_storage))
    .bind(merged.current_page)
    .bind(merged.last_progress_date.map(CalendarDate::to_storage))
    .bind(merged.finished_date.map(CalendarDate::to_storage))
    .bind(id)
    .execute(pool)
    .await?;

    Ok(Some(merged))
}

/// Insert a manually created article/poem record. Backlog status gets the
/// next order slot and today's backlog date; in-progress without a started
/// date and finished without a finished date get stamped today.
pub async fn create_article(
    pool: &SqlitePool,
    mut record: BookRecord,
    today: CalendarDate,
    now: DateTime<Utc>,
) -> Result<BookRecord> {
    record.last_looked_up = Some(now);
    match record.status {
        Some(BookStatus::Backlog) => {
            record.backlog_order = Some(next_backlog_order(pool).await?);
            record.backlog_date = Some(today);
        }
        Some(BookStatus::InProgress) if record.started_date.is_none() => {
            record.started_date = Some(today);
        }
        Some(BookStatus::Finished) if record.finished_date.is_none() => {
            record.finished_date = Some(today);
        }
        _ => {}
    }

    sqlx::query(
        r#"
        INSERT INTO books (id, entry_type, title, authors, publishers, publish_date,
                           number_of_pages, cover_url, subjects, description, last_looked_up,
                           status, backlog_order, backlog_date, started_date, current_page,
                           last_progress_date, finished_date)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&record.id)
    .bind(record.entry_type.as_str())
    .bind(&record.title)
    .bind(serde_json::to_string(&record.authors)?)
    .bind(serde_json::to_string(&record.publishers)?)
    .bind(&record.publish_date)
    .bind(record.number_of_pages)
    .bind(&record.cover_url)
    .bind(serde_json::to_string(&record.subjects)?)
    .bind(&record.description)
    .bind(now.to_rfc3339())
    .bind(record.status.map(BookStatus::as_str))
    .bind(record.backlog_order)
    .bind(record.backlog_date.map(CalendarDate::to_storage))
    .bind(record.started_date.map(CalendarDate::to_storage))
    .bind(record.current_page)
    .bind(record.last_progress_date.map(CalendarDate::to_storage))
    .bind(record.finished_date.map(CalendarDate::to_storage))
    .execute(pool)
    .await?;

    Ok(record)
}

/// Delete a record and its progress ledger. Idempotent; returns whether a
/// record was actually removed.
pub async fn delete_book(pool: &SqlitePool, id: &str) -> Result<bool> {
    sqlx::query("DELETE FROM progress_events WHERE book_id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    let result = sqlx::query("DELETE FROM books WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Unset any stored started/finished/last-progress date later than
/// `today`, so a future-dated entry doesn't show as already read.
pub async fn clear_future_activity_dates(pool: &SqlitePool, today: CalendarDate) -> Result<()> {
    let cutoff = today.to_storage();
    for column in ["started_date", "finished_date", "last_progress_date"] {
        let sql =
            format!("UPDATE books SET {column} = NULL WHERE {column} IS NOT NULL AND {column} > ?");
        sqlx::query(&sql).bind(&cutoff).execute(pool).await?;
    }
    Ok(())
}

/// Every stored started/finished/last-progress date across all records
/// (duplicates included).
pub async fn collect_activity_dates(pool: &SqlitePool) -> Result<Vec<CalendarDate>> {
    let rows =
        sqlx::query("SELECT started_date, finished_date, last_progress_date FROM books")
            .fetch_all(pool)
            .await?;

    let mut dates = Vec::new();
    for row in &rows {
        for name in ["started_date", "finished_date", "last_progress_date"] {
            if let Some(date) = date_column(row, name)? {
                dates.push(date);
            }
        }
    }
    Ok(dates)
}

/// Net pages recorded (progress-event deltas) in the inclusive window.
pub async fn sum_progress_deltas(
    pool: &SqlitePool,
    from: CalendarDate,
    to: CalendarDate,
) -> Result<i64> {
    let sum: Option<i64> = sqlx::query_scalar(
        "SELECT SUM(page_delta) FROM progress_events WHERE event_date >= ? AND event_date <= ?",
    )
    .bind(from.to_storage())
    .bind(to.to_storage())
    .fetch_one(pool)
    .await?;
    Ok(sum.unwrap_or(0))
}
