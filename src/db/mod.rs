//! SQLite persistence for booklog
//!
//! Holds one row per book/article, an append-only progress-event ledger,
//! and a key-value settings table (calendar overrides). The whole layer is
//! optional: the service runs cache-less when no database is configured.

pub mod books;
pub mod overrides;

use anyhow::Result;
use sqlx::SqlitePool;

/// Connect (creating the file if needed) and run table migrations.
pub async fn init_pool(database_url: &str) -> Result<SqlitePool> {
    // Accept either a full sqlite URL or a bare path.
    let url = if database_url.starts_with("sqlite:") {
        database_url.to_string()
    } else {
        format!("sqlite://{}?mode=rwc", database_url)
    };
    tracing::debug!("Connecting to database: {}", url);

    let pool = SqlitePool::connect(&url).await?;
    init_tables(&pool).await?;

    Ok(pool)
}

/// Create booklog tables if they don't exist.
///
/// Public so tests can initialize in-memory pools.
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS books (
            id TEXT PRIMARY KEY,
            entry_type TEXT NOT NULL DEFAULT 'book',
            title TEXT NOT NULL,
            authors TEXT NOT NULL DEFAULT '[]',
            publishers TEXT NOT NULL DEFAULT '[]',
            publish_date TEXT,
            number_of_pages INTEGER,
            cover_url TEXT,
            subjects TEXT NOT NULL DEFAULT '[]',
            description TEXT,
            last_looked_up TEXT NOT NULL,
            status TEXT,
            backlog_order INTEGER,
            backlog_date TEXT,
            started_date TEXT,
            current_page INTEGER,
            last_progress_date TEXT,
            finished_date TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS progress_events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            book_id TEXT NOT NULL,
            event_date TEXT NOT NULL,
            page_delta INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_progress_events_book ON progress_events(book_id)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Database tables initialized (books, progress_events, settings)");

    Ok(())
}
