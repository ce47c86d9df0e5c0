//! Environment-based configuration for booklog
//!
//! The service runs cache-less when no database URL is configured: lookups
//! go straight to the catalog providers, reading-log reads return empty
//! results, and reading-log writes fail with 503.

use tracing::info;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5742";
pub const DEFAULT_TIMEZONE: &str = "UTC";

/// Resolved service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database URL or path; `None` disables all storage-backed
    /// features.
    pub database_url: Option<String>,
    /// IANA timezone used for "today" and stats windows.
    pub timezone: String,
    /// Optional Google Books API key (unkeyed requests may be throttled).
    pub google_books_api_key: Option<String>,
    pub bind_addr: String,
    /// Origins allowed by CORS (the local frontend).
    pub allowed_origins: Vec<String>,
}

impl Config {
    /// Read configuration from the environment.
    pub fn from_env() -> Self {
        let database_url = non_empty(std::env::var("BOOKLOG_DATABASE_URL").ok());
        match &database_url {
            Some(_) => info!("Database URL configured (cache and reading log enabled)"),
            None => info!("BOOKLOG_DATABASE_URL not set; running cache-less"),
        }

        let timezone = non_empty(std::env::var("BOOKLOG_TIMEZONE").ok())
            .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string());

        let google_books_api_key = non_empty(std::env::var("BOOKLOG_GOOGLE_BOOKS_API_KEY").ok());
        if google_books_api_key.is_some() {
            info!("Google Books API key loaded from environment");
        }

        let bind_addr = non_empty(std::env::var("BOOKLOG_BIND").ok())
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        let allowed_origins = non_empty(std::env::var("BOOKLOG_ALLOWED_ORIGINS").ok())
            .map(|raw| {
                raw.split(',')
                    .map(|origin| origin.trim().to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect()
            })
            .unwrap_or_else(default_origins);

        Self {
            database_url,
            timezone,
            google_books_api_key,
            bind_addr,
            allowed_origins,
        }
    }
}

fn default_origins() -> Vec<String> {
    vec![
        "http://localhost:5173".to_string(),
        "http://127.0.0.1:5173".to_string(),
    ]
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
