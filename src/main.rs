//! booklog - Personal reading-log backend
//!
//! ISBN metadata lookup (Open Library with a Google Books fallback), an
//! optional SQLite cache, and a backlog/in-progress/finished reading
//! pipeline with progress statistics.

use anyhow::Result;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use booklog::config::Config;
use booklog::services::lookup::CatalogLookup;
use booklog::time::AppTimezone;
use booklog::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting booklog");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env();

    let timezone = match AppTimezone::from_name(&config.timezone) {
        Some(tz) => tz,
        None => {
            warn!(
                "Unrecognized timezone {:?}; falling back to UTC",
                config.timezone
            );
            AppTimezone::utc()
        }
    };
    info!("Timezone: {}", timezone.name());

    let store = match &config.database_url {
        Some(url) => {
            let pool = booklog::db::init_pool(url).await?;
            info!("Database connection established");
            Some(pool)
        }
        None => None,
    };

    let catalog = CatalogLookup::new(config.google_books_api_key.clone())
        .map_err(|e| anyhow::anyhow!("Failed to build catalog clients: {}", e))?;

    let state = AppState::new(store, catalog, timezone);
    let app = booklog::build_router(state, &config.allowed_origins);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("Listening on http://{}", config.bind_addr);
    info!("Health check: http://{}/health", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
