//! Calendar override storage
//!
//! Overrides force a calendar day shown (true) or hidden (false) on the
//! reading-activity calendar, independent of what the book records say.
//! The whole map is stored as one JSON value in the settings table.

use std::collections::BTreeMap;

use anyhow::Result;
use sqlx::SqlitePool;

use crate::time::CalendarDate;

const OVERRIDES_KEY: &str = "calendar_overrides";

/// Date string ("YYYY-MM-DD") to shown/hidden flag, sorted by date.
pub type OverrideMap = BTreeMap<String, bool>;

/// Load the override map; missing or unparseable state yields an empty map.
pub async fn get_overrides(pool: &SqlitePool) -> Result<OverrideMap> {
    let value: Option<String> =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
            .bind(OVERRIDES_KEY)
            .fetch_optional(pool)
            .await?;

    Ok(value
        .as_deref()
        .and_then(|v| serde_json::from_str(v).ok())
        .unwrap_or_default())
}

/// Replace the stored override map.
pub async fn set_overrides(pool: &SqlitePool, overrides: &OverrideMap) -> Result<()> {
    let value = serde_json::to_string(overrides)?;
    sqlx::query(
        "INSERT INTO settings (key, value) VALUES (?, ?) \
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
    )
    .bind(OVERRIDES_KEY)
    .bind(value)
    .execute(pool)
    .await?;
    Ok(())
}

/// Set or clear the override for one date. `None` removes the entry,
/// returning the day to its derived state.
pub async fn set_override(
    pool: &SqlitePool,
    date: CalendarDate,
    shown: Option<bool>,
) -> Result<OverrideMap> {
    let mut overrides = get_overrides(pool).await?;
    match shown {
        Some(flag) => {
            overrides.insert(date.to_string(), flag);
        }
        None => {
            overrides.remove(&date.to_string());
        }
    }
    set_overrides(pool, &overrides).await?;
    Ok(overrides)
}
