//! External catalog clients and lookup/aggregation services

pub mod google_books;
pub mod lookup;
pub mod normalizer;
pub mod open_library;
pub mod stats;

use serde::Deserialize;
use thiserror::Error;

/// Errors from the external catalog providers.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("network error: {0}")]
    Network(String),

    #[error("no match for id {0}")]
    NotFound(String),

    #[error("provider returned {0}: {1}")]
    Api(u16, String),

    #[error("parse error: {0}")]
    Parse(String),
}

/// Page counts occasionally arrive as strings or fractions; anything that
/// is not a plain integer is treated as absent rather than failing the
/// whole record.
pub(crate) fn lenient_page_count<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.as_i64()))
}
