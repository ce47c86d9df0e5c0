//! Catalog lookup orchestration
//!
//! Open Library is queried first. Its author references are resolved
//! (capped), Google Books fills description/cover/page gaps, and a primary
//! miss falls back to a direct Google Books lookup. No retries: every call
//! either succeeds within its timeout or the lookup fails.

use tracing::{info, warn};

use super::google_books::GoogleBooksClient;
use super::normalizer;
use super::open_library::OpenLibraryClient;
use super::CatalogError;
use crate::models::BookRecord;

/// Maximum author references resolved per edition.
const MAX_AUTHOR_LOOKUPS: usize = 5;

/// Combined external catalog lookup.
#[derive(Debug, Clone)]
pub struct CatalogLookup {
    open_library: OpenLibraryClient,
    google_books: GoogleBooksClient,
}

impl CatalogLookup {
    pub fn new(google_books_api_key: Option<String>) -> Result<Self, CatalogError> {
        Ok(Self {
            open_library: OpenLibraryClient::new()?,
            google_books: GoogleBooksClient::new(google_books_api_key)?,
        })
    }

    /// Assemble from preconfigured clients (used by tests).
    pub fn with_clients(open_library: OpenLibraryClient, google_books: GoogleBooksClient) -> Self {
        Self {
            open_library,
            google_books,
        }
    }

    /// Look up a normalized, digits-only ISBN against both catalogs.
    pub async fn lookup_isbn(&self, isbn: &str) -> Result<BookRecord, CatalogError> {
        match self.open_library.fetch_edition(isbn).await {
            Ok(edition) => {
                let keys: Vec<&str> = edition
                    .authors
                    .iter()
                    .filter_map(|a| a.key.as_deref())
                    .take(MAX_AUTHOR_LOOKUPS)
                    .collect();

                let mut authors = Vec::new();
                for key in &keys {
                    if let Some(name) = self.open_library.fetch_author_name(key).await {
                        authors.push(name);
                    }
                }
                if authors.is_empty() {
                    // No reference resolved; fall back to the raw keys.
                    authors = keys.iter().map(|k| k.to_string()).collect();
                }

                let mut record = normalizer::from_open_library(isbn, &edition, authors);

                if normalizer::description_is_empty(&record.description) {
                    match self.google_books.fetch_volume(isbn).await {
                        Ok(Some(volume)) => {
                            normalizer::enrich_from_google_books(&mut record, &volume)
                        }
                        Ok(None) => {}
                        Err(e) => {
                            warn!(isbn = %isbn, error = %e, "Google Books enrichment failed")
                        }
                    }
                }

                info!(isbn = %isbn, title = %record.title, "resolved via Open Library");
                Ok(record)
            }
            Err(CatalogError::NotFound(_)) => match self.google_books.fetch_volume(isbn).await? {
                Some(volume) => {
                    let record = normalizer::from_google_books(isbn, &volume);
                    info!(isbn = %isbn, title = %record.title, "resolved via Google Books fallback");
                    Ok(record)
                }
                None => Err(CatalogError::NotFound(isbn.to_string())),
            },
            Err(other) => Err(other),
        }
    }
}
