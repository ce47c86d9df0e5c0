//! Open Library API client (primary catalog source)
//!
//! Editions are fetched by ISBN; author entries on an edition are reference
//! keys resolved through a second endpoint. Response fields with more than
//! one wire shape (description, subjects) are modeled as untagged unions
//! with a single extraction method each.

use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::CatalogError;

const OPEN_LIBRARY_BASE_URL: &str = "https://openlibrary.org";
const USER_AGENT: &str = "booklog/0.1 (personal reading log)";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Open Library edition JSON (the subset booklog consumes).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OlEdition {
    pub title: Option<String>,
    #[serde(default)]
    pub authors: Vec<OlAuthorRef>,
    #[serde(default)]
    pub publishers: Vec<String>,
    pub publish_date: Option<String>,
    #[serde(default, deserialize_with = "crate::services::lenient_page_count")]
    pub number_of_pages: Option<i64>,
    #[serde(default)]
    pub covers: Vec<i64>,
    #[serde(default)]
    pub subjects: Vec<OlSubject>,
    pub description: Option<OlText>,
}

/// Author entry on an edition: a reference key to be resolved separately.
#[derive(Debug, Clone, Deserialize)]
pub struct OlAuthorRef {
    pub key: Option<String>,
}

/// Subjects arrive either as plain strings or `{name}` objects.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OlSubject {
    Plain(String),
    Named { name: String },
}

impl OlSubject {
    pub fn into_name(self) -> String {
        match self {
            OlSubject::Plain(name) => name,
            OlSubject::Named { name } => name,
        }
    }
}

/// Descriptions arrive either as plain strings or `{value}` wrappers.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OlText {
    Plain(String),
    Wrapped { value: String },
}

impl OlText {
    pub fn into_value(self) -> String {
        match self {
            OlText::Plain(value) => value,
            OlText::Wrapped { value } => value,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OlAuthor {
    name: Option<String>,
}

/// Open Library API client.
#[derive(Debug, Clone)]
pub struct OpenLibraryClient {
    http: reqwest::Client,
    base_url: String,
}

impl OpenLibraryClient {
    pub fn new() -> Result<Self, CatalogError> {
        Self::with_base_url(OPEN_LIBRARY_BASE_URL)
    }

    /// Client against an alternate base URL (used by tests).
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, CatalogError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| CatalogError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    /// Fetch the edition record for a digits-only ISBN.
    pub async fn fetch_edition(&self, isbn: &str) -> Result<OlEdition, CatalogError> {
        let url = format!("{}/isbn/{}.json", self.base_url, isbn);
        debug!(isbn = %isbn, "querying Open Library");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| CatalogError::Network(e.to_string()))?;

        let status = response.status();

        if status.as_u16() == 404 {
            return Err(CatalogError::NotFound(isbn.to_string()));
        }

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(CatalogError::Api(status.as_u16(), text));
        }

        response
            .json()
            .await
            .map_err(|e| CatalogError::Parse(e.to_string()))
    }

    /// Resolve an author reference key (e.g. `/authors/OL26320A`) to a
    /// display name. Failures are logged and swallowed; a missing author
    /// name never fails the whole lookup.
    pub async fn fetch_author_name(&self, key: &str) -> Option<String> {
        let url = format!("{}{}.json", self.base_url, key);

        match self.http.get(&url).send().await {
            Ok(response) if response.status().is_success() => {
                match response.json::<OlAuthor>().await {
                    Ok(author) => author.name,
                    Err(e) => {
                        debug!(key = %key, error = %e, "author response did not parse");
                        None
                    }
                }
            }
            Ok(response) => {
                debug!(key = %key, status = %response.status(), "author lookup failed");
                None
            }
            Err(e) => {
                debug!(key = %key, error = %e, "author lookup failed");
                None
            }
        }
    }
}
