//! Google Books API client (secondary catalog source)
//!
//! Used two ways: to fill gaps in an Open Library record (description,
//! cover, page count, subjects) and as the fallback source when Open
//! Library has no edition for an ISBN.

use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::CatalogError;

const GOOGLE_BOOKS_BASE_URL: &str = "https://www.googleapis.com/books/v1";
const USER_AGENT: &str = "booklog/0.1 (personal reading log)";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Volume list returned by the volumes query endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GbVolumeList {
    #[serde(rename = "totalItems", default)]
    pub total_items: i64,
    #[serde(default)]
    pub items: Vec<GbVolume>,
}

/// One Google Books volume.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GbVolume {
    #[serde(rename = "volumeInfo", default)]
    pub volume_info: GbVolumeInfo,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GbVolumeInfo {
    pub title: Option<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    pub publisher: Option<String>,
    #[serde(rename = "publishedDate")]
    pub published_date: Option<String>,
    #[serde(
        rename = "pageCount",
        default,
        deserialize_with = "crate::services::lenient_page_count"
    )]
    pub page_count: Option<i64>,
    #[serde(default)]
    pub categories: Vec<String>,
    pub description: Option<String>,
    #[serde(rename = "imageLinks", default)]
    pub image_links: GbImageLinks,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GbImageLinks {
    pub thumbnail: Option<String>,
    #[serde(rename = "smallThumbnail")]
    pub small_thumbnail: Option<String>,
}

impl GbImageLinks {
    /// Preferred thumbnail URL, if any.
    pub fn best(&self) -> Option<&str> {
        self.thumbnail.as_deref().or(self.small_thumbnail.as_deref())
    }
}

/// Google Books API client.
#[derive(Debug, Clone)]
pub struct GoogleBooksClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl GoogleBooksClient {
    pub fn new(api_key: Option<String>) -> Result<Self, CatalogError> {
        Self::with_base_url(GOOGLE_BOOKS_BASE_URL, api_key)
    }

    /// Client against an alternate base URL (used by tests).
    pub fn with_base_url(
        base_url: impl Into<String>,
        api_key: Option<String>,
    ) -> Result<Self, CatalogError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| CatalogError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.into(),
            api_key,
        })
    }

    fn volumes_url(&self, isbn: &str) -> String {
        let mut url = format!("{}/volumes?q=isbn:{}", self.base_url, isbn);
        if let Some(key) = &self.api_key {
            url.push_str("&key=");
            url.push_str(key);
        }
        url
    }

    /// Fetch the first matching volume for an ISBN. `Ok(None)` means the
    /// catalog has no match.
    pub async fn fetch_volume(&self, isbn: &str) -> Result<Option<GbVolume>, CatalogError> {
        let url = self.volumes_url(isbn);
        debug!(isbn = %isbn, "querying Google Books");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| CatalogError::Network(e.to_string()))?;

        let status = response.status();

        if status.as_u16() == 404 {
            return Ok(None);
        }

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(CatalogError::Api(status.as_u16(), text));
        }

        let list: GbVolumeList = response
            .json()
            .await
            .map_err(|e| CatalogError::Parse(e.to_string()))?;

        if list.total_items < 1 {
            return Ok(None);
        }

        Ok(list.items.into_iter().next())
    }
}
