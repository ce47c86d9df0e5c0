//! Data model for book and article records

use crate::time::CalendarDate;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder for missing titles and authors.
pub const UNKNOWN: &str = "Unknown";

/// Id prefix for manually created articles and poems.
pub const ARTICLE_ID_PREFIX: &str = "article-";

/// Reading pipeline status. Absence of a status means "looked up but not
/// tracked"; transitions between statuses are unrestricted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookStatus {
    Backlog,
    InProgress,
    Finished,
}

impl BookStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BookStatus::Backlog => "backlog",
            BookStatus::InProgress => "in_progress",
            BookStatus::Finished => "finished",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "backlog" => Some(BookStatus::Backlog),
            "in_progress" => Some(BookStatus::InProgress),
            "finished" => Some(BookStatus::Finished),
            _ => None,
        }
    }
}

/// Kind of entry: a looked-up book or a manually entered article/poem.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    #[default]
    Book,
    Article,
    Poem,
}

impl EntryType {
    pub fn as_str(self) -> &'static str {
        match self {
            EntryType::Book => "book",
            EntryType::Article => "article",
            EntryType::Poem => "poem",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "book" => Some(EntryType::Book),
            "article" => Some(EntryType::Article),
            "poem" => Some(EntryType::Poem),
            _ => None,
        }
    }

    /// Manual entries may only be articles or poems; anything unrecognized
    /// becomes an article.
    pub fn article_kind(value: &str) -> Self {
        match value {
            "poem" => EntryType::Poem,
            _ => EntryType::Article,
        }
    }
}

/// A book or article record (one per ISBN or generated article id).
///
/// The progress-event ledger lives in its own table and is never part of
/// API responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookRecord {
    /// Digits-only ISBN, or `article-<uuid>` for manual entries.
    pub id: String,
    #[serde(default)]
    pub entry_type: EntryType,
    pub title: String,
    pub authors: Vec<String>,
    #[serde(default)]
    pub publishers: Vec<String>,
    pub publish_date: Option<String>,
    pub number_of_pages: Option<i64>,
    pub cover_url: Option<String>,
    #[serde(default)]
    pub subjects: Vec<String>,
    pub description: Option<String>,
    /// Refreshed every time the record is read or written via lookup.
    pub last_looked_up: Option<DateTime<Utc>>,
    pub status: Option<BookStatus>,
    /// Dense zero-based position among backlog items.
    pub backlog_order: Option<i64>,
    pub backlog_date: Option<CalendarDate>,
    pub started_date: Option<CalendarDate>,
    pub current_page: Option<i64>,
    /// Last day the user updated the page number.
    pub last_progress_date: Option<CalendarDate>,
    pub finished_date: Option<CalendarDate>,
}

impl BookRecord {
    /// Fresh record with defaulted metadata and no reading-log state.
    pub fn new(id: impl Into<String>, entry_type: EntryType) -> Self {
        Self {
            id: id.into(),
            entry_type,
            title: UNKNOWN.to_string(),
            authors: vec![UNKNOWN.to_string()],
            publishers: Vec::new(),
            publish_date: None,
            number_of_pages: None,
            cover_url: None,
            subjects: Vec::new(),
            description: None,
            last_looked_up: None,
            status: None,
            backlog_order: None,
            backlog_date: None,
            started_date: None,
            current_page: None,
            last_progress_date: None,
            finished_date: None,
        }
    }
}

/// Partial update for `PATCH /api/books/{id}`. Absent fields are left alone.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BookUpdate {
    pub title: Option<String>,
    pub authors: Option<Vec<String>>,
    pub publishers: Option<Vec<String>>,
    pub publish_date: Option<String>,
    pub number_of_pages: Option<i64>,
    pub cover_url: Option<String>,
    pub subjects: Option<Vec<String>>,
    pub description: Option<String>,
    pub status: Option<BookStatus>,
    pub backlog_date: Option<CalendarDate>,
    pub started_date: Option<CalendarDate>,
    pub current_page: Option<i64>,
    pub finished_date: Option<CalendarDate>,
}

impl BookUpdate {
    /// An empty update is a no-op that still returns the current record.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.authors.is_none()
            && self.publishers.is_none()
            && self.publish_date.is_none()
            && self.number_of_pages.is_none()
            && self.cover_url.is_none()
            && self.subjects.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.backlog_date.is_none()
            && self.started_date.is_none()
            && self.current_page.is_none()
            && self.finished_date.is_none()
    }
}
