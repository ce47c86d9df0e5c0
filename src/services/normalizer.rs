//! Canonical record construction from catalog responses
//!
//! Both providers are reduced to one shape: title defaults to "Unknown",
//! authors to ["Unknown"], list fields to empty, descriptions are trimmed
//! (whitespace-only becomes absent). When Open Library has no description,
//! a Google Books volume fills the gaps; Open Library data always wins
//! where both have a value.

use crate::models::{BookRecord, EntryType};
use crate::services::google_books::GbVolume;
use crate::services::open_library::{OlEdition, OlSubject};

const MAX_SUBJECTS: usize = 10;

/// Raw metadata extracted from a provider, before defaulting.
#[derive(Debug, Default)]
pub struct RawMetadata {
    pub title: Option<String>,
    pub authors: Vec<String>,
    pub publishers: Vec<String>,
    pub publish_date: Option<String>,
    pub number_of_pages: Option<i64>,
    pub cover_url: Option<String>,
    pub subjects: Vec<String>,
    pub description: Option<String>,
}

/// Single canonical shape for both providers.
pub fn canonical(id: &str, raw: RawMetadata) -> BookRecord {
    let mut record = BookRecord::new(id, EntryType::Book);
    if let Some(title) = raw.title {
        let title = title.trim().to_string();
        if !title.is_empty() {
            record.title = title;
        }
    }
    if !raw.authors.is_empty() {
        record.authors = raw.authors;
    }
    record.publishers = raw.publishers;
    record.publish_date = raw.publish_date;
    record.number_of_pages = raw.number_of_pages;
    record.cover_url = raw.cover_url;
    record.subjects = raw.subjects;
    record.subjects.truncate(MAX_SUBJECTS);
    record.description = clean_description(raw.description);
    record
}

/// Canonical record from an Open Library edition plus resolved author names.
pub fn from_open_library(isbn: &str, edition: &OlEdition, authors: Vec<String>) -> BookRecord {
    canonical(
        isbn,
        RawMetadata {
            title: edition.title.clone(),
            authors,
            publishers: edition.publishers.clone(),
            publish_date: edition.publish_date.clone(),
            number_of_pages: edition.number_of_pages,
            cover_url: edition.covers.first().map(|id| cover_url_from_id(*id)),
            subjects: edition
                .subjects
                .iter()
                .cloned()
                .map(OlSubject::into_name)
                .collect(),
            description: edition.description.clone().map(|d| d.into_value()),
        },
    )
}

/// Canonical record from a Google Books volume (fallback path; the author
/// list is taken as-is, no reference resolution).
pub fn from_google_books(isbn: &str, volume: &GbVolume) -> BookRecord {
    let info = &volume.volume_info;
    canonical(
        isbn,
        RawMetadata {
            title: info.title.clone(),
            authors: info.authors.clone(),
            publishers: info.publisher.clone().map(|p| vec![p]).unwrap_or_default(),
            publish_date: info.published_date.clone(),
            number_of_pages: info.page_count,
            cover_url: info.image_links.best().map(secure_url),
            subjects: info.categories.clone(),
            description: info.description.clone(),
        },
    )
}

/// Fill gaps in an Open Library record from a Google Books volume. Only
/// empty fields are touched.
pub fn enrich_from_google_books(record: &mut BookRecord, volume: &GbVolume) {
    let info = &volume.volume_info;
    if description_is_empty(&record.description) {
        record.description = clean_description(info.description.clone());
    }
    if record.cover_url.is_none() {
        record.cover_url = info.image_links.best().map(secure_url);
    }
    if record.number_of_pages.is_none() {
        record.number_of_pages = info.page_count;
    }
    if record.subjects.is_empty() && !info.categories.is_empty() {
        record.subjects = info.categories.clone();
        record.subjects.truncate(MAX_SUBJECTS);
    }
}

/// Trim a description; missing or whitespace-only becomes `None`.
fn clean_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}

/// True when the description is missing or whitespace-only.
pub fn description_is_empty(description: &Option<String>) -> bool {
    !matches!(description, Some(d) if !d.trim().is_empty())
}

/// Cover image URL for an Open Library numeric cover id.
pub fn cover_url_from_id(cover_id: i64) -> String {
    format!("https://covers.openlibrary.org/b/id/{cover_id}-M.jpg")
}

/// Upgrade a possibly-insecure provider URL to https.
pub fn secure_url(url: &str) -> String {
    match url.strip_prefix("http:") {
        Some(rest) => format!("https:{rest}"),
        None => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::google_books::GbVolumeList;

    fn grapes_volume() -> GbVolume {
        let list: GbVolumeList = serde_json::from_str(
            r#"{
                "totalItems": 1,
                "items": [{
                    "volumeInfo": {
                        "title": "The Grapes of Wrath",
                        "authors": ["John Steinbeck"],
                        "publisher": "Viking",
                        "publishedDate": "2014",
                        "pageCount": 496,
                        "categories": ["Fiction"],
                        "description": "A Pulitzer Prize-winning novel.",
                        "imageLinks": {
                            "thumbnail": "http://books.google.com/books/content?id=abc123"
                        }
                    }
                }]
            }"#,
        )
        .unwrap();
        list.items.into_iter().next().unwrap()
    }

    #[test]
    fn open_library_record_is_canonical() {
        let edition: OlEdition = serde_json::from_str(
            r#"{
                "title": "The Grapes of Wrath",
                "publishers": ["Viking"],
                "publish_date": "1939",
                "number_of_pages": 464,
                "covers": [12345],
                "subjects": ["Fiction"],
                "description": {"value": "  A novel.  "}
            }"#,
        )
        .unwrap();

        let record =
            from_open_library("9780670016907", &edition, vec!["John Steinbeck".to_string()]);
        assert_eq!(record.id, "9780670016907");
        assert_eq!(record.title, "The Grapes of Wrath");
        assert_eq!(record.authors, vec!["John Steinbeck"]);
        assert_eq!(
            record.cover_url.as_deref(),
            Some("https://covers.openlibrary.org/b/id/12345-M.jpg")
        );
        assert_eq!(record.description.as_deref(), Some("A novel."));
        assert_eq!(record.status, None);
    }

    #[test]
    fn missing_fields_get_defaults() {
        let record = canonical("123", RawMetadata::default());
        assert_eq!(record.title, "Unknown");
        assert_eq!(record.authors, vec!["Unknown"]);
        assert!(record.publishers.is_empty());
        assert!(record.subjects.is_empty());
        assert_eq!(record.description, None);
    }

    #[test]
    fn whitespace_title_and_description_are_treated_as_missing() {
        let record = canonical(
            "123",
            RawMetadata {
                title: Some("   ".to_string()),
                description: Some("  \n ".to_string()),
                ..RawMetadata::default()
            },
        );
        assert_eq!(record.title, "Unknown");
        assert_eq!(record.description, None);
    }

    #[test]
    fn subjects_are_capped_at_ten() {
        let record = canonical(
            "123",
            RawMetadata {
                subjects: (0..15).map(|i| format!("subject-{i}")).collect(),
                ..RawMetadata::default()
            },
        );
        assert_eq!(record.subjects.len(), 10);
    }

    #[test]
    fn google_books_record_upgrades_cover_to_https() {
        let record = from_google_books("9780670016907", &grapes_volume());
        assert_eq!(record.title, "The Grapes of Wrath");
        assert_eq!(record.authors, vec!["John Steinbeck"]);
        assert_eq!(record.publishers, vec!["Viking"]);
        assert!(record.cover_url.unwrap().starts_with("https://"));
    }

    #[test]
    fn enrichment_fills_only_gaps() {
        let edition: OlEdition = serde_json::from_str(
            r#"{
                "title": "The Grapes of Wrath",
                "publishers": ["Penguin"],
                "number_of_pages": 464,
                "subjects": ["Dust Bowl"]
            }"#,
        )
        .unwrap();
        let mut record = from_open_library("9780670016907", &edition, vec!["J. S.".to_string()]);
        assert!(description_is_empty(&record.description));

        enrich_from_google_books(&mut record, &grapes_volume());

        // Filled from Google Books.
        assert_eq!(
            record.description.as_deref(),
            Some("A Pulitzer Prize-winning novel.")
        );
        assert!(record.cover_url.unwrap().starts_with("https://"));
        // Untouched: Open Library already had values.
        assert_eq!(record.number_of_pages, Some(464));
        assert_eq!(record.subjects, vec!["Dust Bowl"]);
        assert_eq!(record.publishers, vec!["Penguin"]);
    }

    #[test]
    fn enrichment_fills_page_count_when_absent() {
        let edition: OlEdition =
            serde_json::from_str(r#"{"title": "T"}"#).unwrap();
        let mut record = from_open_library("123", &edition, Vec::new());
        enrich_from_google_books(&mut record, &grapes_volume());
        assert_eq!(record.number_of_pages, Some(496));
        assert_eq!(record.subjects, vec!["Fiction"]);
    }

    #[test]
    fn secure_url_leaves_https_alone() {
        assert_eq!(secure_url("https://a/b"), "https://a/b");
        assert_eq!(secure_url("http://a/b"), "https://a/b");
    }

    #[test]
    fn description_emptiness() {
        assert!(description_is_empty(&None));
        assert!(description_is_empty(&Some("  ".to_string())));
        assert!(!description_is_empty(&Some("text".to_string())));
    }
}
