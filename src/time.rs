//! Calendar-date handling
//!
//! Reading-log dates are calendar dates (not instants) in the application's
//! configured timezone. Storage keeps them as midnight-normalized strings;
//! this module owns every conversion so the date-vs-datetime distinction
//! never leaks into the persistence code.

use chrono::{Datelike, Months, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A calendar date as the user experiences it (app timezone).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalendarDate(NaiveDate);

impl CalendarDate {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// Parse a `YYYY-MM-DD` string, tolerating a trailing time component
    /// (stored values are midnight-normalized timestamps).
    pub fn parse(value: &str) -> Option<Self> {
        let head = value.get(..10)?;
        NaiveDate::parse_from_str(head, "%Y-%m-%d").ok().map(Self)
    }

    /// Midnight-normalized storage representation.
    ///
    /// Zero-padded, so lexicographic comparison in SQL matches date order.
    pub fn to_storage(self) -> String {
        format!("{}T00:00:00", self.0.format("%Y-%m-%d"))
    }

    pub fn from_storage(value: &str) -> Option<Self> {
        Self::parse(value)
    }

    pub fn year(self) -> i32 {
        self.0.year()
    }

    pub fn month(self) -> u32 {
        self.0.month()
    }

    pub fn inner(self) -> NaiveDate {
        self.0
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl Serialize for CalendarDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CalendarDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        CalendarDate::parse(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid calendar date: {raw:?}")))
    }
}

/// The application timezone: defines "today" for every reading-log date.
#[derive(Debug, Clone, Copy)]
pub struct AppTimezone {
    tz: Tz,
}

impl AppTimezone {
    pub fn utc() -> Self {
        Self { tz: Tz::UTC }
    }

    /// Resolve an IANA zone name (e.g. `America/Chicago`).
    pub fn from_name(name: &str) -> Option<Self> {
        name.parse::<Tz>().ok().map(|tz| Self { tz })
    }

    /// Today's date in the application timezone.
    pub fn today(&self) -> CalendarDate {
        CalendarDate::new(Utc::now().with_timezone(&self.tz).date_naive())
    }

    pub fn name(&self) -> &'static str {
        self.tz.name()
    }
}

/// First and last day of the month containing `date`.
pub fn month_window(date: CalendarDate) -> (CalendarDate, CalendarDate) {
    // Infallible for a date that already exists.
    month_window_of(date.year(), date.month()).unwrap_or((date, date))
}

/// First and last day of the given month, or `None` for an invalid month.
pub fn month_window_of(year: i32, month: u32) -> Option<(CalendarDate, CalendarDate)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)?;
    let end = start.checked_add_months(Months::new(1))?.pred_opt()?;
    Some((CalendarDate(start), CalendarDate(end)))
}

/// First and last day of the year containing `date`.
pub fn year_window(date: CalendarDate) -> (CalendarDate, CalendarDate) {
    let year = date.year();
    match (
        CalendarDate::from_ymd(year, 1, 1),
        CalendarDate::from_ymd(year, 12, 31),
    ) {
        (Some(start), Some(end)) => (start, end),
        _ => (date, date),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_plain_dates_and_timestamps() {
        let plain = CalendarDate::parse("2024-03-15").unwrap();
        let stamped = CalendarDate::parse("2024-03-15T00:00:00").unwrap();
        assert_eq!(plain, stamped);
        assert_eq!(plain.to_string(), "2024-03-15");
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(CalendarDate::parse("yesterday").is_none());
        assert!(CalendarDate::parse("2024-13-01").is_none());
        assert!(CalendarDate::parse("2024").is_none());
    }

    #[test]
    fn storage_roundtrip_is_midnight_normalized() {
        let date = CalendarDate::from_ymd(2024, 1, 2).unwrap();
        assert_eq!(date.to_storage(), "2024-01-02T00:00:00");
        assert_eq!(CalendarDate::from_storage(&date.to_storage()), Some(date));
    }

    #[test]
    fn storage_strings_order_like_dates() {
        let earlier = CalendarDate::from_ymd(2024, 9, 30).unwrap();
        let later = CalendarDate::from_ymd(2024, 10, 1).unwrap();
        assert!(earlier.to_storage() < later.to_storage());
    }

    #[test]
    fn month_window_handles_year_end_and_leap_years() {
        let (start, end) = month_window(CalendarDate::from_ymd(2024, 12, 15).unwrap());
        assert_eq!(start.to_string(), "2024-12-01");
        assert_eq!(end.to_string(), "2024-12-31");

        let (start, end) = month_window_of(2024, 2).unwrap();
        assert_eq!(start.to_string(), "2024-02-01");
        assert_eq!(end.to_string(), "2024-02-29");

        assert!(month_window_of(2024, 13).is_none());
        assert!(month_window_of(2024, 0).is_none());
    }

    #[test]
    fn year_window_spans_the_whole_year() {
        let (start, end) = year_window(CalendarDate::from_ymd(2023, 6, 20).unwrap());
        assert_eq!(start.to_string(), "2023-01-01");
        assert_eq!(end.to_string(), "2023-12-31");
    }

    #[test]
    fn serde_uses_iso_dates() {
        let date = CalendarDate::from_ymd(2024, 3, 15).unwrap();
        assert_eq!(serde_json::to_string(&date).unwrap(), "\"2024-03-15\"");
        let parsed: CalendarDate = serde_json::from_str("\"2024-03-15\"").unwrap();
        assert_eq!(parsed, date);
    }

    #[test]
    fn timezone_resolution() {
        assert!(AppTimezone::from_name("America/Chicago").is_some());
        assert!(AppTimezone::from_name("Mars/Olympus_Mons").is_none());
        assert_eq!(AppTimezone::utc().name(), "UTC");
    }
}
