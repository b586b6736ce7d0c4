//! Helpers shared by both extractors.
//!
//! - Publication date extraction and `M/D/YYYY` formatting
//! - Paragraph text joining
//! - Relative link resolution against a site's base origin
//! - String truncation for log output

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::ElementRef;
use url::Url;

use crate::errors::ScrapeError;

/// Matches dates written as `<month name> <day>, <year>`, e.g. `January 5, 2024`.
static DATE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\w{3,}\s\d{1,2},\s\d{4}").expect("date pattern compiles"));

/// Pull the first written-out date from a timestamp line and reformat it.
///
/// The timestamp text usually carries more than the date, for example
/// `Updated 10:23 AM EDT, Tue March 3, 2023`. The first match of
/// `<word of 3+ letters> <1-2 digit day>, <4 digit year>` is parsed as a
/// full month name and rendered as `M/D/YYYY` with no zero padding.
///
/// # Errors
///
/// Returns [`ScrapeError::DateFormat`] if no date-shaped text is present or
/// the matched word is not a month name.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(reformat_date("March 3, 2023").unwrap(), "3/3/2023");
/// ```
pub fn reformat_date(timestamp: &str) -> Result<String, ScrapeError> {
    let found = DATE_PATTERN
        .find(timestamp)
        .ok_or_else(|| ScrapeError::DateFormat(truncate_for_log(timestamp.trim(), 80)))?;

    let date = NaiveDate::parse_from_str(found.as_str(), "%B %d, %Y")
        .map_err(|_| ScrapeError::DateFormat(found.as_str().to_string()))?;

    Ok(format!("{}/{}/{}", date.month(), date.day(), date.year()))
}

/// Trimmed text content of an element.
pub fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Join paragraph texts with single spaces, dropping empty paragraphs.
pub fn join_paragraphs<'a>(paragraphs: impl Iterator<Item = ElementRef<'a>>) -> String {
    paragraphs
        .map(element_text)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolve a scraped link path against the site's base origin.
///
/// Returns `None` for hrefs that cannot form a valid URL.
pub fn resolve_link(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    base.join(href).ok().map(|u| u.to_string())
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to `max` characters with an ellipsis and a count of
/// the dropped bytes appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}…(+{} bytes)", &s[..cut], s.len() - cut),
    }
}
