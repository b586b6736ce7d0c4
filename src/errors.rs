//! Error types shared by the extractors, the browser session, and the CSV sink.
//!
//! Errors fall into two groups:
//!
//! - **Fatal** conditions that abort a source's run ([`ScrapeError::StructureChanged`],
//!   [`ScrapeError::InvalidOutputFormat`], configuration problems, sink I/O).
//! - **Per-article** conditions that only cost a single article. These are
//!   classified with [`ScrapeError::skip_kind`] so the extractor can record
//!   why an article was dropped instead of silently swallowing the error.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::models::Source;

/// Everything that can go wrong while extracting or writing articles.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// The listing page no longer matches the expected markup.
    #[error("{site} listing structure changed: {detail}")]
    StructureChanged { site: Source, detail: String },

    /// The destination filename does not look like a CSV file.
    #[error("output file must have a CSV extension, got `{extension}`")]
    InvalidOutputFormat { extension: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("browser command failed: {0}")]
    Browser(#[from] fantoccini::error::CmdError),

    #[error("could not start browser session: {0}")]
    BrowserLaunch(String),

    #[error("timed out after {0:?} loading {1}")]
    Timeout(Duration, String),

    /// A selector matched nothing on an article page.
    #[error("no `{field}` element matched `{selector}`")]
    MissingElement { field: &'static str, selector: String },

    #[error("could not read a publication date from `{0}`")]
    DateFormat(String),

    /// The topic cannot be joined onto the site's base URL.
    #[error("cannot build a topic URL from `{topic}` under {base_url}")]
    InvalidTopic { topic: String, base_url: String },

    #[error("invalid selector `{selector}`: {reason}")]
    Selector { selector: String, reason: String },

    #[error("configuration error: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Why a single article was dropped from a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipKind {
    /// Transport failure: connection, status code, timeout, browser command.
    Network,
    /// The page loaded but its content could not be interpreted.
    Parse,
    /// A required element was absent from the page.
    MissingField,
}

impl fmt::Display for SkipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SkipKind::Network => "network",
            SkipKind::Parse => "parse",
            SkipKind::MissingField => "missing-field",
        };
        f.write_str(s)
    }
}

impl ScrapeError {
    /// Classify an error raised while processing one article.
    ///
    /// Returns `None` for conditions that must abort the whole run rather
    /// than skip a single article.
    pub fn skip_kind(&self) -> Option<SkipKind> {
        match self {
            ScrapeError::Http(_)
            | ScrapeError::Browser(_)
            | ScrapeError::BrowserLaunch(_)
            | ScrapeError::Timeout(..) => Some(SkipKind::Network),
            ScrapeError::DateFormat(_) => Some(SkipKind::Parse),
            ScrapeError::MissingElement { .. } => Some(SkipKind::MissingField),
            ScrapeError::StructureChanged { .. }
            | ScrapeError::InvalidOutputFormat { .. }
            | ScrapeError::InvalidTopic { .. }
            | ScrapeError::Selector { .. }
            | ScrapeError::Config(_)
            | ScrapeError::Io(_)
            | ScrapeError::Csv(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_element_is_skippable() {
        let err = ScrapeError::MissingElement {
            field: "date",
            selector: "div.timestamp".to_string(),
        };
        assert_eq!(err.skip_kind(), Some(SkipKind::MissingField));
        assert_eq!(err.to_string(), "no `date` element matched `div.timestamp`");
    }

    #[test]
    fn test_structure_changed_is_fatal() {
        let err = ScrapeError::StructureChanged {
            site: Source::Fox,
            detail: "no article URLs found".to_string(),
        };
        assert_eq!(err.skip_kind(), None);
        assert!(err.to_string().starts_with("Fox listing structure changed"));
    }

    #[test]
    fn test_invalid_output_format_names_extension() {
        let err = ScrapeError::InvalidOutputFormat {
            extension: "txt".to_string(),
        };
        assert!(err.to_string().contains("`txt`"));
        assert_eq!(err.skip_kind(), None);
    }

    #[test]
    fn test_invalid_topic_is_fatal() {
        let err = ScrapeError::InvalidTopic {
            topic: "http://[".to_string(),
            base_url: "https://www.cnn.com/".to_string(),
        };
        assert_eq!(err.skip_kind(), None);
        assert!(err.to_string().contains("topic URL"));
        assert!(!err.to_string().contains("selector"));
    }

    #[test]
    fn test_timeout_and_date_classification() {
        let timeout = ScrapeError::Timeout(Duration::from_secs(3), "https://x".to_string());
        assert_eq!(timeout.skip_kind(), Some(SkipKind::Network));
        let date = ScrapeError::DateFormat("yesterday".to_string());
        assert_eq!(date.skip_kind(), Some(SkipKind::Parse));
    }
}
