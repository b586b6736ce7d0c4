//! Data models for scraped articles.
//!
//! - [`ArticleRecord`]: one fully extracted article, ready for the CSV sink
//! - [`ListingEntry`]: a link discovered on a topic listing page
//! - [`SkippedArticle`]: an article that was dropped, with the reason why
//! - [`Source`]: the site an article came from

use serde::Serialize;
use std::fmt;

use crate::errors::SkipKind;

/// The news site an article was scraped from.
///
/// Serialized as the literal site name written to the `source` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Source {
    #[serde(rename = "CNN")]
    Cnn,
    #[serde(rename = "Fox")]
    Fox,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Cnn => "CNN",
            Source::Fox => "Fox",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single extracted article.
///
/// Field order matches the CSV column order: `title, date, url,
/// article_text, source`. Records are only ever built whole; an article
/// that fails any step never produces a partial record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticleRecord {
    /// Headline text.
    pub title: String,
    /// Publication date as `M/D/YYYY`, without zero padding.
    #[serde(rename = "date")]
    pub publication_date: String,
    /// Absolute article URL.
    pub url: String,
    /// Body paragraphs joined with single spaces. May be empty.
    #[serde(rename = "article_text")]
    pub body_text: String,
    pub source: Source,
}

/// A link found on a listing page.
///
/// `title` is `None` when the listing markup carries no headline for the
/// link; the article page then supplies it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub title: Option<String>,
    pub url: String,
}

/// An article that was dropped during extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedArticle {
    pub url: String,
    pub kind: SkipKind,
    pub reason: String,
}
