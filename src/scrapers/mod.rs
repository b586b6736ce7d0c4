//! Site-specific article extractors.
//!
//! Each extractor follows the same two-phase shape:
//!
//! 1. **Listing**: load the topic page and collect article links
//! 2. **Articles**: visit each link and extract title, date, and body text
//!
//! | Source | Module | Method |
//! |--------|--------|--------|
//! | CNN | [`cnn`] | Headless Chrome over WebDriver |
//! | Fox News | [`fox`] | Plain HTTP GET |
//!
//! Both share [`ExtractorSession`], which accumulates whole
//! [`ArticleRecord`]s and the articles that were skipped. Because a record is
//! only pushed once every field is known, the title, date, url, and body
//! sequences can never drift out of alignment.

use scraper::Html;
use tracing::{debug, warn};

use crate::config::CompiledRecipe;
use crate::errors::ScrapeError;
use crate::models::{ArticleRecord, ListingEntry, SkippedArticle, Source};
use crate::utils::{element_text, join_paragraphs, reformat_date};

pub mod cnn;
pub mod fox;

/// Per-run state of one extractor.
#[derive(Debug)]
pub struct ExtractorSession {
    pub source: Source,
    /// Origin that listing and article links are resolved against.
    pub base_url: String,
    pub topic: String,
    records: Vec<ArticleRecord>,
    skipped: Vec<SkippedArticle>,
    listing_failures: usize,
}

impl ExtractorSession {
    pub fn new(source: Source, base_url: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            source,
            base_url: base_url.into(),
            topic: topic.into(),
            records: Vec::new(),
            skipped: Vec::new(),
            listing_failures: 0,
        }
    }

    /// Record the outcome of one article.
    ///
    /// Successful records are appended whole. Recoverable failures are logged
    /// and remembered as skips; fatal ones are handed back to the caller.
    pub fn record(
        &mut self,
        url: &str,
        outcome: Result<ArticleRecord, ScrapeError>,
    ) -> Result<(), ScrapeError> {
        match outcome {
            Ok(record) => {
                self.records.push(record);
                Ok(())
            }
            Err(e) => match e.skip_kind() {
                Some(kind) => {
                    warn!(source = %self.source, %url, %kind, error = %e, "Skipping article");
                    self.skipped.push(SkippedArticle {
                        url: url.to_string(),
                        kind,
                        reason: e.to_string(),
                    });
                    Ok(())
                }
                None => Err(e),
            },
        }
    }

    pub(crate) fn note_listing_failure(&mut self) {
        self.listing_failures += 1;
    }

    pub fn records(&self) -> &[ArticleRecord] {
        &self.records
    }

    pub fn skipped(&self) -> &[SkippedArticle] {
        &self.skipped
    }

    /// Number of listing loads that failed at the browser level.
    pub fn listing_failures(&self) -> usize {
        self.listing_failures
    }

    pub fn titles(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.title.as_str()).collect()
    }

    pub fn dates(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.publication_date.as_str()).collect()
    }

    pub fn urls(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.url.as_str()).collect()
    }

    pub fn body_texts(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.body_text.as_str()).collect()
    }

    /// Hand the collected records to the caller, leaving the session empty.
    pub fn take_records(&mut self) -> Vec<ArticleRecord> {
        std::mem::take(&mut self.records)
    }
}

/// Build one [`ArticleRecord`] from an article page.
///
/// The title comes from the listing entry when it has one, otherwise from
/// the recipe's headline selector. The body is every paragraph matched by
/// the recipe joined with single spaces and may be empty. The date is
/// required; a missing or unparseable timestamp fails the whole article.
pub fn parse_article(
    html: &str,
    recipe: &CompiledRecipe,
    entry: &ListingEntry,
    source: Source,
) -> Result<ArticleRecord, ScrapeError> {
    let document = Html::parse_document(html);

    let title = match &entry.title {
        Some(title) => title.clone(),
        None => document
            .select(&recipe.headline.selector)
            .next()
            .map(element_text)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ScrapeError::MissingElement {
                field: "title",
                selector: recipe.headline.css.clone(),
            })?,
    };

    let body_text = join_paragraphs(document.select(&recipe.paragraphs));

    let timestamp = document
        .select(&recipe.date.selector)
        .next()
        .map(element_text)
        .ok_or_else(|| ScrapeError::MissingElement {
            field: "date",
            selector: recipe.date.css.clone(),
        })?;
    let publication_date = reformat_date(&timestamp)?;

    debug!(url = %entry.url, %title, %publication_date, body_bytes = body_text.len(), "Parsed article");
    Ok(ArticleRecord {
        title,
        publication_date,
        url: entry.url.clone(),
        body_text,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SkipKind;

    fn record(n: usize) -> ArticleRecord {
        ArticleRecord {
            title: format!("Title {n}"),
            publication_date: "1/2/2024".to_string(),
            url: format!("https://example.com/{n}"),
            body_text: String::new(),
            source: Source::Fox,
        }
    }

    #[test]
    fn test_skipped_articles_leave_sequences_aligned() {
        let mut session = ExtractorSession::new(Source::Fox, "https://www.foxnews.com/", "politics");
        session.record("https://example.com/1", Ok(record(1))).unwrap();
        session
            .record(
                "https://example.com/2",
                Err(ScrapeError::MissingElement {
                    field: "date",
                    selector: "time".to_string(),
                }),
            )
            .unwrap();
        session.record("https://example.com/3", Ok(record(3))).unwrap();

        assert_eq!(session.titles(), vec!["Title 1", "Title 3"]);
        assert_eq!(session.titles().len(), session.dates().len());
        assert_eq!(session.dates().len(), session.urls().len());
        assert_eq!(session.urls().len(), session.body_texts().len());

        assert_eq!(session.skipped().len(), 1);
        assert_eq!(session.skipped()[0].kind, SkipKind::MissingField);
        assert_eq!(session.skipped()[0].url, "https://example.com/2");
    }

    #[test]
    fn test_fatal_errors_are_returned() {
        let mut session = ExtractorSession::new(Source::Cnn, "https://www.cnn.com/", "politics");
        let result = session.record(
            "https://example.com/1",
            Err(ScrapeError::StructureChanged {
                site: Source::Cnn,
                detail: "gone".to_string(),
            }),
        );
        assert!(result.is_err());
        assert!(session.skipped().is_empty());
        assert!(session.records().is_empty());
    }

    #[test]
    fn test_parse_article_prefers_listing_title() {
        let recipe = crate::config::SiteRecipe {
            base_url: "https://example.com".to_string(),
            listing: crate::config::ListingRules {
                container: "div".to_string(),
                link: "a".to_string(),
                headline: None,
                skip_marker: None,
            },
            article: crate::config::ArticleRules {
                headline: "h1".to_string(),
                paragraphs: "div.body p".to_string(),
                date: "time".to_string(),
            },
        }
        .compile()
        .unwrap();
        let html = r#"<html><body><h1>Page headline</h1>
            <time>June 9, 2024</time>
            <div class="body"><p>One.</p><p>Two.</p></div></body></html>"#;

        let with_title = ListingEntry {
            title: Some("Listing headline".to_string()),
            url: "https://example.com/a".to_string(),
        };
        let record = parse_article(html, &recipe, &with_title, Source::Cnn).unwrap();
        assert_eq!(record.title, "Listing headline");
        assert_eq!(record.publication_date, "6/9/2024");
        assert_eq!(record.body_text, "One. Two.");

        let without_title = ListingEntry {
            title: None,
            url: "https://example.com/a".to_string(),
        };
        let record = parse_article(html, &recipe, &without_title, Source::Cnn).unwrap();
        assert_eq!(record.title, "Page headline");

        let no_date = "<html><body><h1>x</h1><div class=\"body\"><p>y</p></div></body></html>";
        let err = parse_article(no_date, &recipe, &without_title, Source::Cnn).unwrap_err();
        assert!(matches!(err, ScrapeError::MissingElement { field: "date", .. }));
    }

    #[test]
    fn test_take_records_empties_session() {
        let mut session = ExtractorSession::new(Source::Fox, "https://www.foxnews.com/", "politics");
        session.record("https://example.com/1", Ok(record(1))).unwrap();
        let taken = session.take_records();
        assert_eq!(taken.len(), 1);
        assert!(session.records().is_empty());
    }
}
