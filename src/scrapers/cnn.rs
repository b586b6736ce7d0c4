//! CNN article extractor.
//!
//! CNN builds its topic pages with JavaScript, so both the listing and every
//! article are loaded through a headless browser (see [`crate::browser`]).
//!
//! # Phases
//!
//! 1. [`CnnExtractor::fetch_listing`] opens one browser session, loads
//!    `https://www.cnn.com/<topic>`, and collects every link inside the
//!    lead-plus-headlines containers along with the headline nested in it.
//! 2. [`CnnExtractor::fetch_articles`] opens a second session and visits each
//!    link in turn. Articles that fail for any recoverable reason are skipped.
//!
//! Each phase closes its browser session before returning, on success and on
//! failure alike.

use itertools::Itertools;
use scraper::Html;
use tracing::{debug, error, info, instrument, warn};

use crate::browser::{BrowserLauncher, BrowserPage};
use crate::config::CompiledRecipe;
use crate::errors::ScrapeError;
use crate::models::{ListingEntry, Source};
use crate::scrapers::{ExtractorSession, parse_article};
use crate::utils::{element_text, resolve_link};

/// Browser-driven extractor for CNN topic pages.
pub struct CnnExtractor<L: BrowserLauncher> {
    launcher: L,
    recipe: CompiledRecipe,
    topic_url: String,
    listing: Vec<ListingEntry>,
    session: ExtractorSession,
}

impl<L: BrowserLauncher> CnnExtractor<L> {
    pub fn new(launcher: L, recipe: CompiledRecipe, topic: &str) -> Result<Self, ScrapeError> {
        let topic_url = resolve_link(&recipe.base_url, topic).ok_or_else(|| ScrapeError::InvalidTopic {
            topic: topic.to_string(),
            base_url: recipe.base_url.to_string(),
        })?;
        let session = ExtractorSession::new(Source::Cnn, recipe.base_url.as_str(), topic);

        Ok(Self {
            launcher,
            recipe,
            topic_url,
            listing: Vec::new(),
            session,
        })
    }

    pub fn topic_url(&self) -> &str {
        &self.topic_url
    }

    pub fn session(&self) -> &ExtractorSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut ExtractorSession {
        &mut self.session
    }

    /// Load the topic page and collect article links.
    ///
    /// A browser failure (driver missing, page load error, timeout) is logged
    /// and leaves the listing empty without raising. A page that loads but
    /// yields no links raises [`ScrapeError::StructureChanged`].
    #[instrument(level = "info", skip_all, fields(url = %self.topic_url))]
    pub async fn fetch_listing(&mut self) -> Result<&[ListingEntry], ScrapeError> {
        self.listing.clear();

        let mut browser = match self.launcher.launch().await {
            Ok(browser) => browser,
            Err(e) => {
                error!(error = %e, "Error getting CNN listing page");
                self.session.note_listing_failure();
                return Ok(self.listing.as_slice());
            }
        };

        let loaded = browser.page_source(&self.topic_url).await;
        release(browser).await;

        let html = match loaded {
            Ok(html) => html,
            Err(e) => {
                error!(error = %e, "Error getting CNN listing page");
                self.session.note_listing_failure();
                return Ok(self.listing.as_slice());
            }
        };

        self.listing = parse_listing(&html, &self.recipe)?;
        info!(
            count = self.listing.len(),
            source = %self.topic_url,
            "Indexed CNN article URLs"
        );
        debug!(urls = ?self.listing.iter().map(|e| &e.url).collect::<Vec<_>>(), "CNN URLs");

        Ok(self.listing.as_slice())
    }

    /// Visit every listed article and record the ones that extract cleanly.
    ///
    /// A failure to start the browser for this phase is returned as an error;
    /// failures on individual articles only skip that article.
    #[instrument(level = "info", skip_all, fields(count = self.listing.len()))]
    pub async fn fetch_articles(&mut self) -> Result<(), ScrapeError> {
        if self.listing.is_empty() {
            warn!("No CNN articles to fetch");
            return Ok(());
        }

        let mut browser = self.launcher.launch().await?;

        let mut fatal = None;
        for entry in &self.listing {
            let outcome = match browser.page_source(&entry.url).await {
                Ok(html) => parse_article(&html, &self.recipe, entry, Source::Cnn),
                Err(e) => Err(e),
            };
            if let Err(e) = self.session.record(&entry.url, outcome) {
                fatal = Some(e);
                break;
            }
        }

        release(browser).await;

        if let Some(e) = fatal {
            return Err(e);
        }

        info!(
            fetched = self.session.records().len(),
            skipped = self.session.skipped().len(),
            "Fetched CNN article contents"
        );
        Ok(())
    }

    /// Run both phases.
    pub async fn run(&mut self) -> Result<&ExtractorSession, ScrapeError> {
        self.fetch_listing().await?;
        self.fetch_articles().await?;
        Ok(&self.session)
    }
}

/// Close a browser session, logging rather than raising on failure.
async fn release<P: BrowserPage>(browser: P) {
    if let Err(e) = browser.close().await {
        warn!(error = %e, "Failed to close browser session cleanly");
    }
}

/// Extract listing entries from a rendered CNN topic page.
///
/// Each link inside a listing container becomes one entry, titled by the
/// headline element nested in the link (or the link text when there is
/// none). Repeated URLs keep only their first occurrence.
pub fn parse_listing(html: &str, recipe: &CompiledRecipe) -> Result<Vec<ListingEntry>, ScrapeError> {
    let document = Html::parse_document(html);

    let entries = document
        .select(&recipe.container)
        .flat_map(|container| container.select(&recipe.link))
        .filter_map(|anchor| {
            let url = resolve_link(&recipe.base_url, anchor.value().attr("href")?)?;
            let title = recipe
                .listing_headline
                .as_ref()
                .and_then(|headline| anchor.select(headline).next())
                .map(element_text)
                .unwrap_or_else(|| element_text(anchor));
            Some(ListingEntry {
                title: Some(title).filter(|t| !t.is_empty()),
                url,
            })
        })
        .unique_by(|entry| entry.url.clone())
        .collect::<Vec<_>>();

    if entries.is_empty() {
        return Err(ScrapeError::StructureChanged {
            site: Source::Cnn,
            detail: format!("no article links found under `{}`", recipe.container_css),
        });
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::fake::FakeLauncher;
    use crate::config::SiteRecipe;
    use crate::errors::SkipKind;

    const LISTING: &str = r#"<html><body>
        <div class="container_lead-plus-headlines__field-links">
          <a href="/2024/01/05/politics/one/index.html">
            <div class="container__headline"><span>First story</span></div>
          </a>
          <a href="/2024/01/05/politics/two/index.html">
            <div class="container__headline">Second story</div>
          </a>
        </div>
        <div class="container_lead-plus-headlines__field-links">
          <a href="/2024/01/05/politics/three/index.html">Third story</a>
          <a href="/2024/01/05/politics/one/index.html">First story again</a>
        </div>
        </body></html>"#;

    fn article(paragraphs: &[&str], timestamp: Option<&str>) -> String {
        let body = paragraphs
            .iter()
            .map(|p| format!("<p>{p}</p>"))
            .collect::<String>();
        let timestamp = timestamp
            .map(|t| format!(r#"<div class="timestamp">{t}</div>"#))
            .unwrap_or_default();
        format!(
            r#"<html><body>
            <h1>Page headline</h1>
            <div class="layout__content-wrapper layout-with-rail__content-wrapper">
            <section class="layout__wrapper layout-with-rail__wrapper">
            <section class="layout__main-wrapper layout-with-rail__main-wrapper">
            <section class="layout__main layout-with-rail__main">
            <article><section><main>
              {timestamp}
              <div class="article__content-container"><div class="article__content">{body}</div></div>
            </main></section></article>
            </section></section></section></div>
            </body></html>"#
        )
    }

    fn url(path: &str) -> String {
        format!("https://www.cnn.com{path}")
    }

    fn extractor(launcher: FakeLauncher) -> CnnExtractor<FakeLauncher> {
        let recipe = SiteRecipe::cnn().compile().unwrap();
        CnnExtractor::new(launcher, recipe, "politics").unwrap()
    }

    #[test]
    fn test_parse_listing_pairs_titles_with_links() {
        let recipe = SiteRecipe::cnn().compile().unwrap();
        let entries = parse_listing(LISTING, &recipe).unwrap();

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].url, url("/2024/01/05/politics/one/index.html"));
        assert_eq!(entries[0].title.as_deref(), Some("First story"));
        assert_eq!(entries[1].title.as_deref(), Some("Second story"));
        assert_eq!(entries[2].title.as_deref(), Some("Third story"));
    }

    #[test]
    fn test_parse_listing_without_links_is_structure_change() {
        let recipe = SiteRecipe::cnn().compile().unwrap();
        let err = parse_listing("<html><body><div class=\"other\"></div></body></html>", &recipe)
            .unwrap_err();
        assert!(matches!(err, ScrapeError::StructureChanged { site: Source::Cnn, .. }));
    }

    #[test]
    fn test_topic_url() {
        let cnn = extractor(FakeLauncher::default());
        assert_eq!(cnn.topic_url(), "https://www.cnn.com/politics");
        assert_eq!(cnn.session().base_url, "https://www.cnn.com/");
        assert_eq!(cnn.session().topic, "politics");
    }

    #[test]
    fn test_unusable_topic_is_reported_as_topic_error() {
        let recipe = SiteRecipe::cnn().compile().unwrap();
        let err = CnnExtractor::new(FakeLauncher::default(), recipe, "http://[broken")
            .err()
            .unwrap();
        assert!(matches!(err, ScrapeError::InvalidTopic { ref topic, .. } if topic == "http://[broken"));
    }

    #[tokio::test]
    async fn test_malformed_article_is_skipped() {
        let launcher = FakeLauncher::serving(vec![
            (url("/politics"), LISTING.to_string()),
            (
                url("/2024/01/05/politics/one/index.html"),
                article(&["Alpha.", "Beta."], Some("Updated 10:23 AM EST, Fri January 5, 2024")),
            ),
            (
                url("/2024/01/05/politics/two/index.html"),
                article(&["No date here."], None),
            ),
            (
                url("/2024/01/05/politics/three/index.html"),
                article(&[], Some("Published 9:00 AM EDT, Mon March 3, 2023")),
            ),
        ]);
        let mut cnn = extractor(launcher.clone());

        let session = cnn.run().await.unwrap();

        assert_eq!(session.records().len(), 2);
        assert_eq!(session.titles(), vec!["First story", "Third story"]);
        assert_eq!(session.dates(), vec!["1/5/2024", "3/3/2023"]);
        assert_eq!(session.body_texts(), vec!["Alpha. Beta.", ""]);
        assert_eq!(session.urls().len(), 2);
        assert!(session.records().iter().all(|r| r.source == Source::Cnn));

        assert_eq!(session.skipped().len(), 1);
        assert_eq!(session.skipped()[0].kind, SkipKind::MissingField);
        assert_eq!(
            session.skipped()[0].url,
            url("/2024/01/05/politics/two/index.html")
        );

        assert_eq!(launcher.launches.get(), 2);
        assert_eq!(launcher.closes.get(), 2);
    }

    #[tokio::test]
    async fn test_unreachable_article_is_skipped_as_network() {
        let launcher = FakeLauncher::serving(vec![
            (url("/politics"), LISTING.to_string()),
            (
                url("/2024/01/05/politics/one/index.html"),
                article(&["Alpha."], Some("January 5, 2024")),
            ),
        ]);
        let mut cnn = extractor(launcher);
        cnn.run().await.unwrap();

        let kinds = cnn
            .session()
            .skipped()
            .iter()
            .map(|s| s.kind)
            .collect::<Vec<_>>();
        assert_eq!(kinds, vec![SkipKind::Network, SkipKind::Network]);
        assert_eq!(cnn.session().records().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_listing_releases_browser_and_fails() {
        let launcher = FakeLauncher::serving(vec![(
            url("/politics"),
            "<html><body><p>redesigned</p></body></html>".to_string(),
        )]);
        let mut cnn = extractor(launcher.clone());

        let err = cnn.fetch_listing().await.unwrap_err();

        assert!(matches!(err, ScrapeError::StructureChanged { .. }));
        assert_eq!(launcher.launches.get(), 1);
        assert_eq!(launcher.closes.get(), 1);
        assert!(cnn.session().records().is_empty());
    }

    #[tokio::test]
    async fn test_browser_failure_on_listing_is_not_fatal() {
        let launcher = FakeLauncher {
            fail_launch: true,
            ..FakeLauncher::default()
        };
        let mut cnn = extractor(launcher);

        let listing = cnn.fetch_listing().await.unwrap();
        assert!(listing.is_empty());
        assert_eq!(cnn.session().listing_failures(), 1);

        cnn.fetch_articles().await.unwrap();
        assert!(cnn.session().records().is_empty());
    }

    #[tokio::test]
    async fn test_listing_page_load_failure_is_not_fatal() {
        let launcher = FakeLauncher::serving(vec![]);
        let mut cnn = extractor(launcher.clone());

        assert!(cnn.fetch_listing().await.unwrap().is_empty());
        assert_eq!(cnn.session().listing_failures(), 1);
        assert_eq!(launcher.closes.get(), 1);
    }
}
