//! Fox News article extractor.
//!
//! Fox serves complete article markup over plain HTTP, so no browser is
//! involved: the topic page and each article are fetched with `reqwest` and
//! parsed with `scraper`. Requests are independent and carry no session state.
//!
//! # Listing rules
//!
//! Every element matching the listing container is one candidate article.
//! Candidates whose text contains `VIDEO` are video pages with almost no text
//! and are ignored. Candidates without a usable link are skipped one by one.

use futures::stream::{self, StreamExt};
use itertools::Itertools;
use reqwest::Client;
use scraper::Html;
use tracing::{debug, info, instrument};

use crate::config::{CompiledRecipe, HttpSettings};
use crate::errors::ScrapeError;
use crate::models::{ArticleRecord, ListingEntry, Source};
use crate::scrapers::{ExtractorSession, parse_article};
use crate::utils::resolve_link;

/// HTTP-driven extractor for Fox News topic pages.
pub struct FoxExtractor {
    client: Client,
    recipe: CompiledRecipe,
    topic_url: String,
    urls: Vec<String>,
    session: ExtractorSession,
}

impl FoxExtractor {
    pub fn new(
        settings: &HttpSettings,
        recipe: CompiledRecipe,
        topic: &str,
    ) -> Result<Self, ScrapeError> {
        let client = Client::builder()
            .timeout(settings.timeout())
            .user_agent(settings.user_agent.clone())
            .build()?;

        let topic_url = resolve_link(&recipe.base_url, topic).ok_or_else(|| ScrapeError::InvalidTopic {
            topic: topic.to_string(),
            base_url: recipe.base_url.to_string(),
        })?;
        let session = ExtractorSession::new(Source::Fox, recipe.base_url.as_str(), topic);

        Ok(Self {
            client,
            recipe,
            topic_url,
            urls: Vec::new(),
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

    /// Fetch the topic page and collect article URLs.
    ///
    /// # Errors
    ///
    /// - The topic page cannot be fetched.
    /// - No URLs survive filtering ([`ScrapeError::StructureChanged`]).
    #[instrument(level = "info", skip_all, fields(url = %self.topic_url))]
    pub async fn fetch_listing(&mut self) -> Result<&[String], ScrapeError> {
        let html = get_html(&self.client, &self.topic_url).await?;
        self.urls = parse_listing(&html, &self.recipe)?;

        info!(
            count = self.urls.len(),
            source = %self.topic_url,
            "Indexed Fox article URLs"
        );
        debug!(urls = ?self.urls, "Fox URLs");
        Ok(self.urls.as_slice())
    }

    /// Fetch every listed article in order.
    ///
    /// An article that fails to download or parse is skipped and recorded in
    /// the session; the rest of the batch continues.
    #[instrument(level = "info", skip_all, fields(count = self.urls.len()))]
    pub async fn fetch_articles(&mut self) -> Result<(), ScrapeError> {
        let client = &self.client;
        let recipe = &self.recipe;

        let outcomes: Vec<(String, Result<ArticleRecord, ScrapeError>)> =
            stream::iter(self.urls.iter())
                .then(|url| async move { (url.clone(), fetch_article(client, recipe, url).await) })
                .collect()
                .await;

        for (url, outcome) in outcomes {
            self.session.record(&url, outcome)?;
        }

        info!(
            fetched = self.session.records().len(),
            skipped = self.session.skipped().len(),
            "Fetched Fox article contents"
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

async fn get_html(client: &Client, url: &str) -> Result<String, ScrapeError> {
    let response = client.get(url).send().await?.error_for_status()?;
    Ok(response.text().await?)
}

/// Fetch a single Fox article
#[instrument(level = "info", skip(client, recipe))]
async fn fetch_article(
    client: &Client,
    recipe: &CompiledRecipe,
    url: &str,
) -> Result<ArticleRecord, ScrapeError> {
    let html = get_html(client, url).await?;
    let entry = ListingEntry {
        title: None,
        url: url.to_string(),
    };
    parse_article(&html, recipe, &entry, Source::Fox)
}

/// Extract article URLs from a Fox topic page.
///
/// Takes the first link of each listing container, skipping containers marked
/// as video and containers with no link. Repeated URLs keep only their first
/// occurrence.
pub fn parse_listing(html: &str, recipe: &CompiledRecipe) -> Result<Vec<String>, ScrapeError> {
    let document = Html::parse_document(html);
    let mut urls = Vec::new();

    for container in document.select(&recipe.container) {
        if let Some(marker) = recipe.skip_marker.as_deref() {
            if container.text().collect::<String>().contains(marker) {
                debug!(marker, "Skipping marked listing entry");
                continue;
            }
        }

        let href = container
            .select(&recipe.link)
            .next()
            .and_then(|anchor| anchor.value().attr("href"));
        match href.and_then(|href| resolve_link(&recipe.base_url, href)) {
            Some(url) => urls.push(url),
            None => debug!("Listing entry has no usable link"),
        }
    }

    let urls = urls.into_iter().unique().collect::<Vec<_>>();
    if urls.is_empty() {
        return Err(ScrapeError::StructureChanged {
            site: Source::Fox,
            detail: format!("no article URLs found under `{}`", recipe.container_css),
        });
    }
    Ok(urls)
}
