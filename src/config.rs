//! Runtime configuration and per-site selector maps.
//!
//! Each site's markup knowledge lives in a [`SiteRecipe`]: a base origin plus
//! the selectors used on its listing and article pages. When the sites change
//! their HTML, only the recipe needs updating, either here in the defaults or
//! in a YAML file passed with `--config`.
//!
//! # Example
//!
//! ```yaml
//! http:
//!   timeout_secs: 10
//! browser:
//!   port: 4444
//!   driver_path: /usr/local/bin/chromedriver
//! ```
//!
//! Sections left out keep their built-in defaults, as do missing `http` and
//! `browser` fields. A `cnn` or `fox` section replaces that site's recipe
//! whole, so it must name every selector (`headline` and `skip_marker` on the
//! listing are optional).

use scraper::Selector;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{info, instrument};
use url::Url;

use crate::errors::ScrapeError;

/// User agent presented by both the HTTP client and the browser.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub cnn: SiteRecipe,
    pub fox: SiteRecipe,
    pub http: HttpSettings,
    pub browser: BrowserSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cnn: SiteRecipe::cnn(),
            fox: SiteRecipe::fox(),
            http: HttpSettings::default(),
            browser: BrowserSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from an optional YAML file.
    ///
    /// With no path, the built-in defaults are returned. Fields missing from
    /// the file fall back to their defaults.
    #[instrument(level = "info")]
    pub fn load(path: Option<&str>) -> Result<Self, ScrapeError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(Path::new(path))?;
        let config = Self::from_yaml(&raw)?;
        info!(path, "Loaded configuration");
        Ok(config)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, ScrapeError> {
        // An empty file deserializes to `null`, which serde_yaml rejects for a struct.
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }
}

/// Selectors and origin for one news site.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteRecipe {
    pub base_url: String,
    pub listing: ListingRules,
    pub article: ArticleRules,
}

/// Where article links live on a topic listing page.
#[derive(Debug, Clone, Deserialize)]
pub struct ListingRules {
    /// Element(s) wrapping one or more article links.
    pub container: String,
    /// Anchor selector, evaluated inside each container.
    pub link: String,
    /// Headline selector, evaluated inside each link.
    #[serde(default)]
    pub headline: Option<String>,
    /// Containers whose text contains this marker are ignored (case-sensitive).
    #[serde(default)]
    pub skip_marker: Option<String>,
}

/// Where the fields of a single article live.
#[derive(Debug, Clone, Deserialize)]
pub struct ArticleRules {
    pub headline: String,
    pub paragraphs: String,
    pub date: String,
}

impl SiteRecipe {
    pub fn cnn() -> Self {
        Self {
            base_url: "https://www.cnn.com".to_string(),
            listing: ListingRules {
                container: "div.container_lead-plus-headlines__field-links".to_string(),
                link: "a[href]".to_string(),
                headline: Some(".container__headline".to_string()),
                skip_marker: None,
            },
            article: ArticleRules {
                headline: "h1".to_string(),
                paragraphs: "body > div.layout__content-wrapper.layout-with-rail__content-wrapper \
                     > section.layout__wrapper.layout-with-rail__wrapper \
                     > section.layout__main-wrapper.layout-with-rail__main-wrapper \
                     > section.layout__main.layout-with-rail__main \
                     > article > section > main > div.article__content-container \
                     > div.article__content > p"
                    .to_string(),
                date: "div.timestamp".to_string(),
            },
        }
    }

    pub fn fox() -> Self {
        Self {
            base_url: "https://www.foxnews.com".to_string(),
            listing: ListingRules {
                container: "main.main-content .content .article".to_string(),
                link: "a".to_string(),
                headline: None,
                skip_marker: Some("VIDEO".to_string()),
            },
            article: ArticleRules {
                headline: "h1.headline".to_string(),
                paragraphs: "#wrapper > div.page-content > div.row.full > main > article \
                     > div > div.article-content > div > p"
                    .to_string(),
                date: "#wrapper > div.page-content > div.row.full > main > article > header \
                     > div.article-meta.article-meta-upper > div.article-date > time"
                    .to_string(),
            },
        }
    }

    /// Parse the base origin and compile every selector.
    ///
    /// Fails on the first selector that does not parse, so a bad config file
    /// is reported before any page is fetched.
    pub fn compile(&self) -> Result<CompiledRecipe, ScrapeError> {
        let base_url = Url::parse(&self.base_url).map_err(|e| ScrapeError::Selector {
            selector: self.base_url.clone(),
            reason: format!("base_url is not a valid URL: {e}"),
        })?;

        Ok(CompiledRecipe {
            base_url,
            container: compile_selector(&self.listing.container)?,
            container_css: self.listing.container.clone(),
            link: compile_selector(&self.listing.link)?,
            listing_headline: self
                .listing
                .headline
                .as_deref()
                .map(compile_selector)
                .transpose()?,
            skip_marker: self.listing.skip_marker.clone(),
            headline: FieldSelector::new(&self.article.headline)?,
            paragraphs: compile_selector(&self.article.paragraphs)?,
            date: FieldSelector::new(&self.article.date)?,
        })
    }
}

/// A [`SiteRecipe`] with its selectors parsed and ready to use.
#[derive(Debug, Clone)]
pub struct CompiledRecipe {
    pub base_url: Url,
    pub container: Selector,
    pub container_css: String,
    pub link: Selector,
    pub listing_headline: Option<Selector>,
    pub skip_marker: Option<String>,
    pub headline: FieldSelector,
    pub paragraphs: Selector,
    pub date: FieldSelector,
}

/// A compiled selector that keeps its source text for error messages.
#[derive(Debug, Clone)]
pub struct FieldSelector {
    pub css: String,
    pub selector: Selector,
}

impl FieldSelector {
    fn new(css: &str) -> Result<Self, ScrapeError> {
        Ok(Self {
            css: css.to_string(),
            selector: compile_selector(css)?,
        })
    }
}

pub fn compile_selector(css: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(css).map_err(|e| ScrapeError::Selector {
        selector: css.to_string(),
        reason: e.to_string(),
    })
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl HttpSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Settings for the chromedriver-backed browser session.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    /// Path to the chromedriver binary. Relative paths resolve against the
    /// working directory.
    pub driver_path: String,
    pub port: u16,
    pub headless: bool,
    pub page_load_timeout_secs: u64,
    /// How long to wait for chromedriver to accept connections.
    pub startup_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            driver_path: "chromedriver".to_string(),
            port: 9515,
            headless: true,
            page_load_timeout_secs: 30,
            startup_timeout_secs: 10,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl BrowserSettings {
    pub fn page_load_timeout(&self) -> Duration {
        Duration::from_secs(self.page_load_timeout_secs)
    }

    pub fn startup_timeout(&self) -> Duration {
        Duration::from_secs(self.startup_timeout_secs)
    }

    pub fn webdriver_url(&self) -> String {
        format!("http://localhost:{}", self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_recipes_compile() {
        let config = AppConfig::default();
        let cnn = config.cnn.compile().unwrap();
        let fox = config.fox.compile().unwrap();

        assert_eq!(cnn.base_url.as_str(), "https://www.cnn.com/");
        assert!(cnn.listing_headline.is_some());
        assert_eq!(fox.skip_marker.as_deref(), Some("VIDEO"));
        assert_eq!(fox.headline.css, "h1.headline");
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
http:
  timeout_secs: 5
browser:
  port: 4444
fox:
  base_url: "http://127.0.0.1:8080"
  listing:
    container: "div.story"
    link: "a"
  article:
    headline: "h1"
    paragraphs: "div.body p"
    date: "time"
"#;
        let config = AppConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.http.timeout(), Duration::from_secs(5));
        assert_eq!(config.http.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(config.browser.port, 4444);
        assert_eq!(config.browser.webdriver_url(), "http://localhost:4444");
        assert_eq!(config.fox.listing.container, "div.story");
        assert_eq!(config.fox.listing.skip_marker, None);
        assert_eq!(config.cnn.base_url, "https://www.cnn.com");
    }

    #[test]
    fn test_empty_yaml_is_default() {
        let config = AppConfig::from_yaml("  \n").unwrap();
        assert_eq!(config.browser.driver_path, "chromedriver");
    }

    #[test]
    fn test_invalid_selector_is_reported() {
        let mut recipe = SiteRecipe::fox();
        recipe.article.date = "div[".to_string();
        let err = recipe.compile().unwrap_err();
        assert!(matches!(err, ScrapeError::Selector { ref selector, .. } if selector == "div["));
    }

    #[test]
    fn test_invalid_base_url_is_reported() {
        let mut recipe = SiteRecipe::cnn();
        recipe.base_url = "not a url".to_string();
        assert!(recipe.compile().is_err());
    }

    #[test]
    fn test_load_without_path() {
        let config = AppConfig::load(None).unwrap();
        assert_eq!(config.fox.base_url, "https://www.foxnews.com");
    }
}
