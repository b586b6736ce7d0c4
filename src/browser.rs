//! Headless Chrome sessions driven over WebDriver.
//!
//! CNN renders its listing and article markup with JavaScript, so those pages
//! are loaded through a real browser. A session owns two things that must not
//! outlive it: the chromedriver child process and the WebDriver session it
//! hosts. Callers acquire a session with [`BrowserLauncher::launch`] and must
//! hand it back with [`BrowserPage::close`] when the phase ends, whether the
//! phase succeeded or not. The driver process is also spawned with
//! `kill_on_drop`, so a session dropped on a panic path does not leak it.
//!
//! The two traits exist so the CNN extractor can be exercised against canned
//! HTML without a browser installed.

use fantoccini::{Client, ClientBuilder};
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::{Child, Command};
use tokio::time::{sleep, timeout};
use tracing::{debug, info, instrument, warn};

use crate::config::BrowserSettings;
use crate::errors::ScrapeError;

/// Something that can start a browser session.
#[allow(async_fn_in_trait)]
pub trait BrowserLauncher {
    type Session: BrowserPage;

    async fn launch(&self) -> Result<Self::Session, ScrapeError>;
}

/// A live browser session.
#[allow(async_fn_in_trait)]
pub trait BrowserPage {
    /// Navigate to `url` and return the rendered page source.
    async fn page_source(&mut self, url: &str) -> Result<String, ScrapeError>;

    /// End the session and release everything it holds.
    async fn close(self) -> Result<(), ScrapeError>;
}

/// Launches chromedriver and opens a Chrome session through it.
#[derive(Debug, Clone)]
pub struct ChromeLauncher {
    settings: BrowserSettings,
    driver_path: PathBuf,
}

impl ChromeLauncher {
    pub fn new(settings: BrowserSettings) -> Self {
        let driver_path = resolve_driver_path(&settings.driver_path);
        Self {
            settings,
            driver_path,
        }
    }

    pub fn driver_path(&self) -> &Path {
        &self.driver_path
    }

    /// Keep trying to open a WebDriver session until chromedriver is up or
    /// the startup timeout elapses. Each attempt is bounded by the time left,
    /// so a driver that accepts the connection but never answers cannot
    /// stall the launch.
    async fn connect(&self) -> Result<Client, ScrapeError> {
        let url = self.settings.webdriver_url();
        let caps = chrome_capabilities(&self.settings);
        let deadline = Instant::now() + self.settings.startup_timeout();

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let mut builder = ClientBuilder::native();
            builder.capabilities(caps.clone());
            let attempt = builder.connect(&url);

            let reason = match timeout(remaining, attempt).await {
                Ok(Ok(client)) => return Ok(client),
                Ok(Err(e)) => e.to_string(),
                Err(_) => format!("no answer within {:?}", self.settings.startup_timeout()),
            };

            if Instant::now() >= deadline {
                return Err(ScrapeError::BrowserLaunch(format!(
                    "no WebDriver session at {url}: {reason}"
                )));
            }
            debug!(error = %reason, %url, "chromedriver not ready yet");
            sleep(Duration::from_millis(250)).await;
        }
    }
}

impl BrowserLauncher for ChromeLauncher {
    type Session = ChromeSession;

    #[instrument(level = "info", skip_all, fields(driver = %self.driver_path.display(), port = self.settings.port))]
    async fn launch(&self) -> Result<ChromeSession, ScrapeError> {
        let driver = Command::new(&self.driver_path)
            .arg(format!("--port={}", self.settings.port))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                ScrapeError::BrowserLaunch(format!("{}: {e}", self.driver_path.display()))
            })?;

        // On failure `driver` is dropped here and killed.
        let client = self.connect().await?;
        info!("Browser session started");

        Ok(ChromeSession {
            client,
            driver,
            page_load_timeout: self.settings.page_load_timeout(),
        })
    }
}

/// A Chrome session plus the chromedriver process hosting it.
pub struct ChromeSession {
    client: Client,
    driver: Child,
    page_load_timeout: Duration,
}

impl BrowserPage for ChromeSession {
    #[instrument(level = "debug", skip(self))]
    async fn page_source(&mut self, url: &str) -> Result<String, ScrapeError> {
        let client = &self.client;
        let load = async {
            client.goto(url).await?;
            Ok::<_, ScrapeError>(client.source().await?)
        };

        timeout(self.page_load_timeout, load)
            .await
            .map_err(|_| ScrapeError::Timeout(self.page_load_timeout, url.to_string()))?
    }

    #[instrument(level = "info", skip_all)]
    async fn close(self) -> Result<(), ScrapeError> {
        let ChromeSession {
            client, mut driver, ..
        } = self;

        let closed = client.close().await;
        if let Err(e) = driver.kill().await {
            warn!(error = %e, "Failed to stop chromedriver");
        }
        info!("Browser session closed");
        Ok(closed?)
    }
}

/// Resolve the driver path against the working directory when relative.
pub fn resolve_driver_path(path: &str) -> PathBuf {
    let path = PathBuf::from(path);
    if path.is_absolute() {
        return path;
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path,
    }
}

/// WebDriver capabilities: headless Chrome that ignores certificate errors
/// and presents a desktop user agent.
pub fn chrome_capabilities(settings: &BrowserSettings) -> Map<String, Value> {
    let mut args = vec![
        "--ignore-certificate-errors".to_string(),
        "--ignore-ssl-errors".to_string(),
        format!("--user-agent={}", settings.user_agent),
    ];
    if settings.headless {
        args.push("--headless=new".to_string());
    }

    let mut caps = Map::new();
    caps.insert("acceptInsecureCerts".to_string(), json!(true));
    caps.insert(
        "goog:chromeOptions".to_string(),
        json!({
            "args": args,
            "excludeSwitches": ["enable-logging"],
        }),
    );
    caps
}
