//! # News Extract
//!
//! Scrapes a topic section (politics by default) from CNN and Fox News and
//! appends every article's title, date, URL, body text, and source to a
//! single CSV file.
//!
//! ## Usage
//!
//! ```sh
//! news_extract -filename articles.csv
//! ```
//!
//! ## Architecture
//!
//! 1. **Validation**: the output path must name a CSV file; nothing is fetched otherwise
//! 2. **CNN**: listing and articles loaded through headless Chrome, then appended
//! 3. **Fox News**: listing and articles fetched over HTTP, then appended
//!
//! The two sources run one after the other. A fatal error in one source is
//! logged and does not stop the other; the process still exits with an
//! error if either source failed.

use std::error::Error;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

use news_extract::browser::ChromeLauncher;
use news_extract::cli::Cli;
use news_extract::config::AppConfig;
use news_extract::outputs::csv::validate_output_path;
use news_extract::run_sources;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = Instant::now();
    info!("news_extract starting up");

    let args = Cli::parse_normalized();
    debug!(?args, "Parsed CLI arguments");

    let output = PathBuf::from(&args.filename);
    if let Err(e) = validate_output_path(&output) {
        error!(path = %output.display(), error = %e, "Refusing to write output");
        return Err(e.into());
    }

    let mut config = AppConfig::load(args.config.as_deref())?;
    if let Some(driver_path) = args.driver_path {
        config.browser.driver_path = driver_path;
    }

    let launcher = ChromeLauncher::new(config.browser.clone());
    debug!(driver = %launcher.driver_path().display(), "Using chromedriver");

    let report = run_sources(launcher, &config, &args.topic, &output).await?;

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        rows = report.written,
        failed_sources = report.failures.len(),
        path = %output.display(),
        "Execution complete"
    );

    if report.is_success() {
        return Ok(());
    }
    Err(report.failure_summary().into())
}
