//! Runs every source in turn and appends what each one extracted.
//!
//! Sources are isolated from each other: a fatal error in CNN is logged and
//! reported, and Fox still runs and is written (and the reverse). A source
//! that fails writes nothing, so a run where every source fails leaves the
//! output file untouched.

use std::path::Path;
use tracing::{debug, error, info, instrument};

use crate::browser::BrowserLauncher;
use crate::config::{AppConfig, CompiledRecipe};
use crate::errors::ScrapeError;
use crate::models::Source;
use crate::outputs::csv::{append_records, validate_output_path};
use crate::scrapers::ExtractorSession;
use crate::scrapers::cnn::CnnExtractor;
use crate::scrapers::fox::FoxExtractor;

/// Outcome of one run across all sources.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Data rows appended to the output file.
    pub written: usize,
    /// Sources that failed, with the error that stopped each one.
    pub failures: Vec<(Source, ScrapeError)>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// One line naming every failed source and why.
    pub fn failure_summary(&self) -> String {
        self.failures
            .iter()
            .map(|(source, e)| format!("{source}: {e}"))
            .collect::<Vec<_>>()
            .join("; ")
    }

    fn settle(&mut self, source: Source, outcome: Result<usize, ScrapeError>) {
        match outcome {
            Ok(rows) => self.written += rows,
            Err(e) => {
                error!(%source, error = %e, "Source failed");
                self.failures.push((source, e));
            }
        }
    }
}

/// Extract CNN then Fox for `topic` and append both to `output`.
///
/// # Errors
///
/// Only problems that stop the run before any source starts: an output path
/// that is not a CSV file, or a selector in `config` that does not compile.
/// Per-source failures are collected in the returned [`RunReport`].
#[instrument(level = "info", skip(launcher, config), fields(path = %output.display()))]
pub async fn run_sources<L: BrowserLauncher>(
    launcher: L,
    config: &AppConfig,
    topic: &str,
    output: &Path,
) -> Result<RunReport, ScrapeError> {
    validate_output_path(output)?;
    let cnn_recipe = config.cnn.compile()?;
    let fox_recipe = config.fox.compile()?;

    let mut report = RunReport::default();
    report.settle(Source::Cnn, run_cnn(launcher, cnn_recipe, topic, output).await);
    report.settle(Source::Fox, run_fox(config, fox_recipe, topic, output).await);

    info!(
        rows = report.written,
        failed_sources = report.failures.len(),
        "All sources processed"
    );
    Ok(report)
}

#[instrument(level = "info", skip_all, fields(source = "CNN", %topic))]
async fn run_cnn<L: BrowserLauncher>(
    launcher: L,
    recipe: CompiledRecipe,
    topic: &str,
    output: &Path,
) -> Result<usize, ScrapeError> {
    let mut cnn = CnnExtractor::new(launcher, recipe, topic)?;
    cnn.run().await?;
    write_session(cnn.session_mut(), output)
}

#[instrument(level = "info", skip_all, fields(source = "Fox", %topic))]
async fn run_fox(
    config: &AppConfig,
    recipe: CompiledRecipe,
    topic: &str,
    output: &Path,
) -> Result<usize, ScrapeError> {
    let mut fox = FoxExtractor::new(&config.http, recipe, topic)?;
    fox.run().await?;
    write_session(fox.session_mut(), output)
}

/// Log a finished session's counts and append its records to the output.
fn write_session(session: &mut ExtractorSession, output: &Path) -> Result<usize, ScrapeError> {
    info!(
        source = %session.source,
        base_url = %session.base_url,
        topic = %session.topic,
        extracted = session.records().len(),
        skipped = session.skipped().len(),
        listing_failures = session.listing_failures(),
        "Extraction finished"
    );
    for skip in session.skipped() {
        debug!(url = %skip.url, kind = %skip.kind, reason = %skip.reason, "Skipped article");
    }

    let records = session.take_records();
    append_records(output, &records)
}
