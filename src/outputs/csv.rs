//! CSV sink for extracted articles.
//!
//! Records are appended to the destination file, never overwritten, so
//! several sources (and several runs) accumulate in one table. The header
//! row `title,date,url,article_text,source` is written only when the file is
//! new or empty.

use std::fs::OpenOptions;
use std::path::Path;
use tracing::{info, instrument};

use crate::errors::ScrapeError;
use crate::models::ArticleRecord;

/// Reject destinations that do not look like CSV files.
///
/// The check is a case-insensitive search for `csv` anywhere in the path, so
/// `report.csv` and `REPORT.CSV` pass while `report.txt` does not.
///
/// # Errors
///
/// [`ScrapeError::InvalidOutputFormat`] naming the offending extension.
pub fn validate_output_path(path: &Path) -> Result<(), ScrapeError> {
    if path.to_string_lossy().to_lowercase().contains("csv") {
        return Ok(());
    }
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().into_owned())
        .unwrap_or_else(|| "(none)".to_string());
    Err(ScrapeError::InvalidOutputFormat { extension })
}

/// Append records to the CSV file at `path`.
///
/// # Arguments
///
/// * `path` - Destination file; created if it does not exist
/// * `records` - Records to append, written in order
///
/// # Returns
///
/// The number of data rows written.
#[instrument(level = "info", skip(records), fields(path = %path.display(), count = records.len()))]
pub fn append_records(path: &Path, records: &[ArticleRecord]) -> Result<usize, ScrapeError> {
    validate_output_path(path)?;

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let needs_header = file.metadata()?.len() == 0;

    let mut writer = ::csv::WriterBuilder::new()
        .has_headers(needs_header)
        .from_writer(file);
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    info!(rows = records.len(), header = needs_header, "Appended articles to CSV");
    Ok(records.len())
}
