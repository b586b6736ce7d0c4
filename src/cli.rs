//! Command-line interface definitions.
//!
//! The output path has historically been passed as `-filename out.csv`, a
//! single-dash long flag that `clap` does not accept natively. Arguments are
//! passed through [`normalize_args`] first so that spelling keeps working
//! alongside `--filename` and `-f`.

use clap::Parser;
use std::ffi::OsString;

/// Scrape CNN and Fox News topic pages into a CSV file.
///
/// # Examples
///
/// ```sh
/// news_extract -filename politics.csv
/// news_extract --topic world --driver-path /usr/local/bin/chromedriver
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path of the CSV file to append articles to
    #[arg(short = 'f', long = "filename", default_value = "fake.csv")]
    pub filename: String,

    /// Topic section to scrape on both sites
    #[arg(short, long, default_value = "politics")]
    pub topic: String,

    /// Path to the chromedriver binary (relative paths resolve against the working directory)
    #[arg(long, env = "CHROMEDRIVER_PATH")]
    pub driver_path: Option<String>,

    /// Optional path to a YAML config file with selector and timeout overrides
    #[arg(short, long)]
    pub config: Option<String>,
}

impl Cli {
    /// Parse the process arguments, accepting the legacy `-filename` flag.
    pub fn parse_normalized() -> Self {
        Self::parse_from(normalize_args(std::env::args_os()))
    }
}

/// Rewrite `-filename` (and `-filename=...`) to `--filename`.
pub fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| match arg.to_str() {
            Some("-filename") => OsString::from("--filename"),
            Some(s) if s.starts_with("-filename=") => OsString::from(format!("-{s}")),
            _ => arg,
        })
        .collect()
}
