//! Scrape CNN and Fox News topic pages into a CSV table.
//!
//! The binary in `main.rs` wires these modules together; they are exposed as
//! a library so each extractor can be driven and tested on its own.

pub mod browser;
pub mod cli;
pub mod config;
pub mod errors;
pub mod models;
pub mod outputs;
pub mod pipeline;
pub mod scrapers;
pub mod utils;

pub use pipeline::{RunReport, run_sources};
