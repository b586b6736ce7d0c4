//! Output writers.
//!
//! - [`csv`]: appends extracted articles to a CSV table
//!
//! # Output Structure
//!
//! ```text
//! title,date,url,article_text,source
//! Senate passes bill,3/3/2023,https://www.cnn.com/...,First paragraph. Second.,CNN
//! House vote delayed,11/14/2023,https://www.foxnews.com/...,Lawmakers said...,Fox
//! ```

pub mod csv;
