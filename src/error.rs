// src/error.rs
use std::path::PathBuf;
use thiserror::Error;

/// Everything that can abort a crawl run. Nothing here is retried: the job
/// is a single pass reviewed by a human, so every variant is fatal.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// HTTP failure on the bulletin page or the image itself.
    #[error("fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),

    /// The bulletin layout was not recognized (no period label, no image).
    #[error("extraction failed: {0}")]
    Extraction(String),

    /// The cleaned table did not have the expected shape.
    #[error("table schema mismatch: {0}")]
    SchemaMismatch(String),

    /// A value cell could not be converted to a number.
    #[error("cannot parse {value:?} as a numeric value")]
    NumericParse { value: String },

    /// The historical dataset file exists but cannot be read as CSV.
    #[error("historical dataset unreadable: {0}")]
    Dataset(#[from] csv::Error),

    /// Writing the updated dataset back failed. The on-disk file is left
    /// untouched in this case: the rewrite goes through a temp file.
    #[error("failed to persist dataset to {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The tesseract subprocess failed to produce a PDF.
    #[error("ocr conversion failed: {0}")]
    Ocr(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
