//! Error types for usage-report-core
//!
//! Only the I/O and configuration boundary is fallible. Malformed log lines
//! and payloads are dropped by the pipeline and never surface here.

use chrono::NaiveDate;
use thiserror::Error;

/// Main error type for the usage-report-core library
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Log source failure (bad pattern, unreadable directory)
    #[error("log source {source_name} failed: {message}")]
    Source {
        source_name: String,
        message: String,
    },

    /// Start date falls after end date
    #[error("invalid date range: {start} is after {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },
}

/// Result type alias for usage-report-core
pub type Result<T> = std::result::Result<T, Error>;
