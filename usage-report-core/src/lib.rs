//! # usage-report-core
//!
//! Core library for usage-report: turns application log files into a
//! usage, cost and performance report.
//!
//! This library provides:
//! - Record types for log lines and embedded performance reports
//! - A best-effort line parser and telemetry extractors
//! - The metrics aggregator producing [`ReportData`]
//! - Report period resolution and log sources
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Architecture
//!
//! Data flows through three stages:
//! - **Parse:** raw text into [`LogRecord`]s; malformed lines are dropped
//! - **Extract:** performance reports and text signals from the records
//! - **Aggregate:** records and reports into [`ReportData`]
//!
//! ## Example
//!
//! ```rust,no_run
//! use usage_report_core::analytics::{process_logs, AggregateOptions};
//! use usage_report_core::period::DateRange;
//!
//! let text = std::fs::read_to_string("app.log").expect("failed to read logs");
//! let day = "2025-12-09".parse().expect("valid date");
//! let report = process_logs(&text, DateRange::single(day), &AggregateOptions::default());
//! println!("{} interactions", report.data.executive_summary.total_interactions);
//! ```

// Re-export commonly used items at the crate root
pub use analytics::{ProcessedReport, ReportData};
pub use config::Config;
pub use error::{Error, Result};
pub use period::{DateRange, ReportPeriod};
pub use tally::Tally;
pub use types::*;

// Public modules
pub mod analytics;
pub mod config;
pub mod error;
pub mod format;
pub mod ingest;
pub mod logging;
pub mod period;
pub mod tally;
pub mod types;
