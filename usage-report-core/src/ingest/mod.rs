//! Ingestion layer: raw log text into typed records and telemetry
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌────────────┐     ┌──────────────┐
//! │  LogSource  │ ──► │  LogLines  │ ──► │  LogRecord   │
//! │ (dir, file) │     │ (lazy)     │     │  sequence    │
//! └─────────────┘     └────────────┘     └──────────────┘
//!                                               │
//!                                               ▼
//!                                 ┌───────────────────────────┐
//!                                 │  telemetry extractors     │
//!                                 │  ├─ perf reports          │
//!                                 │  ├─ intents / languages   │
//!                                 │  ├─ warnings / errors     │
//!                                 │  └─ unique users          │
//!                                 └───────────────────────────┘
//! ```
//!
//! Every stage drops bad input at the smallest scope (one line, one payload)
//! and keeps going. Drop counts are reported through [`ParseStats`] and
//! [`PerfReportScan`].

pub mod lines;
pub mod source;
pub mod telemetry;

pub use lines::{parse_all, parse_log_lines, LogLines, ParseStats};
pub use source::{DirectorySource, FileSource, LogSource};
pub use telemetry::{
    count_by_level, extract_errors, extract_intents, extract_languages, extract_perf_reports,
    extract_unique_users, extract_warnings, scan_perf_reports, PerfReportScan,
    PERF_REPORT_PREFIX,
};
