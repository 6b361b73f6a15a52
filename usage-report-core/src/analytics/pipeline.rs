//! End-to-end processing of one batch of log text.

use super::aggregate::{aggregate_metrics_at, AggregateOptions};
use super::report::ReportData;
use crate::ingest::lines::{parse_all, ParseStats};
use crate::ingest::telemetry::scan_perf_reports;
use crate::period::DateRange;
use chrono::{DateTime, Utc};

/// Report data plus the counters describing what was dropped on the way.
#[derive(Debug, Clone)]
pub struct ProcessedReport {
    pub data: ReportData,
    pub parse_stats: ParseStats,
    /// Messages carrying the PerfReport prefix
    pub payload_candidates: usize,
    /// Prefixed messages whose payload did not decode
    pub payload_drops: usize,
}

/// Parse, extract and aggregate `content`, stamped with the current time.
pub fn process_logs(content: &str, range: DateRange, options: &AggregateOptions) -> ProcessedReport {
    process_logs_at(content, range, Utc::now(), options)
}

/// Parse, extract and aggregate `content` with an explicit generation time.
pub fn process_logs_at(
    content: &str,
    range: DateRange,
    generated_at: DateTime<Utc>,
    options: &AggregateOptions,
) -> ProcessedReport {
    let (records, parse_stats) = parse_all(content);
    let scan = scan_perf_reports(&records);

    tracing::info!(
        lines = parse_stats.lines,
        records = records.len(),
        dropped_lines = parse_stats.dropped,
        perf_reports = scan.reports.len(),
        dropped_payloads = scan.dropped,
        "Parsed log batch"
    );

    let data = aggregate_metrics_at(&scan.reports, &records, range, generated_at, options);

    ProcessedReport {
        data,
        parse_stats,
        payload_candidates: scan.candidates,
        payload_drops: scan.dropped,
    }
}
