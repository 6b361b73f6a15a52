//! Telemetry extraction from decoded log records.
//!
//! Two kinds of signal live in message text:
//! - embedded performance reports, `PerfReport {json}`
//! - free-text markers for detected intents and language codes
//!
//! Every extractor here is a pure function over the records. None of them
//! fail: no match yields an empty result, and a payload that does not decode
//! is dropped.

use crate::tally::Tally;
use crate::types::{level, LogRecord, PerfReport};
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// Prefix marking a message whose remainder is a [`PerfReport`] payload.
pub const PERF_REPORT_PREFIX: &str = "PerfReport ";

static INTENTS_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"extracted user intents: (.+)").unwrap());

static LANGUAGE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"language code (\w+) detected").unwrap());

/// Separator between intents in an intent detection message.
const INTENT_SEPARATOR: &str = ", ";

/// Outcome of scanning records for performance reports.
#[derive(Debug, Default)]
pub struct PerfReportScan {
    /// Decoded reports, in record order
    pub reports: Vec<PerfReport>,
    /// Messages that carried the prefix
    pub candidates: usize,
    /// Prefixed messages whose payload failed to decode
    pub dropped: usize,
}

/// Decode every embedded performance report, keeping drop counts.
///
/// Reports are not deduplicated; a trace logged twice yields two reports.
pub fn scan_perf_reports<'a, I>(records: I) -> PerfReportScan
where
    I: IntoIterator<Item = &'a LogRecord>,
{
    let mut scan = PerfReportScan::default();

    for record in records {
        let Some(payload) = record.message.strip_prefix(PERF_REPORT_PREFIX) else {
            continue;
        };
        scan.candidates += 1;

        match serde_json::from_str::<PerfReport>(payload) {
            Ok(report) => scan.reports.push(report),
            Err(e) => {
                scan.dropped += 1;
                tracing::debug!(
                    cid = %record.cid,
                    error = %e,
                    "Dropping undecodable PerfReport payload"
                );
            }
        }
    }

    scan
}

/// Decode every embedded performance report.
pub fn extract_perf_reports<'a, I>(records: I) -> Vec<PerfReport>
where
    I: IntoIterator<Item = &'a LogRecord>,
{
    scan_perf_reports(records).reports
}

/// Intent names from `extracted user intents: a, b` messages.
///
/// One entry per detected intent, in order, duplicates kept.
pub fn extract_intents(records: &[LogRecord]) -> Vec<String> {
    records
        .iter()
        .filter_map(|r| INTENTS_PATTERN.captures(&r.message))
        .flat_map(|caps| {
            caps[1]
                .split(INTENT_SEPARATOR)
                .map(|intent| intent.trim().to_string())
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Occurrences of each code in `language code <code> detected` messages.
pub fn extract_languages(records: &[LogRecord]) -> Tally {
    records
        .iter()
        .filter_map(|r| LANGUAGE_PATTERN.captures(&r.message))
        .filter_map(|caps| caps.get(1))
        .map(|code| code.as_str())
        .collect()
}

/// Unique WARNING messages in first-seen order.
pub fn extract_warnings(records: &[LogRecord]) -> Vec<String> {
    unique_messages_at(records, level::WARNING)
}

/// Unique ERROR messages in first-seen order.
pub fn extract_errors(records: &[LogRecord]) -> Vec<String> {
    unique_messages_at(records, level::ERROR)
}

fn unique_messages_at(records: &[LogRecord], wanted: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    records
        .iter()
        .filter(|r| r.level == wanted)
        .filter(|r| seen.insert(r.message.as_str()))
        .map(|r| r.message.clone())
        .collect()
}

/// Records per level, in first-seen order.
pub fn count_by_level(records: &[LogRecord]) -> Tally {
    records.iter().map(|r| r.level.as_str()).collect()
}

/// Distinct user ids, excluding the sentinel and empty ids.
pub fn extract_unique_users(records: &[LogRecord]) -> BTreeSet<String> {
    records
        .iter()
        .filter(|r| r.has_user())
        .map(|r| r.user.clone())
        .collect()
}
