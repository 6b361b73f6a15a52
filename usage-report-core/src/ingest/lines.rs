//! Line parser: raw newline-delimited JSON text into [`LogRecord`]s.
//!
//! Parsing is best-effort. A line that is not valid JSON, or that lacks a
//! required field, is dropped and counted in [`ParseStats`]; it never stops
//! the rest of the batch. Blank lines are skipped without being counted as
//! drops.

use crate::types::LogRecord;
use std::str::Lines;

/// Counters describing one pass over the input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseStats {
    /// Lines read, including blank ones
    pub lines: usize,
    /// Blank or whitespace-only lines
    pub blank: usize,
    /// Non-blank lines that failed to decode or validate
    pub dropped: usize,
}

impl ParseStats {
    /// Number of records produced so far.
    pub fn parsed(&self) -> usize {
        self.lines - self.blank - self.dropped
    }
}

/// Lazy, single-pass iterator over the records in a block of log text.
///
/// Records are yielded in input order. To restart, create a new iterator.
pub struct LogLines<'a> {
    lines: Lines<'a>,
    stats: ParseStats,
}

impl<'a> LogLines<'a> {
    pub fn new(content: &'a str) -> Self {
        Self {
            lines: content.lines(),
            stats: ParseStats::default(),
        }
    }

    /// Counters for the lines consumed so far.
    pub fn stats(&self) -> ParseStats {
        self.stats
    }
}

impl<'a> Iterator for LogLines<'a> {
    type Item = LogRecord;

    fn next(&mut self) -> Option<LogRecord> {
        for raw_line in self.lines.by_ref() {
            self.stats.lines += 1;

            let line = raw_line.trim();
            if line.is_empty() {
                self.stats.blank += 1;
                continue;
            }

            match serde_json::from_str::<LogRecord>(line) {
                Ok(record) => return Some(record),
                Err(e) => {
                    self.stats.dropped += 1;
                    tracing::debug!(
                        line = self.stats.lines,
                        error = %e,
                        "Dropping malformed log line"
                    );
                }
            }
        }
        None
    }
}

/// Parse newline-delimited log text lazily.
pub fn parse_log_lines(content: &str) -> LogLines<'_> {
    LogLines::new(content)
}

/// Parse all records and return them together with the drop counters.
pub fn parse_all(content: &str) -> (Vec<LogRecord>, ParseStats) {
    let mut lines = LogLines::new(content);
    let records: Vec<LogRecord> = lines.by_ref().collect();
    (records, lines.stats())
}
