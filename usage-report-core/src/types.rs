//! Core record types for usage-report
//!
//! These types describe what the log producer writes: one JSON object per
//! log line ([`LogRecord`]), and a performance report embedded in some of
//! those lines' message text ([`PerfReport`]).
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Record** | One successfully decoded log line |
//! | **PerfReport** | Cost/latency telemetry for one user interaction |
//! | **Span** | A timed processing step inside a PerfReport |
//! | **Intent** | Detected purpose of an interaction, used for grouping |
//! | **Sentinel user** | `"-"`, written when no user is authenticated |
//!
//! All money and duration values are [`Decimal`]. Percentages are kept as
//! the display strings the producer emits (e.g. `"17.6%"`).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// User id written by the producer when no user is authenticated.
pub const NO_USER: &str = "-";

/// Well-known severity strings.
///
/// Levels are free-form text on the wire; these are only the values the
/// health computation looks for.
pub mod level {
    pub const DEBUG: &str = "DEBUG";
    pub const INFO: &str = "INFO";
    pub const WARNING: &str = "WARNING";
    pub const ERROR: &str = "ERROR";
}

// ============================================
// Log records
// ============================================

/// A single decoded log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Free-form message text (may carry an embedded payload)
    pub message: String,
    /// When the line was written
    #[serde(with = "timestamp_format")]
    pub timestamp: DateTime<Utc>,
    /// Severity (INFO, WARNING, ERROR, ...); not a closed set
    pub level: String,
    /// Emitting logger name
    pub logger: String,
    /// Client address of the originating request
    pub client_ip: String,
    /// Async task identifier, when the line came from a task
    #[serde(rename = "taskName", default)]
    pub task_name: Option<String>,
    /// Correlation id shared by all lines of one request
    pub cid: String,
    /// User identifier, [`NO_USER`] when unauthenticated
    pub user: String,
    /// Log schema version
    pub schema_version: String,
}

impl LogRecord {
    /// Whether this line belongs to an identified user.
    pub fn has_user(&self) -> bool {
        !self.user.is_empty() && self.user != NO_USER
    }
}

/// Serde adapter for log timestamps.
///
/// The producer writes `YYYY-MM-DD HH:MM:SS` without a zone. Naive values are
/// taken as UTC; RFC 3339 values are converted to UTC.
pub(crate) mod timestamp_format {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    const WIRE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
    const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

    pub fn parse(value: &str) -> Option<DateTime<Utc>> {
        let value = value.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
            return Some(dt.with_timezone(&Utc));
        }
        if let Ok(dt) = DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f%:z") {
            return Some(dt.with_timezone(&Utc));
        }
        NAIVE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
            .map(|naive| naive.and_utc())
    }

    pub fn serialize<S>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&ts.format(WIRE_FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", raw)))
    }
}

// ============================================
// Performance reports
// ============================================

/// A processing span within a [`PerfReport`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub name: String,
    pub duration_ms: Decimal,
    /// Standard error of the duration
    pub duration_se: Decimal,
    /// Share of the report's total duration, e.g. `"17.6%"`
    pub duration_percentage: String,
    /// Offset from the start of the interaction
    pub start_offset_ms: Decimal,
    /// Share of the report's tokens, e.g. `"0%"`
    pub token_percentage: String,

    // Only present on spans that called a model
    #[serde(default)]
    pub input_tokens_expended: Option<i64>,
    #[serde(default)]
    pub output_tokens_expended: Option<i64>,
    #[serde(default)]
    pub total_tokens_expended: Option<i64>,
    #[serde(default)]
    pub input_cost_usd: Option<Decimal>,
    #[serde(default)]
    pub output_cost_usd: Option<Decimal>,
    #[serde(default)]
    pub total_cost_usd: Option<Decimal>,
}

/// Token and cost totals for one intent within a [`PerfReport`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentTotals {
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub total_tokens: i64,
    pub cached_input_tokens: i64,
    pub audio_input_tokens: i64,
    pub audio_output_tokens: i64,
    pub input_cost_usd: Decimal,
    pub output_cost_usd: Decimal,
    pub cached_input_cost_usd: Decimal,
    pub audio_input_cost_usd: Decimal,
    pub audio_output_cost_usd: Decimal,
    pub total_cost_usd: Decimal,
    pub duration_percentage: String,
    pub token_percentage: String,
}

/// Performance report for a single user interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerfReport {
    pub user_id: String,
    pub trace_id: String,
    pub total_ms: Decimal,
    pub total_s: Decimal,

    // Token counts
    pub total_input_tokens: i64,
    pub total_output_tokens: i64,
    pub total_tokens: i64,
    pub total_cached_input_tokens: i64,
    pub total_audio_input_tokens: i64,
    pub total_audio_output_tokens: i64,

    // Costs (USD)
    pub total_input_cost_usd: Decimal,
    pub total_output_cost_usd: Decimal,
    pub total_cached_input_cost_usd: Decimal,
    pub total_audio_input_cost_usd: Decimal,
    pub total_audio_output_cost_usd: Decimal,
    pub total_cost_usd: Decimal,

    /// Per-intent totals in the order the producer wrote them
    pub grouped_totals_by_intent: IntentBreakdown,
    pub spans: Vec<Span>,
}

/// Per-intent totals of one report, kept in wire order.
///
/// The payload encodes this as a JSON object. Order matters for ranking
/// ties downstream, so it is decoded into a list rather than a hash map.
/// A repeated key replaces the earlier value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntentBreakdown(Vec<(String, IntentTotals)>);

impl IntentBreakdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the totals for `name`, keeping its first position.
    pub fn insert(&mut self, name: impl Into<String>, totals: IntentTotals) {
        let name = name.into();
        match self.0.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = totals,
            None => self.0.push((name, totals)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&IntentTotals> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, t)| t)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &IntentTotals)> {
        self.0.iter().map(|(n, t)| (n.as_str(), t))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, IntentTotals)> for IntentBreakdown {
    fn from_iter<I: IntoIterator<Item = (String, IntentTotals)>>(iter: I) -> Self {
        let mut breakdown = IntentBreakdown::new();
        for (name, totals) in iter {
            breakdown.insert(name, totals);
        }
        breakdown
    }
}

impl Serialize for IntentBreakdown {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, totals) in &self.0 {
            map.serialize_entry(name, totals)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for IntentBreakdown {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct BreakdownVisitor;

        impl<'de> serde::de::Visitor<'de> for BreakdownVisitor {
            type Value = IntentBreakdown;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a map of intent name to intent totals")
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: serde::de::MapAccess<'de>,
            {
                let mut breakdown = IntentBreakdown::new();
                while let Some((name, totals)) = map.next_entry::<String, IntentTotals>()? {
                    breakdown.insert(name, totals);
                }
                Ok(breakdown)
            }
        }

        deserializer.deserialize_map(BreakdownVisitor)
    }
}
