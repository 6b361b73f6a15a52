//! Report data: the final aggregate handed to renderers.
//!
//! Built once per aggregation and never mutated afterwards.

use crate::tally::Tally;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

/// Complete aggregated report data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportData {
    pub generated_at: DateTime<Utc>,
    pub executive_summary: ExecutiveSummary,
    pub cost_breakdown: CostBreakdown,
    /// Ranked by total cost, highest first
    pub cost_by_intent: Vec<IntentCostEntry>,
    pub performance: PerformanceMetrics,
    pub usage: UsageAnalytics,
    pub system_health: SystemHealth,
}

impl ReportData {
    /// Whether the period had any interactions at all.
    pub fn has_interactions(&self) -> bool {
        self.executive_summary.total_interactions > 0
    }
}

/// Headline numbers for the period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutiveSummary {
    pub date_range_start: NaiveDate,
    pub date_range_end: NaiveDate,
    /// Number of performance reports (not log lines)
    pub total_interactions: usize,
    pub total_cost_usd: Decimal,
    pub avg_response_time_ms: Decimal,
    /// Distinct users seen in the log lines
    pub unique_users: usize,
}

/// Cost by token category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostBreakdown {
    pub total_input_cost_usd: Decimal,
    pub total_output_cost_usd: Decimal,
    pub total_cached_cost_usd: Decimal,
    /// Audio input and audio output combined
    pub total_audio_cost_usd: Decimal,
    pub total_cost_usd: Decimal,
}

/// Cost accumulated for one intent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntentCostEntry {
    pub intent_name: String,
    pub total_cost_usd: Decimal,
    /// Reports that carried this intent
    pub interaction_count: usize,
    pub avg_cost_per_interaction: Decimal,
}

/// Average duration of all spans sharing a name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpanTiming {
    pub name: String,
    pub avg_duration_ms: Decimal,
}

/// Response time statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceMetrics {
    pub avg_response_time_ms: Decimal,
    pub p50_response_time_ms: Decimal,
    pub p95_response_time_ms: Decimal,
    pub p99_response_time_ms: Decimal,
    /// Slowest span names by average duration
    pub slowest_spans: Vec<SpanTiming>,
}

impl PerformanceMetrics {
    pub fn empty() -> Self {
        Self {
            avg_response_time_ms: Decimal::ZERO,
            p50_response_time_ms: Decimal::ZERO,
            p95_response_time_ms: Decimal::ZERO,
            p99_response_time_ms: Decimal::ZERO,
            slowest_spans: Vec::new(),
        }
    }
}

/// How often an intent was detected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntentCount {
    pub intent: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageAnalytics {
    pub unique_users: usize,
    /// Most frequent intents, highest first
    pub top_intents: Vec<IntentCount>,
    /// Detections per language code, in first-seen order
    pub language_distribution: Tally,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemHealth {
    /// Parsed log lines of any level
    pub total_requests: usize,
    pub warning_count: usize,
    pub error_count: usize,
    /// Non-error share of lines, two decimal places
    pub success_rate_percent: Decimal,
    /// Sample of unique warning messages
    pub warning_messages: Vec<String>,
    /// Sample of unique error messages
    pub error_messages: Vec<String>,
}
