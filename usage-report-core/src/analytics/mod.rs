//! Analytics module for usage-report
//!
//! Reduces parsed log records and performance reports into [`ReportData`]:
//! - Executive summary (interactions, cost, mean latency, users)
//! - Cost breakdown by token category and by intent
//! - Response time percentiles and slowest spans
//! - Usage analytics (top intents, languages)
//! - System health (level counts, success rate, message samples)
//!
//! See [`aggregate`] for the individual computations and [`pipeline`] for
//! the parse, extract, aggregate sequence in a single call.

pub mod aggregate;
pub mod pipeline;
pub mod report;

pub use aggregate::{
    aggregate_metrics, aggregate_metrics_at, calculate_cost_breakdown, calculate_cost_by_intent,
    calculate_executive_summary, calculate_percentile, calculate_performance_metrics,
    calculate_system_health, calculate_usage_analytics, identify_bottleneck_spans,
    AggregateOptions,
};
pub use pipeline::{process_logs, process_logs_at, ProcessedReport};
pub use report::{
    CostBreakdown, ExecutiveSummary, IntentCostEntry, IntentCount, PerformanceMetrics,
    ReportData, SpanTiming, SystemHealth, UsageAnalytics,
};
