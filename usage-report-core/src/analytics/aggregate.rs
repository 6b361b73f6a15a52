//! Metrics aggregation: performance reports and log records into
//! [`ReportData`].
//!
//! Every function here is a pure reduction with an explicit result for empty
//! input. All money and duration arithmetic uses [`Decimal`].
//!
//! ## Ranking ties
//!
//! Rankings (cost by intent, slowest spans, top intents) use a stable sort
//! over accumulation order, so equal values keep the order in which their
//! key was first encountered.

use super::report::{
    CostBreakdown, ExecutiveSummary, IntentCostEntry, IntentCount, PerformanceMetrics,
    ReportData, SpanTiming, SystemHealth, UsageAnalytics,
};
use crate::ingest::telemetry::{
    count_by_level, extract_errors, extract_intents, extract_languages, extract_unique_users,
    extract_warnings,
};
use crate::period::DateRange;
use crate::tally::Tally;
use crate::types::{level, LogRecord, PerfReport};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Size limits for the ranked and sampled sections of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregateOptions {
    /// Entries in the top intents list
    pub top_intents: usize,
    /// Entries in the slowest spans list
    pub slowest_spans: usize,
    /// Unique warning and error messages kept as samples
    pub message_samples: usize,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            top_intents: 10,
            slowest_spans: 5,
            message_samples: 10,
        }
    }
}

/// Aggregate everything into a report stamped with the current time.
pub fn aggregate_metrics(
    perf_reports: &[PerfReport],
    log_records: &[LogRecord],
    range: DateRange,
) -> ReportData {
    aggregate_metrics_at(
        perf_reports,
        log_records,
        range,
        Utc::now(),
        &AggregateOptions::default(),
    )
}

/// Aggregate everything into a report with an explicit generation time.
///
/// Same inputs always produce the same report.
pub fn aggregate_metrics_at(
    perf_reports: &[PerfReport],
    log_records: &[LogRecord],
    range: DateRange,
    generated_at: DateTime<Utc>,
    options: &AggregateOptions,
) -> ReportData {
    ReportData {
        generated_at,
        executive_summary: calculate_executive_summary(perf_reports, log_records, range),
        cost_breakdown: calculate_cost_breakdown(perf_reports),
        cost_by_intent: calculate_cost_by_intent(perf_reports),
        performance: calculate_performance_metrics(perf_reports, options.slowest_spans),
        usage: calculate_usage_analytics(log_records, options.top_intents),
        system_health: calculate_system_health(log_records, options.message_samples),
    }
}

fn sum_by<F>(perf_reports: &[PerfReport], field: F) -> Decimal
where
    F: Fn(&PerfReport) -> Decimal,
{
    perf_reports.iter().map(field).sum()
}

/// Mean of a decimal total over `count` items; zero when there are none.
fn mean(total: Decimal, count: usize) -> Decimal {
    if count == 0 {
        Decimal::ZERO
    } else {
        total / Decimal::from(count)
    }
}

pub fn calculate_executive_summary(
    perf_reports: &[PerfReport],
    log_records: &[LogRecord],
    range: DateRange,
) -> ExecutiveSummary {
    let total_time = sum_by(perf_reports, |r| r.total_ms);

    ExecutiveSummary {
        date_range_start: range.start,
        date_range_end: range.end,
        total_interactions: perf_reports.len(),
        total_cost_usd: sum_by(perf_reports, |r| r.total_cost_usd),
        avg_response_time_ms: mean(total_time, perf_reports.len()),
        unique_users: extract_unique_users(log_records).len(),
    }
}

pub fn calculate_cost_breakdown(perf_reports: &[PerfReport]) -> CostBreakdown {
    let audio_in = sum_by(perf_reports, |r| r.total_audio_input_cost_usd);
    let audio_out = sum_by(perf_reports, |r| r.total_audio_output_cost_usd);

    CostBreakdown {
        total_input_cost_usd: sum_by(perf_reports, |r| r.total_input_cost_usd),
        total_output_cost_usd: sum_by(perf_reports, |r| r.total_output_cost_usd),
        total_cached_cost_usd: sum_by(perf_reports, |r| r.total_cached_input_cost_usd),
        total_audio_cost_usd: audio_in + audio_out,
        total_cost_usd: sum_by(perf_reports, |r| r.total_cost_usd),
    }
}

/// Cost per intent, highest total first.
///
/// A report counts once for every intent in its breakdown.
pub fn calculate_cost_by_intent(perf_reports: &[PerfReport]) -> Vec<IntentCostEntry> {
    // (name, total cost, count) in first-encountered order
    let mut accumulated: Vec<(String, Decimal, usize)> = Vec::new();
    let mut slots: HashMap<String, usize> = HashMap::new();

    for report in perf_reports {
        for (intent_name, totals) in report.grouped_totals_by_intent.iter() {
            match slots.get(intent_name) {
                Some(&slot) => {
                    accumulated[slot].1 += totals.total_cost_usd;
                    accumulated[slot].2 += 1;
                }
                None => {
                    slots.insert(intent_name.to_string(), accumulated.len());
                    accumulated.push((intent_name.to_string(), totals.total_cost_usd, 1));
                }
            }
        }
    }

    let mut entries: Vec<IntentCostEntry> = accumulated
        .into_iter()
        .map(|(intent_name, total_cost, count)| IntentCostEntry {
            intent_name,
            total_cost_usd: total_cost,
            interaction_count: count,
            avg_cost_per_interaction: mean(total_cost, count),
        })
        .collect();

    entries.sort_by(|a, b| b.total_cost_usd.cmp(&a.total_cost_usd));
    entries
}

/// Response time statistics plus the `top_spans` slowest span names.
pub fn calculate_performance_metrics(
    perf_reports: &[PerfReport],
    top_spans: usize,
) -> PerformanceMetrics {
    if perf_reports.is_empty() {
        return PerformanceMetrics::empty();
    }

    let mut response_times: Vec<Decimal> = perf_reports.iter().map(|r| r.total_ms).collect();
    let avg = mean(response_times.iter().copied().sum(), response_times.len());
    response_times.sort();

    PerformanceMetrics {
        avg_response_time_ms: avg,
        p50_response_time_ms: calculate_percentile(&response_times, 50),
        p95_response_time_ms: calculate_percentile(&response_times, 95),
        p99_response_time_ms: calculate_percentile(&response_times, 99),
        slowest_spans: identify_bottleneck_spans(perf_reports, top_spans),
    }
}

/// Nearest-rank percentile of ascending `sorted` values.
///
/// Picks the value at index `(n - 1) * percentile / 100` (integer division),
/// never interpolating. Empty input yields zero; percentiles above 100 are
/// treated as 100.
pub fn calculate_percentile(sorted: &[Decimal], percentile: u32) -> Decimal {
    if sorted.is_empty() {
        return Decimal::ZERO;
    }
    let percentile = percentile.min(100) as usize;
    let index = (sorted.len() - 1) * percentile / 100;
    sorted[index]
}

/// Span names with the highest average duration, slowest first.
pub fn identify_bottleneck_spans(perf_reports: &[PerfReport], top_n: usize) -> Vec<SpanTiming> {
    // (name, total duration, count) in first-encountered order
    let mut accumulated: Vec<(String, Decimal, usize)> = Vec::new();
    let mut slots: HashMap<&str, usize> = HashMap::new();

    for span in perf_reports.iter().flat_map(|r| r.spans.iter()) {
        match slots.get(span.name.as_str()) {
            Some(&slot) => {
                accumulated[slot].1 += span.duration_ms;
                accumulated[slot].2 += 1;
            }
            None => {
                slots.insert(span.name.as_str(), accumulated.len());
                accumulated.push((span.name.clone(), span.duration_ms, 1));
            }
        }
    }

    let mut timings: Vec<SpanTiming> = accumulated
        .into_iter()
        .map(|(name, total, count)| SpanTiming {
            name,
            avg_duration_ms: mean(total, count),
        })
        .collect();

    timings.sort_by(|a, b| b.avg_duration_ms.cmp(&a.avg_duration_ms));
    timings.truncate(top_n);
    timings
}

pub fn calculate_usage_analytics(log_records: &[LogRecord], top_n: usize) -> UsageAnalytics {
    let intents = extract_intents(log_records);
    let frequency: Tally = intents.iter().map(String::as_str).collect();

    UsageAnalytics {
        unique_users: extract_unique_users(log_records).len(),
        top_intents: frequency
            .most_common(top_n)
            .into_iter()
            .map(|(intent, count)| IntentCount { intent, count })
            .collect(),
        language_distribution: extract_languages(log_records),
    }
}

/// Level tallies and message samples over all parsed lines.
///
/// The success rate is the share of non-ERROR lines, rounded half-even to
/// two places, and exactly 100.00 when there are no lines.
pub fn calculate_system_health(log_records: &[LogRecord], message_samples: usize) -> SystemHealth {
    let levels = count_by_level(log_records);
    let total_requests = levels.total();
    let warning_count = levels.get(level::WARNING);
    let error_count = levels.get(level::ERROR);

    let mut success_rate = if total_requests == 0 {
        Decimal::ONE_HUNDRED
    } else {
        Decimal::from(total_requests - error_count) / Decimal::from(total_requests)
            * Decimal::ONE_HUNDRED
    };
    success_rate = success_rate.round_dp(2);
    success_rate.rescale(2);

    let mut warning_messages = extract_warnings(log_records);
    warning_messages.truncate(message_samples);
    let mut error_messages = extract_errors(log_records);
    error_messages.truncate(message_samples);

    SystemHealth {
        total_requests,
        warning_count,
        error_count,
        success_rate_percent: success_rate,
        warning_messages,
        error_messages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{IntentBreakdown, IntentTotals, Span};
    use chrono::TimeZone;

    fn d(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    fn range() -> DateRange {
        DateRange::new(
            "2025-12-09".parse().unwrap(),
            "2025-12-09".parse().unwrap(),
        )
        .unwrap()
    }

    fn span(name: &str, duration_ms: &str) -> Span {
        Span {
            name: name.to_string(),
            duration_ms: d(duration_ms),
            duration_se: Decimal::ZERO,
            duration_percentage: "0%".to_string(),
            start_offset_ms: Decimal::ZERO,
            token_percentage: "0%".to_string(),
            input_tokens_expended: None,
            output_tokens_expended: None,
            total_tokens_expended: None,
            input_cost_usd: None,
            output_cost_usd: None,
            total_cost_usd: None,
        }
    }

    fn intent_totals(total_cost: &str) -> IntentTotals {
        IntentTotals {
            input_tokens: 500,
            output_tokens: 50,
            total_tokens: 550,
            cached_input_tokens: 0,
            audio_input_tokens: 0,
            audio_output_tokens: 0,
            input_cost_usd: Decimal::ZERO,
            output_cost_usd: Decimal::ZERO,
            cached_input_cost_usd: Decimal::ZERO,
            audio_input_cost_usd: Decimal::ZERO,
            audio_output_cost_usd: Decimal::ZERO,
            total_cost_usd: d(total_cost),
            duration_percentage: "50%".to_string(),
            token_percentage: "50%".to_string(),
        }
    }

    fn report(total_ms: &str, total_cost: &str) -> PerfReport {
        PerfReport {
            user_id: "user1".to_string(),
            trace_id: "trace1".to_string(),
            total_ms: d(total_ms),
            total_s: d(total_ms) / Decimal::ONE_THOUSAND,
            total_input_tokens: 1000,
            total_output_tokens: 100,
            total_tokens: 1100,
            total_cached_input_tokens: 50,
            total_audio_input_tokens: 0,
            total_audio_output_tokens: 0,
            total_input_cost_usd: d("0.01"),
            total_output_cost_usd: d("0.001"),
            total_cached_input_cost_usd: d("0.0001"),
            total_audio_input_cost_usd: d("0.0002"),
            total_audio_output_cost_usd: d("0.0003"),
            total_cost_usd: d(total_cost),
            grouped_totals_by_intent: IntentBreakdown::new(),
            spans: Vec::new(),
        }
    }

    fn with_intents(mut report: PerfReport, intents: &[(&str, &str)]) -> PerfReport {
        report.grouped_totals_by_intent = intents
            .iter()
            .map(|(name, cost)| (name.to_string(), intent_totals(cost)))
            .collect();
        report
    }

    fn with_spans(mut report: PerfReport, spans: &[(&str, &str)]) -> PerfReport {
        report.spans = spans.iter().map(|(n, ms)| span(n, ms)).collect();
        report
    }

    fn record(message: &str, level: &str, user: &str) -> LogRecord {
        LogRecord {
            message: message.to_string(),
            timestamp: Utc.with_ymd_and_hms(2025, 12, 9, 22, 30, 0).unwrap(),
            level: level.to_string(),
            logger: "test".to_string(),
            client_ip: "127.0.0.1".to_string(),
            task_name: None,
            cid: "cid1".to_string(),
            user: user.to_string(),
            schema_version: "1.0.0".to_string(),
        }
    }

    fn sample_records() -> Vec<LogRecord> {
        vec![
            record("extracted user intents: test-intent", "INFO", "user1"),
            record("language code en detected by gpt-4o.", "INFO", "user1"),
            record("Warning: something happened", "WARNING", "user1"),
        ]
    }

    // ============================================
    // Percentiles
    // ============================================

    #[test]
    fn test_percentile_one_to_hundred() {
        let values: Vec<Decimal> = (1..=100).map(Decimal::from).collect();
        assert_eq!(calculate_percentile(&values, 50), Decimal::from(50));
        assert_eq!(calculate_percentile(&values, 95), Decimal::from(95));
        assert_eq!(calculate_percentile(&values, 99), Decimal::from(99));
        assert_eq!(calculate_percentile(&values, 0), Decimal::from(1));
        assert_eq!(calculate_percentile(&values, 100), Decimal::from(100));
    }

    #[test]
    fn test_percentile_floor_rank() {
        // (4 - 1) * 50 / 100 = 1
        let values = vec![d("10"), d("20"), d("30"), d("40")];
        assert_eq!(calculate_percentile(&values, 50), d("20"));
        // (4 - 1) * 99 / 100 = 2
        assert_eq!(calculate_percentile(&values, 99), d("30"));
    }

    #[test]
    fn test_percentile_edge_cases() {
        assert_eq!(calculate_percentile(&[], 50), Decimal::ZERO);
        assert_eq!(calculate_percentile(&[d("100")], 50), d("100"));
        assert_eq!(calculate_percentile(&[d("1"), d("2")], 250), d("2"));
    }

    // ============================================
    // Executive summary and cost
    // ============================================

    #[test]
    fn test_executive_summary() {
        let reports = vec![report("10000", "0.0111"), report("20000", "0.0222")];
        let summary = calculate_executive_summary(&reports, &sample_records(), range());

        assert_eq!(summary.total_interactions, 2);
        assert_eq!(summary.total_cost_usd, d("0.0333"));
        assert_eq!(summary.avg_response_time_ms, d("15000"));
        assert_eq!(summary.unique_users, 1);
        assert_eq!(summary.date_range_start, range().start);
    }

    #[test]
    fn test_executive_summary_empty() {
        let summary = calculate_executive_summary(&[], &[], range());
        assert_eq!(summary.total_interactions, 0);
        assert_eq!(summary.total_cost_usd, Decimal::ZERO);
        assert_eq!(summary.avg_response_time_ms, Decimal::ZERO);
        assert_eq!(summary.unique_users, 0);
    }

    #[test]
    fn test_cost_breakdown_combines_audio() {
        let reports = vec![report("10000", "0.0111"), report("10000", "0.0111")];
        let breakdown = calculate_cost_breakdown(&reports);

        assert_eq!(breakdown.total_input_cost_usd, d("0.02"));
        assert_eq!(breakdown.total_output_cost_usd, d("0.002"));
        assert_eq!(breakdown.total_cached_cost_usd, d("0.0002"));
        assert_eq!(breakdown.total_audio_cost_usd, d("0.0010"));
        assert_eq!(breakdown.total_cost_usd, d("0.0222"));
    }

    #[test]
    fn test_decimal_sums_do_not_drift() {
        let reports: Vec<PerfReport> = (0..10).map(|_| report("1", "0.1")).collect();
        let breakdown = calculate_cost_breakdown(&reports);
        assert_eq!(breakdown.total_cost_usd.to_string(), "1.0");
    }

    #[test]
    fn test_cost_by_intent_accumulates() {
        let reports = vec![
            with_intents(report("10000", "0.0111"), &[("test-intent", "0.0055")]),
            with_intents(report("10000", "0.0111"), &[("test-intent", "0.0045")]),
        ];
        let entries = calculate_cost_by_intent(&reports);

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].intent_name, "test-intent");
        assert_eq!(entries[0].total_cost_usd, d("0.0100"));
        assert_eq!(entries[0].interaction_count, 2);
        assert_eq!(entries[0].avg_cost_per_interaction, d("0.0050"));
    }

    #[test]
    fn test_cost_by_intent_sorted_descending_with_stable_ties() {
        let reports = vec![
            with_intents(
                report("1", "0"),
                &[("cheap", "0.001"), ("tie-first", "0.005"), ("pricey", "0.009")],
            ),
            with_intents(report("1", "0"), &[("tie-second", "0.005")]),
        ];
        let names: Vec<String> = calculate_cost_by_intent(&reports)
            .into_iter()
            .map(|e| e.intent_name)
            .collect();
        assert_eq!(names, vec!["pricey", "tie-first", "tie-second", "cheap"]);
    }

    #[test]
    fn test_cost_by_intent_empty() {
        assert!(calculate_cost_by_intent(&[]).is_empty());
        assert!(calculate_cost_by_intent(&[report("1", "0")]).is_empty());
    }

    // ============================================
    // Performance
    // ============================================

    #[test]
    fn test_performance_metrics() {
        let reports = vec![
            with_spans(report("30000", "0"), &[("process_message", "9000")]),
            with_spans(report("10000", "0"), &[("process_message", "11000")]),
            report("20000", "0"),
        ];
        let metrics = calculate_performance_metrics(&reports, 5);

        assert_eq!(metrics.avg_response_time_ms, d("20000"));
        assert_eq!(metrics.p50_response_time_ms, d("20000"));
        assert_eq!(metrics.p95_response_time_ms, d("20000"));
        assert_eq!(metrics.p99_response_time_ms, d("20000"));
        assert_eq!(metrics.slowest_spans.len(), 1);
        assert_eq!(metrics.slowest_spans[0].avg_duration_ms, d("10000"));
    }

    #[test]
    fn test_performance_metrics_empty() {
        let metrics = calculate_performance_metrics(&[], 5);
        assert_eq!(metrics, PerformanceMetrics::empty());
    }

    #[test]
    fn test_bottleneck_spans_average_and_rank() {
        let reports = vec![
            with_spans(
                report("10000", "0"),
                &[("process_message", "9000"), ("send_response", "1000")],
            ),
            with_spans(
                report("12000", "0"),
                &[("process_message", "11000"), ("send_response", "1000")],
            ),
        ];
        let spans = identify_bottleneck_spans(&reports, 5);

        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].name, "process_message");
        assert_eq!(spans[0].avg_duration_ms, d("10000"));
        assert_eq!(spans[1].name, "send_response");
        assert_eq!(spans[1].avg_duration_ms, d("1000"));
    }

    #[test]
    fn test_bottleneck_spans_top_n_and_ties() {
        let reports = vec![with_spans(
            report("1", "0"),
            &[
                ("a", "5"),
                ("b", "7"),
                ("c", "5"),
                ("d", "1"),
                ("e", "2"),
                ("f", "3"),
            ],
        )];
        let names: Vec<String> = identify_bottleneck_spans(&reports, 5)
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["b", "a", "c", "f", "e"]);
    }

    // ============================================
    // Usage and health
    // ============================================

    #[test]
    fn test_usage_analytics() {
        let records = vec![
            record("extracted user intents: summarize, translate", "INFO", "u1"),
            record("extracted user intents: translate", "INFO", "u2"),
            record("extracted user intents: summarize", "INFO", "-"),
            record("extracted user intents: chat", "INFO", "u1"),
            record("language code en detected by gpt-4o.", "INFO", "u1"),
            record("language code fr detected by gpt-4o.", "INFO", "u2"),
            record("language code en detected by gpt-4o.", "INFO", "u2"),
        ];
        let usage = calculate_usage_analytics(&records, 10);

        assert_eq!(usage.unique_users, 2);
        assert_eq!(
            usage.top_intents,
            vec![
                IntentCount {
                    intent: "summarize".to_string(),
                    count: 2
                },
                IntentCount {
                    intent: "translate".to_string(),
                    count: 2
                },
                IntentCount {
                    intent: "chat".to_string(),
                    count: 1
                },
            ]
        );
        assert_eq!(usage.language_distribution.get("en"), 2);
        assert_eq!(usage.language_distribution.get("fr"), 1);
    }

    #[test]
    fn test_usage_analytics_caps_top_intents() {
        let records: Vec<LogRecord> = (0..15)
            .map(|i| record(&format!("extracted user intents: intent-{}", i), "INFO", "u"))
            .collect();
        let usage = calculate_usage_analytics(&records, 10);
        assert_eq!(usage.top_intents.len(), 10);
        assert_eq!(usage.top_intents[0].intent, "intent-0");
    }

    #[test]
    fn test_system_health_empty() {
        let health = calculate_system_health(&[], 10);
        assert_eq!(health.total_requests, 0);
        assert_eq!(health.warning_count, 0);
        assert_eq!(health.error_count, 0);
        assert_eq!(health.success_rate_percent.to_string(), "100.00");
        assert!(health.warning_messages.is_empty());
    }

    #[test]
    fn test_system_health_counts() {
        let health = calculate_system_health(&sample_records(), 10);
        assert_eq!(health.total_requests, 3);
        assert_eq!(health.warning_count, 1);
        assert_eq!(health.error_count, 0);
        assert_eq!(health.success_rate_percent.to_string(), "100.00");
        assert_eq!(health.warning_messages, vec!["Warning: something happened"]);
    }

    #[test]
    fn test_system_health_rounds_success_rate() {
        let records = vec![
            record("ok", "INFO", "u"),
            record("ok", "INFO", "u"),
            record("bad", "ERROR", "u"),
        ];
        let health = calculate_system_health(&records, 10);
        assert_eq!(health.error_count, 1);
        assert_eq!(health.success_rate_percent.to_string(), "66.67");
        assert_eq!(health.error_messages, vec!["bad"]);
    }

    #[test]
    fn test_system_health_caps_samples() {
        let mut records: Vec<LogRecord> = (0..12)
            .map(|i| record(&format!("warning {}", i), "WARNING", "u"))
            .collect();
        records.extend((0..12).map(|i| record(&format!("error {}", i), "ERROR", "u")));

        let health = calculate_system_health(&records, 10);
        assert_eq!(health.warning_count, 12);
        assert_eq!(health.error_count, 12);
        assert_eq!(health.warning_messages.len(), 10);
        assert_eq!(health.error_messages.len(), 10);
        assert_eq!(health.warning_messages[0], "warning 0");
    }

    // ============================================
    // Full aggregation
    // ============================================

    #[test]
    fn test_aggregate_is_deterministic() {
        let reports = vec![
            with_spans(
                with_intents(report("10000", "0.0111"), &[("test-intent", "0.0055")]),
                &[("process_message", "9000")],
            ),
            report("12000", "0.0100"),
        ];
        let records = sample_records();
        let at = Utc.with_ymd_and_hms(2025, 12, 10, 6, 0, 0).unwrap();
        let options = AggregateOptions::default();

        let first = aggregate_metrics_at(&reports, &records, range(), at, &options);
        let second = aggregate_metrics_at(&reports, &records, range(), at, &options);
        assert_eq!(first, second);
        assert!(first.has_interactions());
    }

    #[test]
    fn test_aggregate_empty_inputs() {
        let data = aggregate_metrics(&[], &[], range());
        assert!(!data.has_interactions());
        assert!(data.cost_by_intent.is_empty());
        assert!(data.performance.slowest_spans.is_empty());
        assert!(data.usage.top_intents.is_empty());
        assert_eq!(data.system_health.success_rate_percent, Decimal::ONE_HUNDRED);
    }
}
