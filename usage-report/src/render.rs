//! Report renderers: terminal, Markdown and JSON.

use anyhow::Result;
use std::fmt::Write;
use usage_report_core::format::{format_count, format_duration_ms, format_percent, format_usd};
use usage_report_core::ReportData;

/// Supported `--export` formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Markdown,
    Json,
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "md" | "markdown" => Ok(ExportFormat::Markdown),
            "json" => Ok(ExportFormat::Json),
            other => Err(format!("Unknown export format: {}. Use 'md' or 'json'", other)),
        }
    }
}

pub fn render(data: &ReportData, format: Option<ExportFormat>) -> Result<String> {
    match format {
        Some(ExportFormat::Json) => render_json(data),
        Some(ExportFormat::Markdown) => Ok(render_markdown(data)),
        None => Ok(render_terminal(data)),
    }
}

pub fn render_terminal(data: &ReportData) -> String {
    let summary = &data.executive_summary;
    let title = format!(
        "Usage Report: {} to {}",
        summary.date_range_start, summary.date_range_end
    );
    let mut out = String::new();

    // Header
    let _ = writeln!(out);
    let _ = writeln!(out, "+{}+", "-".repeat(60));
    let _ = writeln!(out, "|{:^60}|", title);
    let _ = writeln!(out, "+{}+", "-".repeat(60));
    let _ = writeln!(out);

    if !data.has_interactions() && data.system_health.total_requests == 0 {
        let _ = writeln!(out, "  No activity found for this period.");
        let _ = writeln!(out);
        return out;
    }

    let _ = writeln!(out, "SUMMARY");
    let _ = writeln!(
        out,
        "   Interactions: {:<12} Users: {}",
        format_count(summary.total_interactions),
        summary.unique_users
    );
    let _ = writeln!(
        out,
        "   Total cost:   {:<12} Avg response: {}",
        format_usd(summary.total_cost_usd),
        format_duration_ms(summary.avg_response_time_ms)
    );
    let _ = writeln!(out);

    let costs = &data.cost_breakdown;
    let _ = writeln!(out, "COST BREAKDOWN");
    let _ = writeln!(out, "   Input:  {:<12} Output: {}", format_usd(costs.total_input_cost_usd), format_usd(costs.total_output_cost_usd));
    let _ = writeln!(out, "   Cached: {:<12} Audio:  {}", format_usd(costs.total_cached_cost_usd), format_usd(costs.total_audio_cost_usd));
    let _ = writeln!(out);

    if !data.cost_by_intent.is_empty() {
        let _ = writeln!(out, "COST BY INTENT");
        for (i, entry) in data.cost_by_intent.iter().enumerate() {
            let _ = writeln!(
                out,
                "   {:>2}. {:<32} {:>10}  x{:<5} avg {}",
                i + 1,
                entry.intent_name,
                format_usd(entry.total_cost_usd),
                entry.interaction_count,
                format_usd(entry.avg_cost_per_interaction)
            );
        }
        let _ = writeln!(out);
    }

    let perf = &data.performance;
    let _ = writeln!(out, "PERFORMANCE");
    let _ = writeln!(
        out,
        "   p50: {}  |  p95: {}  |  p99: {}",
        format_duration_ms(perf.p50_response_time_ms),
        format_duration_ms(perf.p95_response_time_ms),
        format_duration_ms(perf.p99_response_time_ms)
    );
    for span in &perf.slowest_spans {
        let _ = writeln!(
            out,
            "   {:<36} {}",
            span.name,
            format_duration_ms(span.avg_duration_ms)
        );
    }
    let _ = writeln!(out);

    let usage = &data.usage;
    if !usage.top_intents.is_empty() {
        let _ = writeln!(out, "TOP INTENTS");
        for (i, intent) in usage.top_intents.iter().enumerate() {
            let _ = writeln!(out, "   {:>2}. {:<36} {:>6}", i + 1, intent.intent, intent.count);
        }
        let _ = writeln!(out);
    }
    if !usage.language_distribution.is_empty() {
        let languages: Vec<String> = usage
            .language_distribution
            .iter()
            .map(|(code, count)| format!("{} {}", code, count))
            .collect();
        let _ = writeln!(out, "LANGUAGES");
        let _ = writeln!(out, "   {}", languages.join("  |  "));
        let _ = writeln!(out);
    }

    let health = &data.system_health;
    let _ = writeln!(out, "SYSTEM HEALTH");
    let _ = writeln!(
        out,
        "   Requests: {:<10} Warnings: {:<8} Errors: {:<8} Success: {}",
        health.total_requests,
        health.warning_count,
        health.error_count,
        format_percent(health.success_rate_percent)
    );
    for message in &health.error_messages {
        let _ = writeln!(out, "   [error]   {}", message);
    }
    for message in &health.warning_messages {
        let _ = writeln!(out, "   [warning] {}", message);
    }
    let _ = writeln!(out);

    out
}

pub fn render_markdown(data: &ReportData) -> String {
    let summary = &data.executive_summary;
    let mut out = String::new();

    let _ = writeln!(
        out,
        "# Usage Report: {} to {}",
        summary.date_range_start, summary.date_range_end
    );
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "*Generated {}*",
        data.generated_at.format("%Y-%m-%d %H:%M UTC")
    );
    let _ = writeln!(out);

    // Summary table
    let _ = writeln!(out, "## Executive Summary");
    let _ = writeln!(out);
    let _ = writeln!(out, "| Metric | Value |");
    let _ = writeln!(out, "|--------|-------|");
    let _ = writeln!(out, "| Interactions | {} |", summary.total_interactions);
    let _ = writeln!(out, "| Total Cost | {} |", format_usd(summary.total_cost_usd));
    let _ = writeln!(
        out,
        "| Avg Response | {} |",
        format_duration_ms(summary.avg_response_time_ms)
    );
    let _ = writeln!(out, "| Unique Users | {} |", summary.unique_users);
    let _ = writeln!(out);

    let costs = &data.cost_breakdown;
    let _ = writeln!(out, "## Cost Breakdown");
    let _ = writeln!(out);
    let _ = writeln!(out, "| Category | Cost |");
    let _ = writeln!(out, "|----------|------|");
    let _ = writeln!(out, "| Input | {} |", format_usd(costs.total_input_cost_usd));
    let _ = writeln!(out, "| Output | {} |", format_usd(costs.total_output_cost_usd));
    let _ = writeln!(out, "| Cached | {} |", format_usd(costs.total_cached_cost_usd));
    let _ = writeln!(out, "| Audio | {} |", format_usd(costs.total_audio_cost_usd));
    let _ = writeln!(out, "| **Total** | **{}** |", format_usd(costs.total_cost_usd));
    let _ = writeln!(out);

    if !data.cost_by_intent.is_empty() {
        let _ = writeln!(out, "## Cost by Intent");
        let _ = writeln!(out);
        let _ = writeln!(out, "| Intent | Total | Count | Avg |");
        let _ = writeln!(out, "|--------|-------|-------|-----|");
        for entry in &data.cost_by_intent {
            let _ = writeln!(
                out,
                "| {} | {} | {} | {} |",
                entry.intent_name,
                format_usd(entry.total_cost_usd),
                entry.interaction_count,
                format_usd(entry.avg_cost_per_interaction)
            );
        }
        let _ = writeln!(out);
    }

    let perf = &data.performance;
    let _ = writeln!(out, "## Performance");
    let _ = writeln!(out);
    let _ = writeln!(out, "- **Average:** {}", format_duration_ms(perf.avg_response_time_ms));
    let _ = writeln!(out, "- **p50:** {}", format_duration_ms(perf.p50_response_time_ms));
    let _ = writeln!(out, "- **p95:** {}", format_duration_ms(perf.p95_response_time_ms));
    let _ = writeln!(out, "- **p99:** {}", format_duration_ms(perf.p99_response_time_ms));
    let _ = writeln!(out);
    if !perf.slowest_spans.is_empty() {
        let _ = writeln!(out, "### Slowest Spans");
        let _ = writeln!(out);
        for (i, span) in perf.slowest_spans.iter().enumerate() {
            let _ = writeln!(
                out,
                "{}. **{}** - {}",
                i + 1,
                span.name,
                format_duration_ms(span.avg_duration_ms)
            );
        }
        let _ = writeln!(out);
    }

    let usage = &data.usage;
    let _ = writeln!(out, "## Usage");
    let _ = writeln!(out);
    let _ = writeln!(out, "- **Unique users:** {}", usage.unique_users);
    for (code, count) in usage.language_distribution.iter() {
        let _ = writeln!(out, "- **Language `{}`:** {}", code, count);
    }
    let _ = writeln!(out);
    if !usage.top_intents.is_empty() {
        let _ = writeln!(out, "### Top Intents");
        let _ = writeln!(out);
        for (i, intent) in usage.top_intents.iter().enumerate() {
            let _ = writeln!(out, "{}. **{}** - {} detections", i + 1, intent.intent, intent.count);
        }
        let _ = writeln!(out);
    }

    let health = &data.system_health;
    let _ = writeln!(out, "## System Health");
    let _ = writeln!(out);
    let _ = writeln!(out, "| Metric | Value |");
    let _ = writeln!(out, "|--------|-------|");
    let _ = writeln!(out, "| Requests | {} |", health.total_requests);
    let _ = writeln!(out, "| Warnings | {} |", health.warning_count);
    let _ = writeln!(out, "| Errors | {} |", health.error_count);
    let _ = writeln!(
        out,
        "| Success Rate | {} |",
        format_percent(health.success_rate_percent)
    );
    let _ = writeln!(out);
    for (heading, messages) in [
        ("Errors", &health.error_messages),
        ("Warnings", &health.warning_messages),
    ] {
        if messages.is_empty() {
            continue;
        }
        let _ = writeln!(out, "### {}", heading);
        let _ = writeln!(out);
        for message in messages {
            let _ = writeln!(out, "- `{}`", message.replace('`', "'"));
        }
        let _ = writeln!(out);
    }

    let _ = writeln!(out, "---");
    let _ = writeln!(out, "*Generated by usage-report*");

    out
}

pub fn render_json(data: &ReportData) -> Result<String> {
    Ok(serde_json::to_string_pretty(data)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use usage_report_core::analytics::{process_logs_at, AggregateOptions};
    use usage_report_core::DateRange;

    fn sample_report() -> ReportData {
        let line = |message: &str, level: &str| {
            serde_json::json!({
                "message": message,
                "client_ip": "172.17.0.1",
                "taskName": null,
                "timestamp": "2025-12-09 22:30:35",
                "level": level,
                "logger": "test",
                "cid": "cid",
                "user": "user1",
                "schema_version": "1.0.0",
            })
            .to_string()
        };
        let text = [
            line("extracted user intents: translate", "INFO"),
            line("language code en detected by gpt-4o.", "INFO"),
            line("upstream timeout", "ERROR"),
        ]
        .join("\n");

        let day = "2025-12-09".parse().unwrap();
        let at = Utc.with_ymd_and_hms(2025, 12, 10, 6, 0, 0).unwrap();
        process_logs_at(&text, DateRange::single(day), at, &AggregateOptions::default()).data
    }

    #[test]
    fn test_export_format_from_str() {
        assert_eq!("md".parse::<ExportFormat>().unwrap(), ExportFormat::Markdown);
        assert_eq!("json".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert!("pdf".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_render_terminal_sections() {
        let out = render_terminal(&sample_report());
        assert!(out.contains("Usage Report: 2025-12-09 to 2025-12-09"));
        assert!(out.contains("SYSTEM HEALTH"));
        assert!(out.contains("[error]   upstream timeout"));
        assert!(out.contains("translate"));
    }

    #[test]
    fn test_render_markdown_sections() {
        let out = render_markdown(&sample_report());
        assert!(out.starts_with("# Usage Report: 2025-12-09 to 2025-12-09"));
        assert!(out.contains("| Success Rate | 66.67% |"));
        assert!(out.contains("- **Language `en`:** 1"));
    }

    #[test]
    fn test_render_json_round_trips_values() {
        let out = render_json(&sample_report()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["system_health"]["error_count"], 1);
        assert_eq!(value["usage"]["top_intents"][0]["intent"], "translate");
    }
}
