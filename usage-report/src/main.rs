//! usage-report - usage, cost and performance reports from application logs
//!
//! Reads JSON log lines (from a directory of log files or a single file),
//! aggregates the embedded PerfReport payloads and prints a report.

mod render;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::Parser;
use render::ExportFormat;
use std::path::{Path, PathBuf};
use usage_report_core::analytics::process_logs;
use usage_report_core::ingest::{DirectorySource, FileSource, LogSource};
use usage_report_core::period::resolve_date_range;
use usage_report_core::{Config, DateRange, ReportPeriod};

#[derive(Parser, Debug)]
#[command(name = "usage-report")]
#[command(about = "Usage, cost and performance report from application logs")]
#[command(version)]
struct Args {
    /// Report period: daily, weekly, monthly or custom (default: from config)
    #[arg(long)]
    period: Option<ReportPeriod>,

    /// First day of the report (YYYY-MM-DD)
    #[arg(long)]
    start_date: Option<NaiveDate>,

    /// Last day of the report (YYYY-MM-DD, default: yesterday)
    #[arg(long)]
    end_date: Option<NaiveDate>,

    /// Directory of log files (default: from config)
    #[arg(long, conflicts_with = "input")]
    logs_dir: Option<PathBuf>,

    /// Read a single log file instead of a directory
    #[arg(long)]
    input: Option<PathBuf>,

    /// Export format (md = markdown, json = JSON)
    #[arg(long)]
    export: Option<ExportFormat>,

    /// Write the report to this file instead of stdout
    #[arg(long)]
    out: Option<PathBuf>,

    /// Save the report under the output directory
    #[arg(long, conflicts_with = "out")]
    save: bool,

    /// Directory used by --save (default: from config)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Print run details to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load().context("failed to load configuration")?;
    let _log_guard = usage_report_core::logging::init(&config.logging).ok();

    // CLI flags win over config and environment
    if let Some(period) = args.period {
        config.report.period = period;
    }
    if args.start_date.is_some() {
        config.report.start_date = args.start_date;
    }
    if args.end_date.is_some() {
        config.report.end_date = args.end_date;
    }
    if let Some(dir) = &args.output_dir {
        config.report.output_dir = dir.clone();
    }
    config.report.validate().context("invalid report settings")?;

    let range = resolve_date_range(
        config.report.period,
        config.report.start_date,
        config.report.end_date,
        Utc::now().date_naive(),
    )?;

    let source: Box<dyn LogSource> = match (&args.input, &args.logs_dir) {
        (Some(path), _) => Box::new(FileSource::new(path)),
        (None, Some(dir)) => Box::new(DirectorySource::new(dir, &config.source.pattern)),
        (None, None) => {
            let dir = config.source.logs_dir.as_ref().context(
                "no log source: pass --logs-dir or --input, or set source.logs_dir in the config",
            )?;
            Box::new(DirectorySource::new(dir, &config.source.pattern))
        }
    };

    if args.verbose {
        eprintln!("Report period: {}", config.report.period);
        eprintln!("Date range: {}", range);
        eprintln!("Source: {}", source.name());
    }

    let text = source
        .fetch(&range)
        .with_context(|| format!("failed to read logs from {}", source.name()))?;
    let processed = process_logs(&text, range, &config.report.aggregate_options());

    if args.verbose {
        let stats = &processed.parse_stats;
        eprintln!("Read {} bytes, {} lines", text.len(), stats.lines);
        eprintln!(
            "Parsed {} records ({} blank, {} dropped)",
            stats.parsed(),
            stats.blank,
            stats.dropped
        );
        eprintln!(
            "Found {} PerfReport payloads ({} dropped)",
            processed.payload_candidates - processed.payload_drops,
            processed.payload_drops
        );
    }

    let rendered = render::render(&processed.data, args.export)?;

    let destination = match (&args.out, args.save) {
        (Some(path), _) => Some(path.clone()),
        (None, true) => Some(
            config
                .report
                .output_dir
                .join(report_file_name(&range, args.export)),
        ),
        (None, false) => None,
    };

    match destination {
        Some(path) => {
            write_report(&path, &rendered)?;
            tracing::info!(path = %path.display(), "Report written");
            eprintln!("Report written to {}", path.display());
        }
        None => print!("{}", rendered),
    }

    Ok(())
}

fn report_file_name(range: &DateRange, format: Option<ExportFormat>) -> String {
    let extension = match format {
        Some(ExportFormat::Markdown) => "md",
        Some(ExportFormat::Json) => "json",
        None => "txt",
    };
    format!(
        "bt-servant-report_{}_{}.{}",
        range.start, range.end, extension
    )
}

fn write_report(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}
