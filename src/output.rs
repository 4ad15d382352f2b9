//! Output rendering for run reports and ledger metrics.
//!
//! Supports `human` (default) and `--json` outputs. The JSON form carries
//! per-file fields and a top-level summary; composition is kept pure for
//! testing.

use crate::ledger::SafetyMetrics;
use crate::models::{FileStatus, SummaryReport};
use owo_colors::OwoColorize;
use serde_json::Value as JsonVal;

fn use_colors(json: bool) -> bool {
    !json && std::env::var_os("NO_COLOR").is_none()
}

/// Print a run report in the requested format. `silent` suppresses the
/// human per-file lines but never the JSON form.
pub fn print_report(report: &SummaryReport, json: bool, silent: bool) {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&compose_report_json(report)).unwrap_or_default()
        );
        return;
    }
    if silent {
        return;
    }
    let color = use_colors(json);
    for o in &report.outcomes {
        let tag = match o.status {
            FileStatus::Written => {
                if color {
                    "✏️  written:".green().bold().to_string()
                } else {
                    "✏️  written:".to_string()
                }
            }
            FileStatus::NoOp => {
                if color {
                    "· no-op:".bright_black().to_string()
                } else {
                    "· no-op:".to_string()
                }
            }
            FileStatus::Error => {
                if color {
                    "✖ error:".red().bold().to_string()
                } else {
                    "✖ error:".to_string()
                }
            }
            FileStatus::Rejected => {
                if color {
                    "▲ rejected:".yellow().bold().to_string()
                } else {
                    "▲ rejected:".to_string()
                }
            }
        };
        let detail = match &o.message {
            Some(m) => format!(" ({})", m),
            None => String::new(),
        };
        println!(
            "{} {} — replaced={} skipped={}{}",
            tag, o.file, o.replaced, o.skipped, detail
        );
    }
    if report.checkpoint_failed {
        let line = "build checkpoint failed; remaining files were not processed";
        if color {
            println!("{}", line.red().bold());
        } else {
            println!("{}", line);
        }
    }
    if let Some(snap) = &report.snapshot {
        println!("rollback hint: git stash apply {}", snap);
    }
    let t = &report.totals;
    let summary = format!(
        "— Summary — written={} no-op={} rejected={} errors={} replaced={} skipped={} deferred={} batch={}{}",
        t.files_written,
        t.files_processed
            .saturating_sub(t.files_written + t.files_rejected + t.files_errored),
        t.files_rejected,
        t.files_errored,
        t.replacements,
        t.skipped_sites,
        t.deferred,
        report.batch_size,
        if report.dry_run { " (dry-run)" } else { "" },
    );
    if color {
        println!("{}", summary.bold());
    } else {
        println!("{}", summary);
    }
}

/// Compose the report JSON object (pure) for testing/snapshot purposes.
pub fn compose_report_json(report: &SummaryReport) -> JsonVal {
    serde_json::to_value(report).unwrap_or(JsonVal::Null)
}

/// Print the persisted ledger state for `--show-metrics`.
pub fn print_metrics(metrics: &SafetyMetrics, json: bool) {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(metrics).unwrap_or_default()
        );
        return;
    }
    println!("runs: {} total, {} successful", metrics.total_runs, metrics.successful_runs);
    println!(
        "files processed: {}  replacements: {}  skipped sites: {}",
        metrics.files_processed, metrics.anys_replaced, metrics.skipped_sites
    );
    println!(
        "errors: {}  corruption: {}  build failures: {}",
        metrics.errors_encountered, metrics.corruption_detected, metrics.build_failures
    );
    println!(
        "safety score: {:.2}  average batch: {:.1}  max safe batch: {}",
        metrics.safety_score, metrics.average_batch_size, metrics.max_safe_batch_size
    );
    for (reason, stat) in &metrics.replacement_type_success {
        println!("  {} — {}/{} applied", reason, stat.successes, stat.attempts);
    }
}
