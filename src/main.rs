//! Tsmend CLI binary entry point.
//! Resolves configuration, enforces preconditions, runs the engine, and
//! maps outcomes to exit codes (0 clean, 1 fatal/unsafe, 2 partial).

use clap::Parser;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tsmend::cli::{Cli, RunMode};
use tsmend::ledger::{SafetyMetrics, SAFE_SCORE_FLOOR};
use tsmend::{config, engine, git, output, utils};

fn main() {
    let cli = Cli::parse();
    let eff = config::resolve_effective(cli.repo_root.as_deref());

    if cli.show_metrics {
        let (metrics, warn) = SafetyMetrics::load(&eff.ledger_path);
        if let Some(w) = warn {
            eprintln!("{} {}", utils::warn_prefix(), w);
        }
        output::print_metrics(&metrics, cli.json);
        return;
    }

    if cli.validate_safety {
        let (metrics, _) = SafetyMetrics::load(&eff.ledger_path);
        let score = metrics.compute_safety_score();
        let safe = score >= SAFE_SCORE_FLOOR;
        if cli.json {
            println!(
                "{}",
                serde_json::json!({ "safe": safe, "safety_score": score })
            );
        } else {
            println!(
                "{} (safety score {:.2})",
                if safe { "safe" } else { "unsafe" },
                score
            );
        }
        std::process::exit(if safe { 0 } else { 1 });
    }

    if cli.check_git_status {
        match git::is_clean(&eff.repo_root) {
            Some(true) => {
                if !cli.silent {
                    println!("working tree clean");
                }
            }
            Some(false) => {
                if !cli.silent {
                    println!("working tree dirty");
                }
                std::process::exit(1);
            }
            None => {
                eprintln!("{} not a git repository", utils::error_prefix());
                std::process::exit(1);
            }
        }
        return;
    }

    let mode = cli.mode();

    // Mutating modes require a clean tree so the stash snapshot is the only
    // uncommitted state. `allow_dirty` in tsmend.toml overrides.
    if mode != RunMode::DryRun && !eff.allow_dirty {
        if let Some(false) = git::is_clean(&eff.repo_root) {
            eprintln!(
                "{} working tree is dirty; commit or stash first, or set allow_dirty in tsmend.toml",
                utils::error_prefix()
            );
            std::process::exit(1);
        }
    }

    // SIGINT finishes the current file, then flushes the ledger and reports.
    let interrupted = Arc::new(AtomicBool::new(false));
    let handler_flag = interrupted.clone();
    let _ = ctrlc::set_handler(move || handler_flag.store(true, Ordering::SeqCst));

    match engine::run(&eff, mode, cli.max_files, cli.silent, interrupted.as_ref()) {
        Ok(report) => {
            output::print_report(&report, cli.json, cli.silent);
            if report.is_partial() || report.interrupted {
                std::process::exit(2);
            }
        }
        Err(e) => {
            eprintln!("{} {}", utils::error_prefix(), e);
            std::process::exit(1);
        }
    }
}
