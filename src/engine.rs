//! Orchestrator: collect → group/prioritize → process files → final
//! validation → report.
//!
//! Per file the flow is parse → (classify → propose → [confirm?] →
//! substitute → validate site)* → validate file → write. A full build/check
//! re-runs as a checkpoint every `checkpoint_interval` processed files; a
//! failed checkpoint aborts the remaining batch but leaves already-written
//! files in place. Single-threaded throughout; the only cross-run state is
//! the safety ledger, loaded once at start and saved once at the end.

use crate::cli::RunMode;
use crate::classify;
use crate::collect;
use crate::config::Effective;
use crate::git;
use crate::ledger::{self, SafetyMetrics};
use crate::models::{
    DiagnosticRecord, FileOutcome, FileStatus, RewriteSite, RunTotals, SiteKind, SummaryReport,
};
use crate::parser;
use crate::utils;
use crate::validate;
use glob::Pattern;
use regex::Regex;
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

/// Number of processed files between build checkpoints is configured; the
/// snapshot label is fixed.
const SNAPSHOT_LABEL: &str = "tsmend pre-run";

struct ProcessResult {
    outcome: FileOutcome,
    corruptions: usize,
}

/// Run the engine once. Fatal errors (unspawnable collector subprocess)
/// surface as `Err`; everything else degrades into the report.
pub fn run(
    eff: &Effective,
    mode: RunMode,
    forced_batch: Option<usize>,
    silent: bool,
    interrupted: &AtomicBool,
) -> Result<SummaryReport, String> {
    let (mut metrics, warn) = SafetyMetrics::load(&eff.ledger_path);
    if let Some(w) = warn {
        if !silent {
            eprintln!("{} {}", utils::warn_prefix(), w);
        }
    }

    let diagnostics = collect::collect(eff).map_err(|e| e.to_string())?;
    let ranked = rank_files(eff, &diagnostics);

    let batch_size = forced_batch
        .unwrap_or_else(|| metrics.recommended_batch_size(eff.min_batch, eff.max_batch));
    let deferred = ranked.len().saturating_sub(batch_size);
    let selected: Vec<PathBuf> = ranked.into_iter().take(batch_size).collect();

    if !silent {
        eprintln!(
            "{} processing {} file(s), batch size {} ({} deferred)",
            utils::info_prefix(),
            selected.len(),
            batch_size,
            deferred
        );
    }

    let snapshot = if mode != RunMode::DryRun && !selected.is_empty() {
        git::snapshot(&eff.repo_root, SNAPSHOT_LABEL)
    } else {
        None
    };

    // dry runs leave the ledger untouched: nothing was risked, so nothing
    // should shift future batch sizing
    let recording = mode != RunMode::DryRun;
    if recording {
        metrics.record_run_start(batch_size);
    }

    let mut outcomes: Vec<FileOutcome> = Vec::new();
    let mut run_replacements = 0usize;
    let mut run_skipped = 0usize;
    let mut run_errors = 0usize;
    let mut run_corruptions = 0usize;
    let mut checkpoint_failed = false;
    let mut was_interrupted = false;

    let total = selected.len();
    for (idx, path) in selected.iter().enumerate() {
        if interrupted.load(Ordering::SeqCst) {
            was_interrupted = true;
            break;
        }

        let result = process_file(eff, mode, &mut metrics, recording, path);
        if recording {
            metrics.record_file_processed();
        }
        match result.outcome.status {
            FileStatus::Error | FileStatus::Rejected => {
                if recording {
                    metrics.record_error();
                }
                run_errors += 1;
            }
            FileStatus::Written | FileStatus::NoOp => {}
        }
        run_replacements += result.outcome.replaced;
        run_skipped += result.outcome.skipped;
        run_corruptions += result.corruptions;
        if !silent {
            log_outcome(&result.outcome);
        }
        outcomes.push(result.outcome);

        let more_remain = idx + 1 < total;
        if mode != RunMode::DryRun
            && more_remain
            && eff.checkpoint_interval > 0
            && (idx + 1) % eff.checkpoint_interval == 0
            && !build_checkpoint(eff, silent)
        {
            metrics.record_build_failure();
            checkpoint_failed = true;
            break;
        }
    }

    let files_written = outcomes
        .iter()
        .filter(|o| o.status == FileStatus::Written)
        .count();

    // final validation pass over the whole project
    if mode != RunMode::DryRun
        && files_written > 0
        && !checkpoint_failed
        && !was_interrupted
        && !build_checkpoint(eff, silent)
    {
        metrics.record_build_failure();
        checkpoint_failed = true;
    }

    if recording {
        let success =
            ledger::run_successful(run_replacements, run_errors, run_corruptions, outcomes.len());
        metrics.record_run_complete(success);
        if let Err(w) = metrics.save(&eff.ledger_path) {
            if !silent {
                eprintln!("{} {}", utils::warn_prefix(), w);
            }
        }
    }

    Ok(SummaryReport {
        totals: RunTotals {
            files_processed: outcomes.len(),
            files_written,
            files_rejected: outcomes
                .iter()
                .filter(|o| o.status == FileStatus::Rejected)
                .count(),
            files_errored: outcomes
                .iter()
                .filter(|o| o.status == FileStatus::Error)
                .count(),
            replacements: run_replacements,
            skipped_sites: run_skipped,
            deferred,
        },
        outcomes,
        batch_size,
        dry_run: mode == RunMode::DryRun,
        checkpoint_failed,
        interrupted: was_interrupted,
        snapshot,
    })
}

/// Group actionable diagnostics by file and rank files by diagnostic count
/// plus directory weight, highest first. Ties break on path for determinism.
fn rank_files(eff: &Effective, diagnostics: &[DiagnosticRecord]) -> Vec<PathBuf> {
    let mut groups: BTreeMap<PathBuf, (usize, i64)> = BTreeMap::new();
    for d in diagnostics {
        if !d.file.is_file() || !is_eligible(eff, &d.file) {
            continue;
        }
        let entry = groups.entry(d.file.clone()).or_insert((0, 0));
        entry.0 += 1;
        entry.1 = entry.1.max(d.priority);
    }
    let mut ranked: Vec<(PathBuf, i64)> = groups
        .into_iter()
        .map(|(path, (count, weight))| (path, count as i64 * 10 + weight))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.into_iter().map(|(p, _)| p).collect()
}

fn is_eligible(eff: &Effective, path: &Path) -> bool {
    let rel = path
        .strip_prefix(&eff.repo_root)
        .unwrap_or(path)
        .to_string_lossy()
        .to_string();
    let matches = |patterns: &[String]| {
        patterns
            .iter()
            .filter_map(|p| Pattern::new(p).ok())
            .any(|p| p.matches(&rel))
    };
    if !eff.include.is_empty() && !matches(&eff.include) {
        return false;
    }
    !matches(&eff.exclude)
}

fn log_outcome(outcome: &FileOutcome) {
    let status = match outcome.status {
        FileStatus::Written => "written",
        FileStatus::NoOp => "no-op",
        FileStatus::Error => "error",
        FileStatus::Rejected => "rejected",
    };
    eprintln!(
        "{} {} — {} (replaced={} skipped={})",
        utils::info_prefix(),
        outcome.file,
        status,
        outcome.replaced,
        outcome.skipped
    );
}

fn build_checkpoint(eff: &Effective, silent: bool) -> bool {
    match collect::run_tool(&eff.repo_root, &eff.build_cmd, eff.timeout_secs) {
        Ok(out) if out.exit_code == Some(0) => true,
        Ok(_) => {
            if !silent {
                eprintln!("{} build checkpoint failed", utils::warn_prefix());
            }
            false
        }
        Err(e) => {
            if !silent {
                eprintln!("{} build checkpoint: {}", utils::warn_prefix(), e);
            }
            false
        }
    }
}

/// Process one file through the parse/classify/substitute/validate loop.
/// `recording` is false in dry runs, keeping ledger counters untouched.
fn process_file(
    eff: &Effective,
    mode: RunMode,
    metrics: &mut SafetyMetrics,
    recording: bool,
    path: &Path,
) -> ProcessResult {
    let display = utils::rel_to_root(path, &eff.repo_root);
    let outcome_with = |status, replaced, skipped, message| ProcessResult {
        outcome: FileOutcome {
            file: display.clone(),
            status,
            replaced,
            skipped,
            message,
        },
        corruptions: 0,
    };

    let original = match fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) => {
            return outcome_with(FileStatus::Error, 0, 0, Some(format!("read failed: {}", e)))
        }
    };

    // a file that already carries corruption is rejected before any rewrite
    if let Some(sig) = validate::corruption_signature(&original) {
        if recording {
            metrics.record_corruption();
        }
        let mut r = outcome_with(
            FileStatus::Rejected,
            0,
            0,
            Some(format!("pre-existing corruption signature: {}", sig)),
        );
        r.corruptions = 1;
        return r;
    }

    let parsed = parser::parse(&original);
    let mut sites = classify::find_sites(&parsed);
    if sites.is_empty() {
        return outcome_with(FileStatus::NoOp, 0, 0, None);
    }
    // apply from the end of the file backwards so byte offsets stay valid
    sites.sort_by(|a, b| b.span.cmp(&a.span).then(b.line.cmp(&a.line)));

    let lines = parser::split_lines(&original);
    let mut current = original.clone();
    let mut replaced = 0usize;
    let mut skipped = 0usize;
    let mut corruptions = 0usize;

    for site in &sites {
        let proposal = classify::propose(site, &lines, eff);
        if proposal.skip {
            if recording {
                metrics.record_skipped(&proposal.reason);
            }
            skipped += 1;
            continue;
        }
        if recording {
            metrics.record_attempt(&proposal.reason);
        }
        let Some(new_type) = proposal.new_type.as_deref() else {
            continue;
        };
        let apply = match mode {
            RunMode::Interactive => confirm_apply(&display, site, new_type),
            // dry-run mirrors auto-fix decisions so the report shows what a
            // real run would change, without writing
            RunMode::AutoFix | RunMode::DryRun => {
                proposal.confidence != crate::models::Confidence::Low
            }
        };
        if !apply {
            continue;
        }
        let Some(candidate) = apply_substitution(&current, site, new_type) else {
            continue;
        };
        if validate::validate_replacement(&current, &candidate, site, new_type) {
            current = candidate;
            replaced += 1;
            if recording {
                metrics.record_replacement(&proposal.reason);
            }
        } else {
            if recording {
                metrics.record_corruption();
            }
            corruptions += 1;
        }
    }

    if replaced == 0 {
        let mut r = outcome_with(FileStatus::NoOp, 0, skipped, None);
        r.corruptions = corruptions;
        return r;
    }

    // whole-file gate before anything touches disk
    if let Some(sig) = validate::corruption_signature(&current) {
        if recording {
            metrics.record_corruption();
        }
        let mut r = outcome_with(
            FileStatus::Rejected,
            0,
            skipped,
            Some(format!("corruption signature: {}", sig)),
        );
        r.corruptions = corruptions + 1;
        return r;
    }
    if !parser::is_valid_syntax(&current) {
        let mut r = outcome_with(
            FileStatus::Rejected,
            0,
            skipped,
            Some("modified text failed strict re-parse".to_string()),
        );
        r.corruptions = corruptions;
        return r;
    }

    if mode != RunMode::DryRun {
        if let Err(e) = fs::write(path, &current) {
            let mut r = outcome_with(
                FileStatus::Error,
                0,
                skipped,
                Some(format!("write failed: {}", e)),
            );
            r.corruptions = corruptions;
            return r;
        }
    }
    let mut r = outcome_with(FileStatus::Written, replaced, skipped, None);
    r.corruptions = corruptions;
    r
}

fn any_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\bany\b").unwrap())
}

/// Substitute one site's `any` with `new_type`.
///
/// Full-parse sites splice the recorded byte range. Fallback sites rewrite
/// the first `any` token on their line only; offsets are unknown there.
fn apply_substitution(text: &str, site: &RewriteSite, new_type: &str) -> Option<String> {
    // an array site replaces only the element type; avoid doubling `[]`
    let effective = if site.kind == SiteKind::ArrayElement {
        new_type.strip_suffix("[]").unwrap_or(new_type)
    } else {
        new_type
    };
    match site.span {
        Some((start, end)) => {
            if start >= end || end > text.len() {
                return None;
            }
            let mut out = String::with_capacity(text.len() + effective.len());
            out.push_str(&text[..start]);
            out.push_str(effective);
            out.push_str(&text[end..]);
            Some(out)
        }
        None => {
            let (line_start, line_end) = line_bounds(text, site.line)?;
            let line = &text[line_start..line_end];
            let replaced = any_token_re().replace(line, effective);
            if replaced == line {
                return None;
            }
            let mut out = String::with_capacity(text.len() + effective.len());
            out.push_str(&text[..line_start]);
            out.push_str(&replaced);
            out.push_str(&text[line_end..]);
            Some(out)
        }
    }
}

/// Byte range of the 1-based `line` within `text`, excluding the newline.
fn line_bounds(text: &str, line: usize) -> Option<(usize, usize)> {
    let mut start = 0usize;
    for (idx, l) in text.split_inclusive('\n').enumerate() {
        let body = l.strip_suffix('\n').unwrap_or(l);
        if idx + 1 == line {
            return Some((start, start + body.len()));
        }
        start += l.len();
    }
    None
}

fn confirm_apply(file: &str, site: &RewriteSite, new_type: &str) -> bool {
    let name = site.name.as_deref().unwrap_or("<anonymous>");
    eprint!(
        "{} {}:{} {} -> {} — apply? [y/N] ",
        utils::note_prefix(),
        file,
        site.line,
        name,
        new_type
    );
    let _ = io::stderr().flush();
    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim(), "y" | "Y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::resolve_effective;
    use std::sync::atomic::AtomicBool;
    use tempfile::tempdir;

    /// Effective config whose tool commands are inert except for a check
    /// command that prints the given literal diagnostic lines.
    fn eff_with_diags(root: &Path, diag_lines: &str) -> Effective {
        let mut eff = resolve_effective(root.to_str());
        eff.repo_root = root.to_path_buf();
        eff.ledger_path = root.join(".tsmend-metrics.json");
        eff.check_cmd = format!("printf '{}'", diag_lines);
        eff.lint_cmd = "true".to_string();
        eff.build_cmd = "true".to_string();
        eff.timeout_secs = 30;
        eff
    }

    fn not_interrupted() -> AtomicBool {
        AtomicBool::new(false)
    }

    #[test]
    fn test_auto_fix_applies_array_inference() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::write(
            root.join("src/a.ts"),
            "function f(items: any) { return items.map(x => x); }\n",
        )
        .unwrap();
        let eff = eff_with_diags(
            root,
            "src/a.ts(1,12): error TS7006: Parameter implicitly has an any type.\\n",
        );

        let report = run(&eff, RunMode::AutoFix, None, true, &not_interrupted()).unwrap();
        assert_eq!(report.totals.files_written, 1);
        assert_eq!(report.totals.replacements, 1);
        let body = fs::read_to_string(root.join("src/a.ts")).unwrap();
        assert!(body.contains("items: unknown[]"));
        assert!(!body.contains(": any"));
        // ledger was persisted and counts the successful run
        let (m, _) = SafetyMetrics::load(&eff.ledger_path);
        assert_eq!(m.total_runs, 1);
        assert_eq!(m.anys_replaced, 1);
        assert_eq!(m.successful_runs, 1);
    }

    #[test]
    fn test_protected_catch_is_never_mutated() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src")).unwrap();
        let src = "try { run(); } catch (err: any) { console.error(err); }\n";
        fs::write(root.join("src/guard.ts"), src).unwrap();
        let eff = eff_with_diags(
            root,
            "src/guard.ts(1,24): error TS7006: Unexpected any.\\n",
        );

        let report = run(&eff, RunMode::AutoFix, None, true, &not_interrupted()).unwrap();
        assert_eq!(report.totals.replacements, 0);
        assert_eq!(report.totals.skipped_sites, 1);
        assert_eq!(report.outcomes[0].status, FileStatus::NoOp);
        assert_eq!(fs::read_to_string(root.join("src/guard.ts")).unwrap(), src);
        // skip-classified sites stay out of attempt statistics entirely
        let (m, _) = SafetyMetrics::load(&eff.ledger_path);
        assert_eq!(m.skipped_sites, 1);
        assert!(m.replacement_type_success.is_empty());
        assert_eq!(m.anys_replaced, 0);
    }

    #[test]
    fn test_forced_batch_size_processes_exactly_one() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src")).unwrap();
        let mut diags = String::new();
        for name in ["a", "b", "c", "d", "e"] {
            let file = format!("src/{}.ts", name);
            fs::write(
                root.join(&file),
                "const data: any = load();\n",
            )
            .unwrap();
            diags.push_str(&format!("{}(1,7): error TS7006: any.\\n", file));
        }
        let eff = eff_with_diags(root, &diags);

        let report = run(&eff, RunMode::AutoFix, Some(1), true, &not_interrupted()).unwrap();
        assert_eq!(report.batch_size, 1);
        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(report.totals.deferred, 4);
    }

    #[test]
    fn test_idempotent_on_clean_second_run() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::write(
            root.join("src/a.ts"),
            "function f(items: any) { return items.map(x => x); }\n",
        )
        .unwrap();
        let eff = eff_with_diags(
            root,
            "src/a.ts(1,12): error TS7006: Parameter implicitly has an any type.\\n",
        );

        let first = run(&eff, RunMode::AutoFix, None, true, &not_interrupted()).unwrap();
        assert_eq!(first.totals.replacements, 1);
        let after_first = fs::read_to_string(root.join("src/a.ts")).unwrap();

        let second = run(&eff, RunMode::AutoFix, None, true, &not_interrupted()).unwrap();
        assert_eq!(second.totals.replacements, 0);
        assert_eq!(second.outcomes[0].status, FileStatus::NoOp);
        assert_eq!(
            fs::read_to_string(root.join("src/a.ts")).unwrap(),
            after_first
        );
    }

    #[test]
    fn test_dry_run_reports_without_writing() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src")).unwrap();
        let src = "const count: any = 1;\n";
        fs::write(root.join("src/a.ts"), src).unwrap();
        let eff = eff_with_diags(root, "src/a.ts(1,7): error TS7006: any.\\n");

        let report = run(&eff, RunMode::DryRun, None, true, &not_interrupted()).unwrap();
        assert!(report.dry_run);
        assert_eq!(report.totals.replacements, 1);
        assert_eq!(fs::read_to_string(root.join("src/a.ts")).unwrap(), src);
    }

    #[test]
    fn test_failed_checkpoint_aborts_remaining() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src")).unwrap();
        let mut diags = String::new();
        for name in ["a", "b", "c"] {
            let file = format!("src/{}.ts", name);
            fs::write(root.join(&file), "const data: any = load();\n").unwrap();
            diags.push_str(&format!("{}(1,7): error TS7006: any.\\n", file));
        }
        let mut eff = eff_with_diags(root, &diags);
        eff.build_cmd = "false".to_string();
        eff.checkpoint_interval = 1;

        let report = run(&eff, RunMode::AutoFix, Some(3), true, &not_interrupted()).unwrap();
        assert!(report.checkpoint_failed);
        // first file written, checkpoint after it failed, rest aborted
        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(report.totals.files_written, 1);
        assert!(report.is_partial());
        let (m, _) = SafetyMetrics::load(&eff.ledger_path);
        assert_eq!(m.build_failures, 1);
    }

    #[test]
    fn test_pre_existing_corruption_rejects_whole_file() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src")).unwrap();
        let src = "const x: unknown unknown = 1;\nconst y: any = 2;\n";
        fs::write(root.join("src/bad.ts"), src).unwrap();
        let eff = eff_with_diags(root, "src/bad.ts(2,7): error TS7006: any.\\n");

        let report = run(&eff, RunMode::AutoFix, None, true, &not_interrupted()).unwrap();
        assert_eq!(report.outcomes[0].status, FileStatus::Rejected);
        assert!(report.is_partial());
        assert_eq!(fs::read_to_string(root.join("src/bad.ts")).unwrap(), src);
        let (m, _) = SafetyMetrics::load(&eff.ledger_path);
        assert_eq!(m.corruption_detected, 1);
        assert_eq!(m.errors_encountered, 1);
    }

    #[test]
    fn test_corrupting_proposal_rejected_per_site_only() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::write(
            root.join("src/a.ts"),
            "const data: any = load();\nconst items: any = rows.map(r => r);\n",
        )
        .unwrap();
        let mut eff = eff_with_diags(
            root,
            "src/a.ts(1,7): error TS7006: any.\\nsrc/a.ts(2,7): error TS7006: any.\\n",
        );
        // a poisoned vocabulary entry yields a corruption-signature rewrite
        eff.vocabulary
            .insert(0, ("data".to_string(), "unknown unknown".to_string()));

        let report = run(&eff, RunMode::AutoFix, None, true, &not_interrupted()).unwrap();
        // the poisoned site is discarded, the clean one still lands
        assert_eq!(report.outcomes[0].status, FileStatus::Written);
        assert_eq!(report.totals.replacements, 1);
        let body = fs::read_to_string(root.join("src/a.ts")).unwrap();
        assert!(body.contains("const data: any"));
        assert!(body.contains("const items: unknown[]"));
        let (m, _) = SafetyMetrics::load(&eff.ledger_path);
        assert_eq!(m.corruption_detected, 1);
    }

    #[test]
    fn test_rank_files_orders_by_count_then_weight() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src/services")).unwrap();
        fs::create_dir_all(root.join("src/components")).unwrap();
        fs::write(root.join("src/services/s.ts"), "const a: any = 1;\n").unwrap();
        fs::write(root.join("src/components/c.ts"), "const b: any = 1;\n").unwrap();
        let eff = eff_with_diags(root, "");

        let mk = |file: &str, weight: i64| DiagnosticRecord {
            file: root.join(file),
            line: 1,
            column: 1,
            code: "TS7006".into(),
            message: "any".into(),
            priority: weight,
        };
        // equal counts: weight decides
        let ranked = rank_files(&eff, &[mk("src/components/c.ts", 5), mk("src/services/s.ts", 25)]);
        assert!(ranked[0].ends_with("src/services/s.ts"));
        // enough extra diagnostics outweigh the directory weight
        let ranked = rank_files(
            &eff,
            &[
                mk("src/components/c.ts", 5),
                mk("src/components/c.ts", 5),
                mk("src/components/c.ts", 5),
                mk("src/components/c.ts", 5),
                mk("src/services/s.ts", 25),
            ],
        );
        assert!(ranked[0].ends_with("src/components/c.ts"));
    }

    #[test]
    fn test_line_bounds_and_substitution_fallback() {
        let text = "const a = 1;\nconst b: any = 2;\nconst c = 3;\n";
        let site = RewriteSite {
            kind: SiteKind::VariableDeclaration,
            name: Some("b".into()),
            line: 2,
            span: None,
        };
        let out = apply_substitution(text, &site, "unknown").unwrap();
        assert_eq!(out, "const a = 1;\nconst b: unknown = 2;\nconst c = 3;\n");
    }

    #[test]
    fn test_array_site_does_not_double_brackets() {
        let text = "const xs: any[] = rows.map(r => r);\n";
        // span of the `any` token inside `any[]`
        let start = text.find("any").unwrap();
        let site = RewriteSite {
            kind: SiteKind::ArrayElement,
            name: None,
            line: 1,
            span: Some((start, start + 3)),
        };
        let out = apply_substitution(text, &site, "unknown[]").unwrap();
        assert_eq!(out, "const xs: unknown[] = rows.map(r => r);\n");
    }
}
