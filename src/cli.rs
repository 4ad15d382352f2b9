//! CLI argument parsing via `clap`.

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "tsmend",
    version,
    about = "Tsmend — safety-gated type rewrites for TypeScript codebases",
    long_about = "Tsmend collects type-checker and linter diagnostics, proposes validated\n\
                  replacements for explicit `any` usage, and sizes each batch from a\n\
                  persisted safety ledger.\n\n\
                  Configuration precedence: CLI > tsmend.toml > defaults.",
    after_help = "Examples:\n  tsmend --dry-run\n  tsmend --auto-fix --max-files 5 --json\n  tsmend --show-metrics\n  tsmend --validate-safety"
)]
/// Top-level CLI options. Without a mode flag, tsmend runs interactively.
pub struct Cli {
    #[arg(long, help = "Repository root (default: current dir)")]
    pub repo_root: Option<String>,
    #[arg(long, help = "Report proposed changes without writing any file")]
    pub dry_run: bool,
    #[arg(
        long,
        help = "Prompt per proposed change (default when neither --dry-run nor --auto-fix)"
    )]
    pub interactive: bool,
    #[arg(
        long,
        help = "Apply all non-skipped high-confidence proposals without prompting"
    )]
    pub auto_fix: bool,
    #[arg(long, value_name = "N", help = "Force batch size, bypassing the ledger")]
    pub max_files: Option<usize>,
    #[arg(long, help = "Machine-readable report on stdout")]
    pub json: bool,
    #[arg(long, help = "Suppress human-oriented log lines")]
    pub silent: bool,
    #[arg(long, help = "Print ledger state and exit")]
    pub show_metrics: bool,
    #[arg(
        long,
        help = "Print a safe/unsafe verdict from the ledger; exit 0 if safe, 1 otherwise"
    )]
    pub validate_safety: bool,
    #[arg(long, help = "Exit 0 if the working tree is clean, else 1")]
    pub check_git_status: bool,
}

/// How the engine treats proposals during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// No writes, report-only.
    DryRun,
    /// Prompt per change on the terminal.
    Interactive,
    /// Apply High/Medium-confidence proposals without prompting.
    AutoFix,
}

impl Cli {
    /// Resolve the run mode. Interactive is the default when neither
    /// `--dry-run` nor `--auto-fix` was given, and an explicit
    /// `--interactive` wins over `--auto-fix`.
    pub fn mode(&self) -> RunMode {
        if self.dry_run {
            RunMode::DryRun
        } else if self.auto_fix && !self.interactive {
            RunMode::AutoFix
        } else {
            RunMode::Interactive
        }
    }
}
