//! Shared data models for diagnostics, rewrite sites, and run reports.

use serde::Serialize;
use std::path::PathBuf;

/// One compiler/linter finding tied to a file location.
///
/// `line` and `column` are 1-based. Records are created once per run from
/// parsed tool output and never persisted.
#[derive(Debug, Clone)]
pub struct DiagnosticRecord {
    pub file: PathBuf,
    pub line: usize,
    pub column: usize,
    pub code: String,
    pub message: String,
    /// Derived ranking weight; higher processes earlier.
    pub priority: i64,
}

/// Syntactic context of a located `any` occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SiteKind {
    VariableDeclaration,
    FunctionParameter,
    FunctionReturn,
    InterfaceProperty,
    ArrayElement,
    TypeAssertion,
    GenericParameter,
}

/// One occurrence in source text eligible for a proposed rewrite.
///
/// `span` is the byte range of the `any` token when the site came from a
/// full parse. It is `None` in the regex-fallback path, in which case only
/// line-based text surgery may be attempted.
#[derive(Debug, Clone)]
pub struct RewriteSite {
    pub kind: SiteKind,
    pub name: Option<String>,
    pub line: usize,
    pub span: Option<(usize, usize)>,
}

/// Confidence tier attached to a proposal by the heuristic that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// A proposed rewrite for one site.
///
/// When `skip` is true the site must be left untouched and is excluded from
/// attempt statistics entirely.
#[derive(Debug, Clone)]
pub struct Proposal {
    pub new_type: Option<String>,
    pub confidence: Confidence,
    pub reason: String,
    pub skip: bool,
}

/// Terminal outcome for one processed file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileStatus {
    /// Content changed and passed all validations.
    Written,
    /// No eligible sites, or every site was skip-classified.
    NoOp,
    /// Exception during processing (read failure, both parse paths failed).
    Error,
    /// Corruption or syntax failure; original left untouched.
    Rejected,
}

#[derive(Debug, Clone, Serialize)]
/// Per-file outcome row in the summary report.
pub struct FileOutcome {
    pub file: String,
    pub status: FileStatus,
    pub replaced: usize,
    pub skipped: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
/// Aggregated totals over one run.
pub struct RunTotals {
    pub files_processed: usize,
    pub files_written: usize,
    pub files_rejected: usize,
    pub files_errored: usize,
    pub replacements: usize,
    pub skipped_sites: usize,
    /// Files that matched diagnostics but fell outside this run's batch.
    pub deferred: usize,
}

#[derive(Debug, Clone, Serialize)]
/// Full result of one engine run, serializable for `--json`.
pub struct SummaryReport {
    pub outcomes: Vec<FileOutcome>,
    pub totals: RunTotals,
    pub batch_size: usize,
    pub dry_run: bool,
    /// True when a mid-run build checkpoint failed and processing aborted.
    pub checkpoint_failed: bool,
    /// True when SIGINT cut the run short.
    pub interrupted: bool,
    /// Rollback hint: stash handle created before any mutation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<String>,
}

impl SummaryReport {
    /// Whether some files were processed but others were rejected, errored,
    /// or cut off by a failed checkpoint. Maps to exit code 2.
    pub fn is_partial(&self) -> bool {
        self.checkpoint_failed
            || self.totals.files_rejected > 0
            || self.totals.files_errored > 0
    }
}
