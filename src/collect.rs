//! Diagnostic collection from the project's type checker and linter.
//!
//! Both tools run as bounded subprocesses via `sh -lc`. A nonzero exit is
//! the normal case when diagnostics exist, so captured output is always
//! parsed; only an unspawnable command is fatal. Lines matching neither
//! known format are skipped.

use crate::config::Effective;
use crate::models::DiagnosticRecord;
use regex::Regex;
use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::OnceLock;
use std::time::Duration;
use wait_timeout::ChildExt;

/// Why a collection step failed.
#[derive(Debug)]
pub enum CollectError {
    /// The subprocess could not be started at all. Fatal for the run.
    Spawn(String),
    /// The subprocess exceeded the configured timeout.
    Timeout(String),
}

impl std::fmt::Display for CollectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectError::Spawn(cmd) => write!(f, "failed to start '{}'", cmd),
            CollectError::Timeout(cmd) => write!(f, "'{}' timed out", cmd),
        }
    }
}

/// Combined stdout/stderr of one tool invocation.
#[derive(Debug)]
pub struct ToolOutput {
    pub exit_code: Option<i32>,
    pub text: String,
}

/// Run one tool command under the repository root with a bounded wait.
pub fn run_tool(root: &Path, cmd: &str, timeout_secs: u64) -> Result<ToolOutput, CollectError> {
    let mut child = Command::new("sh")
        .arg("-lc")
        .arg(cmd)
        .current_dir(root)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|_| CollectError::Spawn(cmd.to_string()))?;

    match child.wait_timeout(Duration::from_secs(timeout_secs)) {
        Ok(Some(status)) => {
            let mut text = String::new();
            if let Some(mut out) = child.stdout.take() {
                let _ = out.read_to_string(&mut text);
            }
            if let Some(mut err) = child.stderr.take() {
                let _ = err.read_to_string(&mut text);
            }
            Ok(ToolOutput {
                exit_code: status.code(),
                text,
            })
        }
        Ok(None) => {
            let _ = child.kill();
            let _ = child.wait();
            Err(CollectError::Timeout(cmd.to_string()))
        }
        Err(_) => Err(CollectError::Spawn(cmd.to_string())),
    }
}

/// Collect diagnostics by running the configured check and lint commands.
pub fn collect(eff: &Effective) -> Result<Vec<DiagnosticRecord>, CollectError> {
    let mut records = Vec::new();
    for cmd in [&eff.check_cmd, &eff.lint_cmd] {
        let out = run_tool(&eff.repo_root, cmd, eff.timeout_secs)?;
        records.extend(parse_tool_output(&eff.repo_root, &out.text, &eff.dir_weights));
    }
    Ok(records)
}

fn tsc_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([^\s(][^(]*)\((\d+),(\d+)\):\s+(?:error|warning)\s+([A-Za-z]+\d+):\s+(.+)$")
            .unwrap()
    })
}

fn lint_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\S.*?):\s+line\s+(\d+),\s+col\s+(\d+),\s+(\w+)\s+-\s+(.*?)\s+\(([\w@/-]+)\)$")
            .unwrap()
    })
}

fn indented_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s+(\d+):(\d+)\s+(error|warning|info)\s+(.+?)\s{2,}(\S+)$").unwrap()
    })
}

fn resolve_file(root: &Path, raw: &str) -> PathBuf {
    let p = PathBuf::from(raw.trim());
    if p.is_absolute() {
        p
    } else {
        root.join(p)
    }
}

/// Ranking weight for a file path from the per-directory table.
fn dir_weight(path: &Path, weights: &HashMap<String, i64>) -> i64 {
    path.components()
        .filter_map(|c| c.as_os_str().to_str())
        .filter_map(|c| weights.get(c).copied())
        .max()
        .unwrap_or(0)
}

/// Parse combined tool output into diagnostic records.
///
/// Supports the type-checker format `path(line,col): severity CODE: message`,
/// the linter format `path: line N, col M, Severity - message (rule)`, and
/// linter blocks where a bare existing-file path line is followed by
/// indented `line:col severity message rule` lines. The last-seen valid path
/// stays the current file until a new path line appears.
pub fn parse_tool_output(
    root: &Path,
    text: &str,
    weights: &HashMap<String, i64>,
) -> Vec<DiagnosticRecord> {
    let mut records = Vec::new();
    let mut current_file: Option<PathBuf> = None;

    for line in text.lines() {
        if let Some(c) = tsc_line_re().captures(line) {
            let file = resolve_file(root, &c[1]);
            let (line_no, col): (usize, usize) =
                match (c[2].parse(), c[3].parse()) {
                    (Ok(l), Ok(co)) => (l, co),
                    _ => continue,
                };
            if line_no == 0 || col == 0 {
                continue;
            }
            records.push(DiagnosticRecord {
                priority: dir_weight(&file, weights),
                file,
                line: line_no,
                column: col,
                code: c[4].to_string(),
                message: c[5].to_string(),
            });
            continue;
        }
        if let Some(c) = lint_line_re().captures(line) {
            let file = resolve_file(root, &c[1]);
            let (line_no, col): (usize, usize) =
                match (c[2].parse(), c[3].parse()) {
                    (Ok(l), Ok(co)) => (l, co),
                    _ => continue,
                };
            if line_no == 0 || col == 0 {
                continue;
            }
            records.push(DiagnosticRecord {
                priority: dir_weight(&file, weights),
                file,
                line: line_no,
                column: col,
                code: c[6].to_string(),
                message: c[5].to_string(),
            });
            continue;
        }
        if let Some(c) = indented_line_re().captures(line) {
            if let Some(file) = current_file.as_ref() {
                let (line_no, col): (usize, usize) =
                    match (c[1].parse(), c[2].parse()) {
                        (Ok(l), Ok(co)) => (l, co),
                        _ => continue,
                    };
                if line_no == 0 || col == 0 {
                    continue;
                }
                records.push(DiagnosticRecord {
                    file: file.clone(),
                    line: line_no,
                    column: col,
                    code: c[5].to_string(),
                    message: c[4].to_string(),
                    priority: dir_weight(file, weights),
                });
            }
            continue;
        }
        // A bare path line sets the current-file context for indented
        // diagnostics, but only when it names an existing file.
        let trimmed = line.trim_end();
        if !trimmed.is_empty() && !trimmed.starts_with(char::is_whitespace) {
            let candidate = resolve_file(root, trimmed);
            if candidate.is_file() {
                current_file = Some(candidate);
            }
        }
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn no_weights() -> HashMap<String, i64> {
        HashMap::new()
    }

    #[test]
    fn test_tsc_line_round_trip() {
        let dir = tempdir().unwrap();
        let out = "src/a.ts(10,5): warning TS1234: 'x' is declared but its value is never read.\n\
                   some unrelated noise line\n";
        let recs = parse_tool_output(dir.path(), out, &no_weights());
        assert_eq!(recs.len(), 1);
        assert!(recs[0].file.ends_with("src/a.ts"));
        assert_eq!(recs[0].line, 10);
        assert_eq!(recs[0].column, 5);
        assert_eq!(recs[0].code, "TS1234");
    }

    #[test]
    fn test_lint_single_line_format() {
        let dir = tempdir().unwrap();
        let out = "src/b.ts: line 3, col 7, Warning - Unexpected any. (no-explicit-any)\n";
        let recs = parse_tool_output(dir.path(), out, &no_weights());
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].line, 3);
        assert_eq!(recs[0].column, 7);
        assert_eq!(recs[0].code, "no-explicit-any");
        assert_eq!(recs[0].message, "Unexpected any.");
    }

    #[test]
    fn test_current_file_context_tracking() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("src")).unwrap();
        std::fs::write(root.join("src/c.ts"), "const x = 1;\n").unwrap();

        let out = "src/c.ts\n\
                   \x20\x202:11  warning  Unexpected any  no-explicit-any\n\
                   \x20\x205:3   error    Missing semi    semi\n\
                   src/missing.ts\n\
                   \x20\x201:1   error    Should be dropped  rule\n";
        let recs = parse_tool_output(root, out, &no_weights());
        // missing.ts does not exist, so the last valid path keeps applying
        assert_eq!(recs.len(), 3);
        assert!(recs.iter().all(|r| r.file.ends_with("src/c.ts")));
        assert_eq!(recs[0].line, 2);
        assert_eq!(recs[1].code, "semi");
    }

    #[test]
    fn test_priority_uses_directory_weights() {
        let dir = tempdir().unwrap();
        let mut w = HashMap::new();
        w.insert("services".to_string(), 25i64);
        let out = "src/services/api.ts(1,1): error TS7006: Parameter 'x' implicitly has an 'any' type.\n";
        let recs = parse_tool_output(dir.path(), out, &w);
        assert_eq!(recs[0].priority, 25);
    }

    #[test]
    fn test_run_tool_captures_nonzero_exit() {
        let dir = tempdir().unwrap();
        let out = run_tool(dir.path(), "printf 'oops\\n'; exit 2", 10).unwrap();
        assert_eq!(out.exit_code, Some(2));
        assert_eq!(out.text, "oops\n");
    }

    #[test]
    fn test_run_tool_timeout() {
        let dir = tempdir().unwrap();
        let err = run_tool(dir.path(), "sleep 5", 1).unwrap_err();
        assert!(matches!(err, CollectError::Timeout(_)));
    }
}
