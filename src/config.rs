//! Configuration discovery and effective settings resolution.
//!
//! Tsmend reads `tsmend.toml|yaml|yml` from the repository root (or closest
//! ancestor) and merges it with CLI flags to produce an `Effective` config.
//! Defaults:
//! - `include`: `src/**/*.ts`, `src/**/*.tsx`
//! - `ledger`: `.tsmend-metrics.json`
//! - `tools.check|build`: `npx tsc --noEmit`; `tools.lint`: `npx eslint .`
//! - `tools.timeout_secs`: 120
//! - `batch.min|max`: 3|25; `batch.checkpoint_interval`: 5
//! - `heuristics.confidence_threshold`: 0.5; `context_window`: 3
//!
//! Overrides precedence: CLI > config file > defaults.

use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Deserialize, Clone)]
/// External tool invocations under `[tools]`. Commands run via `sh -lc`.
pub struct ToolsCfg {
    pub check: Option<String>,
    pub lint: Option<String>,
    pub build: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// Batch sizing bounds under `[batch]`.
pub struct BatchCfg {
    pub min: Option<usize>,
    pub max: Option<usize>,
    pub checkpoint_interval: Option<usize>,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// Inference tuning under `[heuristics]`.
pub struct HeuristicsCfg {
    pub confidence_threshold: Option<f64>,
    pub context_window: Option<usize>,
    /// Identifier -> proposed type, merged over built-in defaults.
    #[serde(default)]
    pub vocabulary: Option<HashMap<String, String>>,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// Root configuration loaded from `tsmend.toml|yaml`.
pub struct TsmendConfig {
    pub include: Option<Vec<String>>,
    pub exclude: Option<Vec<String>>,
    pub ledger: Option<String>,
    pub allow_dirty: Option<bool>,
    #[serde(default)]
    pub tools: Option<ToolsCfg>,
    #[serde(default)]
    pub batch: Option<BatchCfg>,
    #[serde(default)]
    pub heuristics: Option<HeuristicsCfg>,
    /// Directory name -> ranking weight, merged over built-in defaults.
    #[serde(default)]
    pub priorities: Option<HashMap<String, i64>>,
}

#[derive(Debug, Clone)]
/// Fully-resolved configuration used by the engine after applying precedence.
pub struct Effective {
    pub repo_root: PathBuf,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub ledger_path: PathBuf,
    pub allow_dirty: bool,
    pub check_cmd: String,
    pub lint_cmd: String,
    pub build_cmd: String,
    pub timeout_secs: u64,
    pub min_batch: usize,
    pub max_batch: usize,
    pub checkpoint_interval: usize,
    pub confidence_threshold: f64,
    pub context_window: usize,
    pub vocabulary: Vec<(String, String)>,
    pub dir_weights: HashMap<String, i64>,
}

/// Walk upward from `start` to detect the repository root.
///
/// Stops when a `tsmend.toml|yaml|yml` or a `.git` directory is found.
pub fn detect_repo_root(start: &Path) -> PathBuf {
    let mut cur = start;
    loop {
        if cur.join("tsmend.toml").exists()
            || cur.join("tsmend.yaml").exists()
            || cur.join("tsmend.yml").exists()
        {
            return cur.to_path_buf();
        }
        if cur.join(".git").exists() {
            return cur.to_path_buf();
        }
        match cur.parent() {
            Some(p) => cur = p,
            None => return start.to_path_buf(),
        }
    }
}

/// Load `TsmendConfig` from `tsmend.toml` or `tsmend.yaml|yml` if present.
pub fn load_config(root: &Path) -> Option<TsmendConfig> {
    let toml_path = root.join("tsmend.toml");
    if toml_path.exists() {
        let s = fs::read_to_string(&toml_path).ok()?;
        let cfg: TsmendConfig = toml::from_str(&s).ok()?;
        return Some(cfg);
    }
    for yml in ["tsmend.yaml", "tsmend.yml"] {
        let p = root.join(yml);
        if p.exists() {
            let s = fs::read_to_string(&p).ok()?;
            let cfg: TsmendConfig = serde_yaml::from_str(&s).ok()?;
            return Some(cfg);
        }
    }
    None
}

/// Built-in identifier -> type table used when the config adds nothing.
///
/// Ordered: earlier entries win when several keywords match one name.
fn default_vocabulary() -> Vec<(String, String)> {
    [
        ("error", "Error"),
        ("event", "Event"),
        ("response", "Response"),
        ("request", "Request"),
        ("callback", "(...args: unknown[]) => unknown"),
        ("handler", "(...args: unknown[]) => unknown"),
        ("options", "Record<string, unknown>"),
        ("params", "Record<string, unknown>"),
        ("props", "Record<string, unknown>"),
        ("data", "Record<string, unknown>"),
        ("payload", "Record<string, unknown>"),
        ("items", "unknown[]"),
        ("list", "unknown[]"),
        ("results", "unknown[]"),
        ("id", "string"),
        ("name", "string"),
        ("count", "number"),
        ("index", "number"),
        ("enabled", "boolean"),
        ("disabled", "boolean"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

fn default_dir_weights() -> HashMap<String, i64> {
    [
        ("types", 30),
        ("services", 25),
        ("utils", 10),
        ("hooks", 10),
        ("components", 5),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

/// Resolve `Effective` by merging CLI flags, discovered config, and defaults.
pub fn resolve_effective(cli_repo_root: Option<&str>) -> Effective {
    let start = PathBuf::from(cli_repo_root.unwrap_or("."));
    let repo_root = detect_repo_root(&start);
    let cfg = load_config(&repo_root).unwrap_or_default();

    let include = cfg
        .include
        .unwrap_or_else(|| vec!["src/**/*.ts".to_string(), "src/**/*.tsx".to_string()]);
    let exclude = cfg.exclude.unwrap_or_default();
    let ledger_name = cfg
        .ledger
        .unwrap_or_else(|| ".tsmend-metrics.json".to_string());
    let tools = cfg.tools.unwrap_or_default();
    let batch = cfg.batch.unwrap_or_default();
    let heur = cfg.heuristics.unwrap_or_default();

    // Config vocabulary entries take precedence over the built-in table.
    let mut vocabulary: Vec<(String, String)> = heur
        .vocabulary
        .map(|m| {
            let mut v: Vec<(String, String)> = m.into_iter().collect();
            v.sort();
            v
        })
        .unwrap_or_default();
    for (k, t) in default_vocabulary() {
        if !vocabulary.iter().any(|(key, _)| *key == k) {
            vocabulary.push((k, t));
        }
    }

    let mut dir_weights = default_dir_weights();
    if let Some(extra) = cfg.priorities {
        for (k, v) in extra {
            dir_weights.insert(k, v);
        }
    }

    Effective {
        ledger_path: repo_root.join(&ledger_name),
        repo_root,
        include,
        exclude,
        allow_dirty: cfg.allow_dirty.unwrap_or(false),
        check_cmd: tools
            .check
            .unwrap_or_else(|| "npx tsc --noEmit".to_string()),
        lint_cmd: tools.lint.unwrap_or_else(|| "npx eslint .".to_string()),
        build_cmd: tools
            .build
            .unwrap_or_else(|| "npx tsc --noEmit".to_string()),
        timeout_secs: tools.timeout_secs.unwrap_or(120),
        min_batch: batch.min.unwrap_or(3),
        max_batch: batch.max.unwrap_or(25),
        checkpoint_interval: batch.checkpoint_interval.unwrap_or(5),
        confidence_threshold: heur.confidence_threshold.unwrap_or(0.5),
        context_window: heur.context_window.unwrap_or(3),
        vocabulary,
        dir_weights,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_detect_and_load_toml() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let mut f = fs::File::create(root.join("tsmend.toml")).unwrap();
        writeln!(
            f,
            "{}",
            r#"
include = ["lib/**/*.ts"]
ledger = "metrics.json"
[tools]
check = "yarn tsc --noEmit"
timeout_secs = 30
[batch]
min = 1
max = 8
"#
        )
        .unwrap();

        let eff = resolve_effective(root.to_str());
        assert_eq!(eff.include, vec!["lib/**/*.ts"]);
        assert_eq!(eff.ledger_path, root.join("metrics.json"));
        assert_eq!(eff.check_cmd, "yarn tsc --noEmit");
        assert_eq!(eff.timeout_secs, 30);
        assert_eq!(eff.min_batch, 1);
        assert_eq!(eff.max_batch, 8);
        // untouched keys fall back to defaults
        assert_eq!(eff.lint_cmd, "npx eslint .");
        assert_eq!(eff.checkpoint_interval, 5);
    }

    #[test]
    fn test_load_yaml_and_defaults() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let mut f = fs::File::create(root.join("tsmend.yaml")).unwrap();
        writeln!(
            f,
            "{}",
            r#"
allow_dirty: true
heuristics:
  confidence_threshold: 0.8
"#
        )
        .unwrap();

        let eff = resolve_effective(root.to_str());
        assert!(eff.allow_dirty);
        assert!((eff.confidence_threshold - 0.8).abs() < f64::EPSILON);
        assert_eq!(eff.include, vec!["src/**/*.ts", "src/**/*.tsx"]);
    }

    #[test]
    fn test_vocabulary_override_wins_over_defaults() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let mut f = fs::File::create(root.join("tsmend.toml")).unwrap();
        writeln!(
            f,
            "{}",
            r#"
[heuristics.vocabulary]
error = "AppError"
recipe = "Recipe"
"#
        )
        .unwrap();

        let eff = resolve_effective(root.to_str());
        let get = |k: &str| {
            eff.vocabulary
                .iter()
                .find(|(key, _)| key == k)
                .map(|(_, t)| t.as_str())
        };
        assert_eq!(get("error"), Some("AppError"));
        assert_eq!(get("recipe"), Some("Recipe"));
        // built-in entries survive alongside
        assert_eq!(get("items"), Some("unknown[]"));
    }

    #[test]
    fn test_priorities_merge_over_defaults() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("tsmend.toml"), "[priorities]\ncalculations = 40\n").unwrap();
        let eff = resolve_effective(root.to_str());
        assert_eq!(eff.dir_weights.get("calculations"), Some(&40));
        assert_eq!(eff.dir_weights.get("types"), Some(&30));
    }
}
