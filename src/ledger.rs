//! Persisted safety ledger: historical run outcomes and batch sizing.
//!
//! One JSON file per project root, loaded once at process start and written
//! back once at run completion. Absent or unreadable files default-initialize;
//! ledger I/O never fails a run. There is no locking: concurrent runs against
//! the same ledger file are unsupported and last-writer-wins.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Error/corruption rates below these keep a run "successful" as long as it
/// made nonzero forward progress.
pub const RUN_ERROR_RATE_LIMIT: f64 = 0.20;
pub const RUN_CORRUPTION_RATE_LIMIT: f64 = 0.30;

/// Score at or above which `--validate-safety` reports a safe verdict.
pub const SAFE_SCORE_FLOOR: f64 = 0.5;

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
/// Success/attempt tally for one replacement reason or pattern.
pub struct SuccessStat {
    pub successes: u64,
    pub attempts: u64,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
/// The persisted metrics record.
pub struct SafetyMetrics {
    pub total_runs: u64,
    pub successful_runs: u64,
    pub files_processed: u64,
    pub errors_encountered: u64,
    pub corruption_detected: u64,
    pub build_failures: u64,
    pub anys_replaced: u64,
    pub skipped_sites: u64,
    pub average_batch_size: f64,
    pub max_safe_batch_size: usize,
    pub safety_score: f64,
    pub replacement_type_success: BTreeMap<String, SuccessStat>,
    pub pattern_effectiveness: BTreeMap<String, SuccessStat>,
}

impl SafetyMetrics {
    /// Load the ledger, default-initializing when absent or unreadable.
    /// Unreadable files surface as a warning string, never an error.
    pub fn load(path: &Path) -> (Self, Option<String>) {
        match fs::read_to_string(path) {
            Ok(s) => match serde_json::from_str::<SafetyMetrics>(&s) {
                Ok(m) => (m, None),
                Err(e) => (
                    SafetyMetrics::default(),
                    Some(format!("ledger unreadable, using defaults: {}", e)),
                ),
            },
            Err(_) => (SafetyMetrics::default(), None),
        }
    }

    /// Write the ledger once at run completion. Failures are warnings.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let body = serde_json::to_string_pretty(self)
            .map_err(|e| format!("ledger serialize failed: {}", e))?;
        fs::write(path, body).map_err(|e| format!("ledger write failed: {}", e))
    }

    pub fn record_run_start(&mut self, batch_size: usize) {
        self.total_runs += 1;
        let n = self.total_runs as f64;
        self.average_batch_size =
            (self.average_batch_size * (n - 1.0) + batch_size as f64) / n;
    }

    pub fn record_error(&mut self) {
        self.errors_encountered += 1;
    }

    pub fn record_corruption(&mut self) {
        self.corruption_detected += 1;
    }

    pub fn record_build_failure(&mut self) {
        self.build_failures += 1;
    }

    pub fn record_file_processed(&mut self) {
        self.files_processed += 1;
    }

    /// A proposal was considered for application (everything except
    /// protected-context skips).
    pub fn record_attempt(&mut self, reason: &str) {
        self.replacement_type_success
            .entry(reason.to_string())
            .or_default()
            .attempts += 1;
        self.pattern_effectiveness
            .entry(pattern_of(reason).to_string())
            .or_default()
            .attempts += 1;
    }

    /// An attempted proposal was applied and validated.
    pub fn record_replacement(&mut self, reason: &str) {
        self.anys_replaced += 1;
        self.replacement_type_success
            .entry(reason.to_string())
            .or_default()
            .successes += 1;
        self.pattern_effectiveness
            .entry(pattern_of(reason).to_string())
            .or_default()
            .successes += 1;
    }

    /// A protected-context skip. Explicitly not counted toward attempts.
    pub fn record_skipped(&mut self, _reason: &str) {
        self.skipped_sites += 1;
    }

    pub fn record_run_complete(&mut self, success: bool) {
        if success {
            self.successful_runs += 1;
        }
        self.safety_score = self.compute_safety_score();
        self.max_safe_batch_size = step_batch_size(
            self.safety_score,
            self.successful_runs,
            1,
            usize::MAX,
        );
    }

    /// Weighted reliability summary in `[0, 1]`. Weights total 1.0:
    /// success rate 0.35, inverse error rate 0.20, inverse corruption rate
    /// 0.15 (corruption counts double, floored at zero), inverse
    /// build-failure rate 0.15, experience bonus 0.10 (ceiling at 20 runs),
    /// throughput bonus 0.05.
    pub fn compute_safety_score(&self) -> f64 {
        let ratio = |num: u64, den: u64| {
            if den == 0 {
                0.0
            } else {
                num as f64 / den as f64
            }
        };
        let success_rate = ratio(self.successful_runs, self.total_runs);
        let error_rate = ratio(self.errors_encountered, self.files_processed);
        let corruption_rate = ratio(self.corruption_detected, self.files_processed);
        let build_failure_rate = ratio(self.build_failures, self.total_runs);
        let experience = (self.total_runs.min(20) as f64) / 20.0;
        let throughput = if self.anys_replaced > 0 { 1.0 } else { 0.0 };

        let score = 0.35 * success_rate
            + 0.20 * (1.0 - error_rate).clamp(0.0, 1.0)
            + 0.15 * (1.0 - corruption_rate * 2.0).clamp(0.0, 1.0)
            + 0.15 * (1.0 - build_failure_rate).clamp(0.0, 1.0)
            + 0.10 * experience
            + 0.05 * throughput;
        score.clamp(0.0, 1.0)
    }

    /// Batch size recommendation for the next run. Zero history returns the
    /// configured minimum; the caller's forced `--max-files` overrides this
    /// entirely.
    pub fn recommended_batch_size(&self, min_batch: usize, max_batch: usize) -> usize {
        if self.total_runs == 0 {
            return min_batch;
        }
        step_batch_size(
            self.compute_safety_score(),
            self.successful_runs,
            min_batch,
            max_batch,
        )
    }
}

/// Heuristic family of a replacement reason (`vocabulary:error` ->
/// `vocabulary`), keyed into `pattern_effectiveness`.
fn pattern_of(reason: &str) -> &str {
    reason.split(':').next().unwrap_or(reason)
}

/// Ascending step function from safety score to batch size, capped by how
/// much successful history backs the score up.
pub fn step_batch_size(score: f64, successful_runs: u64, min_batch: usize, max_batch: usize) -> usize {
    let tier = if score < 0.3 {
        min_batch
    } else if score < 0.5 {
        5
    } else if score < 0.7 {
        10
    } else if score < 0.85 {
        15
    } else {
        25
    };
    let history_cap = if successful_runs < 3 {
        5
    } else if successful_runs < 8 {
        15
    } else {
        max_batch
    };
    tier.min(history_cap).clamp(min_batch, max_batch)
}

/// The "good enough" progress criterion: a run counts as successful when it
/// applied at least one replacement while keeping per-batch error and
/// corruption rates under the fixed limits.
pub fn run_successful(
    replacements: usize,
    errors: usize,
    corruptions: usize,
    files_processed: usize,
) -> bool {
    if replacements == 0 {
        return false;
    }
    if files_processed == 0 {
        return false;
    }
    let error_rate = errors as f64 / files_processed as f64;
    let corruption_rate = corruptions as f64 / files_processed as f64;
    error_rate < RUN_ERROR_RATE_LIMIT && corruption_rate < RUN_CORRUPTION_RATE_LIMIT
}
