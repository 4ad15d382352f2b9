//! Version-control helpers: working-tree status and stash snapshots.
//!
//! The snapshot/restore pair is an operator safety net only; the engine
//! never reads snapshot state back into its own logic.

use std::path::Path;
use std::process::Command;

/// Working-tree cleanliness, or `None` when the directory is not a git
/// repository (or git is unavailable).
pub fn is_clean(root: &Path) -> Option<bool> {
    let out = Command::new("git")
        .args(["status", "--porcelain"])
        .current_dir(root)
        .output()
        .ok()?;
    if !out.status.success() {
        return None;
    }
    Some(out.stdout.iter().all(|b| b.is_ascii_whitespace()))
}

/// Create a restorable snapshot of the working tree without touching it.
/// Returns the stash commit handle, or `None` when there is nothing to
/// snapshot or git is unavailable.
pub fn snapshot(root: &Path, label: &str) -> Option<String> {
    let out = Command::new("git")
        .args(["stash", "create", label])
        .current_dir(root)
        .output()
        .ok()?;
    if !out.status.success() {
        return None;
    }
    let handle = String::from_utf8_lossy(&out.stdout).trim().to_string();
    if handle.is_empty() {
        return None;
    }
    // keep the dangling stash commit reachable so the operator can apply it
    let _ = Command::new("git")
        .args(["stash", "store", "-m", label, &handle])
        .current_dir(root)
        .output();
    Some(handle)
}

/// Apply a snapshot handle back onto the working tree.
pub fn restore(root: &Path, handle: &str) -> Result<(), String> {
    let out = Command::new("git")
        .args(["stash", "apply", handle])
        .current_dir(root)
        .output()
        .map_err(|e| format!("git unavailable: {}", e))?;
    if out.status.success() {
        Ok(())
    } else {
        Err(String::from_utf8_lossy(&out.stderr).trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_is_clean_outside_repo_is_none() {
        let dir = tempdir().unwrap();
        assert_eq!(is_clean(dir.path()), None);
    }

    #[test]
    fn test_snapshot_outside_repo_is_none() {
        let dir = tempdir().unwrap();
        assert_eq!(snapshot(dir.path(), "tsmend pre-run"), None);
    }
}
