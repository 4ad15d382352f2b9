//! Supporting helpers: colored log prefixes and path relativization.

use owo_colors::OwoColorize;
use std::path::Path;

fn colors_enabled() -> bool {
    std::env::var_os("NO_COLOR").is_none()
}

/// Prefix for fatal/error messages on stderr.
pub fn error_prefix() -> String {
    if colors_enabled() {
        "✖ error:".red().bold().to_string()
    } else {
        "✖ error:".to_string()
    }
}

/// Prefix for warnings that do not stop the run.
pub fn warn_prefix() -> String {
    if colors_enabled() {
        "▲ warn:".yellow().bold().to_string()
    } else {
        "▲ warn:".to_string()
    }
}

/// Prefix for friendly notes.
pub fn note_prefix() -> String {
    if colors_enabled() {
        "◆ note:".blue().bold().to_string()
    } else {
        "◆ note:".to_string()
    }
}

/// Prefix for informational progress lines.
pub fn info_prefix() -> String {
    if colors_enabled() {
        "· info:".bright_black().to_string()
    } else {
        "· info:".to_string()
    }
}

/// Render `path` relative to `root` for display; falls back to the full path.
pub fn rel_to_root(path: &Path, root: &Path) -> String {
    pathdiff::diff_paths(path, root)
        .unwrap_or_else(|| path.to_path_buf())
        .to_string_lossy()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_rel_to_root_strips_prefix() {
        let root = PathBuf::from("/repo");
        let p = PathBuf::from("/repo/src/a.ts");
        assert_eq!(rel_to_root(&p, &root), "src/a.ts");
    }
}
