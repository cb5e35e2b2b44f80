use std::path::{Path, PathBuf};

use cadence_core::paths::CADENCE_DIR;

/// Resolve the project root for a command invocation.
///
/// Priority: explicit `--root` flag, then the nearest ancestor of the current
/// directory containing `.cadence/`, then the nearest ancestor containing
/// `.git/`, then the current directory itself.
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    if let Some(found) = find_ancestor_with(&cwd, CADENCE_DIR) {
        return found;
    }
    if let Some(found) = find_ancestor_with(&cwd, ".git") {
        return found;
    }

    cwd
}

/// Walk up from `start` looking for a directory that contains `marker`.
fn find_ancestor_with(start: &Path, marker: &str) -> Option<PathBuf> {
    let mut current = Some(start);
    while let Some(dir) = current {
        if dir.join(marker).is_dir() {
            return Some(dir.to_path_buf());
        }
        current = dir.parent();
    }
    None
}
