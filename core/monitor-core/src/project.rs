//! Project naming for a session's working directory.
//!
//! The display groups sessions by the repository they run in, so a session started
//! in `/repo/proj/src` is shown as `proj` when `/repo/proj` is the git root.

use std::path::Path;

/// Marks a repository root. Both a directory (regular clone) and a file
/// (worktree, submodule) count.
pub const VCS_MARKER: &str = ".git";

/// Returns the name of the nearest ancestor containing [`VCS_MARKER`], falling
/// back to the last component of `cwd`.
pub fn project_name(cwd: &str) -> String {
    if cwd.trim().is_empty() {
        return String::new();
    }

    let path = Path::new(cwd);
    match path.ancestors().find(|dir| dir.join(VCS_MARKER).exists()) {
        Some(root) => dir_name(root),
        None => dir_name(path),
    }
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}
