//! Atomic file replacement shared by every writer in claude-monitor.
//!
//! Content goes to a temp file in the target's directory and is renamed over the
//! target, so readers see either the previous file or the new one, never a prefix.
//! A failed write drops the temp file, which deletes it.

use std::io::Write;
use std::path::Path;

use fs_err as fs;
use tempfile::Builder;

use crate::error::{MonitorError, Result};

pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let parent_dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent_dir)
        .map_err(|err| MonitorError::io("Failed to create state directory", err))?;

    let mut temp_file = Builder::new()
        .prefix(".")
        .suffix(".tmp")
        .tempfile_in(parent_dir)
        .map_err(|err| MonitorError::io("Temp file error", err))?;
    temp_file
        .write_all(contents)
        .map_err(|err| MonitorError::io("Failed to write temp file", err))?;
    temp_file
        .flush()
        .map_err(|err| MonitorError::io("Failed to flush temp file", err))?;
    temp_file.persist(path).map_err(|err| {
        MonitorError::io(format!("Failed to replace {}", path.display()), err.error)
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dir_listing(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_creates_parent_and_writes() {
        let temp = tempfile::tempdir().unwrap();
        let target = temp.path().join("nested").join("usage.json");

        write_atomic(&target, b"{\"ok\":true}").unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "{\"ok\":true}");
        assert_eq!(dir_listing(target.parent().unwrap()), vec!["usage.json"]);
    }

    #[test]
    fn test_replaces_existing_content() {
        let temp = tempfile::tempdir().unwrap();
        let target = temp.path().join("record.json");

        write_atomic(&target, b"first").unwrap();
        write_atomic(&target, b"second").unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "second");
        assert_eq!(dir_listing(temp.path()), vec!["record.json"]);
    }

    #[test]
    fn test_failed_rename_leaves_no_temp_file() {
        let temp = tempfile::tempdir().unwrap();
        // Renaming a file over a non-empty directory fails on every platform.
        let target = temp.path().join("occupied");
        fs::create_dir_all(target.join("child")).unwrap();

        assert!(write_atomic(&target, b"data").is_err());
        assert_eq!(dir_listing(temp.path()), vec!["occupied"]);
    }
}
