//! Shared utilities for integration tests.

use std::fs;
use std::path::{Path, PathBuf};

/// Write `contents` to `dir/name`, creating parent directories.
pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, contents).unwrap();
    path
}

/// Non-empty lines of a log file.
#[allow(dead_code)]
pub fn read_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}

/// A path that cannot be opened as a file: its parent is a regular file.
#[allow(dead_code)]
pub fn unopenable_path(dir: &Path) -> PathBuf {
    let blocker = write_file(dir, "blocker", "not a directory");
    blocker.join("app.log")
}
