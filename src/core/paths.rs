//! Path normalization utilities
//!
//! Identifiers produced from a scan always use '/' as separator and are relative to root.

use std::path::{Path, PathBuf};

/// Name of the per-root settings directory
pub const CONFIG_DIR: &str = ".readahead";

/// Normalize a path to use '/' as separator (for cross-platform consistency)
pub fn normalize_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Make a path relative to the root directory
pub fn make_relative(path: &Path, root: &Path) -> Option<String> {
    path.strip_prefix(root).ok().map(normalize_path)
}

/// Join a '/'-separated relative identifier onto a base path
pub fn join_normalized(base: &Path, relative: &str) -> PathBuf {
    base.join(relative.replace('/', std::path::MAIN_SEPARATOR_STR))
}

/// Get the settings directory for a given root
pub fn config_dir(root: &Path) -> PathBuf {
    root.join(CONFIG_DIR)
}

/// Whether a root-relative identifier lives inside the settings directory
pub fn is_config_path(relative: &str) -> bool {
    relative == CONFIG_DIR || relative.starts_with(&format!("{}/", CONFIG_DIR))
}
