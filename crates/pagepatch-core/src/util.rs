//! Utility functions shared across the crate.

use std::path::{Path, PathBuf};

/// Get the user's config directory following XDG conventions.
///
/// Returns `$XDG_CONFIG_HOME` if set, otherwise `$HOME/.config`.
pub fn config_dir() -> Option<PathBuf> {
    std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
}

/// Sanitize a user-supplied filename into a storage-safe stem.
///
/// Strips path components and keeps only alphanumerics plus `._-`,
/// so the result is safe to embed in storage keys and URLs.
pub fn sanitize_filename(filename: &str) -> String {
    let base = Path::new(filename)
        .file_name()
        .map_or(filename, |n| n.to_str().unwrap_or(filename));

    let safe: String = base
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();

    if safe.is_empty() {
        "document.pdf".to_string()
    } else {
        safe
    }
}

/// File stem of a sanitized filename (name without the trailing extension).
pub fn file_stem(filename: &str) -> String {
    Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .map_or_else(|| "document".to_string(), ToString::to_string)
}
