//! Utility functions for path sanitization and atomic file writes

use serde::Serialize;
use std::path::{Path, PathBuf};

/// Sanitize a course or assignment name into a filesystem-safe directory name
///
/// Keeps alphanumerics, spaces, and dashes; everything else is dropped.
/// Leading/trailing whitespace is trimmed and runs of spaces collapsed so
/// "CS101:  Intro!" and "CS101 Intro" derive the same directory.
pub fn sanitize_dir_name(name: &str) -> String {
    let kept: String = name
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == ' ' || *c == '-')
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Sanitize a remote filename into a filesystem-safe local filename
///
/// Keeps alphanumerics and `. _ -` plus spaces, dropping path separators and
/// anything else a remote could use to escape the assignment directory.
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '.' | '_' | '-' | ' '))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Append a short identifier suffix to a filename, before the extension
///
/// Used for deterministic collision disambiguation: two distinct remote ids
/// deriving the same sanitized name get `name.ext` and `name.f-2.ext`.
pub fn suffix_file_name(name: &str, id: &str) -> String {
    let id = sanitize_file_name(id);
    let path = Path::new(name);
    match (
        path.file_stem().and_then(|s| s.to_str()),
        path.extension().and_then(|e| e.to_str()),
    ) {
        (Some(stem), Some(ext)) => format!("{stem}.{id}.{ext}"),
        _ => format!("{name}.{id}"),
    }
}

/// Write a value as pretty JSON atomically: write to a temp file in the same
/// directory, then rename over the destination
///
/// A crash mid-write leaves either the old file or no file, never a partial
/// one. The rename stays on one filesystem because the temp file is a sibling.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> std::io::Result<()> {
    let bytes = serde_json::to_vec_pretty(value).map_err(std::io::Error::other)?;
    let tmp = temp_sibling(path);
    std::fs::write(&tmp, &bytes)?;
    match std::fs::rename(&tmp, path) {
        Ok(()) => Ok(()),
        Err(e) => {
            // Leave no temp droppings behind on failure
            let _ = std::fs::remove_file(&tmp);
            Err(e)
        }
    }
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
