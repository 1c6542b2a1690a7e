//! Path and filter utilities

use std::path::{Path, PathBuf};

use crate::error::InventoryError;
use crate::utils::config::{EXCLUDED_FOLDERS, SHARE_SUFFIX, STRIPPED_CHARS};

/// Resolve a manifest logical path (`/shareA/sub/dir`) against the network root.
///
/// The first segment names the share and becomes `<segment>_share`; the rest are joined with
/// the native separator. `\` is accepted as a separator too, empty segments are ignored.
pub fn resolve_logical_path(
    logical_path: &str,
    network_root: &Path,
) -> Result<PathBuf, InventoryError> {
    let mut segments = logical_path
        .split(['/', '\\'])
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let share = segments
        .next()
        .ok_or_else(|| InventoryError::InvalidLogicalPath(logical_path.to_string()))?;
    let mut path = network_root.join(format!("{share}{SHARE_SUFFIX}"));
    for seg in segments {
        path.push(seg);
    }
    Ok(path)
}

/// True for the system folders pruned from every walk.
pub fn is_excluded_folder(name: &str) -> bool {
    EXCLUDED_FOLDERS
        .iter()
        .any(|excluded| excluded.eq_ignore_ascii_case(name))
}

/// Returns true if the path should be descended into / recorded (not excluded).
pub fn should_include_in_walk(path: &Path, root: &Path, exclude_patterns: &[String]) -> bool {
    if path == root {
        return true;
    }
    let name = match path.file_name().and_then(|n| n.to_str()) {
        Some(n) => n,
        None => return true,
    };
    if is_excluded_folder(name) {
        return false;
    }
    if exclude_patterns.is_empty() {
        return true;
    }
    let path_str = path.to_str().unwrap_or("");
    for pattern in exclude_patterns {
        if glob_match(pattern, name) || glob_match(pattern, path_str) {
            return false;
        }
    }
    true
}

/// Simple glob pattern matching (supports * and ?). Every other character, `!` included,
/// matches itself.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();
    glob_match_chars(&p, &t)
}

fn glob_match_chars(p: &[char], t: &[char]) -> bool {
    match p.split_first() {
        None => t.is_empty(),
        Some(('*', rest)) => {
            if rest.is_empty() {
                return true; // trailing * matches everything
            }
            (0..=t.len()).any(|i| glob_match_chars(rest, &t[i..]))
        }
        Some(('?', rest)) => !t.is_empty() && glob_match_chars(rest, &t[1..]),
        Some((c, rest)) => t.first() == Some(c) && glob_match_chars(rest, &t[1..]),
    }
}

/// Remove the field delimiter, BOM / zero-width characters and line breaks from a field.
pub fn sanitize_field(value: &str) -> String {
    if !value.contains(STRIPPED_CHARS) {
        return value.to_string();
    }
    value.chars().filter(|c| !STRIPPED_CHARS.contains(c)).collect()
}

/// Extension with its leading dot (`.docx`), or empty when the name has none.
pub fn extension_with_dot(path: &Path) -> String {
    path.extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default()
}

/// Lowercase extension without the dot, for type checks.
pub fn extension_lower(path: &Path) -> Option<String> {
    path.extension().map(|e| e.to_string_lossy().to_lowercase())
}

/// Lossy display string for a path (record fields are text).
pub fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_keeps_dot() {
        assert_eq!(extension_with_dot(Path::new("/a/report.docx")), ".docx");
        assert_eq!(extension_with_dot(Path::new("/a/Makefile")), "");
        assert_eq!(extension_lower(Path::new("X.DOCX")).as_deref(), Some("docx"));
    }
}
