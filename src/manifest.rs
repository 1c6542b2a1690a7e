//! Batch manifest: delimited text, one target per row, header names the columns.

use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::engine::tools::resolve_logical_path;
use crate::error::InventoryError;
use crate::events::{EventSink, ScanEvent};
use crate::utils::config::{MANIFEST_LABEL_COLUMNS, MANIFEST_PATH_COLUMNS, UTF8_BOM};
use crate::{ScanTarget, TargetKey, TargetStatus};

/// One usable manifest row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ManifestRow {
    /// 1-based line number in the manifest.
    pub line: usize,
    pub label: String,
    pub logical_path: String,
}

/// Split one line on `delimiter`, honoring double quotes (`""` is a literal quote).
pub fn split_fields(line: &str, delimiter: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            c if c == delimiter && !in_quotes => fields.push(std::mem::take(&mut field)),
            c => field.push(c),
        }
    }
    fields.push(field);
    fields.into_iter().map(|f| f.trim().to_string()).collect()
}

fn find_column(header: &[String], names: &[&str]) -> Option<usize> {
    header
        .iter()
        .position(|h| names.iter().any(|n| h.eq_ignore_ascii_case(n)))
}

/// Parse manifest text. Rows without a path are skipped with a
/// [`ScanEvent::ManifestRowSkipped`]; a header missing either column is an error.
pub fn parse_manifest(
    text: &str,
    origin: &Path,
    delimiter: u8,
    events: &dyn EventSink,
) -> Result<Vec<ManifestRow>, InventoryError> {
    let delimiter = delimiter as char;
    let text = text.strip_prefix(UTF8_BOM).unwrap_or(text);
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l))
        .filter(|(_, l)| !l.trim().is_empty());

    let manifest_err = |message: String| InventoryError::Manifest {
        path: origin.to_path_buf(),
        message,
    };
    let (_, header_line) = lines
        .next()
        .ok_or_else(|| manifest_err("empty manifest".to_string()))?;
    let header = split_fields(header_line, delimiter);
    let label_col = find_column(&header, &MANIFEST_LABEL_COLUMNS).ok_or_else(|| {
        manifest_err(format!(
            "no label column (expected one of {:?})",
            MANIFEST_LABEL_COLUMNS
        ))
    })?;
    let path_col = find_column(&header, &MANIFEST_PATH_COLUMNS).ok_or_else(|| {
        manifest_err(format!(
            "no path column (expected one of {:?})",
            MANIFEST_PATH_COLUMNS
        ))
    })?;

    let mut rows = Vec::new();
    for (line, raw) in lines {
        let fields = split_fields(raw, delimiter);
        let logical_path = fields.get(path_col).cloned().unwrap_or_default();
        if logical_path.is_empty() {
            events.emit(&ScanEvent::ManifestRowSkipped {
                timestamp: Utc::now(),
                manifest: origin.to_path_buf(),
                line,
                message: "missing path".to_string(),
            });
            continue;
        }
        rows.push(ManifestRow {
            line,
            label: fields.get(label_col).cloned().unwrap_or_default(),
            logical_path,
        });
    }
    Ok(rows)
}

/// Read and parse a manifest file.
pub fn read_manifest(
    path: &Path,
    delimiter: u8,
    events: &dyn EventSink,
) -> Result<Vec<ManifestRow>, InventoryError> {
    let text = std::fs::read_to_string(path).map_err(|e| InventoryError::Manifest {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    parse_manifest(&text, path, delimiter, events)
}

/// Turn manifest rows into targets, in row order.
///
/// With a network root, logical paths go through [`resolve_logical_path`]; a row that fails to
/// resolve becomes a target with no root (it fails like an inaccessible root). Without one, the
/// logical path is used as the root as-is.
pub fn targets_from_rows(rows: Vec<ManifestRow>, network_root: Option<&Path>) -> Vec<ScanTarget> {
    rows.into_iter()
        .map(|row| {
            let (root, resolve_error) = match network_root {
                Some(net) => match resolve_logical_path(&row.logical_path, net) {
                    Ok(p) => (Some(p), None),
                    Err(e) => (None, Some(e.to_string())),
                },
                None => (Some(PathBuf::from(&row.logical_path)), None),
            };
            ScanTarget {
                label: row.label,
                key: TargetKey::Manifest {
                    line: row.line,
                    logical_path: row.logical_path,
                },
                root,
                resolve_error,
                attempts: 0,
                status: TargetStatus::Pending,
            }
        })
        .collect()
}
