//! Required fields from a single stat call: timestamps, length, attribute flags.

use chrono::{DateTime, Local};
use std::fs::Metadata;
use std::path::Path;
use std::time::SystemTime;

use crate::utils::config::TIMESTAMP_FORMAT;

/// Windows `FILE_ATTRIBUTE_*` bits and their .NET `FileAttributes` names, in output order.
const ATTRIBUTE_NAMES: [(u32, &str); 13] = [
    (0x0001, "ReadOnly"),
    (0x0002, "Hidden"),
    (0x0004, "System"),
    (0x0010, "Directory"),
    (0x0020, "Archive"),
    (0x0080, "Normal"),
    (0x0100, "Temporary"),
    (0x0200, "SparseFile"),
    (0x0400, "ReparsePoint"),
    (0x0800, "Compressed"),
    (0x1000, "Offline"),
    (0x2000, "NotContentIndexed"),
    (0x4000, "Encrypted"),
];

pub const ATTR_READONLY: u32 = 0x0001;
pub const ATTR_HIDDEN: u32 = 0x0002;
pub const ATTR_DIRECTORY: u32 = 0x0010;
pub const ATTR_NORMAL: u32 = 0x0080;
pub const ATTR_REPARSE_POINT: u32 = 0x0400;

/// Fields every record carries, all from one `Metadata`.
#[derive(Clone, Debug, Default)]
pub struct RequiredFields {
    pub date_created: String,
    pub date_modified: String,
    pub length: u64,
    pub attributes: String,
}

pub fn required_fields(path: &Path, meta: &Metadata) -> RequiredFields {
    RequiredFields {
        // Birth time is missing on some filesystems; the column stays empty then.
        date_created: meta.created().map(format_time).unwrap_or_default(),
        date_modified: meta.modified().map(format_time).unwrap_or_default(),
        length: meta.len(),
        attributes: attribute_names(attribute_bits(path, meta)),
    }
}

/// Local-time timestamp in the output format.
pub fn format_time(t: SystemTime) -> String {
    DateTime::<Local>::from(t).format(TIMESTAMP_FORMAT).to_string()
}

/// Comma-separated flag names for an attribute word. `Normal` when no flag is set.
pub fn attribute_names(bits: u32) -> String {
    let names: Vec<&str> = ATTRIBUTE_NAMES
        .iter()
        .filter(|(bit, _)| bits & bit != 0)
        .map(|(_, name)| *name)
        .collect();
    if names.is_empty() {
        "Normal".to_string()
    } else {
        names.join(", ")
    }
}

#[cfg(windows)]
fn attribute_bits(_path: &Path, meta: &Metadata) -> u32 {
    use std::os::windows::fs::MetadataExt;
    meta.file_attributes()
}

/// Unix has no attribute word; derive the flags that have an equivalent.
#[cfg(not(windows))]
fn attribute_bits(path: &Path, meta: &Metadata) -> u32 {
    let mut bits = 0;
    if meta.permissions().readonly() {
        bits |= ATTR_READONLY;
    }
    if path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'))
    {
        bits |= ATTR_HIDDEN;
    }
    if meta.is_dir() {
        bits |= ATTR_DIRECTORY;
    }
    if meta.file_type().is_symlink() {
        bits |= ATTR_REPARSE_POINT;
    }
    bits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_follow_bit_order() {
        assert_eq!(attribute_names(0), "Normal");
        assert_eq!(attribute_names(ATTR_NORMAL), "Normal");
        assert_eq!(attribute_names(0x0020 | ATTR_READONLY), "ReadOnly, Archive");
        assert_eq!(
            attribute_names(ATTR_HIDDEN | ATTR_REPARSE_POINT),
            "Hidden, ReparsePoint"
        );
    }

    #[test]
    fn time_format_is_second_precision() {
        let s = format_time(SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(86_400 * 365));
        assert_eq!(s.len(), "1971-01-01 00:00:00".len());
        assert_eq!(&s[4..5], "-");
        assert_eq!(&s[13..14], ":");
    }
}
