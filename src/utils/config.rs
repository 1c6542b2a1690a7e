//! Application configuration constants.
//! Tuning, thresholds and output format in one place.

use std::sync::OnceLock;

// ---- Package / paths (from CARGO_PKG_NAME, cached) ----

/// Package-derived names: built once from `CARGO_PKG_NAME`, then cached.
pub struct PackagePaths {
    config_filename: String,
}

static PACKAGE_PATHS: OnceLock<PackagePaths> = OnceLock::new();

impl PackagePaths {
    /// Build and cache names from `CARGO_PKG_NAME`. Called once on first use.
    pub fn get() -> &'static PackagePaths {
        PACKAGE_PATHS.get_or_init(|| {
            let pkg = env!("CARGO_PKG_NAME");
            PackagePaths {
                config_filename: format!(".{pkg}.toml"),
            }
        })
    }

    pub fn config_filename(&self) -> &str {
        &self.config_filename
    }
}

/// Directory names pruned from every walk (system folders on Windows shares).
pub const EXCLUDED_FOLDERS: [&str; 2] = ["$RECYCLE.BIN", "System Volume Information"];

// ---- Worker threads ----

/// Thread limits for probe workers.
/// Use [`WorkerThreadLimits::current()`] to fill `all_threads` from rayon; the rest are const.
#[derive(Clone, Copy, Debug)]
pub struct WorkerThreadLimits {
    /// Available threads (from rayon); set by [`WorkerThreadLimits::current()`].
    pub all_threads: usize,
    /// Floor / minimum worker count.
    pub floor: usize,
    /// Default cap. Probing is I/O bound on a share, more workers mostly add contention.
    pub default_max: usize,
}

impl Default for WorkerThreadLimits {
    fn default() -> Self {
        Self {
            all_threads: 0, // use current() to set from rayon
            floor: Self::FLOOR_THREADS,
            default_max: Self::DEFAULT_MAX_THREADS,
        }
    }
}

impl WorkerThreadLimits {
    pub const FLOOR_THREADS: usize = 1;
    pub const DEFAULT_MAX_THREADS: usize = 8;

    /// Build limits with `all_threads` set from `rayon::current_num_threads()`.
    pub fn current() -> Self {
        Self {
            all_threads: rayon::current_num_threads(),
            ..Self::default()
        }
    }

    /// Default probe worker count: available threads, capped, never below the floor.
    pub fn default_workers(&self) -> usize {
        self.all_threads.min(self.default_max).max(self.floor)
    }
}

// ---- Streaming channel cap ----

/// Capacity of the path and record channels. Walk and workers block when full (backpressure),
/// so memory stays bounded no matter how large the tree is.
pub const STREAMING_CHANNEL_CAP: usize = 10_000;

/// Seconds jwalk's rayon pool may stay busy before the walker gives up waiting on it.
pub const JWALK_BUSY_TIMEOUT_SECS: u64 = 60;

// ---- Output format ----

/// Field delimiter for output segments.
pub const FIELD_DELIMITER: char = '|';

/// Output header, in column order.
pub const HEADER_FIELDS: [&str; 12] = [
    "ServerName",
    "FullName",
    "DateCreated",
    "DateModified",
    "Owner",
    "Authors",
    "LastSavedBy",
    "Length",
    "Extension",
    "Attributes",
    "DirectoryName",
    "Name",
];

/// UTF-8 byte-order mark written at the start of every segment.
pub const UTF8_BOM: &str = "\u{FEFF}";

/// Characters stripped from every field before serialization: the delimiter, BOM and
/// zero-width characters some metadata APIs leak, and line breaks.
pub const STRIPPED_CHARS: [char; 8] = [
    FIELD_DELIMITER,
    '\u{FEFF}',
    '\u{200B}',
    '\u{200C}',
    '\u{200D}',
    '\u{2060}',
    '\r',
    '\n',
];

/// Timestamp format for DateCreated / DateModified (local time).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Segment size limit when none is configured.
pub const DEFAULT_MAX_FILE_SIZE_MB: u64 = 100;

/// Segment family name when none is configured.
pub const DEFAULT_OUTPUT_BASE: &str = "inventory";

/// Segment file extension.
pub const SEGMENT_EXTENSION: &str = "csv";

// ---- Manifest ----

pub const DEFAULT_MANIFEST_DELIMITER: u8 = b',';

/// Accepted header names (case-insensitive) for the label column.
pub const MANIFEST_LABEL_COLUMNS: [&str; 4] = ["servername", "server", "label", "source"];

/// Accepted header names (case-insensitive) for the logical path column.
pub const MANIFEST_PATH_COLUMNS: [&str; 3] = ["path", "logicalpath", "fullname"];

/// Suffix appended to the share segment of a logical path.
pub const SHARE_SUFFIX: &str = "_share";

// ---- Document properties ----

/// Extensions of OOXML packages that carry `docProps/core.xml`.
pub const OFFICE_EXTENSIONS: [&str; 7] = ["docx", "docm", "xlsx", "xlsm", "pptx", "pptm", "vsdx"];

/// Packages larger than this are not opened for properties (bytes). 512 MB.
pub const DOC_PROPS_MAX_PACKAGE_SIZE: u64 = 512 * 1024 * 1024;
