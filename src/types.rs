//! Public and internal types for the shareinv API and pipeline.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::utils::config::{
    DEFAULT_MANIFEST_DELIMITER, DEFAULT_MAX_FILE_SIZE_MB, DEFAULT_OUTPUT_BASE,
};

/// Where a target came from: a manifest row (label + logical path) or a path given directly.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum TargetKey {
    /// Manifest row: 1-based line number in the manifest and the logical path it named.
    Manifest { line: usize, logical_path: String },
    /// Root supplied directly (CLI positional path or library call).
    Direct,
}

/// Lifecycle of one target inside a batch.
///
/// `Pending -> Succeeded | Failed`, then once more for failures: `Failed -> Succeeded | RetryExhausted`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum TargetStatus {
    Pending,
    Succeeded,
    Failed,
    RetryExhausted,
}

/// One root to inventory.
#[derive(Clone, Debug)]
pub struct ScanTarget {
    /// Source label written into the ServerName column.
    pub label: String,
    pub key: TargetKey,
    /// Concrete root. `None` when the logical path could not be resolved.
    pub root: Option<PathBuf>,
    /// Why resolution failed, when `root` is `None`.
    pub resolve_error: Option<String>,
    /// Number of traversal attempts so far.
    pub attempts: u32,
    pub status: TargetStatus,
}

impl ScanTarget {
    /// Target for a root given directly (no manifest, no resolution).
    pub fn from_path(label: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            label: label.into(),
            key: TargetKey::Direct,
            root: Some(root.into()),
            resolve_error: None,
            attempts: 0,
            status: TargetStatus::Pending,
        }
    }

    /// Display form of the root (or the unresolved logical path) for events and logs.
    pub fn display_root(&self) -> String {
        match (&self.root, &self.key) {
            (Some(root), _) => root.display().to_string(),
            (None, TargetKey::Manifest { logical_path, .. }) => logical_path.clone(),
            (None, TargetKey::Direct) => String::new(),
        }
    }
}

/// One output row. Field order here matches the header order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FileRecord {
    pub server_name: String,
    pub full_name: String,
    pub date_created: String,
    pub date_modified: String,
    pub owner: String,
    pub authors: String,
    pub last_saved_by: String,
    pub length: u64,
    pub extension: String,
    pub attributes: String,
    pub directory_name: String,
    pub name: String,
}

/// Terminal status of one traversal attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum TraversalStatus {
    Completed,
    RootInaccessible,
    Cancelled,
}

/// Per-attempt result of walking one target.
#[derive(Clone, Debug, Serialize)]
pub struct TraversalOutcome {
    pub files_visited: u64,
    pub files_skipped: u64,
    /// Directories entered below the root.
    pub dirs_visited: u64,
    pub dirs_skipped: u64,
    pub status: TraversalStatus,
    #[serde(serialize_with = "serialize_millis")]
    pub elapsed: Duration,
}

impl TraversalOutcome {
    pub fn root_inaccessible(elapsed: Duration) -> Self {
        Self {
            files_visited: 0,
            files_skipped: 0,
            dirs_visited: 0,
            dirs_skipped: 0,
            status: TraversalStatus::RootInaccessible,
            elapsed,
        }
    }
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

/// Final state of one target plus every attempt's outcome (1 or 2 entries).
#[derive(Clone, Debug)]
pub struct TargetReport {
    pub target: ScanTarget,
    pub outcomes: Vec<TraversalOutcome>,
}

impl TargetReport {
    /// Outcome of the last attempt, if the target was attempted at all.
    pub fn last_outcome(&self) -> Option<&TraversalOutcome> {
        self.outcomes.last()
    }
}

/// Result of [`BatchRunner::run`](crate::batch::BatchRunner::run).
#[derive(Clone, Debug, Default)]
pub struct BatchReport {
    pub targets: Vec<TargetReport>,
    pub files_visited: u64,
    pub files_skipped: u64,
    pub dirs_skipped: u64,
    pub elapsed: Duration,
    /// True when the run stopped early on Ctrl+C.
    pub cancelled: bool,
    /// Output segments written, in order.
    pub segments: Vec<PathBuf>,
}

impl BatchReport {
    pub fn count_with_status(&self, status: TargetStatus) -> usize {
        self.targets
            .iter()
            .filter(|t| t.target.status == status)
            .count()
    }
}

/// Output (sink) options.
#[derive(Clone, Debug)]
pub struct SinkOpts {
    pub output_dir: PathBuf,
    /// Segment family name: `<base>_001.csv`, `<base>_002.csv`, ...
    pub base_name: String,
    /// Rotation threshold in bytes (BOM and header included).
    pub max_segment_bytes: u64,
}

impl SinkOpts {
    pub fn new(output_dir: impl Into<PathBuf>, base_name: impl Into<String>, max_mb: u64) -> Self {
        Self {
            output_dir: output_dir.into(),
            base_name: base_name.into(),
            max_segment_bytes: max_mb.saturating_mul(1024 * 1024),
        }
    }
}

impl Default for SinkOpts {
    fn default() -> Self {
        Self::new(".", DEFAULT_OUTPUT_BASE, DEFAULT_MAX_FILE_SIZE_MB)
    }
}

/// Full options for a run (CLI, config file, or library).
#[derive(Clone, Debug)]
pub struct Opts {
    /// Label used for directly supplied paths (ServerName column).
    pub server: String,
    /// Prefix for manifest logical paths (e.g. `\\server01` or a mount point).
    pub network_root: Option<PathBuf>,
    pub sink: SinkOpts,
    /// Probe worker count. When None, derived from available threads and the FD limit.
    pub num_threads: Option<usize>,
    /// Use the parallel walker (jwalk) instead of the serial one (walkdir).
    pub parallel_walk: bool,
    /// Follow symbolic links (loops are detected and skipped).
    pub follow_links: bool,
    /// Exclude patterns (glob syntax, name or full path).
    pub exclude: Vec<String>,
    /// Read Authors / LastSavedBy from Office documents.
    pub document_properties: bool,
    /// Manifest field delimiter.
    pub manifest_delimiter: u8,
    /// Show a progress counter.
    pub verbose: bool,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            server: String::new(),
            network_root: None,
            sink: SinkOpts::default(),
            num_threads: None,
            parallel_walk: false,
            follow_links: false,
            exclude: Vec::new(),
            document_properties: true,
            manifest_delimiter: DEFAULT_MANIFEST_DELIMITER,
            verbose: false,
        }
    }
}
