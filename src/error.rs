//! Error taxonomy for inventory runs.

use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Classification carried by every failure event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    /// Target root missing or not enumerable. Makes the target eligible for retry.
    RootInaccessible,
    /// A directory below the root could not be enumerated; its subtree is skipped.
    DirectoryAccessDenied,
    /// A single file could not be stat'ed; no record is written for it.
    FileAccessDenied,
    /// Owner or document-property lookup failed; the affected fields are left empty.
    MetadataProbeFailed,
    /// The output could not be written. Aborts the run.
    OutputWriteFailed,
    /// A followed link points back to one of its ancestors; the link is skipped.
    SymlinkCycle,
}

impl ErrorKind {
    /// Node-level kinds are counted as skips and never fail the target.
    pub fn is_node_level(&self) -> bool {
        matches!(
            self,
            ErrorKind::DirectoryAccessDenied | ErrorKind::FileAccessDenied | ErrorKind::SymlinkCycle
        )
    }

    /// Whether a skip of this kind counts against directories (vs. files).
    pub fn counts_as_directory(&self) -> bool {
        matches!(
            self,
            ErrorKind::DirectoryAccessDenied | ErrorKind::SymlinkCycle
        )
    }
}

/// Errors that escape the core to the caller.
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("root inaccessible: {path}: {source}")]
    RootInaccessible {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("output write failed at {path}: {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("output sink is closed")]
    SinkClosed,

    #[error("invalid logical path {0:?}: no share segment")]
    InvalidLogicalPath(String),

    #[error("manifest {path}: {message}")]
    Manifest { path: PathBuf, message: String },
}

impl InventoryError {
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            InventoryError::RootInaccessible { .. } => Some(ErrorKind::RootInaccessible),
            InventoryError::OutputWriteFailed { .. } | InventoryError::SinkClosed => {
                Some(ErrorKind::OutputWriteFailed)
            }
            _ => None,
        }
    }

    /// Filesystem path the error is about, when it names one.
    pub fn path(&self) -> Option<&Path> {
        match self {
            InventoryError::RootInaccessible { path, .. }
            | InventoryError::OutputWriteFailed { path, .. }
            | InventoryError::Manifest { path, .. } => Some(path),
            _ => None,
        }
    }

    pub fn output(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        InventoryError::OutputWriteFailed {
            path: path.into(),
            source,
        }
    }
}

/// Field-level probe failures. Always degraded to empty fields by the probe.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("owner lookup unsupported on this platform")]
    OwnerUnsupported,

    #[error("owner lookup failed: {0}")]
    Owner(String),

    #[error("document package unreadable: {0}")]
    Package(#[from] zip::result::ZipError),

    #[error("document properties malformed: {0}")]
    Properties(#[from] roxmltree::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
