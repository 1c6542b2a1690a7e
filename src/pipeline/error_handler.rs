//! Node-level failure bookkeeping shared by the walk thread and probe workers.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::error::ErrorKind;
use crate::events::{EventSink, ScanEvent};

/// One node skipped during a traversal.
#[derive(Clone, Debug)]
pub struct SkippedNode {
    pub kind: ErrorKind,
    pub path: PathBuf,
    pub message: String,
}

/// Records skips for one traversal attempt and emits a [`ScanEvent::NodeFailed`] for each.
pub struct SkipLog {
    label: String,
    events: Arc<dyn EventSink>,
    nodes: Mutex<Vec<SkippedNode>>,
}

impl SkipLog {
    pub fn new(label: &str, events: Arc<dyn EventSink>) -> Self {
        Self {
            label: label.to_string(),
            events,
            nodes: Mutex::new(Vec::new()),
        }
    }

    pub fn record(&self, kind: ErrorKind, path: PathBuf, message: String) {
        self.events
            .emit(&ScanEvent::node_failed(&self.label, &path, kind, &message));
        let node = SkippedNode {
            kind,
            path,
            message,
        };
        match self.nodes.lock() {
            Ok(mut nodes) => nodes.push(node),
            Err(poisoned) => poisoned.into_inner().push(node),
        }
    }

    /// `(files_skipped, dirs_skipped)`.
    pub fn counts(&self) -> (u64, u64) {
        let nodes = match self.nodes.lock() {
            Ok(nodes) => nodes,
            Err(poisoned) => poisoned.into_inner(),
        };
        let dirs = nodes.iter().filter(|n| n.kind.counts_as_directory()).count() as u64;
        (nodes.len() as u64 - dirs, dirs)
    }

    pub fn nodes(&self) -> Vec<SkippedNode> {
        match self.nodes.lock() {
            Ok(nodes) => nodes.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

/// Log a one-line summary of skipped nodes after a traversal; list them when `verbose`.
pub fn log_skipped_summary(label: &str, skips: &SkipLog, verbose: bool) {
    let (files, dirs) = skips.counts();
    if files + dirs == 0 {
        return;
    }
    log::warn!(
        "[{}] Skipped {} files and {} directories due to permission errors or access issues",
        label,
        files,
        dirs
    );
    if verbose {
        for n in skips.nodes() {
            eprintln!("  skipped ({:?}): {}", n.kind, n.path.display());
        }
    }
}
