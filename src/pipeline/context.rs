//! Pipeline context: shared data passed into the walk thread and probe workers.

use crossbeam_channel::{Receiver, Sender, bounded};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

use crate::FileRecord;

use super::error_handler::SkipLog;
use super::walk::WalkCounts;

/// Shared context for the walk + probe pipeline of one traversal attempt.
#[derive(Clone)]
pub struct PipelineContext {
    pub label: String,
    pub root: PathBuf,
    pub skips: Arc<SkipLog>,
    /// Set externally (Ctrl+C).
    pub cancel: Arc<AtomicBool>,
    /// Set by the consumer when the sink failed; stops the walk early.
    pub abort: Arc<AtomicBool>,
}

impl PipelineContext {
    pub fn should_stop(&self) -> bool {
        self.cancel.load(Ordering::Relaxed) || self.abort.load(Ordering::Relaxed)
    }
}

/// Handles returned by [`run_pipeline`](super::run_pipeline): receive records and join when done.
pub struct PipelineHandles {
    pub record_rx: Receiver<FileRecord>,
    pub walk_handle: JoinHandle<WalkCounts>,
    pub worker_handles: Vec<JoinHandle<()>>,
    pub skips: Arc<SkipLog>,
    pub abort: Arc<AtomicBool>,
}

/// Channels for the pipeline. Walk thread gets `path_tx`; workers get `path_rx` and `record_tx`.
pub struct PipelineChannels {
    pub path_tx: Sender<PathBuf>,
    pub path_rx: Receiver<PathBuf>,
    pub record_tx: Sender<FileRecord>,
    pub record_rx: Receiver<FileRecord>,
}

pub fn create_pipeline_channels(channel_cap: usize) -> PipelineChannels {
    let (path_tx, path_rx) = bounded::<PathBuf>(channel_cap);
    let (record_tx, record_rx) = bounded::<FileRecord>(channel_cap);
    PipelineChannels {
        path_tx,
        path_rx,
        record_tx,
        record_rx,
    }
}

pub fn create_pipeline_context(
    label: &str,
    root: &Path,
    skips: Arc<SkipLog>,
    cancel: Arc<AtomicBool>,
) -> PipelineContext {
    PipelineContext {
        label: label.to_string(),
        root: root.to_path_buf(),
        skips,
        cancel,
        abort: Arc::new(AtomicBool::new(false)),
    }
}
