//! Traversal of one root: root check, then the walk + probe pipeline, with every record handed
//! to the caller's visitor on the calling thread.

use anyhow::Result;
use log::debug;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use crate::engine::probe::MetadataProbe;
use crate::error::{ErrorKind, InventoryError};
use crate::events::{EventSink, ScanEvent};
use crate::pipeline::{
    self, PipelineHandles, SkipLog, WalkSource, log_skipped_summary, shutdown_pipeline_handles,
    tree_walk_source,
};
use crate::utils::config::WorkerThreadLimits;
use crate::utils::fd_limit::determine_threads_given_fd_limit;
use crate::{FileRecord, Opts, TraversalOutcome, TraversalStatus};

/// Check that `root` exists, is a directory and can be listed.
pub fn check_root(root: &Path) -> Result<(), InventoryError> {
    let fail = |source| InventoryError::RootInaccessible {
        path: root.to_path_buf(),
        source,
    };
    let meta = std::fs::metadata(root).map_err(fail)?;
    if !meta.is_dir() {
        return Err(fail(std::io::Error::other("not a directory")));
    }
    std::fs::read_dir(root).map_err(fail)?;
    Ok(())
}

/// Walks roots with per-node failure isolation.
pub struct TraversalEngine {
    probe: Arc<MetadataProbe>,
    events: Arc<dyn EventSink>,
    cancel: Arc<AtomicBool>,
    num_threads: usize,
    follow_links: bool,
    parallel_walk: bool,
    exclude: Vec<String>,
    verbose: bool,
}

impl TraversalEngine {
    pub fn new(opts: &Opts, events: Arc<dyn EventSink>) -> Self {
        let requested = opts
            .num_threads
            .unwrap_or_else(|| WorkerThreadLimits::current().default_workers());
        let num_threads = determine_threads_given_fd_limit(requested);
        debug!("Probe workers: {}", num_threads);
        let probe =
            MetadataProbe::with_defaults(opts.document_properties, opts.follow_links, Arc::clone(&events));
        Self {
            probe: Arc::new(probe),
            events,
            cancel: Arc::new(AtomicBool::new(false)),
            num_threads,
            follow_links: opts.follow_links,
            parallel_walk: opts.parallel_walk,
            exclude: opts.exclude.clone(),
            verbose: opts.verbose,
        }
    }

    /// Replace the metadata probe (e.g. a custom document-property provider).
    pub fn with_probe(mut self, probe: MetadataProbe) -> Self {
        self.probe = Arc::new(probe);
        self
    }

    /// Share a cancellation flag (Ctrl+C). When set, walks stop and report `Cancelled`.
    pub fn with_cancel(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    /// Walk `root`, calling `visit` for every probed file.
    ///
    /// An inaccessible root returns `RootInaccessible` with zero visits. Directory and file
    /// failures below the root are counted and skipped. An error from `visit` (the sink) stops
    /// the walk and is returned.
    pub fn walk<F>(&self, label: &str, root: &Path, visit: F) -> Result<TraversalOutcome>
    where
        F: FnMut(FileRecord) -> Result<(), InventoryError>,
    {
        let source = tree_walk_source(
            root,
            self.follow_links,
            self.exclude.clone(),
            self.parallel_walk,
        );
        self.walk_source(label, root, source, visit)
    }

    /// Same as [`walk`](Self::walk) with a caller-supplied walk source. The root check still
    /// runs against the real filesystem.
    pub fn walk_source<F>(
        &self,
        label: &str,
        root: &Path,
        source: WalkSource,
        mut visit: F,
    ) -> Result<TraversalOutcome>
    where
        F: FnMut(FileRecord) -> Result<(), InventoryError>,
    {
        let start = Instant::now();
        if let Err(e) = check_root(root) {
            self.events.emit(&ScanEvent::node_failed(
                label,
                root,
                ErrorKind::RootInaccessible,
                e.to_string(),
            ));
            return Ok(TraversalOutcome::root_inaccessible(start.elapsed()));
        }

        let skips = Arc::new(SkipLog::new(label, Arc::clone(&self.events)));
        let PipelineHandles {
            record_rx,
            walk_handle,
            worker_handles,
            skips,
            abort,
        } = pipeline::run_pipeline(
            label,
            root,
            source,
            &self.probe,
            skips,
            Arc::clone(&self.cancel),
            self.num_threads,
        );

        let mut files_visited = 0_u64;
        let mut sink_error = None;
        while let Ok(record) = record_rx.recv() {
            if let Err(e) = visit(record) {
                abort.store(true, Ordering::Relaxed);
                sink_error = Some(e);
                break;
            }
            files_visited += 1;
        }
        // Workers blocked on a full record channel need the receiver gone to exit.
        drop(record_rx);

        let counts = shutdown_pipeline_handles(walk_handle, worker_handles)?;
        if let Some(e) = sink_error {
            return Err(e.into());
        }
        debug!(
            "[{}] walk done: {} files sent, {} dirs, {} records",
            label, counts.files_sent, counts.dirs_seen, files_visited
        );
        log_skipped_summary(label, &skips, self.verbose);

        let (files_skipped, dirs_skipped) = skips.counts();
        let status = if self.is_cancelled() {
            TraversalStatus::Cancelled
        } else {
            TraversalStatus::Completed
        };
        Ok(TraversalOutcome {
            files_visited,
            files_skipped,
            dirs_visited: counts.dirs_seen,
            dirs_skipped,
            status,
            elapsed: start.elapsed(),
        })
    }
}
