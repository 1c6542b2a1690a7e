use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::thread::JoinHandle;

use crate::engine::probe::MetadataProbe;
use crate::pipeline;
use crate::utils::config::STREAMING_CHANNEL_CAP;

use super::error_handler::SkipLog;
use super::walk::{WalkCounts, WalkSource};

/// Start the walk + probe pipeline for one root. Returns the record receiver and handles;
/// the caller drains `record_rx`, drops it, then joins via [`shutdown_pipeline_handles`].
pub fn run_pipeline(
    label: &str,
    root: &Path,
    source: WalkSource,
    probe: &Arc<MetadataProbe>,
    skips: Arc<SkipLog>,
    cancel: Arc<AtomicBool>,
    num_threads: usize,
) -> pipeline::PipelineHandles {
    let channels = pipeline::create_pipeline_channels(STREAMING_CHANNEL_CAP);
    let ctx = pipeline::create_pipeline_context(label, root, Arc::clone(&skips), cancel);
    let abort = Arc::clone(&ctx.abort);

    let worker_handles = pipeline::spawn_probe_workers(
        channels.path_rx,
        &channels.record_tx,
        probe,
        &ctx,
        num_threads,
    );
    let walk_handle = pipeline::spawn_walk_thread(channels.path_tx, ctx, source);

    // Dropping the last sender closes the channel once workers exit.
    drop(channels.record_tx);

    pipeline::PipelineHandles {
        record_rx: channels.record_rx,
        walk_handle,
        worker_handles,
        skips,
        abort,
    }
}

/// Join walk and worker threads (after the record stream is drained or dropped).
pub fn shutdown_pipeline_handles(
    walk_handle: JoinHandle<WalkCounts>,
    worker_handles: Vec<JoinHandle<()>>,
) -> Result<WalkCounts> {
    let counts = walk_handle
        .join()
        .map_err(|_| anyhow::anyhow!("walk thread panicked"))?;
    for h in worker_handles {
        h.join()
            .map_err(|_| anyhow::anyhow!("probe worker panicked"))?;
    }
    Ok(counts)
}
