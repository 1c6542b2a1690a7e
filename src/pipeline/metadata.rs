use crossbeam_channel::{Receiver, Sender};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::FileRecord;
use crate::engine::probe::MetadataProbe;
use crate::error::ErrorKind;

use super::context::PipelineContext;

/// Single probe worker: read paths from path_rx, probe each, send records on record_tx.
/// A file whose stat fails is recorded as skipped; the worker moves on.
fn probe_worker_loop(
    path_rx: Receiver<PathBuf>,
    record_tx: Sender<FileRecord>,
    probe: Arc<MetadataProbe>,
    ctx: PipelineContext,
) {
    while let Ok(path) = path_rx.recv() {
        if ctx.should_stop() {
            break;
        }
        match probe.probe(&ctx.label, &path) {
            Ok(record) => {
                if record_tx.send(record).is_err() {
                    break;
                }
            }
            Err(e) => ctx
                .skips
                .record(ErrorKind::FileAccessDenied, path, e.to_string()),
        }
    }
    drop(record_tx);
}

/// Spawn probe workers. Caller must drop its own `record_tx` after this so the record channel
/// closes once every worker is done.
pub fn spawn_probe_workers(
    path_rx: Receiver<PathBuf>,
    record_tx: &Sender<FileRecord>,
    probe: &Arc<MetadataProbe>,
    ctx: &PipelineContext,
    num_threads: usize,
) -> Vec<JoinHandle<()>> {
    (0..num_threads.max(1))
        .map(|_| {
            let path_rx = path_rx.clone();
            let record_tx = record_tx.clone();
            let probe = Arc::clone(probe);
            let ctx = ctx.clone();
            thread::spawn(move || probe_worker_loop(path_rx, record_tx, probe, ctx))
        })
        .collect()
}
