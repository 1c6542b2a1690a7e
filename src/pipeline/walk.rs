//! Common walk loop: consumes an iterator of [`WalkOutcome`], sends file paths to the probe
//! workers and records every failed node without stopping.

use crossbeam_channel::Sender;
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::engine::tools::should_include_in_walk;
use crate::error::ErrorKind;
use crate::utils::config::JWALK_BUSY_TIMEOUT_SECS;

use super::context::PipelineContext;

/// One result from a directory walk.
pub enum WalkOutcome {
    File(PathBuf),
    Dir(PathBuf),
    Err {
        kind: ErrorKind,
        msg: String,
        path: Option<PathBuf>,
    },
}

/// What the walk thread saw: files handed to the workers and directories entered (root excluded).
#[derive(Clone, Copy, Debug, Default)]
pub struct WalkCounts {
    pub files_sent: u64,
    pub dirs_seen: u64,
}

/// Classify a walker error. Loops come first; otherwise a path that is still a directory means
/// its listing failed, anything else is a single entry.
pub fn classify_walk_error(path: Option<&Path>, is_loop: bool) -> ErrorKind {
    if is_loop {
        return ErrorKind::SymlinkCycle;
    }
    match path {
        Some(p) => match std::fs::symlink_metadata(p) {
            Ok(meta) if meta.is_dir() => ErrorKind::DirectoryAccessDenied,
            Ok(_) => ErrorKind::FileAccessDenied,
            // Parent listed it but it can no longer be stat'ed: whatever was below it is lost.
            Err(_) => ErrorKind::DirectoryAccessDenied,
        },
        None => ErrorKind::DirectoryAccessDenied,
    }
}

/// Convert a walkdir result into [`WalkOutcome`].
pub fn to_outcome_walkdir(r: Result<walkdir::DirEntry, walkdir::Error>) -> WalkOutcome {
    match r {
        Ok(entry) if entry.file_type().is_dir() => WalkOutcome::Dir(entry.into_path()),
        Ok(entry) => WalkOutcome::File(entry.into_path()),
        Err(err) => WalkOutcome::Err {
            kind: classify_walk_error(err.path(), err.loop_ancestor().is_some()),
            msg: format!("{}", err),
            path: err.path().map(PathBuf::from),
        },
    }
}

/// Convert a jwalk result into [`WalkOutcome`].
pub fn to_outcome_jwalk(r: Result<jwalk::DirEntry<((), ())>, jwalk::Error>) -> WalkOutcome {
    match r {
        Ok(entry) if entry.file_type().is_dir() => WalkOutcome::Dir(entry.path()),
        Ok(entry) => WalkOutcome::File(entry.path()),
        Err(err) => WalkOutcome::Err {
            kind: classify_walk_error(err.path(), err.loop_ancestor().is_some()),
            msg: format!("{}", err),
            path: err.path().map(PathBuf::from),
        },
    }
}

/// Serial walker. Excluded names are pruned before descending.
pub fn walkdir_iter(
    root: &Path,
    follow_links: bool,
    exclude: Vec<String>,
) -> Box<dyn Iterator<Item = WalkOutcome>> {
    let root_w = root.to_path_buf();
    Box::new(
        walkdir::WalkDir::new(root)
            .follow_links(follow_links)
            .into_iter()
            .filter_entry(move |e| should_include_in_walk(e.path(), &root_w, &exclude))
            .map(to_outcome_walkdir),
    )
}

/// Parallel walker (rayon pool). Excluded names are pruned per directory listing.
pub fn jwalk_iter(
    root: &Path,
    follow_links: bool,
    exclude: Vec<String>,
) -> Box<dyn Iterator<Item = WalkOutcome>> {
    use jwalk::Parallelism;
    let root_w = root.to_path_buf();
    Box::new(
        jwalk::WalkDir::new(root)
            .follow_links(follow_links)
            .parallelism(Parallelism::RayonDefaultPool {
                busy_timeout: Duration::from_secs(JWALK_BUSY_TIMEOUT_SECS),
            })
            .process_read_dir(move |_depth, _path, _state, children| {
                children.retain(|child| match child {
                    Ok(entry) => should_include_in_walk(&entry.path(), &root_w, &exclude),
                    Err(_) => true,
                });
            })
            .into_iter()
            .map(to_outcome_jwalk),
    )
}

/// Builds the outcome iterator on the walk thread (walker iterators need not be `Send`).
pub type WalkSource = Box<dyn FnOnce() -> Box<dyn Iterator<Item = WalkOutcome>> + Send>;

/// Walk source for a real directory tree: jwalk when `parallel`, walkdir otherwise.
pub fn tree_walk_source(
    root: &Path,
    follow_links: bool,
    exclude: Vec<String>,
    parallel: bool,
) -> WalkSource {
    let root = root.to_path_buf();
    Box::new(move || match parallel {
        true => jwalk_iter(&root, follow_links, exclude),
        false => walkdir_iter(&root, follow_links, exclude),
    })
}

pub fn spawn_walk_thread(
    path_tx: Sender<PathBuf>,
    ctx: PipelineContext,
    source: WalkSource,
) -> JoinHandle<WalkCounts> {
    thread::spawn(move || {
        let iter = source();
        run_walk_loop(path_tx, ctx, iter)
    })
}

/// Run the common walk loop: consume `iter`, send file paths to `path_tx`, record errors in the
/// skip log and keep going. Stops early on cancel/abort or when the workers are gone.
/// Drops `path_tx` when done so workers see the channel close.
pub fn run_walk_loop<I>(path_tx: Sender<PathBuf>, ctx: PipelineContext, iter: I) -> WalkCounts
where
    I: Iterator<Item = WalkOutcome>,
{
    let mut counts = WalkCounts::default();
    let mut last_path: Option<PathBuf> = None;
    for outcome in iter {
        if ctx.should_stop() {
            break;
        }
        match outcome {
            WalkOutcome::File(path) => {
                last_path = Some(path.clone());
                if path_tx.send(path).is_err() {
                    break;
                }
                counts.files_sent += 1;
            }
            WalkOutcome::Dir(path) => {
                if path != ctx.root {
                    counts.dirs_seen += 1;
                }
                last_path = Some(path);
            }
            WalkOutcome::Err { kind, msg, path } => {
                // Errors with no path still count; name them after the last path seen.
                let path = path.unwrap_or_else(|| {
                    PathBuf::from(format!(
                        "<no-path, last was {}>",
                        last_path
                            .as_ref()
                            .map(|p| p.display().to_string())
                            .unwrap_or_else(|| "<none>".to_string())
                    ))
                });
                ctx.skips.record(kind, path, msg);
            }
        }
    }
    drop(path_tx);
    counts
}
