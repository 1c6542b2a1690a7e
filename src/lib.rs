//! Shareinv: resilient file inventory of network shares, streamed to rotating pipe-delimited files

pub mod batch;
pub mod engine;
pub mod error;
pub mod events;
pub mod manifest;
pub mod pipeline;
pub mod types;
pub mod utils;

/// Re-export types for API
pub use types::*;

pub use batch::BatchRunner;
pub use error::{ErrorKind, InventoryError};
pub use events::{EventSink, ScanEvent};

use log::debug;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Result alias used by public shareinv API
pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Inventory `roots` (each labeled with `opts.server`) into `opts.sink`.
///
/// Inaccessible roots are retried once and reported as `RetryExhausted`; only an output failure
/// returns `Err`.
pub fn inventory(
    roots: &[PathBuf],
    opts: &Opts,
    events: Arc<dyn EventSink>,
) -> Result<BatchReport> {
    debug!("{} CONFIG:{:#?}", env!("CARGO_PKG_NAME").to_uppercase(), opts);
    let targets = roots
        .iter()
        .map(|root| ScanTarget::from_path(opts.server.clone(), root.clone()))
        .collect();
    BatchRunner::new(opts, events)?.run(targets)
}

/// Read a manifest, resolve its rows against `opts.network_root`, and inventory every target.
pub fn inventory_manifest(
    manifest: &Path,
    opts: &Opts,
    events: Arc<dyn EventSink>,
) -> Result<BatchReport> {
    debug!("{} CONFIG:{:#?}", env!("CARGO_PKG_NAME").to_uppercase(), opts);
    let rows = manifest::read_manifest(manifest, opts.manifest_delimiter, events.as_ref())?;
    let targets = manifest::targets_from_rows(rows, opts.network_root.as_deref());
    BatchRunner::new(opts, events)?.run(targets)
}
