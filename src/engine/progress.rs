//! Progress counter for the CLI (record count; total is unknown while walking).

use kdam::{Animation, Bar, BarExt};
use std::sync::{Arc, Mutex};

pub type ProgressBar = Arc<Mutex<Bar>>;

/// Counter with no total (shows count and rate, no percentage).
pub fn create_counter(desc: &'static str) -> ProgressBar {
    Arc::new(Mutex::new(kdam::tqdm!(
        total = 0,
        desc = desc,
        animation = Animation::Classic,
        position = 0,
        unit = " files"
    )))
}

/// Advance the bar by `n`. Uses try_lock so a contended bar never blocks the caller.
pub fn update_progress_bar(pb: &ProgressBar, n: usize) {
    if let Ok(mut pb) = pb.try_lock() {
        let _ = pb.update(n);
    }
}

/// Change the description shown in front of the counter (current target label).
pub fn set_bar_desc(pb: &ProgressBar, desc: &str) {
    if let Ok(mut bar) = pb.try_lock() {
        bar.desc = desc.to_string();
        let _ = bar.refresh();
    }
}

/// Refresh and leave the bar on its own line.
pub fn finish_bar(pb: &ProgressBar) {
    if let Ok(mut bar) = pb.lock() {
        let _ = bar.refresh();
        eprintln!();
    }
}
