//! Batch runner: every target through the traversal engine into one record sink, then one retry
//! pass over the targets whose root was inaccessible.

use anyhow::{Context, Result};
use chrono::Utc;
use log::{debug, warn};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::{Duration, Instant};

use crate::engine::progress::{ProgressBar, set_bar_desc, update_progress_bar};
use crate::engine::sink::RecordSink;
use crate::engine::traverse::TraversalEngine;
use crate::error::{ErrorKind, InventoryError};
use crate::events::{EventSink, ScanEvent};
use crate::{
    BatchReport, Opts, ScanTarget, TargetReport, TargetStatus, TraversalOutcome, TraversalStatus,
};

/// Drives [`TraversalEngine`] over a list of targets.
pub struct BatchRunner {
    engine: TraversalEngine,
    sink: RecordSink,
    events: Arc<dyn EventSink>,
    progress: Option<ProgressBar>,
}

impl BatchRunner {
    /// Engine from `opts`, sink opened at `opts.sink` (first segment created immediately).
    pub fn new(opts: &Opts, events: Arc<dyn EventSink>) -> Result<Self> {
        let sink = RecordSink::create(opts.sink.clone()).with_context(|| {
            format!("open output in {}", opts.sink.output_dir.display())
        })?;
        let engine = TraversalEngine::new(opts, Arc::clone(&events));
        Ok(Self::from_parts(engine, sink, events))
    }

    pub fn from_parts(engine: TraversalEngine, sink: RecordSink, events: Arc<dyn EventSink>) -> Self {
        Self {
            engine,
            sink,
            events,
            progress: None,
        }
    }

    pub fn with_cancel(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.engine = self.engine.with_cancel(cancel);
        self
    }

    /// Advance `bar` once per record written.
    pub fn with_progress(mut self, bar: ProgressBar) -> Self {
        self.progress = Some(bar);
        self
    }

    /// Run both passes and close the sink.
    ///
    /// Returns `Err` only when the sink fails (the run is aborted; the sink is still closed).
    /// The failure is also emitted as an `OutputWriteFailed` event.
    /// Root failures end up in the report as `RetryExhausted`, never as an error.
    pub fn run(mut self, targets: Vec<ScanTarget>) -> Result<BatchReport> {
        let start = Instant::now();
        let mut reports: Vec<TargetReport> = targets
            .into_iter()
            .map(|target| TargetReport {
                target,
                outcomes: Vec::new(),
            })
            .collect();

        let passes = self.run_passes(&mut reports);
        let closed = self.sink.close();
        let cancelled = passes?;
        if let Err(e) = &closed {
            let output_dir = self.sink.output_dir().to_path_buf();
            self.events.emit(&output_failed("", &output_dir, e));
        }
        closed.context("close output")?;

        let mut report = BatchReport {
            segments: self.sink.segments().to_vec(),
            cancelled,
            elapsed: start.elapsed(),
            ..Default::default()
        };
        for outcome in reports.iter().flat_map(|r| &r.outcomes) {
            report.files_visited += outcome.files_visited;
            report.files_skipped += outcome.files_skipped;
            report.dirs_skipped += outcome.dirs_skipped;
        }
        report.targets = reports;

        self.events.emit(&ScanEvent::BatchCompleted {
            timestamp: Utc::now(),
            targets: report.targets.len(),
            succeeded: report.count_with_status(TargetStatus::Succeeded),
            retry_exhausted: report.count_with_status(TargetStatus::RetryExhausted),
            files_visited: report.files_visited,
            files_skipped: report.files_skipped,
            dirs_skipped: report.dirs_skipped,
            elapsed_ms: report.elapsed.as_millis() as u64,
            cancelled,
        });
        Ok(report)
    }

    /// Main pass, then the retry pass. Returns true when stopped by cancellation.
    fn run_passes(&mut self, reports: &mut [TargetReport]) -> Result<bool> {
        for report in reports.iter_mut() {
            if self.engine.is_cancelled() {
                return Ok(true);
            }
            self.attempt(report)?;
        }

        let failed = reports
            .iter()
            .filter(|r| r.target.status == TargetStatus::Failed)
            .count();
        if failed > 0 {
            debug!("Retrying {} failed target(s)", failed);
        }
        for report in reports
            .iter_mut()
            .filter(|r| r.target.status == TargetStatus::Failed)
        {
            if self.engine.is_cancelled() {
                return Ok(true);
            }
            self.attempt(report)?;
        }
        Ok(self.engine.is_cancelled())
    }

    /// One traversal attempt of one target; updates its status and records the outcome.
    fn attempt(&mut self, report: &mut TargetReport) -> Result<()> {
        let target = &mut report.target;
        target.attempts += 1;
        let display_root = target.display_root();
        self.events.emit(&ScanEvent::ScanStarted {
            timestamp: Utc::now(),
            label: target.label.clone(),
            root: display_root.clone(),
            attempt: target.attempts,
        });
        if let Some(bar) = &self.progress {
            set_bar_desc(bar, &target.label);
        }

        let outcome = match &target.root {
            Some(root) => {
                let sink = &mut self.sink;
                let output_dir = sink.output_dir().to_path_buf();
                let events = self.events.as_ref();
                let progress = self.progress.as_ref();
                let label = target.label.as_str();
                self.engine.walk(label, root, |record| {
                    if let Err(e) = sink.append(&record) {
                        events.emit(&output_failed(label, &output_dir, &e));
                        return Err(e);
                    }
                    if let Some(bar) = progress {
                        update_progress_bar(bar, 1);
                    }
                    Ok(())
                })?
            }
            None => {
                let message = target
                    .resolve_error
                    .clone()
                    .unwrap_or_else(|| "no root".to_string());
                self.events.emit(&ScanEvent::node_failed(
                    &target.label,
                    display_root.as_str(),
                    ErrorKind::RootInaccessible,
                    message,
                ));
                TraversalOutcome::root_inaccessible(Duration::ZERO)
            }
        };

        target.status = next_status(target.status, outcome.status);
        if target.status == TargetStatus::RetryExhausted {
            warn!(
                "[{}] {} still inaccessible after retry",
                target.label, display_root
            );
        }
        self.events.emit(&ScanEvent::TargetCompleted {
            timestamp: Utc::now(),
            label: target.label.clone(),
            root: display_root,
            attempt: target.attempts,
            status: target.status,
            outcome: outcome.clone(),
        });
        report.outcomes.push(outcome);
        Ok(())
    }
}

/// `NodeFailed` event for a sink failure, located at the failing segment when known.
fn output_failed(label: &str, output_dir: &Path, e: &InventoryError) -> ScanEvent {
    ScanEvent::node_failed(
        label,
        e.path().unwrap_or(output_dir),
        ErrorKind::OutputWriteFailed,
        e.to_string(),
    )
}

/// Status after one attempt. A cancelled attempt leaves the status unchanged.
pub fn next_status(current: TargetStatus, traversal: TraversalStatus) -> TargetStatus {
    match (traversal, current) {
        (TraversalStatus::Completed, _) => TargetStatus::Succeeded,
        (TraversalStatus::RootInaccessible, TargetStatus::Failed) => TargetStatus::RetryExhausted,
        (TraversalStatus::RootInaccessible, _) => TargetStatus::Failed,
        (TraversalStatus::Cancelled, status) => status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_machine_transitions() {
        use TargetStatus::*;
        assert_eq!(next_status(Pending, TraversalStatus::Completed), Succeeded);
        assert_eq!(next_status(Pending, TraversalStatus::RootInaccessible), Failed);
        assert_eq!(next_status(Failed, TraversalStatus::Completed), Succeeded);
        assert_eq!(
            next_status(Failed, TraversalStatus::RootInaccessible),
            RetryExhausted
        );
        assert_eq!(next_status(Pending, TraversalStatus::Cancelled), Pending);
    }
}
