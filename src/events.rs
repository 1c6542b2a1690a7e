//! Structured events emitted by the core: per-node failures and run lifecycle.
//!
//! The core never decides where events go. It calls [`EventSink::emit`]; the CLI wires up
//! [`LogEvents`] and optionally [`JsonLinesEvents`] behind a [`FanOut`].

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::ErrorKind;
use crate::types::{TargetStatus, TraversalOutcome};

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ScanEvent {
    ScanStarted {
        timestamp: DateTime<Utc>,
        label: String,
        root: String,
        attempt: u32,
    },
    NodeFailed {
        timestamp: DateTime<Utc>,
        label: String,
        #[serde(serialize_with = "serialize_path_lossy")]
        path: PathBuf,
        kind: ErrorKind,
        message: String,
    },
    ManifestRowSkipped {
        timestamp: DateTime<Utc>,
        #[serde(serialize_with = "serialize_path_lossy")]
        manifest: PathBuf,
        line: usize,
        message: String,
    },
    TargetCompleted {
        timestamp: DateTime<Utc>,
        label: String,
        root: String,
        attempt: u32,
        status: TargetStatus,
        outcome: TraversalOutcome,
    },
    BatchCompleted {
        timestamp: DateTime<Utc>,
        targets: usize,
        succeeded: usize,
        retry_exhausted: usize,
        files_visited: u64,
        files_skipped: u64,
        dirs_skipped: u64,
        elapsed_ms: u64,
        cancelled: bool,
    },
}

/// Paths are written as text; bytes that are not valid UTF-8 become U+FFFD.
fn serialize_path_lossy<P: AsRef<Path>, S: Serializer>(
    path: &P,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&path.as_ref().to_string_lossy())
}

impl ScanEvent {
    pub fn node_failed(
        label: &str,
        path: impl Into<PathBuf>,
        kind: ErrorKind,
        message: impl Into<String>,
    ) -> Self {
        ScanEvent::NodeFailed {
            timestamp: Utc::now(),
            label: label.to_string(),
            path: path.into(),
            kind,
            message: message.into(),
        }
    }

    /// Failure kind, for events that carry one.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            ScanEvent::NodeFailed { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// Receiver of structured events. Called from the walk thread and probe workers concurrently.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &ScanEvent);
}

/// Writes events through the `log` facade: failures at warn, lifecycle at info/debug.
#[derive(Default)]
pub struct LogEvents;

impl EventSink for LogEvents {
    fn emit(&self, event: &ScanEvent) {
        match event {
            ScanEvent::ScanStarted {
                label,
                root,
                attempt,
                ..
            } => log::info!("[{}] scanning {} (attempt {})", label, root, attempt),
            ScanEvent::NodeFailed {
                label,
                path,
                kind,
                message,
                ..
            } => match kind {
                ErrorKind::MetadataProbeFailed => {
                    log::debug!("[{}] {:?} {}: {}", label, kind, path.display(), message)
                }
                _ => log::warn!("[{}] {:?} {}: {}", label, kind, path.display(), message),
            },
            ScanEvent::ManifestRowSkipped {
                manifest,
                line,
                message,
                ..
            } => log::warn!("{}:{}: row skipped: {}", manifest.display(), line, message),
            ScanEvent::TargetCompleted {
                label,
                root,
                status,
                outcome,
                ..
            } => log::info!(
                "[{}] {} -> {:?}: {} files, {} files skipped, {} dirs skipped in {:?}",
                label,
                root,
                status,
                outcome.files_visited,
                outcome.files_skipped,
                outcome.dirs_skipped,
                outcome.elapsed
            ),
            ScanEvent::BatchCompleted {
                targets,
                succeeded,
                retry_exhausted,
                files_visited,
                elapsed_ms,
                ..
            } => log::info!(
                "Batch complete: {} targets ({} succeeded, {} failed after retry), {} files in {} ms",
                targets,
                succeeded,
                retry_exhausted,
                files_visited,
                elapsed_ms
            ),
        }
    }
}

/// One JSON object per line, appended to a file.
pub struct JsonLinesEvents {
    path: PathBuf,
    out: Mutex<BufWriter<File>>,
}

impl JsonLinesEvents {
    pub fn create(path: &Path) -> std::io::Result<Self> {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            out: Mutex::new(BufWriter::new(file)),
        })
    }

    pub fn flush(&self) -> std::io::Result<()> {
        match self.out.lock() {
            Ok(mut out) => out.flush(),
            Err(poisoned) => poisoned.into_inner().flush(),
        }
    }
}

impl EventSink for JsonLinesEvents {
    fn emit(&self, event: &ScanEvent) {
        let Ok(mut out) = self.out.lock() else {
            return;
        };
        let written = serde_json::to_vec(event)
            .map_err(std::io::Error::from)
            .and_then(|mut line| {
                line.push(b'\n');
                out.write_all(&line)
            });
        if let Err(e) = written {
            log::error!("event log {}: {}", self.path.display(), e);
        }
    }
}

impl Drop for JsonLinesEvents {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

/// Forwards every event to each inner sink.
#[derive(Default)]
pub struct FanOut {
    sinks: Vec<Box<dyn EventSink>>,
}

impl FanOut {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: impl EventSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }
}

impl EventSink for FanOut {
    fn emit(&self, event: &ScanEvent) {
        for sink in &self.sinks {
            sink.emit(event);
        }
    }
}

/// Keeps every event in memory. Useful for callers that want to inspect failures after a run.
#[derive(Default)]
pub struct CollectEvents {
    events: Mutex<Vec<ScanEvent>>,
}

impl CollectEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ScanEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Failure events of one kind.
    pub fn of_kind(&self, kind: ErrorKind) -> Vec<ScanEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.kind() == Some(kind))
            .collect()
    }
}

impl EventSink for CollectEvents {
    fn emit(&self, event: &ScanEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
