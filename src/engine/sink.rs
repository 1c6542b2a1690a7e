//! Record sink: pipe-delimited output segments, rotated by size.
//!
//! One writer owns the sink; the pipeline funnels every record to it over a channel, so the
//! check-then-rotate sequence in [`RecordSink::append`] never races.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::debug;

use crate::engine::tools::sanitize_field;
use crate::error::InventoryError;
use crate::utils::config::{FIELD_DELIMITER, HEADER_FIELDS, SEGMENT_EXTENSION, UTF8_BOM};
use crate::{FileRecord, SinkOpts};

/// Path of segment `index` (1-based) in the family described by `opts`.
pub fn segment_path(opts: &SinkOpts, index: u32) -> PathBuf {
    opts.output_dir.join(format!(
        "{}_{:03}.{}",
        opts.base_name, index, SEGMENT_EXTENSION
    ))
}

/// Index of `file_name` when it belongs to the segment family of `opts`.
fn segment_index(opts: &SinkOpts, file_name: &str) -> Option<u32> {
    let digits = file_name
        .strip_prefix(opts.base_name.as_str())?
        .strip_prefix('_')?
        .strip_suffix(SEGMENT_EXTENSION)?
        .strip_suffix('.')?;
    if digits.len() < 3 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Delete segment files of the same family from an earlier run. Segment 1 is truncated on open.
fn remove_stale_segments(opts: &SinkOpts) -> Result<(), InventoryError> {
    let entries = std::fs::read_dir(&opts.output_dir)
        .map_err(|e| InventoryError::output(&opts.output_dir, e))?;
    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(index) = name.to_str().and_then(|n| segment_index(opts, n)) else {
            continue;
        };
        if index < 2 || !entry.file_type().is_ok_and(|t| t.is_file()) {
            continue;
        }
        let path = entry.path();
        std::fs::remove_file(&path).map_err(|e| InventoryError::output(&path, e))?;
        debug!("Removed stale output segment {}", path.display());
    }
    Ok(())
}

/// BOM + header row, as written at the top of every segment.
pub fn segment_preamble() -> String {
    let mut s = String::from(UTF8_BOM);
    s.push_str(&HEADER_FIELDS.join(&FIELD_DELIMITER.to_string()));
    s.push('\n');
    s
}

/// One record as an output line (newline included). Every text field is sanitized here.
pub fn serialize_record(r: &FileRecord) -> String {
    let length = r.length.to_string();
    let fields = [
        sanitize_field(&r.server_name),
        sanitize_field(&r.full_name),
        sanitize_field(&r.date_created),
        sanitize_field(&r.date_modified),
        sanitize_field(&r.owner),
        sanitize_field(&r.authors),
        sanitize_field(&r.last_saved_by),
        length,
        sanitize_field(&r.extension),
        sanitize_field(&r.attributes),
        sanitize_field(&r.directory_name),
        sanitize_field(&r.name),
    ];
    let mut line = fields.join(&FIELD_DELIMITER.to_string());
    line.push('\n');
    line
}

/// The open segment: writer, bytes written so far and its sequence index.
struct OutputSegment {
    path: PathBuf,
    out: BufWriter<File>,
    bytes: u64,
    records: u64,
    index: u32,
}

impl OutputSegment {
    fn open(opts: &SinkOpts, index: u32) -> Result<Self, InventoryError> {
        let path = segment_path(opts, index);
        let file = File::create(&path).map_err(|e| InventoryError::output(&path, e))?;
        let mut seg = OutputSegment {
            path,
            out: BufWriter::new(file),
            bytes: 0,
            records: 0,
            index,
        };
        seg.write(segment_preamble().as_bytes())?;
        debug!("Opened output segment {}", seg.path.display());
        Ok(seg)
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), InventoryError> {
        self.out
            .write_all(bytes)
            .map_err(|e| InventoryError::output(&self.path, e))?;
        self.bytes += bytes.len() as u64;
        Ok(())
    }

    fn finish(mut self) -> Result<PathBuf, InventoryError> {
        self.out
            .flush()
            .map_err(|e| InventoryError::output(&self.path, e))?;
        let file = self
            .out
            .into_inner()
            .map_err(|e| InventoryError::output(&self.path, e.into_error()))?;
        file.sync_all()
            .map_err(|e| InventoryError::output(&self.path, e))?;
        Ok(self.path)
    }
}

/// Streams records into `<base>_NNN.csv` segments under the output directory.
pub struct RecordSink {
    opts: SinkOpts,
    segment: Option<OutputSegment>,
    segments: Vec<PathBuf>,
    records_written: u64,
    closed: bool,
}

impl RecordSink {
    /// Create the output directory if needed, delete segments left by an earlier run and open
    /// the first segment (header written).
    pub fn create(opts: SinkOpts) -> Result<Self, InventoryError> {
        std::fs::create_dir_all(&opts.output_dir)
            .map_err(|e| InventoryError::output(&opts.output_dir, e))?;
        remove_stale_segments(&opts)?;
        let first = OutputSegment::open(&opts, 1)?;
        Ok(Self {
            segments: vec![first.path.clone()],
            segment: Some(first),
            opts,
            records_written: 0,
            closed: false,
        })
    }

    /// Append one record, rotating first if it would push the segment past the size limit.
    pub fn append(&mut self, record: &FileRecord) -> Result<(), InventoryError> {
        let line = serialize_record(record);
        self.rotate_if_needed(line.len() as u64)?;
        let seg = self.segment.as_mut().ok_or(InventoryError::SinkClosed)?;
        seg.write(line.as_bytes())?;
        seg.records += 1;
        self.records_written += 1;
        Ok(())
    }

    /// Rotate when writing `next_len` more bytes would exceed the limit. A segment always takes
    /// at least one record, so a record larger than the limit gets a segment of its own.
    /// Returns true when a new segment was opened.
    pub fn rotate_if_needed(&mut self, next_len: u64) -> Result<bool, InventoryError> {
        if self.closed {
            return Err(InventoryError::SinkClosed);
        }
        let Some(seg) = self.segment.as_ref() else {
            return Err(InventoryError::SinkClosed);
        };
        if seg.records == 0 || seg.bytes + next_len <= self.opts.max_segment_bytes {
            return Ok(false);
        }
        let next_index = seg.index + 1;
        if let Some(full) = self.segment.take() {
            full.finish()?;
        }
        let next = OutputSegment::open(&self.opts, next_index)?;
        self.segments.push(next.path.clone());
        self.segment = Some(next);
        Ok(true)
    }

    /// Flush and close the current segment. Safe to call more than once.
    pub fn close(&mut self) -> Result<(), InventoryError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        if let Some(seg) = self.segment.take() {
            let path = seg.finish()?;
            debug!("Closed output segment {}", path.display());
        }
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Every segment opened so far, in order.
    pub fn segments(&self) -> &[PathBuf] {
        &self.segments
    }

    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    pub fn output_dir(&self) -> &Path {
        &self.opts.output_dir
    }
}

impl Drop for RecordSink {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::error!("closing output on drop: {}", e);
        }
    }
}
