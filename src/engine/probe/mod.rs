//! Metadata probe: turns one file path into a [`FileRecord`].
//!
//! Required fields come from one stat call and are always present. Owner and document
//! properties are looked up separately; when either fails the affected fields are left empty,
//! a [`ErrorKind::MetadataProbeFailed`] event is emitted and the record is still produced.

pub mod docprops;
pub mod owner;
pub mod stat;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::FileRecord;
use crate::engine::tools::{extension_with_dot, path_string};
use crate::error::{ErrorKind, ProbeError};
use crate::events::{EventSink, ScanEvent};

pub use docprops::{
    DocumentProperties, DocumentPropertyProvider, NoDocumentProperties, OfficeDocumentProperties,
};
pub use owner::{OwnerProvider, OwnerResolver};
pub use stat::{RequiredFields, attribute_names, format_time, required_fields};

/// Shared by all probe workers of a run.
pub struct MetadataProbe {
    owners: Box<dyn OwnerProvider>,
    documents: Box<dyn DocumentPropertyProvider>,
    follow_links: bool,
    events: Arc<dyn EventSink>,
    owner_unsupported_reported: AtomicBool,
}

impl MetadataProbe {
    pub fn new(
        documents: Box<dyn DocumentPropertyProvider>,
        follow_links: bool,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            owners: Box::new(OwnerResolver::new()),
            documents,
            follow_links,
            events,
            owner_unsupported_reported: AtomicBool::new(false),
        }
    }

    /// Replace the platform owner lookup.
    pub fn with_owner_provider(mut self, owners: Box<dyn OwnerProvider>) -> Self {
        self.owners = owners;
        self
    }

    /// Probe with the provider chosen by `document_properties`.
    pub fn with_defaults(
        document_properties: bool,
        follow_links: bool,
        events: Arc<dyn EventSink>,
    ) -> Self {
        let documents: Box<dyn DocumentPropertyProvider> = if document_properties {
            Box::new(OfficeDocumentProperties)
        } else {
            Box::new(NoDocumentProperties)
        };
        Self::new(documents, follow_links, events)
    }

    /// Build the record for `path`, labelled `label`.
    ///
    /// Only a failing stat is an error (the caller reports the file as skipped). Owner and
    /// document-property failures degrade to empty fields.
    pub fn probe(&self, label: &str, path: &Path) -> std::io::Result<FileRecord> {
        let meta = if self.follow_links {
            std::fs::metadata(path).or_else(|_| std::fs::symlink_metadata(path))?
        } else {
            std::fs::symlink_metadata(path)?
        };
        let required = required_fields(path, &meta);

        let owner = match self.owners.owner(path, &meta) {
            Ok(owner) => owner,
            Err(e) => {
                self.report_owner_failure(label, path, e);
                String::new()
            }
        };

        let props = if meta.is_file() {
            self.documents
                .properties(path, required.length)
                .unwrap_or_else(|e| {
                    self.events.emit(&ScanEvent::node_failed(
                        label,
                        path,
                        ErrorKind::MetadataProbeFailed,
                        format!("document properties: {e}"),
                    ));
                    DocumentProperties::default()
                })
        } else {
            DocumentProperties::default()
        };

        Ok(FileRecord {
            server_name: label.to_string(),
            full_name: path_string(path),
            date_created: required.date_created,
            date_modified: required.date_modified,
            owner,
            authors: props.authors,
            last_saved_by: props.last_saved_by,
            length: required.length,
            extension: extension_with_dot(path),
            attributes: required.attributes,
            directory_name: path.parent().map(path_string).unwrap_or_default(),
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        })
    }

    /// An unsupported platform is reported once per probe, real lookup failures every time.
    fn report_owner_failure(&self, label: &str, path: &Path, e: ProbeError) {
        if matches!(e, ProbeError::OwnerUnsupported)
            && self.owner_unsupported_reported.swap(true, Ordering::Relaxed)
        {
            return;
        }
        self.events.emit(&ScanEvent::node_failed(
            label,
            path,
            ErrorKind::MetadataProbeFailed,
            format!("owner: {e}"),
        ));
    }
}
