//! Authorship fields from document properties.
//!
//! Office Open XML packages (`.docx`, `.xlsx`, ...) are zip files carrying `docProps/core.xml`;
//! `dc:creator` is the author and `cp:lastModifiedBy` the last person to save.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use zip::result::ZipError;

use crate::engine::tools::extension_lower;
use crate::error::ProbeError;
use crate::utils::config::{DOC_PROPS_MAX_PACKAGE_SIZE, OFFICE_EXTENSIONS};

const CORE_PROPERTIES_PART: &str = "docProps/core.xml";
const DC_NS: &str = "http://purl.org/dc/elements/1.1/";
const CP_NS: &str = "http://schemas.openxmlformats.org/package/2006/metadata/core-properties";

/// Optional authorship fields. Empty strings when absent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DocumentProperties {
    pub authors: String,
    pub last_saved_by: String,
}

/// Source of the optional (slow, fallible) authorship fields.
///
/// `Ok(Default)` means "no properties for this file type"; `Err` means the lookup was attempted
/// and failed. The probe degrades both to empty fields, only the latter is reported.
pub trait DocumentPropertyProvider: Send + Sync {
    fn properties(&self, path: &Path, len: u64) -> Result<DocumentProperties, ProbeError>;
}

/// Provider used when document properties are disabled.
pub struct NoDocumentProperties;

impl DocumentPropertyProvider for NoDocumentProperties {
    fn properties(&self, _path: &Path, _len: u64) -> Result<DocumentProperties, ProbeError> {
        Ok(DocumentProperties::default())
    }
}

/// Reads core properties from OOXML packages.
pub struct OfficeDocumentProperties;

impl OfficeDocumentProperties {
    pub fn handles(path: &Path) -> bool {
        extension_lower(path).is_some_and(|ext| OFFICE_EXTENSIONS.contains(&ext.as_str()))
    }
}

impl DocumentPropertyProvider for OfficeDocumentProperties {
    fn properties(&self, path: &Path, len: u64) -> Result<DocumentProperties, ProbeError> {
        if !Self::handles(path) || len == 0 || len > DOC_PROPS_MAX_PACKAGE_SIZE {
            return Ok(DocumentProperties::default());
        }
        let file = File::open(path)?;
        let mut archive = zip::ZipArchive::new(BufReader::new(file))?;
        let mut xml = String::new();
        match archive.by_name(CORE_PROPERTIES_PART) {
            Ok(mut part) => {
                part.read_to_string(&mut xml)?;
            }
            Err(ZipError::FileNotFound) => return Ok(DocumentProperties::default()),
            Err(e) => return Err(e.into()),
        }
        parse_core_properties(&xml)
    }
}

/// Extract creator and lastModifiedBy from a `core.xml` part.
pub fn parse_core_properties(xml: &str) -> Result<DocumentProperties, ProbeError> {
    let doc = roxmltree::Document::parse(xml)?;
    let text_of = |ns: &str, name: &str| -> String {
        doc.descendants()
            .find(|n| n.has_tag_name((ns, name)))
            .and_then(|n| n.text())
            .map(|s| s.trim().to_string())
            .unwrap_or_default()
    };
    Ok(DocumentProperties {
        authors: text_of(DC_NS, "creator"),
        last_saved_by: text_of(CP_NS, "lastModifiedBy"),
    })
}
