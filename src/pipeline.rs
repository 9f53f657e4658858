//! End-to-end conversion: validate, build, serialize, sign, embed.
//!
//! [`convert`] is a pure function of the document, the credentials and the
//! options; it touches no filesystem. Persisting and archiving the result are
//! left to [`DocumentStore`] and [`Packager`] implementations.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use chrono::NaiveTime;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info, info_span, warn};

use crate::core::{AmountFormatter, BusinessDocument, CpeError, ValidationError, validate_document};
use crate::signature::{SignatureArtifact, SigningCredentials, Unsigned};
use crate::ubl::{BuildOptions, build_tree, serialize};

/// Conversion settings.
#[derive(Debug, Clone, Copy)]
pub struct ConvertOptions {
    /// Issue time used when the document carries none. Pin it for
    /// byte-reproducible output.
    pub issue_time: Option<NaiveTime>,
    pub formatter: AmountFormatter,
    /// Run [`validate_document`] before building.
    pub validate: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            issue_time: None,
            formatter: AmountFormatter::default(),
            validate: true,
        }
    }
}

/// A signed document ready to be stored.
#[derive(Debug, Clone)]
pub struct SignedDocument {
    pub xml: String,
    /// Lowercase hex SHA-256 of `xml`.
    pub hash_hex: String,
    /// `ISSUER_ID-TYPE-SERIES-NUMBER.xml`
    pub file_name: String,
    pub signature: SignatureArtifact,
}

/// Convert a business document into a signed UBL 2.1 document.
pub fn convert(
    doc: &BusinessDocument,
    credentials: &SigningCredentials,
    options: &ConvertOptions,
) -> Result<SignedDocument, CpeError> {
    let document_id = doc.key().to_string();
    let span = info_span!("convert", document_id = %document_id);
    let _guard = span.enter();

    if options.validate {
        let errors = validate_document(doc);
        if !errors.is_empty() {
            warn!(error_count = errors.len(), "document failed validation");
            return Err(CpeError::ValidationFailed(errors));
        }
    }

    let build_options = BuildOptions {
        issue_time: options.issue_time,
        formatter: options.formatter,
    };
    let tree = build_tree(doc, &build_options)?;
    let xml = serialize(&tree)?;
    debug!(bytes = xml.len(), "document serialized");

    let unsigned = Unsigned::new(&xml)?;
    debug!("stage: unsigned");
    let digested = unsigned.digest();
    debug!("stage: digested");
    let signed = digested.sign(credentials)?;
    debug!("stage: signed");
    let (xml, signature) = signed.embed()?.into_parts();
    debug!("stage: embedded");

    let hash_hex = hex::encode(Sha256::digest(xml.as_bytes()));
    info!(document_id = %document_id, xml_hash = %hash_hex, "document converted");

    Ok(SignedDocument {
        xml,
        hash_hex,
        file_name: doc.file_name(),
        signature,
    })
}

/// Destination for signed documents.
pub trait DocumentStore {
    /// Persist `document`, returning where it was written.
    fn store(&self, document: &SignedDocument) -> Result<PathBuf, CpeError>;
}

/// Writes signed documents into a directory, one file per document.
#[derive(Debug, Clone)]
pub struct FsStore {
    dir: PathBuf,
}

impl FsStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DocumentStore for FsStore {
    fn store(&self, document: &SignedDocument) -> Result<PathBuf, CpeError> {
        let name = document.file_name.as_str();
        if !is_plain_file_name(name) {
            return Err(CpeError::StorageFailed(format!(
                "file name {name:?} is not a plain file name"
            )));
        }
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            CpeError::StorageFailed(format!("create {}: {e}", self.dir.display()))
        })?;
        let path = self.dir.join(name);
        std::fs::write(&path, document.xml.as_bytes())
            .map_err(|e| CpeError::StorageFailed(format!("write {}: {e}", path.display())))?;
        debug!(path = %path.display(), "signed document stored");
        Ok(path)
    }
}

// Issuer ids and series reach the file name unchecked when validation is off.
fn is_plain_file_name(name: &str) -> bool {
    !name.contains(['/', '\\'])
        && !name.contains("..")
        && Path::new(name).file_name() == Some(OsStr::new(name))
}

/// Archives a stored document for submission.
///
/// Implementations report failures as [`CpeError::PackagingFailed`].
pub trait Packager {
    fn package(&self, stored: &Path) -> Result<PathBuf, CpeError>;
}

/// Outcome status of a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversionStatus {
    Success,
    Error,
}

/// Response envelope for a conversion request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionReport {
    pub status: ConversionStatus,
    pub document_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xml_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub validation_errors: Vec<ValidationError>,
}

impl ConversionReport {
    pub fn from_result(doc: &BusinessDocument, result: &Result<SignedDocument, CpeError>) -> Self {
        let document_id = doc.key().to_string();
        match result {
            Ok(signed) => Self {
                status: ConversionStatus::Success,
                document_id,
                xml_hash: Some(signed.hash_hex.clone()),
                file_name: Some(signed.file_name.clone()),
                error_code: None,
                error_message: None,
                validation_errors: Vec::new(),
            },
            Err(e) => Self {
                status: ConversionStatus::Error,
                document_id,
                xml_hash: None,
                file_name: None,
                error_code: Some(e.code()),
                error_message: Some(e.to_string()),
                validation_errors: e.validation_errors().to_vec(),
            },
        }
    }
}
