use thiserror::Error;

use super::types::DocumentType;

/// Errors that can occur while converting a business document into a signed
/// UBL artifact.
///
/// Every variant is terminal for the conversion it was raised in. Callers that
/// retry must restart from the [`BusinessDocument`](super::BusinessDocument).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CpeError {
    /// Field-level validation rejected the document before conversion.
    #[error("validation failed: {} error(s)", .0.len())]
    ValidationFailed(Vec<ValidationError>),

    /// The document type code is not one of 01, 03, 07, 08.
    #[error("unsupported document type: {0:?}")]
    UnsupportedDocumentType(String),

    /// A credit or debit note was supplied without a referenced document.
    #[error("document type {} requires a reference to the affected document", .0.code())]
    MissingReference(DocumentType),

    /// The output tree could not be rendered as XML.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The private key PEM is neither PKCS#1 nor PKCS#8.
    #[error("unsupported private key format: {0}")]
    UnsupportedKeyFormat(String),

    /// The private key decoded, but is not an RSA key.
    #[error("unsupported private key algorithm: {0}")]
    UnsupportedKeyAlgorithm(String),

    /// The signer certificate could not be decoded.
    #[error("certificate error: {0}")]
    Certificate(String),

    /// The RSA signing primitive failed.
    #[error("signing failed: {0}")]
    SigningFailed(String),

    /// The signature container anchor is missing or ambiguous.
    #[error("signature injection point not found: {0}")]
    InjectionPointNotFound(String),

    /// An embedded signature did not verify.
    #[error("signature verification failed: {0}")]
    VerificationFailed(String),

    /// Writing the signed document failed.
    #[error("storage failed: {0}")]
    StorageFailed(String),

    /// Archiving the signed document failed.
    #[error("packaging failed: {0}")]
    PackagingFailed(String),
}

impl CpeError {
    /// Stable error code for response envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ValidationFailed(_) => "VALIDATION_FAILED",
            Self::UnsupportedDocumentType(_) => "UNSUPPORTED_DOCUMENT_TYPE",
            Self::MissingReference(_) => "MISSING_REFERENCE",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::UnsupportedKeyFormat(_) => "UNSUPPORTED_KEY_FORMAT",
            Self::UnsupportedKeyAlgorithm(_) => "UNSUPPORTED_KEY_ALGORITHM",
            Self::Certificate(_) => "CERTIFICATE_ERROR",
            Self::SigningFailed(_) => "SIGNING_FAILED",
            Self::InjectionPointNotFound(_) => "INJECTION_POINT_NOT_FOUND",
            Self::VerificationFailed(_) => "VERIFICATION_FAILED",
            Self::StorageFailed(_) => "STORAGE_FAILED",
            Self::PackagingFailed(_) => "PACKAGING_FAILED",
        }
    }

    /// Pipeline stage the error was raised in.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::ValidationFailed(_) => "validate",
            Self::UnsupportedDocumentType(_) | Self::MissingReference(_) => "build",
            Self::Serialization(_) => "serialize",
            Self::UnsupportedKeyFormat(_)
            | Self::UnsupportedKeyAlgorithm(_)
            | Self::Certificate(_)
            | Self::SigningFailed(_) => "sign",
            Self::InjectionPointNotFound(_) => "embed",
            Self::VerificationFailed(_) => "verify",
            Self::StorageFailed(_) => "store",
            Self::PackagingFailed(_) => "package",
        }
    }

    /// Field-level details, when the error came out of validation.
    pub fn validation_errors(&self) -> &[ValidationError] {
        match self {
            Self::ValidationFailed(errors) => errors,
            _ => &[],
        }
    }
}

/// A single validation error with field path, rule and offending value.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ValidationError {
    /// Dot-separated path to the invalid field (e.g. "items[0].quantity").
    pub field: String,
    /// What the rule expected.
    pub expected: String,
    /// The value that was received.
    pub received: String,
    /// Rule name (e.g. "ruc_validation").
    pub rule: String,
    /// Human-readable error description.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.rule, self.field, self.message)
    }
}

impl ValidationError {
    pub fn new(
        field: impl Into<String>,
        expected: impl Into<String>,
        received: impl Into<String>,
        rule: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            expected: expected.into(),
            received: received.into(),
            rule: rule.into(),
            message: message.into(),
        }
    }
}
