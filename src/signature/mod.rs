//! XML-DSig enveloped signing for serialized CPE documents.
//!
//! Signing runs as a chain of typed stages so that a document cannot be
//! embedded before it is signed, nor signed before it is digested:
//!
//! ```text
//! Unsigned --digest()--> Digested --sign(creds)--> Signed --embed()--> Embedded
//! ```
//!
//! The digest is SHA-256 over the exact serialized bytes in placeholder
//! form; the signature value is RSASSA-PKCS1-v1_5 (SHA-256) over that
//! digest. [`verify_signed_xml`] performs the inverse checks.

pub mod embed;
mod engine;
mod keys;
mod verify;

pub use engine::{Digested, Embedded, SignatureArtifact, Signed, Unsigned, sign_xml};
pub use keys::{SigningCredentials, decode_private_key};
pub use verify::{VerifiedSignature, verify_signed_xml};

/// Exclusive XML canonicalization, without comments.
pub const C14N_EXCLUSIVE: &str = "http://www.w3.org/2001/10/xml-exc-c14n#";
pub const SIGNATURE_RSA_SHA256: &str = "http://www.w3.org/2001/04/xmldsig-more#rsa-sha256";
pub const DIGEST_SHA256: &str = "http://www.w3.org/2001/04/xmlenc#sha256";
pub const TRANSFORM_ENVELOPED: &str = "http://www.w3.org/2000/09/xmldsig#enveloped-signature";
