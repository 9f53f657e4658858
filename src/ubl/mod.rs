//! UBL 2.1 output tree, document mapping, and XML serialization.
//!
//! Documents are mapped to an [`OutputTree`] by [`build_tree`] and rendered
//! by [`serialize`]. The tree always carries exactly one empty
//! `<ext:ExtensionContent/>` as the signature container placeholder.
//!
//! # Example
//!
//! ```no_run
//! use sunat_ubl::core::*;
//! use sunat_ubl::ubl;
//!
//! let doc: BusinessDocument = todo!(); // build via DocumentBuilder
//! let tree = ubl::build_tree(&doc, &ubl::BuildOptions::default()).unwrap();
//! let xml = ubl::serialize(&tree).unwrap();
//! ```

mod build;
mod serialize;
mod tree;

pub use build::{BuildOptions, build_tree};
pub use serialize::{XmlWriter, serialize, serialize_fragment};
pub use tree::{Content, Element, OutputTree};

/// Identifier of the enveloped signature, referenced from `cac:Signature`.
pub const SIGNATURE_ID: &str = "SignatureSP";

/// Name of the signature container element.
pub const EXTENSION_CONTENT: &str = "ext:ExtensionContent";

/// UBL 2.1 and XML-DSig namespace URIs.
pub mod ns {
    pub const INVOICE: &str = "urn:oasis:names:specification:ubl:schema:xsd:Invoice-2";
    pub const CREDIT_NOTE: &str = "urn:oasis:names:specification:ubl:schema:xsd:CreditNote-2";
    pub const DEBIT_NOTE: &str = "urn:oasis:names:specification:ubl:schema:xsd:DebitNote-2";
    pub const CAC: &str =
        "urn:oasis:names:specification:ubl:schema:xsd:CommonAggregateComponents-2";
    pub const CBC: &str = "urn:oasis:names:specification:ubl:schema:xsd:CommonBasicComponents-2";
    pub const EXT: &str =
        "urn:oasis:names:specification:ubl:schema:xsd:CommonExtensionComponents-2";
    pub const DS: &str = "http://www.w3.org/2000/09/xmldsig#";
}
