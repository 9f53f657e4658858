//! Core document model, catalogs, formatting, and validation.
//!
//! This module provides the business-document types the converter accepts,
//! the SUNAT catalog table every coded value is resolved against, the
//! two-decimal amount formatter, and the pre-conversion validator.

mod builder;
pub mod catalogs;
mod currencies;
mod decimal;
mod error;
mod key;
mod types;
mod validation;

pub use builder::*;
pub use catalogs::{Catalog, CatalogContext, IdentityDocumentType, Tribute};
pub use currencies::is_supported_currency;
pub use decimal::*;
pub use error::*;
pub use key::*;
pub use types::*;
pub use validation::*;
