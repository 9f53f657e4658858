//! # sunat-ubl
//!
//! Peruvian electronic invoicing (SUNAT CPE): maps business documents to
//! UBL 2.1 invoices, boletas, credit and debit notes, and signs them with an
//! enveloped XML-DSig signature.
//!
//! All monetary values use [`rust_decimal::Decimal`] and are rendered with
//! exactly two decimals; floating point never enters the amount path.
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::NaiveDate;
//! use sunat_ubl::core::*;
//! use rust_decimal_macros::dec;
//!
//! let address = AddressBuilder::new("Av. Arequipa 123", "Lince", "Lima", "Lima").build();
//! let doc = DocumentBuilder::new(
//!     DocumentType::Invoice,
//!     "F001",
//!     "123456",
//!     NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
//! )
//! .issuer(PartyBuilder::new(IdentityDocumentType::TaxId, "20123456786", "Empresa Demo SAC", address.clone()).build())
//! .customer(PartyBuilder::new(IdentityDocumentType::TaxId, "20100066603", "Cliente SAC", address).build())
//! .add_item(ItemBuilder::new("P001", "Producto", dec!(2), "NIU", dec!(50)).tax_rate("1000", dec!(18)).build())
//! .build()
//! .unwrap();
//!
//! assert!(validate_document(&doc).is_empty());
//! assert_eq!(doc.totals.payable_amount, dec!(118.00));
//! assert_eq!(doc.file_name(), "20123456786-01-F001-123456.xml");
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `core` (default) | Document model, builders, catalogs, amount formatting, validation |
//! | `ubl` | UBL 2.1 output tree and XML serialization |
//! | `sign` | Key decoding, XML-DSig signing and verification, conversion pipeline |
//! | `cli` | `cpe` command-line tool |
//! | `all` | Everything |

#[cfg(feature = "core")]
pub mod core;

#[cfg(feature = "ubl")]
pub mod ubl;

#[cfg(feature = "sign")]
pub mod signature;

#[cfg(feature = "sign")]
pub mod pipeline;

// Re-export core types at crate root for convenience
#[cfg(feature = "core")]
pub use crate::core::*;
