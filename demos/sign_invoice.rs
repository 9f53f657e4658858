//! Build, sign and verify an invoice with the bundled test certificate.
//!
//! Run with: `cargo run --example sign_invoice --features sign`

use chrono::NaiveDate;
use rust_decimal_macros::dec;
use sunat_ubl::core::*;
use sunat_ubl::pipeline::{ConvertOptions, DocumentStore, FsStore, convert};
use sunat_ubl::signature::{SigningCredentials, verify_signed_xml};

const CERT: &str = include_str!("../tests/fixtures/cert.pem");
const KEY: &str = include_str!("../tests/fixtures/rsa_pkcs8.pem");

fn main() -> Result<(), CpeError> {
    let address = AddressBuilder::new("Av. Arequipa 123", "Lince", "Lima", "Lima")
        .ubigeo("150116")
        .build();

    let doc = DocumentBuilder::new(
        DocumentType::Invoice,
        "F001",
        "123456",
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
    )
    .issuer(
        PartyBuilder::new(IdentityDocumentType::TaxId, "20123456786", "Empresa Demo SAC", address.clone())
            .trade_name("Demo")
            .build(),
    )
    .customer(PartyBuilder::new(IdentityDocumentType::TaxId, "20100066603", "Cliente SAC", address).build())
    .add_item(
        ItemBuilder::new("P001", "Producto de prueba", dec!(2), "NIU", dec!(50))
            .tax_rate("1000", dec!(18))
            .build(),
    )
    .build()?;

    let credentials = SigningCredentials::from_pem(CERT, KEY)?;
    let signed = convert(&doc, &credentials, &ConvertOptions::default())?;
    let verified = verify_signed_xml(&signed.xml)?;

    let path = FsStore::new(std::env::temp_dir().join("sunat-ubl-demo")).store(&signed)?;

    println!("document:  {}", doc.key());
    println!("payable:   {}", AmountFormatter::default().format(doc.totals.payable_amount));
    println!("sha256:    {}", signed.hash_hex);
    println!("signer:    {}", verified.subject);
    println!("written:   {}", path.display());
    Ok(())
}
