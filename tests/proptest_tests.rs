//! Property-based tests for amount formatting, validation and signature
//! embedding.
//!
//! Run with: `cargo test --features all --test proptest_tests`

#![cfg(feature = "sign")]

use chrono::{NaiveDate, NaiveTime};
use proptest::prelude::*;
use rust_decimal::Decimal;
use sunat_ubl::core::*;
use sunat_ubl::signature::embed;
use sunat_ubl::ubl::{self, BuildOptions};

fn amount() -> impl Strategy<Value = Decimal> {
    (-1_000_000_000i64..1_000_000_000i64, 0u32..6).prop_map(|(n, scale)| Decimal::new(n, scale))
}

fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64, 0u32..4).prop_map(|(n, scale)| Decimal::new(n, scale))
}

fn unsigned_xml(quantity: Decimal, price: Decimal, description: &str) -> String {
    let address = AddressBuilder::new("Av. Arequipa 123", "Lince", "Lima", "Lima").build();
    let doc = DocumentBuilder::new(
        DocumentType::Invoice,
        "F001",
        "1",
        NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
    )
    .issuer(PartyBuilder::new(IdentityDocumentType::TaxId, "20123456786", "Empresa Demo SAC", address.clone()).build())
    .customer(PartyBuilder::new(IdentityDocumentType::TaxId, "20100066603", "Cliente SAC", address).build())
    .add_item(
        ItemBuilder::new("P1", description, quantity, "NIU", price)
            .tax_rate("1000", Decimal::new(18, 0))
            .build(),
    )
    .build_unchecked()
    .unwrap();
    let options = BuildOptions {
        issue_time: NaiveTime::from_hms_opt(0, 0, 0),
        ..BuildOptions::default()
    };
    ubl::serialize(&ubl::build_tree(&doc, &options).unwrap()).unwrap()
}

proptest! {
    #[test]
    fn formatted_amounts_have_exactly_two_decimals(value in amount()) {
        let s = AmountFormatter::default().format(value);
        let (_, fraction) = s.split_once('.').unwrap();
        prop_assert_eq!(fraction.len(), 2);
        prop_assert!(!s.contains('e') && !s.contains('E') && !s.contains(','));
        prop_assert_ne!(s.as_str(), "-0.00");
    }

    #[test]
    fn formatting_is_within_half_a_cent(value in amount()) {
        let formatted: Decimal = AmountFormatter::default().format(value).parse().unwrap();
        prop_assert!((formatted - value).abs() <= Decimal::new(5, 3));
    }

    #[test]
    fn formatting_is_idempotent(value in amount()) {
        let f = AmountFormatter::default();
        let once = f.format(value);
        let twice = f.format(once.parse().unwrap());
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn ruc_with_computed_check_digit_is_valid(body in "[12][0-9]{9}") {
        let weights = [5u32, 4, 3, 2, 7, 6, 5, 4, 3, 2];
        let sum: u32 = body
            .bytes()
            .zip(weights)
            .map(|(b, w)| u32::from(b - b'0') * w)
            .sum();
        let check = match 11 - sum % 11 {
            10 => 1,
            11 => 0,
            n => n,
        };
        let ruc = format!("{body}{check}");
        prop_assert!(is_valid_ruc(&ruc));
        let wrong = format!("{body}{}", (check + 1) % 10);
        prop_assert!(!is_valid_ruc(&wrong));
    }

    #[test]
    fn built_documents_pass_sum_validation(quantity in positive_amount(), price in positive_amount()) {
        let address = AddressBuilder::new("Calle 1", "Lince", "Lima", "Lima").build();
        let doc = DocumentBuilder::new(
            DocumentType::Invoice,
            "F001",
            "1",
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
        )
        .issuer(PartyBuilder::new(IdentityDocumentType::TaxId, "20123456786", "Demo", address.clone()).build())
        .customer(PartyBuilder::new(IdentityDocumentType::TaxId, "20100066603", "Cliente", address).build())
        .add_item(
            ItemBuilder::new("P1", "Item", quantity, "NIU", price)
                .tax_rate("1000", Decimal::new(18, 0))
                .build(),
        )
        .build_unchecked()
        .unwrap();
        prop_assert!(validate_document(&doc).is_empty());
    }

    #[test]
    fn strip_undoes_splice(
        quantity in positive_amount(),
        price in positive_amount(),
        description in "[A-Za-z0-9 áéíóúñ&<>]{1,40}",
        block in "[A-Za-z0-9+/=]{1,200}",
    ) {
        let xml = unsigned_xml(quantity, price, &description);
        prop_assert_eq!(xml.matches(embed::PLACEHOLDER).count(), 1);

        let fragment = format!("<ds:Signature Id=\"SignatureSP\">\n  <ds:SignatureValue>{block}</ds:SignatureValue>\n</ds:Signature>");
        let signed = embed::splice(&xml, &fragment).unwrap();
        prop_assert!(!signed.contains(embed::PLACEHOLDER));
        prop_assert_eq!(embed::strip(&signed).unwrap(), xml.clone());
        prop_assert_eq!(embed::normalize(&signed).unwrap(), xml);
    }
}
