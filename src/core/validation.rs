use rust_decimal::Decimal;

use super::catalogs::{IdentityDocumentType, is_known_tribute};
use super::currencies::is_supported_currency;
use super::decimal::AmountFormatter;
use super::error::ValidationError;
use super::key::DocumentKey;
use super::types::*;

/// RUC check-digit weights for the first ten digits.
const RUC_WEIGHTS: [u32; 10] = [5, 4, 3, 2, 7, 6, 5, 4, 3, 2];

/// Validate a business document before conversion.
/// Returns all validation errors found (not just the first).
pub fn validate_document(doc: &BusinessDocument) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    // The issuer always declares under its RUC.
    if !is_valid_ruc(&doc.issuer.document_id) {
        errors.push(ValidationError::new(
            "issuer.documentId",
            "Valid RUC format",
            &doc.issuer.document_id,
            "ruc_validation",
            "RUC format is invalid",
        ));
    }
    validate_party_identity(&doc.customer, "customer", &mut errors);

    if DocumentType::from_code(&doc.type_code).is_none() {
        errors.push(ValidationError::new(
            "type",
            "Valid document type (01, 03, 07, 08)",
            &doc.type_code,
            "document_type_validation",
            "Document type is not valid",
        ));
    }

    let key = doc.key();
    if !key.has_valid_series() || !key.has_valid_number() {
        errors.push(ValidationError::new(
            "series",
            "4 alphanumeric series and 1-8 digit number",
            key.to_string(),
            "document_key_validation",
            "Series or number is malformed",
        ));
    }

    if let Some(reference) = &doc.reference {
        let well_formed = reference
            .document_id
            .parse::<DocumentKey>()
            .is_ok_and(|key| key.has_valid_series() && key.has_valid_number());
        if !well_formed {
            errors.push(ValidationError::new(
                "reference.documentId",
                "SERIES-NUMBER of the amended document",
                &reference.document_id,
                "document_key_validation",
                "Referenced document id is malformed",
            ));
        }
    }

    if !is_supported_currency(&doc.currency) {
        errors.push(ValidationError::new(
            "currency",
            "Valid currency code (PEN, USD, EUR)",
            &doc.currency,
            "currency_validation",
            "Currency code is not valid",
        ));
    }

    validate_sum(doc, &mut errors);

    if doc.items.is_empty() {
        errors.push(ValidationError::new(
            "items",
            "At least one item",
            "0",
            "items_validation",
            "Document must have at least one item",
        ));
    }

    for (i, item) in doc.items.iter().enumerate() {
        validate_item(item, i, &mut errors);
    }

    errors
}

/// `totalAmount == subTotal + Σ taxes`, compared at two decimals.
fn validate_sum(doc: &BusinessDocument, errors: &mut Vec<ValidationError>) {
    let formatter = AmountFormatter::default();
    let taxes: Decimal = doc.tax_groups().iter().map(|g| g.tax_amount).sum();
    let expected = formatter.round(doc.totals.sub_total + taxes);
    let received = formatter.round(doc.totals.total_amount);

    if expected != received {
        errors.push(ValidationError::new(
            "totals.totalAmount",
            expected.to_string(),
            received.to_string(),
            "sum_validation",
            "Total amount calculation mismatch",
        ));
    }
}

fn validate_party_identity(party: &Party, prefix: &str, errors: &mut Vec<ValidationError>) {
    match IdentityDocumentType::from_code(&party.document_type) {
        Some(IdentityDocumentType::TaxId) if !is_valid_ruc(&party.document_id) => {
            errors.push(ValidationError::new(
                format!("{prefix}.documentId"),
                "Valid RUC format",
                &party.document_id,
                "ruc_validation",
                "RUC format is invalid",
            ));
        }
        Some(_) => {}
        None => {
            errors.push(ValidationError::new(
                format!("{prefix}.documentType"),
                "Identity document type (0, 1, 4, 6, 7, A)",
                &party.document_type,
                "identity_document_validation",
                "Identity document type is not valid",
            ));
        }
    }
}

fn validate_item(item: &DocumentItem, index: usize, errors: &mut Vec<ValidationError>) {
    if item.quantity <= Decimal::ZERO {
        errors.push(ValidationError::new(
            format!("items[{index}].quantity"),
            "Greater than 0",
            item.quantity.to_string(),
            "quantity_validation",
            "Quantity must be greater than 0",
        ));
    }

    if item.unit_price <= Decimal::ZERO {
        errors.push(ValidationError::new(
            format!("items[{index}].unitPrice"),
            "Greater than 0",
            item.unit_price.to_string(),
            "price_validation",
            "Unit price must be greater than 0",
        ));
    }

    for (j, tax) in item.taxes.iter().enumerate() {
        if !is_known_tribute(&tax.tax_type) {
            errors.push(ValidationError::new(
                format!("items[{index}].taxes[{j}].taxType"),
                "Catalog 05 tribute code",
                &tax.tax_type,
                "tax_type_validation",
                "Tax type is not a known tribute",
            ));
        }
    }
}

/// Check an 11-digit RUC against its modulus-11 check digit.
pub fn is_valid_ruc(ruc: &str) -> bool {
    if ruc.len() != 11 || !ruc.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }

    let digits: Vec<u32> = ruc.bytes().map(|b| u32::from(b - b'0')).collect();
    let sum: u32 = digits
        .iter()
        .zip(RUC_WEIGHTS.iter())
        .map(|(d, w)| d * w)
        .sum();

    let check = match 11 - sum % 11 {
        10 => 1,
        11 => 0,
        n => n,
    };
    check == digits[10]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AddressBuilder, DocumentBuilder, ItemBuilder, PartyBuilder};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn test_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    fn test_address() -> Address {
        AddressBuilder::new("Av. Arequipa 123", "Miraflores", "Lima", "Lima").build()
    }

    fn test_invoice() -> BusinessDocument {
        DocumentBuilder::new(DocumentType::Invoice, "F001", "123456", test_date())
            .issuer(
                PartyBuilder::new(
                    IdentityDocumentType::TaxId,
                    "20123456786",
                    "Empresa Demo SAC",
                    test_address(),
                )
                .build(),
            )
            .customer(
                PartyBuilder::new(
                    IdentityDocumentType::TaxId,
                    "20100066603",
                    "Cliente SA",
                    test_address(),
                )
                .build(),
            )
            .add_item(
                ItemBuilder::new("P001", "Servicio", dec!(2), "NIU", dec!(50.00))
                    .tax_rate("1000", dec!(18))
                    .build(),
            )
            .build_unchecked()
            .unwrap()
    }

    #[test]
    fn valid_invoice_passes() {
        let errors = validate_document(&test_invoice());
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");
    }

    #[test]
    fn ruc_checksum() {
        assert!(is_valid_ruc("20123456786"));
        assert!(is_valid_ruc("20100066603"));
        assert!(!is_valid_ruc("20123456787"));
        assert!(!is_valid_ruc("2012345678"));
        assert!(!is_valid_ruc("2012345678a"));
        assert!(!is_valid_ruc(""));
    }

    #[test]
    fn invalid_issuer_ruc() {
        let mut doc = test_invoice();
        doc.issuer.document_id = "20123456780".into();
        let errors = validate_document(&doc);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].rule, "ruc_validation");
        assert_eq!(errors[0].field, "issuer.documentId");
        assert_eq!(errors[0].received, "20123456780");
    }

    #[test]
    fn customer_dni_is_not_checked_as_ruc() {
        let mut doc = test_invoice();
        doc.customer.document_type = "1".into();
        doc.customer.document_id = "12345678".into();
        assert!(validate_document(&doc).is_empty());
    }

    #[test]
    fn unknown_identity_type() {
        let mut doc = test_invoice();
        doc.customer.document_type = "Z".into();
        let errors = validate_document(&doc);
        assert!(
            errors
                .iter()
                .any(|e| e.rule == "identity_document_validation")
        );
    }

    #[test]
    fn unsupported_type_and_currency() {
        let mut doc = test_invoice();
        doc.type_code = "09".into();
        doc.currency = "JPY".into();
        let errors = validate_document(&doc);
        let rules: Vec<&str> = errors.iter().map(|e| e.rule.as_str()).collect();
        assert_eq!(rules, ["document_type_validation", "currency_validation"]);
    }

    #[test]
    fn sum_mismatch() {
        let mut doc = test_invoice();
        doc.totals.total_amount = dec!(120.00);
        let errors = validate_document(&doc);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].rule, "sum_validation");
        assert_eq!(errors[0].expected, "118.00");
        assert_eq!(errors[0].received, "120.00");
    }

    #[test]
    fn sum_tolerates_sub_cent_noise() {
        let mut doc = test_invoice();
        doc.totals.total_amount = dec!(118.001);
        assert!(validate_document(&doc).is_empty());
    }

    #[test]
    fn item_quantity_and_price() {
        let mut doc = test_invoice();
        doc.items[0].quantity = dec!(0);
        doc.items[0].unit_price = dec!(-1);
        let errors = validate_document(&doc);
        assert!(errors.iter().any(|e| e.field == "items[0].quantity"
            && e.rule == "quantity_validation"));
        assert!(errors.iter().any(|e| e.field == "items[0].unitPrice"
            && e.rule == "price_validation"));
    }

    #[test]
    fn empty_items() {
        let mut doc = test_invoice();
        doc.items.clear();
        doc.totals.sub_total = dec!(0);
        doc.totals.total_amount = dec!(0);
        let errors = validate_document(&doc);
        assert!(errors.iter().any(|e| e.rule == "items_validation"));
    }

    #[test]
    fn malformed_series() {
        let mut doc = test_invoice();
        doc.series = "F1".into();
        let errors = validate_document(&doc);
        assert_eq!(errors[0].rule, "document_key_validation");
    }

    #[test]
    fn unknown_tribute_on_item() {
        let mut doc = test_invoice();
        doc.items[0].taxes[0].tax_type = "4242".into();
        let errors = validate_document(&doc);
        assert!(errors.iter().any(|e| e.rule == "tax_type_validation"));
    }

    #[test]
    fn malformed_reference_id() {
        let mut doc = test_invoice();
        doc.type_code = "07".into();
        doc.reference = Some(DocumentReference::new(
            DocumentType::Invoice,
            "F001123456",
            test_date(),
            "Anulacion",
        ));
        let errors = validate_document(&doc);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].rule, "document_key_validation");
        assert_eq!(errors[0].field, "reference.documentId");
        assert_eq!(errors[0].received, "F001123456");

        doc.reference = Some(DocumentReference::new(
            DocumentType::Invoice,
            "F001-123456",
            test_date(),
            "Anulacion",
        ));
        assert!(validate_document(&doc).is_empty());
    }
}
