use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::catalogs::{FISCAL_DOMICILE, IdentityDocumentType};
use super::decimal::AmountFormatter;
use super::error::{CpeError, ValidationError};
use super::types::*;
use super::validation;

const MAX_ITEMS: usize = 10_000;

/// Builder for business documents.
///
/// Totals are derived from the items unless set explicitly, then the
/// document is validated.
///
/// ```
/// use sunat_ubl::core::*;
/// use rust_decimal_macros::dec;
/// use chrono::NaiveDate;
///
/// let address = AddressBuilder::new("Av. Arequipa 123", "Miraflores", "Lima", "Lima").build();
/// let doc = DocumentBuilder::new(
///         DocumentType::Invoice,
///         "F001",
///         "123456",
///         NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
///     )
///     .issuer(PartyBuilder::new(IdentityDocumentType::TaxId, "20123456786", "Empresa Demo SAC", address.clone()).build())
///     .customer(PartyBuilder::new(IdentityDocumentType::TaxId, "20100066603", "Cliente SA", address).build())
///     .add_item(ItemBuilder::new("P001", "Servicio", dec!(2), "NIU", dec!(50))
///         .tax_rate("1000", dec!(18))
///         .build())
///     .build()
///     .unwrap();
/// assert_eq!(doc.totals.payable_amount, dec!(118.00));
/// ```
pub struct DocumentBuilder {
    document_type: DocumentType,
    series: String,
    number: String,
    issue_date: NaiveDate,
    issue_time: Option<NaiveTime>,
    due_date: Option<NaiveDate>,
    currency: String,
    issuer: Option<Party>,
    customer: Option<Party>,
    items: Vec<DocumentItem>,
    taxes: Vec<TaxTotal>,
    totals: Option<DocumentTotals>,
    reference: Option<DocumentReference>,
}

impl DocumentBuilder {
    pub fn new(
        document_type: DocumentType,
        series: impl Into<String>,
        number: impl Into<String>,
        issue_date: NaiveDate,
    ) -> Self {
        Self {
            document_type,
            series: series.into(),
            number: number.into(),
            issue_date,
            issue_time: None,
            due_date: None,
            currency: "PEN".to_string(),
            issuer: None,
            customer: None,
            items: Vec::new(),
            taxes: Vec::new(),
            totals: None,
            reference: None,
        }
    }

    pub fn issue_time(mut self, time: NaiveTime) -> Self {
        self.issue_time = Some(time);
        self
    }

    pub fn due_date(mut self, date: NaiveDate) -> Self {
        self.due_date = Some(date);
        self
    }

    pub fn currency(mut self, code: impl Into<String>) -> Self {
        self.currency = code.into();
        self
    }

    pub fn issuer(mut self, party: Party) -> Self {
        self.issuer = Some(party);
        self
    }

    pub fn customer(mut self, party: Party) -> Self {
        self.customer = Some(party);
        self
    }

    pub fn add_item(mut self, item: DocumentItem) -> Self {
        self.items.push(item);
        self
    }

    /// Add a document-level tax. When none are added, the item taxes are
    /// aggregated instead.
    pub fn add_tax(mut self, tax: TaxTotal) -> Self {
        self.taxes.push(tax);
        self
    }

    /// Use explicit totals instead of deriving them from the items.
    pub fn totals(mut self, totals: DocumentTotals) -> Self {
        self.totals = Some(totals);
        self
    }

    pub fn reference(mut self, reference: DocumentReference) -> Self {
        self.reference = Some(reference);
        self
    }

    /// Build the document, deriving totals and running validation.
    /// Returns all validation errors (not just the first).
    pub fn build(self) -> Result<BusinessDocument, CpeError> {
        let doc = self.build_unchecked()?;

        let errors = validation::validate_document(&doc);
        if !errors.is_empty() {
            return Err(CpeError::ValidationFailed(errors));
        }
        Ok(doc)
    }

    /// Build without validation, for importing data that is checked elsewhere.
    pub fn build_unchecked(self) -> Result<BusinessDocument, CpeError> {
        let issuer = self.issuer.ok_or_else(|| required("issuer"))?;
        let customer = self.customer.ok_or_else(|| required("customer"))?;

        if self.items.len() > MAX_ITEMS {
            return Err(CpeError::ValidationFailed(vec![ValidationError::new(
                "items",
                format!("at most {MAX_ITEMS} items"),
                self.items.len().to_string(),
                "items_validation",
                "document has too many items",
            )]));
        }

        let mut doc = BusinessDocument {
            id: None,
            type_code: self.document_type.code().to_string(),
            series: self.series,
            number: self.number,
            issue_date: self.issue_date,
            issue_time: self.issue_time,
            due_date: self.due_date,
            currency: self.currency,
            issuer,
            customer,
            items: self.items,
            totals: DocumentTotals {
                sub_total: Decimal::ZERO,
                total_taxes: Decimal::ZERO,
                total_amount: Decimal::ZERO,
                payable_amount: Decimal::ZERO,
            },
            taxes: self.taxes,
            reference: self.reference,
        };

        doc.totals = match self.totals {
            Some(totals) => totals,
            None => calculate_totals(&doc),
        };
        Ok(doc)
    }
}

fn required(field: &str) -> CpeError {
    CpeError::ValidationFailed(vec![ValidationError::new(
        field,
        "present",
        "",
        "required_field",
        format!("{field} is required"),
    )])
}

/// Derive document totals from the line totals and tax groups.
pub fn calculate_totals(doc: &BusinessDocument) -> DocumentTotals {
    let sub_total: Decimal = doc.items.iter().map(|i| i.line_total).sum();
    let total_taxes: Decimal = doc.tax_groups().iter().map(|g| g.tax_amount).sum();
    let total_amount = sub_total + total_taxes;

    DocumentTotals {
        sub_total,
        total_taxes,
        total_amount,
        payable_amount: total_amount,
    }
}

/// Builder for Party (issuer/customer).
pub struct PartyBuilder {
    document_type: IdentityDocumentType,
    document_id: String,
    name: String,
    trade_name: Option<String>,
    address: Address,
}

impl PartyBuilder {
    pub fn new(
        document_type: IdentityDocumentType,
        document_id: impl Into<String>,
        name: impl Into<String>,
        address: Address,
    ) -> Self {
        Self {
            document_type,
            document_id: document_id.into(),
            name: name.into(),
            trade_name: None,
            address,
        }
    }

    pub fn trade_name(mut self, name: impl Into<String>) -> Self {
        self.trade_name = Some(name.into());
        self
    }

    pub fn build(self) -> Party {
        Party {
            document_type: self.document_type.code().to_string(),
            document_id: self.document_id,
            name: self.name,
            trade_name: self.trade_name,
            address: self.address,
        }
    }
}

/// Builder for Address. City defaults to the province, country to PE.
pub struct AddressBuilder {
    street: String,
    city: Option<String>,
    district: String,
    province: String,
    department: String,
    country: String,
    postal_code: Option<String>,
    ubigeo: Option<String>,
    establishment_code: Option<String>,
}

impl AddressBuilder {
    pub fn new(
        street: impl Into<String>,
        district: impl Into<String>,
        province: impl Into<String>,
        department: impl Into<String>,
    ) -> Self {
        Self {
            street: street.into(),
            city: None,
            district: district.into(),
            province: province.into(),
            department: department.into(),
            country: "PE".to_string(),
            postal_code: None,
            ubigeo: None,
            establishment_code: None,
        }
    }

    pub fn city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn country(mut self, code: impl Into<String>) -> Self {
        self.country = code.into();
        self
    }

    pub fn postal_code(mut self, code: impl Into<String>) -> Self {
        self.postal_code = Some(code.into());
        self
    }

    pub fn ubigeo(mut self, code: impl Into<String>) -> Self {
        self.ubigeo = Some(code.into());
        self
    }

    /// Annex establishment code. Omit for the fiscal domicile.
    pub fn establishment_code(mut self, code: impl Into<String>) -> Self {
        self.establishment_code = Some(code.into());
        self
    }

    pub fn build(self) -> Address {
        Address {
            city: self.city.unwrap_or_else(|| self.province.clone()),
            street: self.street,
            district: self.district,
            province: self.province,
            department: self.department,
            country: self.country,
            postal_code: self.postal_code,
            ubigeo: self.ubigeo,
            establishment_code: self
                .establishment_code
                .filter(|c| c != FISCAL_DOMICILE),
        }
    }
}

/// Builder for DocumentItem.
pub struct ItemBuilder {
    id: String,
    description: String,
    quantity: Decimal,
    unit_code: String,
    unit_price: Decimal,
    line_total: Option<Decimal>,
    taxes: Vec<Tax>,
    rates: Vec<(String, Decimal)>,
    classification_code: Option<String>,
}

impl ItemBuilder {
    pub fn new(
        id: impl Into<String>,
        description: impl Into<String>,
        quantity: Decimal,
        unit_code: impl Into<String>,
        unit_price: Decimal,
    ) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            quantity,
            unit_code: unit_code.into(),
            unit_price,
            line_total: None,
            taxes: Vec::new(),
            rates: Vec::new(),
            classification_code: None,
        }
    }

    /// Override the line total (defaults to quantity × unit price).
    pub fn line_total(mut self, total: Decimal) -> Self {
        self.line_total = Some(total);
        self
    }

    /// Apply a tribute at `rate` percent over the line total.
    pub fn tax_rate(mut self, tax_type: impl Into<String>, rate: Decimal) -> Self {
        self.rates.push((tax_type.into(), rate));
        self
    }

    /// Add a fully specified line tax.
    pub fn tax(mut self, tax: Tax) -> Self {
        self.taxes.push(tax);
        self
    }

    /// UNSPSC product code.
    pub fn classification(mut self, code: impl Into<String>) -> Self {
        self.classification_code = Some(code.into());
        self
    }

    pub fn build(self) -> DocumentItem {
        let formatter = AmountFormatter::default();
        let line_total = self
            .line_total
            .unwrap_or_else(|| formatter.round(self.quantity * self.unit_price));

        let mut taxes = self.taxes;
        for (tax_type, rate) in self.rates {
            taxes.push(Tax {
                tax_type,
                tax_amount: formatter.round(line_total * rate / dec!(100)),
                tax_rate: rate,
                tax_base: line_total,
                exemption_reason_code: None,
            });
        }

        DocumentItem {
            id: self.id,
            description: self.description,
            quantity: self.quantity,
            unit_code: self.unit_code,
            unit_price: self.unit_price,
            line_total,
            taxes,
            classification_code: self.classification_code,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address() -> Address {
        AddressBuilder::new("Av. Arequipa 123", "Miraflores", "Lima", "Lima").build()
    }

    fn issuer() -> Party {
        PartyBuilder::new(IdentityDocumentType::TaxId, "20123456786", "Empresa Demo SAC", address())
            .trade_name("Demo")
            .build()
    }

    fn customer() -> Party {
        PartyBuilder::new(IdentityDocumentType::TaxId, "20100066603", "Cliente SA", address()).build()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    #[test]
    fn derives_totals_from_items() {
        let doc = DocumentBuilder::new(DocumentType::Invoice, "F001", "1", date())
            .issuer(issuer())
            .customer(customer())
            .add_item(
                ItemBuilder::new("A", "Uno", dec!(2), "NIU", dec!(50))
                    .tax_rate("1000", dec!(18))
                    .build(),
            )
            .add_item(
                ItemBuilder::new("B", "Dos", dec!(1), "NIU", dec!(10.50))
                    .tax_rate("1000", dec!(18))
                    .build(),
            )
            .build()
            .unwrap();

        assert_eq!(doc.items[0].line_total, dec!(100.00));
        assert_eq!(doc.items[1].taxes[0].tax_amount, dec!(1.89));
        assert_eq!(doc.totals.sub_total, dec!(110.50));
        assert_eq!(doc.totals.total_taxes, dec!(19.89));
        assert_eq!(doc.totals.total_amount, dec!(130.39));
        assert_eq!(doc.totals.payable_amount, dec!(130.39));
        assert_eq!(doc.type_code, "01");
        assert_eq!(doc.currency, "PEN");
    }

    #[test]
    fn missing_issuer_is_reported() {
        let err = DocumentBuilder::new(DocumentType::Invoice, "F001", "1", date())
            .customer(customer())
            .build()
            .unwrap_err();
        assert_eq!(err.validation_errors()[0].field, "issuer");
        assert_eq!(err.validation_errors()[0].rule, "required_field");
    }

    #[test]
    fn build_runs_validation() {
        let err = DocumentBuilder::new(DocumentType::Invoice, "F001", "1", date())
            .currency("GBP")
            .issuer(issuer())
            .customer(customer())
            .add_item(ItemBuilder::new("A", "Uno", dec!(1), "NIU", dec!(5)).build())
            .build()
            .unwrap_err();
        assert_eq!(err.code(), "VALIDATION_FAILED");
        assert!(
            err.validation_errors()
                .iter()
                .any(|e| e.rule == "currency_validation")
        );
    }

    #[test]
    fn explicit_totals_are_kept() {
        let totals = DocumentTotals {
            sub_total: dec!(1),
            total_taxes: dec!(0),
            total_amount: dec!(1),
            payable_amount: dec!(1),
        };
        let doc = DocumentBuilder::new(DocumentType::Boleta, "B001", "7", date())
            .issuer(issuer())
            .customer(customer())
            .add_item(ItemBuilder::new("A", "Uno", dec!(3), "NIU", dec!(5)).build())
            .totals(totals)
            .build_unchecked()
            .unwrap();
        assert_eq!(doc.totals.sub_total, dec!(1));
    }

    #[test]
    fn address_defaults() {
        let addr = AddressBuilder::new("Jr. Union 1", "Cercado", "Arequipa", "Arequipa")
            .establishment_code("0000")
            .build();
        assert_eq!(addr.city, "Arequipa");
        assert_eq!(addr.country, "PE");
        assert_eq!(addr.establishment_code, None);
    }

    #[test]
    fn party_display_name_prefers_trade_name() {
        assert_eq!(issuer().display_name(), "Demo");
        assert_eq!(customer().display_name(), "Cliente SA");
        assert_eq!(issuer().document_type, "6");
    }
}
