use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::CpeError;
use super::key::DocumentKey;

/// Business document to be converted: invoice, boleta, credit or debit note.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessDocument {
    /// Caller-side identifier, not emitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Catalog 01 document type code ("01", "03", "07", "08").
    #[serde(rename = "type")]
    pub type_code: String,
    /// Series prefix (e.g. "F001").
    pub series: String,
    /// Sequential number within the series.
    pub number: String,
    pub issue_date: NaiveDate,
    /// Time of issue. Falls back to the build-time clock when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_time: Option<NaiveTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    /// ISO 4217 currency code.
    pub currency: String,
    pub issuer: Party,
    pub customer: Party,
    pub items: Vec<DocumentItem>,
    pub totals: DocumentTotals,
    /// Document-level taxes. Aggregated from the items when empty.
    #[serde(default)]
    pub taxes: Vec<TaxTotal>,
    /// Affected document; required for credit and debit notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<DocumentReference>,
}

impl BusinessDocument {
    /// Resolve the document type code.
    pub fn document_type(&self) -> Result<DocumentType, CpeError> {
        DocumentType::from_code(&self.type_code)
            .ok_or_else(|| CpeError::UnsupportedDocumentType(self.type_code.clone()))
    }

    /// Composite `SERIES-NUMBER` key.
    pub fn key(&self) -> DocumentKey {
        DocumentKey::new(&self.series, &self.number)
    }

    /// `ISSUER_ID-TYPE-SERIES-NUMBER`, the identifier used for file names.
    pub fn file_stem(&self) -> String {
        format!(
            "{}-{}-{}-{}",
            self.issuer.document_id, self.type_code, self.series, self.number
        )
    }

    /// `ISSUER_ID-TYPE-SERIES-NUMBER.xml`
    pub fn file_name(&self) -> String {
        format!("{}.xml", self.file_stem())
    }

    /// Document-level taxes grouped by tax type, in first-seen order.
    ///
    /// Uses `taxes` when supplied, otherwise sums the item taxes per
    /// (tax type, rate) base.
    pub fn tax_groups(&self) -> Vec<TaxGroup> {
        let source: Vec<Tax> = if self.taxes.is_empty() {
            aggregate_item_taxes(&self.items)
        } else {
            self.taxes.clone()
        };

        let mut groups: Vec<TaxGroup> = Vec::new();
        for tax in source {
            match groups.iter_mut().find(|g| g.tax_type == tax.tax_type) {
                Some(group) => {
                    group.tax_amount += tax.tax_amount;
                    group.subtotals.push(tax);
                }
                None => groups.push(TaxGroup {
                    tax_type: tax.tax_type.clone(),
                    tax_amount: tax.tax_amount,
                    subtotals: vec![tax],
                }),
            }
        }
        groups
    }
}

fn aggregate_item_taxes(items: &[DocumentItem]) -> Vec<Tax> {
    let mut sums: Vec<Tax> = Vec::new();
    for tax in items.iter().flat_map(|item| item.taxes.iter()) {
        let existing = sums
            .iter_mut()
            .find(|acc| acc.tax_type == tax.tax_type && acc.tax_rate == tax.tax_rate);
        match existing {
            Some(acc) => {
                acc.tax_amount += tax.tax_amount;
                acc.tax_base += tax.tax_base;
            }
            None => sums.push(Tax {
                exemption_reason_code: None,
                ..tax.clone()
            }),
        }
    }
    sums
}

/// Catalog 01 document types handled by the converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentType {
    /// 01: Factura.
    Invoice,
    /// 03: Boleta de venta.
    Boleta,
    /// 07: Nota de crédito.
    CreditNote,
    /// 08: Nota de débito.
    DebitNote,
}

impl DocumentType {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Invoice => "01",
            Self::Boleta => "03",
            Self::CreditNote => "07",
            Self::DebitNote => "08",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "01" => Some(Self::Invoice),
            "03" => Some(Self::Boleta),
            "07" => Some(Self::CreditNote),
            "08" => Some(Self::DebitNote),
            _ => None,
        }
    }

    /// Credit and debit notes must point at the document they amend.
    pub fn requires_reference(&self) -> bool {
        matches!(self, Self::CreditNote | Self::DebitNote)
    }
}

/// Issuer or customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Party {
    /// Catalog 06 identity document type ("6" = RUC, "1" = DNI, ...).
    pub document_type: String,
    /// Tax ID or national ID.
    pub document_id: String,
    /// Legal (registration) name.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trade_name: Option<String>,
    pub address: Address,
}

impl Party {
    /// Name shown in `cac:PartyName`: the trade name when there is one.
    pub fn display_name(&self) -> &str {
        self.trade_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.name)
    }
}

/// Registration address.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: String,
    pub city: String,
    pub district: String,
    pub province: String,
    pub department: String,
    /// ISO 3166-1 alpha-2.
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    /// INEI ubigeo (six digits).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ubigeo: Option<String>,
    /// Annex establishment code; "0000" is the fiscal domicile.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub establishment_code: Option<String>,
}

impl Address {
    /// Single address line: `street - district - province - department`.
    pub fn line(&self) -> String {
        format!(
            "{} - {} - {} - {}",
            self.street, self.district, self.province, self.department
        )
    }
}

/// One document line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentItem {
    /// Seller's item code.
    pub id: String,
    pub description: String,
    pub quantity: Decimal,
    /// UN/ECE Rec 20 unit code (e.g. "NIU", "ZZ").
    pub unit_code: String,
    pub unit_price: Decimal,
    pub line_total: Decimal,
    #[serde(default)]
    pub taxes: Vec<Tax>,
    /// UNSPSC product code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification_code: Option<String>,
}

/// A tax applied to a line, or aggregated at document level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tax {
    /// Catalog 05 tribute code ("1000" = IGV, ...).
    pub tax_type: String,
    pub tax_amount: Decimal,
    #[serde(default)]
    pub tax_rate: Decimal,
    #[serde(default)]
    pub tax_base: Decimal,
    /// Catalog 07 affectation code. Defaults per tribute when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exemption_reason_code: Option<String>,
}

/// Document-level tax entry; same shape as a line tax.
pub type TaxTotal = Tax;

/// All document-level subtotals sharing one tax type.
#[derive(Debug, Clone, PartialEq)]
pub struct TaxGroup {
    pub tax_type: String,
    pub tax_amount: Decimal,
    pub subtotals: Vec<Tax>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentTotals {
    pub sub_total: Decimal,
    pub total_taxes: Decimal,
    pub total_amount: Decimal,
    pub payable_amount: Decimal,
}

/// Document amended by a credit or debit note.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentReference {
    /// Catalog 01 type of the referenced document.
    pub document_type: String,
    /// Referenced `SERIES-NUMBER`.
    pub document_id: String,
    pub issue_date: NaiveDate,
    /// Free-text reason for the note.
    pub reason: String,
    /// Catalog 09/10 note type. Defaults to "01".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_code: Option<String>,
}

impl DocumentReference {
    pub fn new(
        document_type: DocumentType,
        document_id: impl Into<String>,
        issue_date: NaiveDate,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            document_type: document_type.code().to_string(),
            document_id: document_id.into(),
            issue_date,
            reason: reason.into(),
            response_code: None,
        }
    }

    /// Set the catalog 09/10 note type.
    pub fn with_response_code(mut self, code: impl Into<String>) -> Self {
        self.response_code = Some(code.into());
        self
    }

    pub fn response_code(&self) -> &str {
        self.response_code.as_deref().unwrap_or("01")
    }
}
