use chrono::{Local, NaiveTime};
use rust_decimal::Decimal;
use tracing::debug;

use super::tree::{Element, OutputTree};
use super::{EXTENSION_CONTENT, SIGNATURE_ID, ns};
use crate::core::catalogs::{self, Catalog, tribute};
use crate::core::*;

/// Options for mapping a document to its UBL tree.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildOptions {
    /// Fallback for `cbc:IssueTime` when the document has none. Unset means
    /// the local clock, which makes the output time-dependent.
    pub issue_time: Option<NaiveTime>,
    pub formatter: AmountFormatter,
}

/// Element names that differ between the three UBL document kinds.
struct Variant {
    root: &'static str,
    namespace: &'static str,
    type_code: Option<&'static str>,
    line: &'static str,
    quantity: &'static str,
    monetary_total: &'static str,
    response_catalog: Option<Catalog>,
}

impl Variant {
    fn of(document_type: DocumentType) -> Self {
        match document_type {
            DocumentType::Invoice | DocumentType::Boleta => Self {
                root: "Invoice",
                namespace: ns::INVOICE,
                type_code: Some("cbc:InvoiceTypeCode"),
                line: "cac:InvoiceLine",
                quantity: "cbc:InvoicedQuantity",
                monetary_total: "cac:LegalMonetaryTotal",
                response_catalog: None,
            },
            DocumentType::CreditNote => Self {
                root: "CreditNote",
                namespace: ns::CREDIT_NOTE,
                type_code: Some("cbc:CreditNoteTypeCode"),
                line: "cac:CreditNoteLine",
                quantity: "cbc:CreditedQuantity",
                monetary_total: "cac:LegalMonetaryTotal",
                response_catalog: Some(Catalog::CreditNoteType),
            },
            DocumentType::DebitNote => Self {
                root: "DebitNote",
                namespace: ns::DEBIT_NOTE,
                type_code: None,
                line: "cac:DebitNoteLine",
                quantity: "cbc:DebitedQuantity",
                monetary_total: "cac:RequestedMonetaryTotal",
                response_catalog: Some(Catalog::DebitNoteType),
            },
        }
    }
}

/// Map a business document to its UBL 2.1 tree.
///
/// Invoices and boletas become `Invoice`, credit notes `CreditNote` and
/// debit notes `DebitNote`. Notes must carry the document they amend.
pub fn build_tree(doc: &BusinessDocument, options: &BuildOptions) -> Result<OutputTree, CpeError> {
    let document_type = doc.document_type()?;
    let reference = match (&doc.reference, document_type.requires_reference()) {
        (None, true) => return Err(CpeError::MissingReference(document_type)),
        (reference, true) => reference.as_ref(),
        (_, false) => None,
    };

    let variant = Variant::of(document_type);
    let mapper = Mapper {
        doc,
        currency: &doc.currency,
        formatter: options.formatter,
    };

    let issue_time = doc
        .issue_time
        .or(options.issue_time)
        .unwrap_or_else(|| Local::now().time());

    let mut root = Element::new(variant.root).attrs([
        ("xmlns", variant.namespace.to_string()),
        ("xmlns:cac", ns::CAC.to_string()),
        ("xmlns:cbc", ns::CBC.to_string()),
        ("xmlns:ds", ns::DS.to_string()),
        ("xmlns:ext", ns::EXT.to_string()),
    ]);

    // Signature container: first child, before the version preamble.
    root.push(
        Element::new("ext:UBLExtensions")
            .child(Element::new("ext:UBLExtension").child(Element::new(EXTENSION_CONTENT))),
    );

    root.push(Element::text("cbc:UBLVersionID", catalogs::UBL_VERSION));
    root.push(
        Element::text("cbc:CustomizationID", catalogs::CUSTOMIZATION_ID)
            .attrs(Catalog::Customization.context().attributes(None)),
    );
    root.push(
        Element::text("cbc:ProfileID", catalogs::OPERATION_TYPE_INTERNAL_SALE)
            .attrs(Catalog::OperationType.context().attributes(None)),
    );
    root.push(Element::text("cbc:ID", doc.key().to_string()));
    root.push(Element::text("cbc:IssueDate", doc.issue_date.to_string()));
    root.push(Element::text(
        "cbc:IssueTime",
        issue_time.format("%H:%M:%S").to_string(),
    ));

    if variant.root == "Invoice" {
        if let Some(due) = doc.due_date {
            root.push(Element::text("cbc:DueDate", due.to_string()));
        }
    }

    match (variant.type_code, document_type) {
        (Some(name), DocumentType::Invoice | DocumentType::Boleta) => {
            root.push(
                Element::text(name, document_type.code())
                    .attrs(
                        Catalog::DocumentType
                            .context()
                            .attributes(Some(catalogs::OPERATION_TYPE_INTERNAL_SALE)),
                    )
                    .attr("name", "Tipo de Operacion"),
            );
        }
        (Some(name), _) => {
            let code = reference.map(|r| r.response_code()).unwrap_or("01");
            root.push(Element::text(name, code).attrs(
                variant
                    .response_catalog
                    .map(|c| c.context().attributes(None))
                    .unwrap_or_default(),
            ));
        }
        (None, _) => {}
    }

    if document_type == DocumentType::Boleta {
        root.push(
            Element::text("cbc:Note", catalogs::FREE_TRANSFER_LEGEND)
                .attr("languageLocaleID", catalogs::FREE_TRANSFER_LEGEND_CODE),
        );
    }

    root.push(
        Element::text("cbc:DocumentCurrencyCode", &doc.currency)
            .attrs(Catalog::Currency.context().attributes(None)),
    );
    root.push(Element::text(
        "cbc:LineCountNumeric",
        doc.items.len().to_string(),
    ));

    if let (Some(reference), Some(catalog)) = (reference, variant.response_catalog) {
        root.push(mapper.discrepancy_response(reference, catalog));
        root.push(mapper.billing_reference(reference));
    }

    root.push(mapper.signature());
    root.push(Element::new("cac:AccountingSupplierParty").child(mapper.party(&doc.issuer)));
    root.push(Element::new("cac:AccountingCustomerParty").child(mapper.party(&doc.customer)));
    root.push(
        Element::new("cac:PaymentTerms")
            .child(Element::text("cbc:ID", catalogs::PAYMENT_TERMS_ID))
            .child(Element::text("cbc:PaymentMeansID", catalogs::PAYMENT_MEANS_CASH)),
    );

    for group in doc.tax_groups() {
        root.push(mapper.document_tax_total(&group));
    }

    root.push(mapper.monetary_total(variant.monetary_total));

    for (index, item) in doc.items.iter().enumerate() {
        root.push(mapper.line(&variant, index, item)?);
    }

    debug!(
        document_id = %doc.key(),
        root = variant.root,
        lines = doc.items.len(),
        "built output tree"
    );

    Ok(OutputTree {
        document_type,
        root,
    })
}

struct Mapper<'a> {
    doc: &'a BusinessDocument,
    currency: &'a str,
    formatter: AmountFormatter,
}

impl Mapper<'_> {
    fn amount(&self, name: &'static str, value: Decimal) -> Element {
        Element::text(name, self.formatter.format(value)).attr("currencyID", self.currency)
    }

    fn signature(&self) -> Element {
        let issuer = &self.doc.issuer;
        Element::new("cac:Signature")
            .child(Element::text("cbc:ID", self.doc.key().to_string()))
            .child(
                Element::new("cac:SignatoryParty")
                    .child(
                        Element::new("cac:PartyIdentification")
                            .child(Element::text("cbc:ID", &issuer.document_id)),
                    )
                    .child(Element::new("cac:PartyName").child(Element::text("cbc:Name", &issuer.name))),
            )
            .child(
                Element::new("cac:DigitalSignatureAttachment").child(
                    Element::new("cac:ExternalReference")
                        .child(Element::text("cbc:URI", format!("#{SIGNATURE_ID}"))),
                ),
            )
    }

    fn party(&self, party: &Party) -> Element {
        Element::new("cac:Party")
            .child(
                Element::new("cac:PartyIdentification").child(
                    Element::text("cbc:ID", &party.document_id).attrs(
                        Catalog::IdentityDocument
                            .context()
                            .attributes(Some(&party.document_type)),
                    ),
                ),
            )
            .child(Element::new("cac:PartyName").child(Element::text("cbc:Name", party.display_name())))
            .child(
                Element::new("cac:PartyLegalEntity")
                    .child(Element::text("cbc:RegistrationName", &party.name))
                    .child(self.registration_address(&party.address)),
            )
    }

    fn registration_address(&self, address: &Address) -> Element {
        let mut el = Element::new("cac:RegistrationAddress");
        if let Some(ubigeo) = &address.ubigeo {
            el.push(Element::text("cbc:ID", ubigeo).attrs(Catalog::Ubigeo.context().attributes(None)));
        }
        el.push(
            Element::text(
                "cbc:AddressTypeCode",
                address
                    .establishment_code
                    .as_deref()
                    .unwrap_or(catalogs::FISCAL_DOMICILE),
            )
            .attrs(Catalog::AddressType.context().attributes(None)),
        );
        el.push(Element::text("cbc:CityName", &address.city));
        if let Some(postal) = &address.postal_code {
            el.push(Element::text("cbc:PostalZone", postal));
        }
        el.push(Element::text("cbc:CountrySubentity", &address.province));
        el.push(Element::text("cbc:District", &address.district));
        el.push(Element::new("cac:AddressLine").child(Element::text("cbc:Line", address.line())));
        el.push(
            Element::new("cac:Country").child(
                Element::text("cbc:IdentificationCode", &address.country)
                    .attrs(Catalog::Country.context().attributes(None)),
            ),
        );
        el
    }

    fn discrepancy_response(&self, reference: &DocumentReference, catalog: Catalog) -> Element {
        Element::new("cac:DiscrepancyResponse")
            .child(Element::text("cbc:ReferenceID", &reference.document_id))
            .child(
                Element::text("cbc:ResponseCode", reference.response_code())
                    .attrs(catalog.context().attributes(None)),
            )
            .child(Element::text("cbc:Description", &reference.reason))
    }

    fn billing_reference(&self, reference: &DocumentReference) -> Element {
        Element::new("cac:BillingReference").child(
            Element::new("cac:InvoiceDocumentReference")
                .child(Element::text("cbc:ID", &reference.document_id))
                .child(Element::text("cbc:IssueDate", reference.issue_date.to_string()))
                .child(
                    Element::text("cbc:DocumentTypeCode", &reference.document_type)
                        .attrs(Catalog::DocumentType.context().attributes(None)),
                ),
        )
    }

    fn document_tax_total(&self, group: &TaxGroup) -> Element {
        let mut el = Element::new("cac:TaxTotal").child(self.amount("cbc:TaxAmount", group.tax_amount));
        for tax in &group.subtotals {
            el.push(self.tax_subtotal(tax, false));
        }
        el
    }

    fn line_tax_total(&self, taxes: &[Tax]) -> Element {
        let total: Decimal = taxes.iter().map(|t| t.tax_amount).sum();
        let mut el = Element::new("cac:TaxTotal").child(self.amount("cbc:TaxAmount", total));
        for tax in taxes {
            el.push(self.tax_subtotal(tax, true));
        }
        el
    }

    /// `cac:TaxSubtotal`. Line subtotals also carry the rate and the
    /// affectation code.
    fn tax_subtotal(&self, tax: &Tax, line_level: bool) -> Element {
        let tribute = tribute(&tax.tax_type);

        let mut category = Element::new("cac:TaxCategory").child(
            Element::text("cbc:ID", tribute.category)
                .attrs(Catalog::TaxCategory.context().attributes(None)),
        );
        if line_level {
            category.push(Element::text("cbc:Percent", self.formatter.format(tax.tax_rate)));
            let affectation = tax.exemption_reason_code.as_deref().or(tribute.affectation);
            if let Some(code) = affectation {
                category.push(
                    Element::text("cbc:TaxExemptionReasonCode", code)
                        .attrs(Catalog::Affectation.context().attributes(None)),
                );
            }
        }
        category.push(
            Element::new("cac:TaxScheme")
                .child(
                    Element::text("cbc:ID", &tax.tax_type)
                        .attrs(Catalog::Tribute.context().attributes(None)),
                )
                .child(Element::text("cbc:Name", tribute.name))
                .child(Element::text("cbc:TaxTypeCode", tribute.type_code)),
        );

        Element::new("cac:TaxSubtotal")
            .child(self.amount("cbc:TaxableAmount", tax.tax_base))
            .child(self.amount("cbc:TaxAmount", tax.tax_amount))
            .child(category)
    }

    fn monetary_total(&self, name: &'static str) -> Element {
        let totals = &self.doc.totals;
        Element::new(name)
            .child(self.amount("cbc:LineExtensionAmount", totals.sub_total))
            .child(self.amount("cbc:TaxInclusiveAmount", totals.total_amount))
            .child(self.amount("cbc:PayableAmount", totals.payable_amount))
    }

    fn line(&self, variant: &Variant, index: usize, item: &DocumentItem) -> Result<Element, CpeError> {
        let reference_price = reference_price(item).ok_or_else(|| {
            CpeError::Serialization(format!("pricing reference for line {} overflows", index + 1))
        })?;

        let mut line = Element::new(variant.line)
            .child(Element::text("cbc:ID", (index + 1).to_string()))
            .child(
                Element::text(variant.quantity, self.formatter.format(item.quantity))
                    .attr("unitCode", &item.unit_code)
                    .attrs(Catalog::UnitOfMeasure.context().attributes(None)),
            )
            .child(self.amount("cbc:LineExtensionAmount", item.line_total))
            .child(
                Element::new("cac:PricingReference").child(
                    Element::new("cac:AlternativeConditionPrice")
                        .child(self.amount("cbc:PriceAmount", reference_price))
                        .child(
                            Element::text("cbc:PriceTypeCode", catalogs::PRICE_TYPE_UNIT_PRICE)
                                .attrs(Catalog::PriceType.context().attributes(None)),
                        ),
                ),
            );

        if !item.taxes.is_empty() {
            line.push(self.line_tax_total(&item.taxes));
        }

        let mut product = Element::new("cac:Item")
            .child(Element::text("cbc:Description", &item.description))
            .child(
                Element::new("cac:SellersItemIdentification").child(Element::text("cbc:ID", &item.id)),
            );
        if let Some(code) = &item.classification_code {
            product.push(
                Element::new("cac:CommodityClassification").child(
                    Element::text("cbc:ItemClassificationCode", code)
                        .attrs(Catalog::ItemClassification.context().attributes(None)),
                ),
            );
        }

        Ok(line
            .child(product)
            .child(Element::new("cac:Price").child(self.amount("cbc:PriceAmount", item.unit_price))))
    }
}

/// Unit price including taxes, `None` when the arithmetic overflows.
fn reference_price(item: &DocumentItem) -> Option<Decimal> {
    if item.quantity.is_zero() {
        return Some(item.unit_price);
    }
    let gross = item
        .taxes
        .iter()
        .try_fold(item.line_total, |acc, tax| acc.checked_add(tax.tax_amount))?;
    gross.checked_div(item.quantity)
}
