//! SUNAT and UN/ECE catalog metadata.
//!
//! Every coded value in a UBL document travels with the identifiers of the
//! catalog it was drawn from (agency, list/scheme id, name, URI). This module
//! is the one place those literals live; the tree builder asks [`Catalog::context`]
//! for them instead of spelling them out.

const SUNAT: &str = "PE:SUNAT";
const INEI: &str = "PE:INEI";
const UNECE: &str = "United Nations Economic Commission for Europe";

/// Which attribute family a catalog is expressed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeStyle {
    /// `listAgencyName`, `listID`, `listName`, `listURI` (code types).
    List,
    /// `schemeAgencyName`, `schemeID`, `schemeName`, `schemeURI` (identifier types).
    Scheme,
    /// `unitCodeListID`, `unitCodeListAgencyName` (quantities).
    UnitCodeList,
}

/// Catalog identifiers attached to a coded value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogContext {
    pub style: AttributeStyle,
    pub agency_name: &'static str,
    /// Fixed list/scheme id. `None` when the id depends on the value being coded.
    pub id: Option<&'static str>,
    pub name: Option<&'static str>,
    pub uri: Option<&'static str>,
}

impl CatalogContext {
    /// Attributes in schema order.
    ///
    /// `dynamic_id` fills the list/scheme id for catalogs whose id is
    /// chosen per value (identity document scheme, operation type).
    pub fn attributes(&self, dynamic_id: Option<&str>) -> Vec<(&'static str, String)> {
        let id = self.id.or(dynamic_id);
        let mut attrs = Vec::with_capacity(4);
        match self.style {
            AttributeStyle::List => {
                attrs.push(("listAgencyName", self.agency_name.to_string()));
                if let Some(id) = id {
                    attrs.push(("listID", id.to_string()));
                }
                if let Some(name) = self.name {
                    attrs.push(("listName", name.to_string()));
                }
                if let Some(uri) = self.uri {
                    attrs.push(("listURI", uri.to_string()));
                }
            }
            AttributeStyle::Scheme => {
                attrs.push(("schemeAgencyName", self.agency_name.to_string()));
                if let Some(id) = id {
                    attrs.push(("schemeID", id.to_string()));
                }
                if let Some(name) = self.name {
                    attrs.push(("schemeName", name.to_string()));
                }
                if let Some(uri) = self.uri {
                    attrs.push(("schemeURI", uri.to_string()));
                }
            }
            AttributeStyle::UnitCodeList => {
                if let Some(id) = id {
                    attrs.push(("unitCodeListID", id.to_string()));
                }
                attrs.push(("unitCodeListAgencyName", self.agency_name.to_string()));
            }
        }
        attrs
    }
}

/// Catalogs referenced by the UBL documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Catalog {
    /// `cbc:CustomizationID`.
    Customization,
    /// Catalog 51: operation type (`cbc:ProfileID`).
    OperationType,
    /// Catalog 01: document type.
    DocumentType,
    /// ISO 4217 currency.
    Currency,
    /// Catalog 06: identity document type.
    IdentityDocument,
    /// INEI ubigeo.
    Ubigeo,
    /// Annex establishment code.
    AddressType,
    /// ISO 3166-1 country.
    Country,
    /// UN/ECE 5305 tax category.
    TaxCategory,
    /// Catalog 05: tribute (tax scheme).
    Tribute,
    /// Catalog 07: IGV affectation.
    Affectation,
    /// UN/ECE Rec 20 unit of measure.
    UnitOfMeasure,
    /// Catalog 16: price type.
    PriceType,
    /// Catalog 09: credit note type.
    CreditNoteType,
    /// Catalog 10: debit note type.
    DebitNoteType,
    /// UNSPSC product classification.
    ItemClassification,
}

impl Catalog {
    pub const fn context(self) -> CatalogContext {
        match self {
            Self::Customization => CatalogContext {
                style: AttributeStyle::Scheme,
                agency_name: SUNAT,
                id: None,
                name: None,
                uri: None,
            },
            Self::OperationType => CatalogContext {
                style: AttributeStyle::Scheme,
                agency_name: SUNAT,
                id: None,
                name: Some("Tipo de Operacion"),
                uri: Some("urn:pe:gob:sunat:cpe:see:gem:catalogos:catalogo51"),
            },
            Self::DocumentType => CatalogContext {
                style: AttributeStyle::List,
                agency_name: SUNAT,
                id: None,
                name: Some("Tipo de Documento"),
                uri: Some("urn:pe:gob:sunat:cpe:see:gem:catalogos:catalogo01"),
            },
            Self::Currency => CatalogContext {
                style: AttributeStyle::List,
                agency_name: UNECE,
                id: Some("ISO 4217 Alpha"),
                name: Some("Currency"),
                uri: None,
            },
            Self::IdentityDocument => CatalogContext {
                style: AttributeStyle::Scheme,
                agency_name: SUNAT,
                id: None,
                name: Some("Documento de Identidad"),
                uri: Some("urn:pe:gob:sunat:cpe:see:gem:catalogos:catalogo06"),
            },
            Self::Ubigeo => CatalogContext {
                style: AttributeStyle::Scheme,
                agency_name: INEI,
                id: None,
                name: Some("Ubigeos"),
                uri: None,
            },
            Self::AddressType => CatalogContext {
                style: AttributeStyle::List,
                agency_name: SUNAT,
                id: None,
                name: Some("Establecimientos anexos"),
                uri: None,
            },
            Self::Country => CatalogContext {
                style: AttributeStyle::List,
                agency_name: UNECE,
                id: Some("ISO 3166-1"),
                name: Some("Country"),
                uri: None,
            },
            Self::TaxCategory => CatalogContext {
                style: AttributeStyle::Scheme,
                agency_name: UNECE,
                id: Some("UN/ECE 5305"),
                name: Some("Tax Category Identifier"),
                uri: None,
            },
            Self::Tribute => CatalogContext {
                style: AttributeStyle::Scheme,
                agency_name: SUNAT,
                id: Some("UN/ECE 5153"),
                name: Some("Codigo de tributos"),
                uri: Some("urn:pe:gob:sunat:cpe:see:gem:catalogos:catalogo05"),
            },
            Self::Affectation => CatalogContext {
                style: AttributeStyle::List,
                agency_name: SUNAT,
                id: None,
                name: Some("Afectacion del IGV"),
                uri: Some("urn:pe:gob:sunat:cpe:see:gem:catalogos:catalogo07"),
            },
            Self::UnitOfMeasure => CatalogContext {
                style: AttributeStyle::UnitCodeList,
                agency_name: UNECE,
                id: Some("UN/ECE rec 20"),
                name: None,
                uri: None,
            },
            Self::PriceType => CatalogContext {
                style: AttributeStyle::List,
                agency_name: SUNAT,
                id: None,
                name: Some("Tipo de Precio"),
                uri: Some("urn:pe:gob:sunat:cpe:see:gem:catalogos:catalogo16"),
            },
            Self::CreditNoteType => CatalogContext {
                style: AttributeStyle::List,
                agency_name: SUNAT,
                id: None,
                name: Some("Tipo de nota de credito"),
                uri: Some("urn:pe:gob:sunat:cpe:see:gem:catalogos:catalogo09"),
            },
            Self::DebitNoteType => CatalogContext {
                style: AttributeStyle::List,
                agency_name: SUNAT,
                id: None,
                name: Some("Tipo de nota de debito"),
                uri: Some("urn:pe:gob:sunat:cpe:see:gem:catalogos:catalogo10"),
            },
            Self::ItemClassification => CatalogContext {
                style: AttributeStyle::List,
                agency_name: "GS1 US",
                id: Some("UNSPSC"),
                name: Some("Item Classification"),
                uri: None,
            },
        }
    }
}

/// UBL schema version emitted in `cbc:UBLVersionID`.
pub const UBL_VERSION: &str = "2.1";

/// SUNAT customization version emitted in `cbc:CustomizationID`.
pub const CUSTOMIZATION_ID: &str = "2.0";

/// Catalog 51: internal sale ("venta interna").
pub const OPERATION_TYPE_INTERNAL_SALE: &str = "0101";

/// Catalog 16: unit price including taxes.
pub const PRICE_TYPE_UNIT_PRICE: &str = "01";

/// Default annex establishment code (fiscal domicile).
pub const FISCAL_DOMICILE: &str = "0000";

/// Catalog 52 legend for goods or services transferred free of charge.
pub const FREE_TRANSFER_LEGEND_CODE: &str = "1002";
pub const FREE_TRANSFER_LEGEND: &str =
    "TRANSFERENCIA GRATUITA DE UN BIEN Y/O SERVICIO PRESTADO GRATUITAMENTE";

/// Payment terms block (`cac:PaymentTerms`): cash sale.
pub const PAYMENT_TERMS_ID: &str = "FormaPago";
pub const PAYMENT_MEANS_CASH: &str = "Contado";

/// Catalog 06: identity document types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityDocumentType {
    /// 0: Non-domiciled, without RUC.
    NonDomiciled,
    /// 1: DNI, national ID.
    NationalId,
    /// 4: Foreigner's card.
    ForeignerCard,
    /// 6: RUC, tax ID.
    TaxId,
    /// 7: Passport.
    Passport,
    /// A: Diplomatic ID.
    DiplomaticId,
}

impl IdentityDocumentType {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NonDomiciled => "0",
            Self::NationalId => "1",
            Self::ForeignerCard => "4",
            Self::TaxId => "6",
            Self::Passport => "7",
            Self::DiplomaticId => "A",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "0" => Some(Self::NonDomiciled),
            "1" => Some(Self::NationalId),
            "4" => Some(Self::ForeignerCard),
            "6" => Some(Self::TaxId),
            "7" => Some(Self::Passport),
            "A" => Some(Self::DiplomaticId),
            _ => None,
        }
    }
}

/// Catalog 05 entry: a tribute and how it is declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tribute {
    pub code: &'static str,
    /// `cac:TaxScheme/cbc:Name`.
    pub name: &'static str,
    /// `cac:TaxScheme/cbc:TaxTypeCode` (UN/ECE 5153).
    pub type_code: &'static str,
    /// UN/ECE 5305 tax category.
    pub category: &'static str,
    /// Default catalog 07 affectation for lines carrying this tribute.
    pub affectation: Option<&'static str>,
}

static TRIBUTES: &[Tribute] = &[
    Tribute {
        code: "1000",
        name: "IGV",
        type_code: "VAT",
        category: "S",
        affectation: Some("10"),
    },
    Tribute {
        code: "1016",
        name: "IVAP",
        type_code: "VAT",
        category: "S",
        affectation: Some("17"),
    },
    Tribute {
        code: "2000",
        name: "ISC",
        type_code: "EXC",
        category: "S",
        affectation: None,
    },
    Tribute {
        code: "7152",
        name: "ICBPER",
        type_code: "OTH",
        category: "S",
        affectation: None,
    },
    Tribute {
        code: "9995",
        name: "EXP",
        type_code: "FRE",
        category: "G",
        affectation: Some("40"),
    },
    Tribute {
        code: "9996",
        name: "GRA",
        type_code: "FRE",
        category: "Z",
        affectation: Some("21"),
    },
    Tribute {
        code: "9997",
        name: "EXO",
        type_code: "VAT",
        category: "E",
        affectation: Some("20"),
    },
    Tribute {
        code: "9998",
        name: "INA",
        type_code: "FRE",
        category: "O",
        affectation: Some("30"),
    },
    Tribute {
        code: "9999",
        name: "OTROS",
        type_code: "OTH",
        category: "S",
        affectation: None,
    },
];

/// Look up a catalog 05 tribute. Unknown codes resolve to the "9999 OTROS"
/// entry, so callers should keep emitting their own code value.
pub fn tribute(code: &str) -> &'static Tribute {
    TRIBUTES
        .iter()
        .find(|t| t.code == code)
        .unwrap_or(&TRIBUTES[TRIBUTES.len() - 1])
}

/// Whether `code` is a catalog 05 tribute.
pub fn is_known_tribute(code: &str) -> bool {
    TRIBUTES.iter().any(|t| t.code == code)
}
