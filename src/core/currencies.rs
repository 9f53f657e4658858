//! ISO 4217 currencies accepted for SUNAT electronic documents.

/// Check whether `code` is a currency the converter issues documents in.
pub fn is_supported_currency(code: &str) -> bool {
    CURRENCY_CODES.binary_search(&code).is_ok()
}

/// Sorted for binary search.
static CURRENCY_CODES: &[&str] = &[
    "EUR", // Euro
    "PEN", // Sol
    "USD", // US Dollar
];
