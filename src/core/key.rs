use std::fmt;
use std::str::FromStr;

use super::error::CpeError;

/// Composite document key `SERIES-NUMBER`, e.g. "F001-123456".
///
/// The series is a four-character alphanumeric prefix whose first letter
/// tells the document family apart (F = factura, B = boleta); the number is
/// the sequential correlative within that series, up to eight digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentKey {
    series: String,
    number: String,
}

impl DocumentKey {
    pub fn new(series: impl Into<String>, number: impl Into<String>) -> Self {
        Self {
            series: series.into(),
            number: number.into(),
        }
    }

    pub fn series(&self) -> &str {
        &self.series
    }

    pub fn number(&self) -> &str {
        &self.number
    }

    /// Whether the series is four alphanumeric characters.
    pub fn has_valid_series(&self) -> bool {
        self.series.len() == 4 && self.series.chars().all(|c| c.is_ascii_alphanumeric())
    }

    /// Whether the number is one to eight digits.
    pub fn has_valid_number(&self) -> bool {
        (1..=8).contains(&self.number.len()) && self.number.chars().all(|c| c.is_ascii_digit())
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.series, self.number)
    }
}

impl FromStr for DocumentKey {
    type Err = CpeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('-') {
            Some((series, number)) if !series.is_empty() && !number.is_empty() => {
                Ok(Self::new(series, number))
            }
            _ => Err(CpeError::ValidationFailed(vec![
                super::ValidationError::new(
                    "documentId",
                    "SERIES-NUMBER",
                    s,
                    "document_key_validation",
                    "document key must have the form SERIES-NUMBER",
                ),
            ])),
        }
    }
}
