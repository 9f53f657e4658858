use rust_decimal::{Decimal, RoundingStrategy};

use super::error::CpeError;

/// Fixed-scale rendering of every numeric leaf in the output tree.
///
/// Always `.` as separator, no grouping, no exponent. The default renders two
/// decimals with commercial rounding (half away from zero), so `100.005`
/// becomes `"100.01"` and `-3` becomes `"-3.00"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmountFormatter {
    scale: u32,
    strategy: RoundingStrategy,
}

impl Default for AmountFormatter {
    fn default() -> Self {
        Self {
            scale: 2,
            strategy: RoundingStrategy::MidpointAwayFromZero,
        }
    }
}

impl AmountFormatter {
    pub fn new(scale: u32, strategy: RoundingStrategy) -> Self {
        Self { scale, strategy }
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    /// Round `value` to the configured scale.
    pub fn round(&self, value: Decimal) -> Decimal {
        let mut rounded = value.round_dp_with_strategy(self.scale, self.strategy);
        rounded.rescale(self.scale);
        if rounded.is_zero() {
            // -0.001 rounds to a negative zero; never print "-0.00".
            rounded.set_sign_positive(true);
        }
        rounded
    }

    pub fn format(&self, value: Decimal) -> String {
        self.round(value).to_string()
    }

    /// Format a binary float. NaN and infinities have no decimal rendering.
    pub fn format_f64(&self, value: f64) -> Result<String, CpeError> {
        if !value.is_finite() {
            return Err(CpeError::Serialization(format!(
                "non-finite number {value} cannot be rendered"
            )));
        }
        let decimal = Decimal::try_from(value)
            .map_err(|e| CpeError::Serialization(format!("number {value}: {e}")))?;
        Ok(self.format(decimal))
    }
}
