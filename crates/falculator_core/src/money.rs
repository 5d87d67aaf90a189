//! Decimal money helpers.
//!
//! Every monetary value and every percentage in the engine is a
//! [`rust_decimal::Decimal`]: 96-bit mantissa, 28–29 significant digits,
//! exact addition and subtraction. Percentages are stored as plain
//! decimals (`4.5` means 4.5%, not 0.045).
//!
//! Exponentiation goes through `MathematicalOps` (`powi`/`powd`), which
//! is pure integer arithmetic and therefore produces identical bits on
//! every platform. Where a result is rounded, the strategy is banker's
//! rounding (`MidpointNearestEven`).

use rust_decimal::{Decimal, MathematicalOps, RoundingStrategy};

/// `percent`% of `value`.
#[inline]
pub fn percent_of(value: Decimal, percent: Decimal) -> Decimal {
    value * percent / Decimal::ONE_HUNDRED
}

/// Growth factor for `periods` applications of `rate_percent` per
/// period: `(1 + rate/100)^periods`.
pub fn compound_factor(rate_percent: Decimal, periods: u32) -> Decimal {
    let base = Decimal::ONE + rate_percent / Decimal::ONE_HUNDRED;
    base.powi(i64::from(periods))
}

/// Growth factor for an annual rate applied with monthly compounding
/// over `occurrences` monthly firings: `(1 + rate/100)^(occurrences/12)`.
///
/// A single firing yields the twelfth root of the annual factor, so
/// twelve firings compound back to exactly the annual rate.
pub fn annual_monthly_factor(rate_percent: Decimal, occurrences: u32) -> Decimal {
    let base = Decimal::ONE + rate_percent / Decimal::ONE_HUNDRED;
    let exponent = Decimal::from(occurrences) / Decimal::from(12);
    base.powd(exponent)
}

/// Round to whole cents, banker's rounding.
#[inline]
pub fn round_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
}
