//! Monetary helpers.
//!
//! Every intermediate result is rounded to cents with [`round2`] so that
//! sequential carry-overs never accumulate floating-point drift.

use crate::errors::{Error, Result};

/// Rounds to 2 decimal places. Non-finite input becomes 0.
#[must_use]
pub fn round2(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    (value * 100.0).round() / 100.0
}

/// Coerces user-entered text to an amount; anything unparsable is 0.
#[must_use]
pub fn coerce_amount(input: &str) -> f64 {
    input
        .trim()
        .replace(',', ".")
        .parse::<f64>()
        .map_or(0.0, round2)
}

/// Replaces NaN or infinite amounts by 0 and rounds the rest.
#[must_use]
pub fn sanitize(amount: f64) -> f64 {
    round2(amount)
}

/// Validates an amount that moves money: it must be finite and at least one cent
/// once rounded.
pub fn positive(amount: f64) -> Result<f64> {
    let rounded = round2(amount);
    if !amount.is_finite() || rounded <= 0.0 {
        return Err(Error::InvalidAmount { amount });
    }
    Ok(rounded)
}

/// Sum of an iterator of amounts, rounded after every addition.
pub fn sum<I>(amounts: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    amounts.into_iter().fold(0.0, |acc, a| round2(acc + a))
}
