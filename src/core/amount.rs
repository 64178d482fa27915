//! Money amounts as stored in `Decimal(12, 2)` columns.
//!
//! `SQLite` keeps these columns as REAL, so an amount only reads back exactly when
//! it fits the declared precision. Every amount the crate persists passes
//! through [`ensure_fits`], and line and budget arithmetic is checked so it
//! reports `Validation` instead of overflowing.

use crate::{
    config::constants::{MONEY_INTEGER_DIGITS, MONEY_SCALE},
    errors::{Error, Result},
};
use rust_decimal::Decimal;

/// Exclusive bound on the magnitude of a stored amount
fn limit() -> Decimal {
    Decimal::from(10_i64.pow(MONEY_INTEGER_DIGITS))
}

/// Fails with `Validation` unless `amount` fits a money column.
pub fn ensure_fits(field: &str, amount: Decimal) -> Result<Decimal> {
    if amount.normalize().scale() > MONEY_SCALE {
        return Err(Error::validation(format!(
            "{field} {amount} has more than {MONEY_SCALE} decimal places"
        )));
    }
    ensure_in_range(field, amount)
}

fn ensure_in_range(field: &str, amount: Decimal) -> Result<Decimal> {
    if amount.abs() >= limit() {
        return Err(Error::validation(format!(
            "{field} {amount} exceeds {MONEY_INTEGER_DIGITS} integer digits"
        )));
    }
    Ok(amount)
}

/// A catalog price: fits a money column and is not negative.
pub fn ensure_price(price: Decimal) -> Result<Decimal> {
    if price < Decimal::ZERO {
        return Err(Error::validation(format!(
            "Price cannot be negative, got {price}"
        )));
    }
    ensure_fits("Price", price)
}

/// `unit_cost * quantity`, bounded like any stored amount.
///
/// Inputs come back from REAL columns, so the result is rounded to the money
/// scale rather than rejected for float noise in the last digits.
pub fn line_total(unit_cost: Decimal, quantity: i32) -> Result<Decimal> {
    let total = unit_cost
        .round_dp(MONEY_SCALE)
        .checked_mul(Decimal::from(quantity))
        .ok_or_else(|| {
            Error::validation(format!("Line total {unit_cost} x {quantity} overflows"))
        })?;
    ensure_in_range("Line total", total)
}

/// Sum of line totals, bounded like any stored amount.
pub fn total<I>(amounts: I) -> Result<Decimal>
where
    I: IntoIterator<Item = Decimal>,
{
    let total = amounts
        .into_iter()
        .try_fold(Decimal::ZERO, |sum, amount| {
            sum.checked_add(amount.round_dp(MONEY_SCALE))
        })
        .ok_or_else(|| Error::validation("Budget total overflows"))?;
    ensure_in_range("Budget total", total)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use std::str::FromStr;

    fn dec(text: &str) -> Decimal {
        Decimal::from_str(text).unwrap()
    }

    #[test]
    fn test_prices_respect_column_precision() {
        assert_eq!(ensure_price(dec("15.00")).unwrap(), dec("15"));
        assert!(ensure_price(dec("15.000")).is_ok());
        assert!(ensure_price(dec("9999999999.99")).is_ok());

        let huge = Decimal::from_scientific("1e28").unwrap();
        for bad in [dec("0.105"), dec("10000000000"), huge, dec("-0.01")] {
            let err = ensure_price(bad).unwrap_err();
            assert!(matches!(err, Error::Validation { .. }), "{bad} accepted");
        }
    }

    #[test]
    fn test_line_total_never_panics() {
        assert_eq!(line_total(dec("15.00"), 3).unwrap(), dec("45.00"));
        assert_eq!(line_total(dec("32.5000000001"), 2).unwrap(), dec("65.00"));

        let err = line_total(Decimal::MAX, 10).unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));

        let err = line_total(dec("9999999999.99"), i32::MAX).unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[test]
    fn test_total_is_checked() {
        assert_eq!(
            total([dec("45.00"), dec("65.00")]).unwrap(),
            dec("110.00")
        );
        assert_eq!(total([]).unwrap(), Decimal::ZERO);

        let err = total([Decimal::MAX, Decimal::MAX]).unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));

        let err = total([dec("9999999999.99"), dec("0.01")]).unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }
}
