//! Money helpers

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use rusty_money::{Money, iso, iso::Currency};
use thiserror::Error;

/// Errors from parsing or converting money amounts.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MoneyParseError {
    /// Not in the form `"AMOUNT CODE"`, or the amount isn't a number.
    #[error("invalid money amount `{0}`, expected e.g. \"5000 PHP\"")]
    InvalidAmount(String),

    /// Not an ISO 4217 code we know.
    #[error("unknown currency `{0}`")]
    UnknownCurrency(String),

    /// Has more decimal places than the currency allows, or doesn't fit.
    #[error("{amount} cannot be represented in {currency} minor units")]
    Unrepresentable {
        /// Amount in major units.
        amount: Decimal,

        /// ISO code.
        currency: &'static str,
    },
}

/// Look up a currency by ISO 4217 code, case-insensitively.
///
/// # Errors
///
/// Returns [`MoneyParseError::UnknownCurrency`] for unknown codes.
pub fn currency(code: &str) -> Result<&'static Currency, MoneyParseError> {
    iso::find(&code.trim().to_ascii_uppercase())
        .ok_or_else(|| MoneyParseError::UnknownCurrency(code.to_string()))
}

/// Convert a major-unit amount to minor units. Sub-minor precision is
/// rejected rather than rounded away.
///
/// # Errors
///
/// Returns [`MoneyParseError::Unrepresentable`] if the amount has too many
/// decimal places or doesn't fit in an `i64`.
pub fn major_to_minor(
    amount: Decimal,
    currency: &'static Currency,
) -> Result<i64, MoneyParseError> {
    let unrepresentable = || MoneyParseError::Unrepresentable {
        amount,
        currency: currency.iso_alpha_code,
    };

    let scaled = 10_i64
        .checked_pow(currency.exponent)
        .map(Decimal::from)
        .and_then(|factor| amount.checked_mul(factor))
        .ok_or_else(unrepresentable)?;

    if scaled.fract() != Decimal::ZERO {
        return Err(unrepresentable());
    }

    scaled
        .round_dp_with_strategy(0, RoundingStrategy::ToZero)
        .to_i64()
        .ok_or_else(unrepresentable)
}

/// Parse `"AMOUNT CODE"` (e.g. `"5000 PHP"`, `"12.50 USD"`) into money.
///
/// # Errors
///
/// Returns a [`MoneyParseError`] if the format, amount or currency is invalid.
pub fn parse_money(s: &str) -> Result<Money<'static, Currency>, MoneyParseError> {
    let mut parts = s.split_whitespace();

    let (Some(amount), Some(code), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(MoneyParseError::InvalidAmount(s.to_string()));
    };

    let amount = amount
        .replace(',', "")
        .parse::<Decimal>()
        .map_err(|_err| MoneyParseError::InvalidAmount(s.to_string()))?;

    let currency = currency(code)?;

    Ok(Money::from_minor(major_to_minor(amount, currency)?, currency))
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn parses_amount_and_code() -> TestResult {
        let money = parse_money("5,000 PHP")?;

        assert_eq!(money.to_minor_units(), 5000_00);
        assert_eq!(money.currency(), iso::PHP);

        Ok(())
    }

    #[test]
    fn currency_lookup_ignores_case() -> TestResult {
        assert_eq!(currency("php")?, iso::PHP);

        Ok(())
    }

    #[test]
    fn rejects_missing_currency() {
        assert!(matches!(
            parse_money("5000"),
            Err(MoneyParseError::InvalidAmount(_))
        ));
    }

    #[test]
    fn rejects_unknown_currency() {
        assert!(matches!(
            parse_money("10 ABC"),
            Err(MoneyParseError::UnknownCurrency(code)) if code == "ABC"
        ));
    }

    #[test]
    fn rejects_sub_minor_precision() {
        assert!(matches!(
            major_to_minor(Decimal::new(10_005, 3), iso::PHP),
            Err(MoneyParseError::Unrepresentable { .. })
        ));
    }

    #[test]
    fn converts_major_to_minor() -> TestResult {
        assert_eq!(major_to_minor(Decimal::new(1050, 2), iso::PHP)?, 1050);
        assert_eq!(major_to_minor(Decimal::new(10, 0), iso::PHP)?, 1000);

        Ok(())
    }
}
