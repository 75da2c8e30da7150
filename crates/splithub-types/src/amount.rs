//! Human-readable token amounts.
//!
//! Amounts travel through the flows as decimal strings (`"10.00"`), exactly as a
//! user typed them. They are converted to integer token units only when an
//! authorization is built, using the decimals reported by the token contract.
//!
//! ```
//! use alloy_primitives::U256;
//! use splithub_types::amount::parse_units;
//!
//! let units = parse_units("10.50", 6).unwrap();
//! assert_eq!(units, U256::from(10_500_000u64));
//! ```

use alloy_primitives::U256;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Error returned when an amount string cannot be turned into token units.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum AmountError {
    #[error("Invalid amount {0:?}")]
    Invalid(String),
    #[error("Amount must not be negative: {0}")]
    Negative(String),
    #[error("Amount {amount} has more than {decimals} decimal places")]
    TooPrecise { amount: String, decimals: u8 },
}

/// Parses a decimal amount string.
pub fn parse_amount(amount: &str) -> Result<Decimal, AmountError> {
    let value =
        Decimal::from_str(amount.trim()).map_err(|_| AmountError::Invalid(amount.to_string()))?;
    if value.is_sign_negative() && !value.is_zero() {
        return Err(AmountError::Negative(amount.to_string()));
    }
    Ok(value)
}

/// Converts a decimal amount string into integer token units (`amount * 10^decimals`).
///
/// Trailing zeros never count as precision: `"1.500000"` is accepted for a
/// 6-decimal token, `"1.0000001"` is not.
pub fn parse_units(amount: &str, decimals: u8) -> Result<U256, AmountError> {
    let value = parse_amount(amount)?.normalize();
    let scale = value.scale();
    if scale > u32::from(decimals) {
        return Err(AmountError::TooPrecise {
            amount: amount.to_string(),
            decimals,
        });
    }
    let mantissa = value.mantissa().unsigned_abs();
    let exponent = U256::from(u32::from(decimals) - scale);
    U256::from(10u8)
        .checked_pow(exponent)
        .and_then(|factor| U256::from(mantissa).checked_mul(factor))
        .ok_or_else(|| AmountError::Invalid(amount.to_string()))
}

/// Sums decimal amount strings and renders the total without trailing zeros.
///
/// `["10.00", "20.00"]` totals to `"30"`. A sum that does not fit a
/// [`Decimal`] is rejected as [`AmountError::Invalid`].
pub fn total_amount<S: AsRef<str>>(amounts: &[S]) -> Result<String, AmountError> {
    let mut total = Decimal::ZERO;
    for amount in amounts {
        let amount = amount.as_ref();
        total = total
            .checked_add(parse_amount(amount)?)
            .ok_or_else(|| AmountError::Invalid(format!("total overflows at {amount}")))?;
    }
    Ok(total.normalize().to_string())
}
