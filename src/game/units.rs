use ethers::types::{Sign, I256, U256};
use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

/// On-chain representation of an item amount. Whole-unit items have no
/// fractional on-chain amount; FIXED18 items use 18 decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Whole,
    Fixed18,
}

pub const FIXED18_DECIMALS: usize = 18;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum UnitError {
    #[error("Amount must not be negative: {0}")]
    Negative(Decimal),

    #[error("Whole-unit amount has a fractional part: {0}")]
    FractionalWholeUnit(Decimal),

    #[error("Amount has more than 18 decimal places: {0}")]
    PrecisionTooHigh(Decimal),

    #[error("On-chain amount out of range: {0}")]
    OutOfRange(String),
}

/// Converts a display-decimal amount to its on-chain integer representation.
/// All arithmetic stays in the string/decimal domain; floats would corrupt
/// settlement amounts.
pub fn to_chain_integer(amount: &Decimal, unit: Unit) -> Result<U256, UnitError> {
    if amount.is_sign_negative() {
        return Err(UnitError::Negative(*amount));
    }
    let normalized = amount.normalize();

    match unit {
        Unit::Whole => {
            if !normalized.fract().is_zero() {
                return Err(UnitError::FractionalWholeUnit(*amount));
            }
            parse_u256(&normalized.to_string())
        }
        Unit::Fixed18 => {
            let text = normalized.to_string();
            let (int_part, frac_part) = match text.split_once('.') {
                Some((i, f)) => (i, f),
                None => (text.as_str(), ""),
            };
            if frac_part.len() > FIXED18_DECIMALS {
                return Err(UnitError::PrecisionTooHigh(*amount));
            }
            let mut digits = String::with_capacity(int_part.len() + FIXED18_DECIMALS);
            digits.push_str(int_part);
            digits.push_str(frac_part);
            for _ in 0..(FIXED18_DECIMALS - frac_part.len()) {
                digits.push('0');
            }
            parse_u256(&digits)
        }
    }
}

/// Inverse of [`to_chain_integer`]; exact for every value the forward
/// conversion can produce within `Decimal` range.
pub fn from_chain_integer(raw: U256, unit: Unit) -> Result<Decimal, UnitError> {
    let text = raw.to_string();
    match unit {
        Unit::Whole => {
            Decimal::from_str(&text).map_err(|e| UnitError::OutOfRange(e.to_string()))
        }
        Unit::Fixed18 => {
            let padded = if text.len() <= FIXED18_DECIMALS {
                format!("0.{:0>width$}", text, width = FIXED18_DECIMALS)
            } else {
                let split = text.len() - FIXED18_DECIMALS;
                format!("{}.{}", &text[..split], &text[split..])
            };
            Decimal::from_str(&padded)
                .map(|d| d.normalize())
                .map_err(|e| UnitError::OutOfRange(e.to_string()))
        }
    }
}

/// Signed variant used for settlement deltas; the sign is carried into the
/// on-chain int256.
pub fn to_signed_chain_integer(amount: &Decimal, unit: Unit) -> Result<I256, UnitError> {
    let magnitude = to_chain_integer(&amount.abs(), unit)?;
    let sign = if amount.is_sign_negative() {
        Sign::Negative
    } else {
        Sign::Positive
    };
    I256::checked_from_sign_and_abs(sign, magnitude)
        .ok_or_else(|| UnitError::OutOfRange(amount.to_string()))
}

fn parse_u256(digits: &str) -> Result<U256, UnitError> {
    let trimmed = digits.trim_start_matches('0');
    let trimmed = if trimmed.is_empty() { "0" } else { trimmed };
    U256::from_dec_str(trimmed).map_err(|e| UnitError::OutOfRange(e.to_string()))
}
