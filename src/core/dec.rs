use super::constants::{DEC_PRECISION, DISPLAY_MAX_DECIMALS, DISPLAY_PRECISION, DISPLAY_SCALE_EXPONENT};
use super::types::Currency;
use super::Result;
use crate::error::TradeError;
use bigdecimal::BigDecimal;
use num_bigint::{BigInt, BigUint, Sign};
use num_traits::Zero;
use std::fmt;
use std::str::FromStr;

pub fn ten_pow(exp: u32) -> BigUint {
    BigUint::from(10u32).pow(exp)
}

/// Parses a human decimal string ("1.25", " 3 ", "-0.5") into a decimal.
///
/// Only an optional minus sign, digits and at most one point are accepted.
/// Exponent forms such as "1e3" are rejected.
pub fn parse_dec(value: &str) -> Option<BigDecimal> {
    let trimmed = value.trim();
    let (negative, unsigned) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };
    let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, ""));

    let is_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    if int_part.len() + frac_part.len() == 0 || !is_digits(int_part) || !is_digits(frac_part) {
        return None;
    }

    let magnitude = BigUint::from_str(&format!("{}{}", int_part, frac_part)).ok()?;
    let sign = if negative { Sign::Minus } else { Sign::Plus };
    Some(BigDecimal::new(
        BigInt::from_biguint(sign, magnitude),
        frac_part.len() as i64,
    ))
}

pub fn dec_from_biguint(value: &BigUint) -> BigDecimal {
    BigDecimal::new(BigInt::from(value.clone()), 0)
}

// Moves the decimal point `places` digits to the right (left when negative).
// Exact, no division involved.
pub fn shift_decimal(value: &BigDecimal, places: i64) -> BigDecimal {
    let (digits, scale) = value.as_bigint_and_exponent();
    BigDecimal::new(digits, scale - places)
}

// Rounds toward zero to an integer
pub fn truncate(value: &BigDecimal) -> BigInt {
    let (digits, scale) = value.as_bigint_and_exponent();
    if scale <= 0 {
        return digits * BigInt::from(ten_pow(exponent_u32(scale.unsigned_abs())));
    }
    // |digits| < 2^bits <= 10^scale, nothing is left of the integer part
    if scale.unsigned_abs() >= digits.bits() {
        return BigInt::zero();
    }
    digits / BigInt::from(ten_pow(exponent_u32(scale.unsigned_abs())))
}

fn exponent_u32(exp: u64) -> u32 {
    u32::try_from(exp).unwrap_or(u32::MAX)
}

pub fn truncate_to_biguint(value: &BigDecimal) -> BigUint {
    truncate(value).to_biguint().unwrap_or_default()
}

// Keeps intermediate pool math at a fixed scale
pub fn round(value: &BigDecimal) -> BigDecimal {
    value.with_scale(DEC_PRECISION)
}

/// Converts a human decimal amount into integer base units.
///
/// The result is `floor(amount * 10^decimals)`: excess fractional digits are
/// dropped, never rounded up, so a quote never assumes more input than the
/// user typed.
pub fn to_base_units(amount: &str, decimals: u32) -> Result<BigUint> {
    let dec = parse_dec(amount).ok_or_else(|| TradeError::InvalidAmount(amount.to_string()))?;
    if dec < BigDecimal::zero() {
        return Err(TradeError::InvalidAmount(amount.to_string()).into());
    }
    Ok(truncate_to_biguint(&shift_decimal(&dec, decimals as i64)))
}

pub fn from_base_units(amount: &BigUint, decimals: u32) -> BigDecimal {
    BigDecimal::new(BigInt::from(amount.clone()), decimals as i64)
}

/// Renders a decimal with at most `max_decimals` fractional digits.
///
/// Extra digits are truncated. With `trim`, trailing zeros (and a dangling
/// decimal point) are removed.
pub fn format_dec(value: &BigDecimal, max_decimals: u32, trim: bool) -> String {
    let units = truncate(&shift_decimal(value, max_decimals as i64));
    let negative = units.sign() == Sign::Minus;

    let width = max_decimals as usize + 1;
    let mut digits = units.magnitude().to_str_radix(10);
    if digits.len() < width {
        digits = format!("{}{}", "0".repeat(width - digits.len()), digits);
    }

    let (int_part, frac_part) = digits.split_at(digits.len() - max_decimals as usize);
    let mut frac = frac_part.to_string();
    if trim {
        while frac.ends_with('0') {
            frac.pop();
        }
    }

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(int_part);
    if !frac.is_empty() {
        out.push('.');
        out.push_str(&frac);
    }
    out
}

/// A decimal paired with its display options.
#[derive(Clone, Debug, PartialEq)]
pub struct PrettyDec {
    raw: BigDecimal,
    precision: u32,
    max_decimals: u32,
    trim: bool,
}

impl PrettyDec {
    pub fn new(raw: BigDecimal) -> Self {
        Self {
            raw,
            precision: 0,
            max_decimals: DEC_PRECISION as u32,
            trim: false,
        }
    }

    // The displayed value is `raw / 10^precision`
    pub fn precision(mut self, precision: u32) -> Self {
        self.precision = precision;
        self
    }

    pub fn max_decimals(mut self, max_decimals: u32) -> Self {
        self.max_decimals = max_decimals;
        self
    }

    pub fn trim(mut self, trim: bool) -> Self {
        self.trim = trim;
        self
    }

    pub fn to_dec(&self) -> BigDecimal {
        shift_decimal(&self.raw, -(self.precision as i64))
    }
}

impl fmt::Display for PrettyDec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_dec(&self.to_dec(), self.max_decimals, self.trim))
    }
}

/// Formats a ratio such as `0.0123` as the percent value `1.23`.
///
/// The ratio is scaled by 10^5 and displayed with precision 3. Scaling by
/// 100 directly loses precision in some decimal formatters when the integer
/// part is zero, so the two-step form is kept.
pub fn percent_pretty(ratio: &BigDecimal) -> PrettyDec {
    PrettyDec::new(shift_decimal(ratio, DISPLAY_SCALE_EXPONENT as i64))
        .precision(DISPLAY_PRECISION)
        .max_decimals(DISPLAY_MAX_DECIMALS)
        .trim(true)
}

/// An amount in base units together with the currency that gives it meaning.
#[derive(Clone, Debug, PartialEq)]
pub struct PrettyCoin {
    pub currency: Currency,
    pub amount: BigUint,
}

impl PrettyCoin {
    pub fn new(currency: Currency, amount: BigUint) -> Self {
        Self { currency, amount }
    }

    pub fn zero(currency: Currency) -> Self {
        Self::new(currency, BigUint::zero())
    }

    pub fn to_dec(&self) -> BigDecimal {
        from_base_units(&self.amount, self.currency.coin_decimals)
    }
}

impl fmt::Display for PrettyCoin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}",
            format_dec(&self.to_dec(), self.currency.coin_decimals, true),
            self.currency.coin_denom
        )
    }
}
