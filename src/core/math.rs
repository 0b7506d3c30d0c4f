use super::constants::POW_APPROX_PRECISION;
use super::dec::{round, truncate};
use super::Result;
use anyhow::anyhow;
use bigdecimal::BigDecimal;
use num_traits::{One, ToPrimitive, Zero};
use std::str::FromStr;

// Series terms needed once the base is within 0.5 of 1 stay far below this
const MAX_POW_ITERATIONS: u64 = 300;

fn checked_div(numerator: &BigDecimal, denominator: &BigDecimal) -> Result<BigDecimal> {
    if denominator.is_zero() {
        return Err(anyhow!("Division by zero in pool math"));
    }
    Ok(round(&(numerator / denominator)))
}

fn abs_difference_with_sign(a: &BigDecimal, b: &BigDecimal) -> (BigDecimal, bool) {
    if a >= b {
        (a - b, false)
    } else {
        (b - a, true)
    }
}

/// Spot price of the in-token quoted in the out-token, fee included:
/// `(Bi / Wi) / (Bo / Wo) * 1 / (1 - fee)`.
pub fn calc_spot_price(
    balance_in: &BigDecimal,
    weight_in: &BigDecimal,
    balance_out: &BigDecimal,
    weight_out: &BigDecimal,
    swap_fee: &BigDecimal,
) -> Result<BigDecimal> {
    let number = checked_div(balance_in, weight_in)?;
    let denom = checked_div(balance_out, weight_out)?;
    let ratio = checked_div(&number, &denom)?;
    let scale = checked_div(&BigDecimal::one(), &(BigDecimal::one() - swap_fee))?;

    Ok(round(&(ratio * scale)))
}

/// Weighted-pool output for an exact input:
/// `Bo * (1 - (Bi / (Bi + Ai * (1 - fee))) ^ (Wi / Wo))`.
pub fn calc_out_given_in(
    balance_in: &BigDecimal,
    weight_in: &BigDecimal,
    balance_out: &BigDecimal,
    weight_out: &BigDecimal,
    amount_in: &BigDecimal,
    swap_fee: &BigDecimal,
) -> Result<BigDecimal> {
    let weight_ratio = checked_div(weight_in, weight_out)?;
    let adjusted_in = round(&(amount_in * (BigDecimal::one() - swap_fee)));
    let y = checked_div(balance_in, &(balance_in + &adjusted_in))?;
    let foo = pow(&y, &weight_ratio)?;
    let bar = BigDecimal::one() - foo;

    Ok(round(&(balance_out * bar)))
}

/// `base ^ exp` for `0 < base < 2` and `exp >= 0`.
///
/// The integer part of the exponent is applied exactly; the fractional part
/// goes through [`pow_approx`].
pub fn pow(base: &BigDecimal, exp: &BigDecimal) -> Result<BigDecimal> {
    if *base <= BigDecimal::zero() || *base >= BigDecimal::from(2u32) {
        return Err(anyhow!("Pow base must be in range (0, 2), got {}", base));
    }
    if *exp < BigDecimal::zero() {
        return Err(anyhow!("Pow exponent must be non-negative, got {}", exp));
    }

    let (times, fractional) = split_exponent(exp)?;
    let integer_pow = pow_int(base, times);

    if fractional.is_zero() {
        return Ok(integer_pow);
    }

    let precision = BigDecimal::from_str(POW_APPROX_PRECISION)?;
    let partial = pow_approx(base, &fractional, &precision)?;

    Ok(round(&(integer_pow * partial)))
}

fn split_exponent(exp: &BigDecimal) -> Result<(u64, BigDecimal)> {
    let integer = truncate(exp);
    let fractional = exp - BigDecimal::new(integer.clone(), 0);
    let times = integer
        .to_u64()
        .ok_or_else(|| anyhow!("Pow exponent {} is too large", exp))?;
    Ok((times, fractional))
}

fn pow_int(base: &BigDecimal, mut times: u64) -> BigDecimal {
    let mut result = BigDecimal::one();
    let mut square = base.clone();
    while times > 0 {
        if times & 1 == 1 {
            result = round(&(&result * &square));
        }
        square = round(&(&square * &square));
        times >>= 1;
    }
    result
}

/// `base ^ exp` for a fractional `exp`, accurate to `precision`.
///
/// The binomial series converges slowly when the base is far from 1, so the
/// base is first pulled into [0.5, 1.5] by square roots, doubling the
/// exponent each time: `b^e = sqrt(b)^(2e)`.
pub fn pow_approx(base: &BigDecimal, exp: &BigDecimal, precision: &BigDecimal) -> Result<BigDecimal> {
    if exp.is_zero() {
        return Ok(BigDecimal::one());
    }

    let one = BigDecimal::one();
    let half = BigDecimal::new(5.into(), 1);
    let mut base = base.clone();
    let mut exp = exp.clone();
    while abs_difference_with_sign(&base, &one).0 > half {
        base = base
            .sqrt()
            .map(|root| round(&root))
            .ok_or_else(|| anyhow!("Pow base {} has no square root", base))?;
        exp = exp * BigDecimal::from(2u32);
    }

    let (times, fractional) = split_exponent(&exp)?;
    let series = pow_series(&base, &fractional, precision)?;
    Ok(round(&(pow_int(&base, times) * series)))
}

// (1 - x)^a = sum over k of binom(a, k) * (-x)^k, summed until a term drops
// below `precision`
fn pow_series(base: &BigDecimal, exp: &BigDecimal, precision: &BigDecimal) -> Result<BigDecimal> {
    if exp.is_zero() {
        return Ok(BigDecimal::one());
    }

    let one = BigDecimal::one();
    let (x, x_neg) = abs_difference_with_sign(base, &one);
    let mut term = BigDecimal::one();
    let mut sum = BigDecimal::one();
    let mut negative = false;

    let mut i: u64 = 1;
    while term >= *precision {
        if i > MAX_POW_ITERATIONS {
            return Err(anyhow!(
                "Pow series for {}^{} did not converge in {} terms",
                base,
                exp,
                MAX_POW_ITERATIONS
            ));
        }

        let big_k = BigDecimal::from(i);
        let (c, c_neg) = abs_difference_with_sign(exp, &(&big_k - &one));
        term = round(&(&term * &(&c * &x)));
        term = round(&(&term / &big_k));

        if term.is_zero() {
            break;
        }
        if x_neg {
            negative = !negative;
        }
        if c_neg {
            negative = !negative;
        }
        if negative {
            sum = &sum - &term;
        } else {
            sum = &sum + &term;
        }
        i += 1;
    }
    Ok(sum)
}
