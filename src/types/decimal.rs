//! Checked mathematical operations on `Decimal`.
//!
//! `rust_decimal` panics on some invalid inputs (e.g. the square root of a
//! negative number through `powd`), so every helper here reports failure as a
//! [`HedgeError::NumericalError`] instead.

use crate::Decimal;
use crate::types::error::{HedgeError, HedgeResult};
use rust_decimal::MathematicalOps;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal_macros::dec;

/// Beyond this magnitude `erf(x)` equals ±1 to more than 15 digits.
const ERF_SATURATION: Decimal = dec!(6);

/// Square root of a non-negative `Decimal`.
///
/// # Errors
///
/// Returns `HedgeError::NumericalError` if `value` is negative.
pub fn decimal_sqrt(value: Decimal) -> HedgeResult<Decimal> {
    if value < Decimal::ZERO {
        return Err(HedgeError::NumericalError(format!(
            "Cannot take square root of negative value {}",
            value
        )));
    }
    if value.is_zero() {
        return Ok(Decimal::ZERO);
    }
    value.sqrt().ok_or_else(|| {
        HedgeError::NumericalError(format!("Square root of {} did not converge", value))
    })
}

/// Natural exponential `e^value`.
///
/// # Errors
///
/// Returns `HedgeError::NumericalError` if the result overflows.
pub fn decimal_exp(value: Decimal) -> HedgeResult<Decimal> {
    value
        .checked_exp()
        .ok_or_else(|| HedgeError::NumericalError(format!("exp({}) overflowed", value)))
}

/// Gauss error function.
///
/// Uses the Abramowitz & Stegun 7.1.26 rational approximation
/// (absolute error below 1.5e-7), saturating to ±1 for large arguments.
pub fn decimal_erf(value: Decimal) -> HedgeResult<Decimal> {
    if value.is_zero() {
        return Ok(Decimal::ZERO);
    }

    let sign = if value.is_sign_negative() {
        Decimal::NEGATIVE_ONE
    } else {
        Decimal::ONE
    };
    let x = value.abs();
    if x >= ERF_SATURATION {
        return Ok(sign);
    }

    let a1 = dec!(0.254829592);
    let a2 = dec!(-0.284496736);
    let a3 = dec!(1.421413741);
    let a4 = dec!(-1.453152027);
    let a5 = dec!(1.061405429);
    let p = dec!(0.3275911);

    let t = Decimal::ONE / (Decimal::ONE + p * x);
    // Horner form of a1·t + a2·t² + a3·t³ + a4·t⁴ + a5·t⁵
    let poly = t * (a1 + t * (a2 + t * (a3 + t * (a4 + t * a5))));
    let y = Decimal::ONE - poly * decimal_exp(-(x * x))?;

    Ok(sign * clamp_unit(y))
}

/// Standard normal cumulative distribution function Φ(x).
pub fn decimal_norm_cdf(value: Decimal) -> HedgeResult<Decimal> {
    let scaled = value / decimal_sqrt(Decimal::TWO)?;
    let cdf = (Decimal::ONE + decimal_erf(scaled)?) / Decimal::TWO;
    Ok(clamp_unit(cdf))
}

/// Checked addition.
///
/// # Errors
///
/// Returns `HedgeError::NumericalError` if the sum overflows.
pub fn checked_add(a: Decimal, b: Decimal) -> HedgeResult<Decimal> {
    a.checked_add(b)
        .ok_or_else(|| HedgeError::NumericalError(format!("{} + {} overflowed", a, b)))
}

/// Checked subtraction.
///
/// # Errors
///
/// Returns `HedgeError::NumericalError` if the difference overflows.
pub fn checked_sub(a: Decimal, b: Decimal) -> HedgeResult<Decimal> {
    a.checked_sub(b)
        .ok_or_else(|| HedgeError::NumericalError(format!("{} - {} overflowed", a, b)))
}

/// Checked multiplication.
///
/// # Errors
///
/// Returns `HedgeError::NumericalError` if the product overflows.
pub fn checked_mul(a: Decimal, b: Decimal) -> HedgeResult<Decimal> {
    a.checked_mul(b)
        .ok_or_else(|| HedgeError::NumericalError(format!("{} * {} overflowed", a, b)))
}

/// Checked division.
///
/// # Errors
///
/// Returns `HedgeError::NumericalError` on division by zero or overflow.
pub fn checked_div(a: Decimal, b: Decimal) -> HedgeResult<Decimal> {
    a.checked_div(b)
        .ok_or_else(|| HedgeError::NumericalError(format!("{} / {} is not representable", a, b)))
}

/// Sum of `values`, failing on overflow instead of panicking.
///
/// # Errors
///
/// Returns `HedgeError::NumericalError` if a partial sum overflows.
pub fn checked_sum<I>(values: I) -> HedgeResult<Decimal>
where
    I: IntoIterator<Item = Decimal>,
{
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, value| checked_add(acc, value))
}

/// Clamps `value` into `[min, max]`.
#[must_use]
pub fn clamp(value: Decimal, min: Decimal, max: Decimal) -> Decimal {
    value.max(min).min(max)
}

/// Clamps `value` into `[0, 1]`.
#[must_use]
pub fn clamp_unit(value: Decimal) -> Decimal {
    clamp(value, Decimal::ZERO, Decimal::ONE)
}

/// Converts a `Decimal` to `f64`.
///
/// # Errors
///
/// Returns `HedgeError::NumericalError` if the value is not representable.
pub fn to_f64(value: Decimal) -> HedgeResult<f64> {
    value
        .to_f64()
        .ok_or_else(|| HedgeError::NumericalError(format!("{} is not representable as f64", value)))
}

/// Converts a finite `f64` to `Decimal`.
///
/// # Errors
///
/// Returns `HedgeError::NumericalError` for NaN, infinities or values outside
/// the `Decimal` range.
pub fn from_f64(value: f64) -> HedgeResult<Decimal> {
    if !value.is_finite() {
        return Err(HedgeError::NumericalError(format!(
            "Cannot convert non-finite value {} to Decimal",
            value
        )));
    }
    Decimal::from_f64(value).ok_or_else(|| {
        HedgeError::NumericalError(format!("{} is outside the Decimal range", value))
    })
}
