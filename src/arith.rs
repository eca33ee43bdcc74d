//! Checked arithmetic primitives.
//!
//! Every function validates its domain before computing and reports a
//! [`MathError`] instead of handing back NaN or infinity.

use az::CheckedAs;
use thiserror::Error;

/// Distance from the nearest integer still treated as an integer.
pub const INTEGER_TOLERANCE: f64 = 1e-12;
/// Newton iteration stops once a step is smaller than this, scaled by `max(1, |x|)`.
pub const ROOT_TOLERANCE: f64 = 1e-10;
pub const ROOT_MAX_ITERATIONS: usize = 1000;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MathError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("division by zero")]
    DivisionByZero,
    #[error("overflow: {0}")]
    Overflow(String),
}

pub struct Calculator;

impl Calculator {
    pub fn add(a: f64, b: f64) -> f64 {
        a + b
    }

    pub fn sub(a: f64, b: f64) -> f64 {
        a - b
    }

    pub fn mul(a: f64, b: f64) -> f64 {
        a * b
    }

    pub fn div(a: f64, b: f64) -> Result<f64, MathError> {
        if b == 0.0 {
            return Err(MathError::DivisionByZero);
        }
        Ok(a / b)
    }

    pub fn is_integer(a: f64) -> bool {
        (a - a.round()).abs() < INTEGER_TOLERANCE
    }

    pub fn fact(a: f64) -> Result<f64, MathError> {
        if a < 0.0 {
            return Err(MathError::InvalidArgument(format!(
                "factorial of negative number {}",
                a
            )));
        }
        if !Self::is_integer(a) {
            return Err(MathError::InvalidArgument(format!(
                "factorial of non-integer {}",
                a
            )));
        }

        let n = a.round();
        let mut result = 1.0;
        let mut i = 2.0;
        while i <= n {
            result *= i;
            if !result.is_finite() {
                return Err(MathError::Overflow(format!("{}! is too large", n)));
            }
            i += 1.0;
        }
        Ok(result)
    }

    /// Raises `a` to a non-negative integer power `b`.
    pub fn power(a: f64, b: f64) -> Result<f64, MathError> {
        if !Self::is_integer(b) || b.round() < 0.0 {
            return Err(MathError::InvalidArgument(format!(
                "exponent must be a non-negative integer, got {}",
                b
            )));
        }
        let Some(mut exponent) = b.round().checked_as::<u64>() else {
            return Err(MathError::InvalidArgument(format!(
                "exponent {} out of range",
                b
            )));
        };

        let mut base = a;
        let mut result = 1.0;
        while exponent > 0 {
            if exponent & 1 == 1 {
                result *= base;
            }
            exponent >>= 1;
            if exponent > 0 {
                base *= base;
            }
        }

        if !result.is_finite() && a.is_finite() {
            return Err(MathError::Overflow(format!("{}^{} is too large", a, b)));
        }
        Ok(result)
    }

    /// `b`-th root of `a` by Newton-Raphson iteration.
    pub fn root(a: f64, b: f64) -> Result<f64, MathError> {
        if !Self::is_integer(b) || b.round() <= 0.0 {
            return Err(MathError::InvalidArgument(format!(
                "root degree must be a positive integer, got {}",
                b
            )));
        }
        let Some(degree) = b.round().checked_as::<i32>() else {
            return Err(MathError::InvalidArgument(format!(
                "root degree {} out of range",
                b
            )));
        };
        if degree % 2 == 0 && a < 0.0 {
            return Err(MathError::InvalidArgument(format!(
                "even root of negative number {}",
                a
            )));
        }
        if a == 0.0 {
            return Ok(0.0);
        }

        let n = f64::from(degree);
        // Start from the float root and let Newton polish it.
        let mut x = a.abs().powf(n.recip()).copysign(a);
        for _ in 0..ROOT_MAX_ITERATIONS {
            let next = ((n - 1.0) * x + a / x.powi(degree - 1)) / n;
            if !next.is_finite() {
                return Err(MathError::Overflow(format!(
                    "root({}, {}) diverged",
                    a, b
                )));
            }
            if (next - x).abs() < ROOT_TOLERANCE * next.abs().max(1.0) {
                return Ok(next);
            }
            x = next;
        }
        Err(MathError::Overflow(format!(
            "root({}, {}) did not converge",
            a, b
        )))
    }

    /// Remainder of integer division, always in `0..|b|`.
    pub fn modulo(a: f64, b: f64) -> Result<f64, MathError> {
        if !Self::is_integer(a) || !Self::is_integer(b) {
            return Err(MathError::InvalidArgument(format!(
                "modulo needs integer operands, got {} and {}",
                a, b
            )));
        }
        let (Some(lhs), Some(rhs)) = (
            a.round().checked_as::<i64>(),
            b.round().checked_as::<i64>(),
        ) else {
            return Err(MathError::InvalidArgument(format!(
                "modulo operands {} and {} out of range",
                a, b
            )));
        };
        if rhs == 0 {
            return Err(MathError::DivisionByZero);
        }
        lhs.checked_rem_euclid(rhs)
            .map(|r| r as f64)
            .ok_or_else(|| MathError::Overflow(format!("{} % {}", lhs, rhs)))
    }
}
