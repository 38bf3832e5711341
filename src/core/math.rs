use thiserror::Error;

/// Factor / percentage precision: a factor of `ONE` is 100%.
pub const ONE: u128 = 10_000;

/// Price precision for usd values (1e18 scale).
pub const PRICE_PRECISION: u128 = 1_000_000_000_000_000_000;

/// Errors arising from checked fixed-point arithmetic.
///
/// Arithmetic failures are always fatal to the enclosing call — the
/// engine never saturates or wraps, correctness of the exposure
/// counters depends on exact reversion.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MathError {
    #[error("division by zero")]
    DivisionByZero,
    #[error("arithmetic overflow")]
    Overflow,
    #[error("arithmetic underflow")]
    Underflow,
}

/// Compute `a * b / denominator`, rounding toward zero.
///
/// The product is formed at full u128 width; inputs whose product
/// exceeds it fail with [`MathError::Overflow`]. At the 1e18 price
/// scale this admits exposures up to ~3.4e20 raw units, which is the
/// intended operating range.
///
/// Exposure-increasing conversions use this rounding direction: the
/// protocol never credits a position with more value than exact.
pub fn mul_div_down(a: u128, b: u128, denominator: u128) -> Result<u128, MathError> {
    if denominator == 0 {
        return Err(MathError::DivisionByZero);
    }
    let product = a.checked_mul(b).ok_or(MathError::Overflow)?;
    Ok(product / denominator)
}

/// Compute `a * b / denominator`, rounding away from zero.
///
/// Used for "would exceed"-style limit comparisons, where rounding
/// down could let an exposure slip under a ceiling it actually breaks.
pub fn mul_div_up(a: u128, b: u128, denominator: u128) -> Result<u128, MathError> {
    if denominator == 0 {
        return Err(MathError::DivisionByZero);
    }
    let product = a.checked_mul(b).ok_or(MathError::Overflow)?;
    let quotient = product / denominator;
    if product % denominator == 0 {
        Ok(quotient)
    } else {
        // quotient < product <= u128::MAX, so the bump cannot overflow
        Ok(quotient + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mul_div_down_exact() {
        assert_eq!(mul_div_down(10, 10, 4), Ok(25));
        assert_eq!(mul_div_down(1000, 5000, ONE), Ok(500));
    }

    #[test]
    fn test_mul_div_down_truncates() {
        assert_eq!(mul_div_down(10, 10, 3), Ok(33));
        assert_eq!(mul_div_down(1, 1, 2), Ok(0));
    }

    #[test]
    fn test_mul_div_up_bumps() {
        assert_eq!(mul_div_up(10, 10, 3), Ok(34));
        assert_eq!(mul_div_up(1, 1, 2), Ok(1));
        // exact division must not bump
        assert_eq!(mul_div_up(10, 10, 4), Ok(25));
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(mul_div_down(1, 1, 0), Err(MathError::DivisionByZero));
        assert_eq!(mul_div_up(1, 1, 0), Err(MathError::DivisionByZero));
    }

    #[test]
    fn test_overflow_detected() {
        assert_eq!(
            mul_div_down(u128::MAX, 2, 1),
            Err(MathError::Overflow)
        );
        assert_eq!(mul_div_up(u128::MAX, u128::MAX, 1), Err(MathError::Overflow));
    }

    #[test]
    fn test_price_precision_identity() {
        // rate of exactly PRICE_PRECISION prices 1:1
        assert_eq!(
            mul_div_down(1_000_000, PRICE_PRECISION, PRICE_PRECISION),
            Ok(1_000_000)
        );
    }
}
