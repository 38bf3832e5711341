//! Pure solvency-value calculation over exposure snapshots.
//!
//! No state: the registry (or an outer account layer) collects
//! per-asset usd values and risk factors, and this module folds them
//! into the two aggregates solvency checks compare against debt.

use crate::core::math::{mul_div_down, MathError, ONE};
use serde::{Deserialize, Serialize};

/// One asset's usd exposure and the factors that discount it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetValueAndRiskFactors {
    pub usd_value: u128,
    pub collateral_factor: u16,
    pub liquidation_factor: u16,
}

/// Aggregate risk values for a set of exposures.
///
/// `collateral_value` is what the exposures are worth as borrowing
/// power; `liquidation_value` is the threshold below which a position
/// becomes liquidatable. With valid factors the former never exceeds
/// the latter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskValues {
    pub collateral_value: u128,
    pub liquidation_value: u128,
}

/// Weight each exposure by its factors and sum.
///
/// Every term is computed as `usd_value * factor / ONE`, rounded down,
/// and overflow-checked before it joins the sum; the function fails
/// with [`MathError::Overflow`] rather than wrapping. Deterministic:
/// identical input always produces identical output.
pub fn calculate_weighted_risk_values(
    exposures: &[AssetValueAndRiskFactors],
) -> Result<RiskValues, MathError> {
    let mut values = RiskValues::default();
    for exposure in exposures {
        let collateral_term = mul_div_down(
            exposure.usd_value,
            u128::from(exposure.collateral_factor),
            ONE,
        )?;
        let liquidation_term = mul_div_down(
            exposure.usd_value,
            u128::from(exposure.liquidation_factor),
            ONE,
        )?;
        values.collateral_value = values
            .collateral_value
            .checked_add(collateral_term)
            .ok_or(MathError::Overflow)?;
        values.liquidation_value = values
            .liquidation_value
            .checked_add(liquidation_term)
            .ok_or(MathError::Overflow)?;
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        let values = calculate_weighted_risk_values(&[]).unwrap();
        assert_eq!(values, RiskValues::default());
    }

    #[test]
    fn test_single_exposure() {
        let values = calculate_weighted_risk_values(&[AssetValueAndRiskFactors {
            usd_value: 1000,
            collateral_factor: 5000,
            liquidation_factor: 7000,
        }])
        .unwrap();
        assert_eq!(values.collateral_value, 500);
        assert_eq!(values.liquidation_value, 700);
    }

    #[test]
    fn test_terms_round_down_independently() {
        // 333 * 5000 / 10000 = 166.5 -> 166, per term, not on the sum
        let exposure = AssetValueAndRiskFactors {
            usd_value: 333,
            collateral_factor: 5000,
            liquidation_factor: 5000,
        };
        let values =
            calculate_weighted_risk_values(&[exposure.clone(), exposure]).unwrap();
        assert_eq!(values.collateral_value, 332);
        assert_eq!(values.liquidation_value, 332);
    }

    #[test]
    fn test_sum_overflow_detected() {
        let exposure = AssetValueAndRiskFactors {
            usd_value: u128::MAX / 2,
            collateral_factor: 10_000,
            liquidation_factor: 10_000,
        };
        let err = calculate_weighted_risk_values(&[exposure.clone(), exposure.clone(), exposure])
            .unwrap_err();
        assert_eq!(err, MathError::Overflow);
    }

    #[test]
    fn test_zero_factors_zero_value() {
        let values = calculate_weighted_risk_values(&[AssetValueAndRiskFactors {
            usd_value: 123_456,
            collateral_factor: 0,
            liquidation_factor: 0,
        }])
        .unwrap();
        assert_eq!(values, RiskValues::default());
    }
}
