use crate::core::math::ONE;
use crate::error::EngineError;
use serde::{Deserialize, Serialize};

/// Risk parameters and running exposure for one (creditor, asset) pair.
///
/// `collateral_factor` and `liquidation_factor` are fixed-point
/// percentages with denominator [`ONE`]. The structural invariant
/// `collateral_factor <= liquidation_factor` is checked on every
/// write: a position must stop counting as collateral before it
/// becomes liquidatable.
///
/// `max_exposure` bounds the raw token exposure independent of price;
/// a value of 0 effectively disables deposits for the asset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskParams {
    /// Running raw-token exposure attributed to the creditor.
    pub last_exposure_asset: u128,
    /// Ceiling on raw-token exposure.
    pub max_exposure: u128,
    /// Fraction of usd value that counts as collateral (0..=ONE).
    pub collateral_factor: u16,
    /// Fraction of usd value used as liquidation threshold (0..=ONE).
    pub liquidation_factor: u16,
}

impl RiskParams {
    /// Validate a factor pair before it is written.
    pub fn check_factors(collateral_factor: u16, liquidation_factor: u16) -> Result<(), EngineError> {
        if u128::from(liquidation_factor) > ONE {
            return Err(EngineError::RiskFactorOutOfBounds {
                factor: liquidation_factor,
            });
        }
        if collateral_factor > liquidation_factor {
            return Err(EngineError::CollateralFactorExceedsLiquidationFactor {
                collateral: collateral_factor,
                liquidation: liquidation_factor,
            });
        }
        Ok(())
    }
}
