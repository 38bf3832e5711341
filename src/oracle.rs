//! Consumed external interfaces: price oracle and access control.
//!
//! The engine treats pricing as an opaque deterministic function from
//! (asset, exposure) to usd value, and authorization as a single
//! role-membership predicate. Production deployments plug in their own
//! implementations; [`FixedRateOracle`] and [`SingleManager`] cover
//! tests and demos.

use crate::core::asset::{AccountId, AssetKey};
use crate::core::math::{mul_div_down, PRICE_PRECISION};
use crate::error::EngineResult;
use std::collections::HashMap;
use thiserror::Error;

/// Errors arising from oracle lookups.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OracleError {
    #[error("no usd rate available for {asset}")]
    RateNotFound { asset: AssetKey },
}

/// Price oracle: converts a raw exposure amount of an asset into a
/// usd value. Assumed deterministic for the duration of a call chain.
pub trait Oracle {
    fn usd_value(&self, asset: &AssetKey, exposure: u128) -> EngineResult<u128>;
}

/// Deterministic rate-table oracle.
///
/// Rates are expressed at [`PRICE_PRECISION`] scale: a rate of exactly
/// `PRICE_PRECISION` values one raw unit of exposure at one usd unit.
///
/// # Examples
///
/// ```
/// use collateral_engine::core::asset::AssetKey;
/// use collateral_engine::core::math::PRICE_PRECISION;
/// use collateral_engine::oracle::{FixedRateOracle, Oracle};
///
/// let mut oracle = FixedRateOracle::new();
/// oracle.set_rate(AssetKey::fungible("WETH"), 2 * PRICE_PRECISION);
///
/// let value = oracle.usd_value(&AssetKey::fungible("WETH"), 500).unwrap();
/// assert_eq!(value, 1000);
/// ```
#[derive(Debug, Clone, Default)]
pub struct FixedRateOracle {
    rates: HashMap<AssetKey, u128>,
}

impl FixedRateOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the usd rate for an asset, replacing any previous rate.
    pub fn set_rate(&mut self, asset: AssetKey, rate: u128) {
        self.rates.insert(asset, rate);
    }
}

impl Oracle for FixedRateOracle {
    fn usd_value(&self, asset: &AssetKey, exposure: u128) -> EngineResult<u128> {
        let rate = self
            .rates
            .get(asset)
            .copied()
            .ok_or_else(|| OracleError::RateNotFound {
                asset: asset.clone(),
            })?;
        Ok(mul_div_down(exposure, rate, PRICE_PRECISION)?)
    }
}

/// Access control: role membership for the administrative setters.
pub trait AccessControl {
    fn has_risk_manager_role(&self, caller: &AccountId) -> bool;
}

/// Access control granting the risk-manager role to exactly one account.
#[derive(Debug, Clone)]
pub struct SingleManager {
    manager: AccountId,
}

impl SingleManager {
    pub fn new(manager: AccountId) -> Self {
        Self { manager }
    }
}

impl AccessControl for SingleManager {
    fn has_risk_manager_role(&self, caller: &AccountId) -> bool {
        caller == &self.manager
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::math::MathError;
    use crate::error::EngineError;

    #[test]
    fn test_fixed_rate_pricing() {
        let mut oracle = FixedRateOracle::new();
        let weth = AssetKey::fungible("WETH");
        oracle.set_rate(weth.clone(), 3 * PRICE_PRECISION);

        assert_eq!(oracle.usd_value(&weth, 100).unwrap(), 300);
        assert_eq!(oracle.usd_value(&weth, 0).unwrap(), 0);
    }

    #[test]
    fn test_fractional_rate_rounds_down() {
        let mut oracle = FixedRateOracle::new();
        let dust = AssetKey::fungible("DUST");
        // half a usd unit per raw unit
        oracle.set_rate(dust.clone(), PRICE_PRECISION / 2);

        assert_eq!(oracle.usd_value(&dust, 3).unwrap(), 1);
    }

    #[test]
    fn test_unknown_asset() {
        let oracle = FixedRateOracle::new();
        let err = oracle
            .usd_value(&AssetKey::fungible("UNKNOWN"), 1)
            .unwrap_err();
        assert!(matches!(err, EngineError::Oracle(OracleError::RateNotFound { .. })));
    }

    #[test]
    fn test_huge_exposure_overflows() {
        let mut oracle = FixedRateOracle::new();
        let weth = AssetKey::fungible("WETH");
        oracle.set_rate(weth.clone(), u128::MAX);

        let err = oracle.usd_value(&weth, u128::MAX).unwrap_err();
        assert_eq!(err, EngineError::Math(MathError::Overflow));
    }

    #[test]
    fn test_single_manager() {
        let access = SingleManager::new(AccountId::new("risk-manager"));
        assert!(access.has_risk_manager_role(&AccountId::new("risk-manager")));
        assert!(!access.has_risk_manager_role(&AccountId::new("mallory")));
    }
}
