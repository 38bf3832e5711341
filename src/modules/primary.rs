use crate::core::asset::{AssetKey, AssetType, Creditor};
use crate::core::math::MathError;
use crate::core::risk_params::RiskParams;
use crate::error::{EngineError, EngineResult};
use crate::modules::{AssetModule, ModuleRouter};
use crate::oracle::Oracle;
use log::debug;
use std::collections::HashMap;
use std::sync::Arc;

/// Asset module for primary assets: positions priced directly by an
/// oracle.
///
/// Holds the per-(creditor, asset) risk parameters and running
/// exposure counters, and enforces the raw-token `max_exposure`
/// ceiling on every deposit. Withdrawals only ever decrease exposure
/// and are never ceiling-checked.
#[derive(Clone)]
pub struct PrimaryAssetModule {
    oracle: Arc<dyn Oracle>,
    state: HashMap<(Creditor, AssetKey), RiskParams>,
}

impl PrimaryAssetModule {
    pub fn new(oracle: Arc<dyn Oracle>) -> Self {
        Self {
            oracle,
            state: HashMap::new(),
        }
    }

    /// Overwrite the risk parameters for a (creditor, asset) pair.
    ///
    /// Fails if `collateral_factor > liquidation_factor` or either
    /// factor exceeds `ONE`. The running exposure counter is
    /// preserved across overwrites. `max_exposure` is unrestricted;
    /// 0 disables further deposits.
    ///
    /// Callers are authorized upstream by the registry's risk-manager
    /// gate.
    pub fn set_risk_parameters(
        &mut self,
        creditor: &Creditor,
        asset: &AssetKey,
        max_exposure: u128,
        collateral_factor: u16,
        liquidation_factor: u16,
    ) -> EngineResult<()> {
        RiskParams::check_factors(collateral_factor, liquidation_factor)?;
        let entry = self
            .state
            .entry((creditor.clone(), asset.clone()))
            .or_default();
        entry.max_exposure = max_exposure;
        entry.collateral_factor = collateral_factor;
        entry.liquidation_factor = liquidation_factor;
        Ok(())
    }

    fn params(&self, creditor: &Creditor, asset: &AssetKey) -> RiskParams {
        self.state
            .get(&(creditor.clone(), asset.clone()))
            .cloned()
            .unwrap_or_default()
    }

    /// Raise the exposure counter, enforcing the max-exposure ceiling.
    fn increase_exposure(
        &mut self,
        creditor: &Creditor,
        asset: &AssetKey,
        amount: u128,
    ) -> EngineResult<u128> {
        let mut params = self.params(creditor, asset);
        let new_exposure = params
            .last_exposure_asset
            .checked_add(amount)
            .ok_or(MathError::Overflow)?;
        if new_exposure > params.max_exposure {
            debug!(
                "primary deposit rejected: {creditor}/{asset} exposure {new_exposure} > max {}",
                params.max_exposure
            );
            return Err(EngineError::ExposureNotInLimits);
        }
        params.last_exposure_asset = new_exposure;
        self.state.insert((creditor.clone(), asset.clone()), params);
        Ok(new_exposure)
    }

    /// Lower the exposure counter. Fails with `Underflow` past zero.
    fn decrease_exposure(
        &mut self,
        creditor: &Creditor,
        asset: &AssetKey,
        amount: u128,
    ) -> EngineResult<u128> {
        let mut params = self.params(creditor, asset);
        let new_exposure = params
            .last_exposure_asset
            .checked_sub(amount)
            .ok_or(MathError::Underflow)?;
        params.last_exposure_asset = new_exposure;
        self.state.insert((creditor.clone(), asset.clone()), params);
        Ok(new_exposure)
    }
}

impl AssetModule for PrimaryAssetModule {
    fn asset_type(&self) -> AssetType {
        AssetType::Primary
    }

    fn process_deposit(
        &mut self,
        _router: &mut dyn ModuleRouter,
        creditor: &Creditor,
        asset: &AssetKey,
        amount: u128,
    ) -> EngineResult<(u128, AssetType)> {
        let new_exposure = self.increase_exposure(creditor, asset, amount)?;
        let usd_value = self.oracle.usd_value(asset, new_exposure)?;
        Ok((usd_value, AssetType::Primary))
    }

    fn process_withdrawal(
        &mut self,
        _router: &mut dyn ModuleRouter,
        creditor: &Creditor,
        asset: &AssetKey,
        amount: u128,
    ) -> EngineResult<(u128, AssetType)> {
        let new_exposure = self.decrease_exposure(creditor, asset, amount)?;
        let usd_value = self.oracle.usd_value(asset, new_exposure)?;
        Ok((usd_value, AssetType::Primary))
    }

    fn process_indirect_deposit(
        &mut self,
        _router: &mut dyn ModuleRouter,
        creditor: &Creditor,
        asset: &AssetKey,
        delta_exposure: u128,
        exposure_upper_asset: u128,
    ) -> EngineResult<u128> {
        self.increase_exposure(creditor, asset, delta_exposure)?;
        // the parent's share is priced directly: a primary asset's usd
        // value is linear in exposure
        self.oracle.usd_value(asset, exposure_upper_asset)
    }

    fn process_indirect_withdrawal(
        &mut self,
        _router: &mut dyn ModuleRouter,
        creditor: &Creditor,
        asset: &AssetKey,
        delta_exposure: u128,
        exposure_upper_asset: u128,
    ) -> EngineResult<u128> {
        self.decrease_exposure(creditor, asset, delta_exposure)?;
        self.oracle.usd_value(asset, exposure_upper_asset)
    }

    fn risk_params(&self, creditor: &Creditor, asset: &AssetKey) -> RiskParams {
        self.params(creditor, asset)
    }

    fn usd_value_exposure_to_asset(
        &self,
        creditor: &Creditor,
        asset: &AssetKey,
    ) -> EngineResult<u128> {
        let params = self.params(creditor, asset);
        self.oracle.usd_value(asset, params.last_exposure_asset)
    }
}
