use crate::core::asset::{AssetKey, AssetType, Creditor};
use crate::core::math::{mul_div_down, MathError, ONE};
use crate::core::risk_params::RiskParams;
use crate::error::{EngineError, EngineResult};
use crate::modules::{AssetModule, ModuleRouter};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Conversion from a derived asset's own exposure delta to the delta
/// forwarded to one of its underlying assets.
///
/// The function is asset-pair specific and injected per module
/// instance. Contract: monotonic in `amount`, deterministic, and
/// rounds down.
pub trait ExposureStrategy {
    fn underlying_delta(
        &self,
        asset: &AssetKey,
        underlying: &AssetKey,
        amount: u128,
    ) -> EngineResult<u128>;
}

/// 1:1 conversion, for wrappers that hold exactly one unit of the
/// underlying per unit of the wrapper.
#[derive(Debug, Clone, Copy, Default)]
pub struct OneToOne;

impl ExposureStrategy for OneToOne {
    fn underlying_delta(
        &self,
        _asset: &AssetKey,
        _underlying: &AssetKey,
        amount: u128,
    ) -> EngineResult<u128> {
        Ok(amount)
    }
}

/// Fixed-ratio conversion: `amount * numerator / denominator`,
/// rounded down.
#[derive(Debug, Clone, Copy)]
pub struct FixedRatio {
    pub numerator: u128,
    pub denominator: u128,
}

impl ExposureStrategy for FixedRatio {
    fn underlying_delta(
        &self,
        _asset: &AssetKey,
        _underlying: &AssetKey,
        amount: u128,
    ) -> EngineResult<u128> {
        Ok(mul_div_down(amount, self.numerator, self.denominator)?)
    }
}

/// Exposure state of one (creditor, derived asset) position.
///
/// `usd_value_exposure_asset_last` is a cached snapshot: the sum of
/// the usd values last reported by the underlying modules for this
/// asset's recorded shares. It is only ever rewritten by the
/// deposit/withdrawal path, never adjusted independently.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedAssetState {
    pub exposure_asset_last: u128,
    pub usd_value_exposure_asset_last: u128,
    /// This asset's share of each underlying's exposure, parallel to
    /// the configured underlying list.
    pub exposure_to_underlying_last: Vec<u128>,
}

impl DerivedAssetState {
    fn with_underlying_count(count: usize) -> Self {
        Self {
            exposure_to_underlying_last: vec![0; count],
            ..Self::default()
        }
    }
}

/// Protocol-wide usd exposure bookkeeping for one creditor within a
/// derived module.
///
/// `usd_exposure_protocol_last` is maintained incrementally
/// (`- old value + new value` on every call), never resummed from the
/// per-asset records; the incremental rule is part of the observable
/// contract because recomputation could diverge under rounding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolState {
    pub usd_exposure_protocol_last: u128,
    pub max_usd_exposure_protocol: u128,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Flow {
    Deposit,
    Withdrawal,
}

/// Asset module for derived assets: positions priced as a function of
/// one or more underlying assets' exposure, recursively.
///
/// On every deposit or withdrawal the module forwards the converted
/// exposure delta to each underlying module, takes back the usd value
/// of its share, applies the incremental protocol-exposure update, and
/// (on deposits only) enforces the per-creditor protocol ceiling.
#[derive(Clone)]
pub struct DerivedAssetModule {
    strategy: Arc<dyn ExposureStrategy>,
    /// Registration config: ordered underlying references per asset.
    underlying_of: HashMap<AssetKey, Vec<AssetKey>>,
    state: HashMap<(Creditor, AssetKey), DerivedAssetState>,
    protocol: HashMap<Creditor, ProtocolState>,
    risk_factors: HashMap<Creditor, u16>,
}

impl DerivedAssetModule {
    pub fn new(strategy: Arc<dyn ExposureStrategy>) -> Self {
        Self {
            strategy,
            underlying_of: HashMap::new(),
            state: HashMap::new(),
            protocol: HashMap::new(),
            risk_factors: HashMap::new(),
        }
    }

    /// Record the underlying references for an asset this module
    /// handles. The registry validates acyclicity and depth before
    /// calling this.
    pub(crate) fn add_asset(&mut self, asset: AssetKey, underlying: Vec<AssetKey>) {
        self.underlying_of.insert(asset, underlying);
    }

    pub fn handles(&self, asset: &AssetKey) -> bool {
        self.underlying_of.contains_key(asset)
    }

    /// Set the per-creditor protocol ceiling and risk factor.
    ///
    /// The risk factor discounts this module's usd exposure in
    /// solvency snapshots and must not exceed `ONE`. Lowering the
    /// ceiling below the current exposure is allowed: it blocks new
    /// deposits without forcing withdrawals.
    pub fn set_risk_parameters(
        &mut self,
        creditor: &Creditor,
        max_usd_exposure_protocol: u128,
        risk_factor: u16,
    ) -> EngineResult<()> {
        if u128::from(risk_factor) > ONE {
            return Err(EngineError::RiskFactorOutOfBounds {
                factor: risk_factor,
            });
        }
        let entry = self.protocol.entry(creditor.clone()).or_default();
        entry.max_usd_exposure_protocol = max_usd_exposure_protocol;
        self.risk_factors.insert(creditor.clone(), risk_factor);
        Ok(())
    }

    /// Current protocol-wide usd exposure snapshot for a creditor.
    pub fn protocol_state(&self, creditor: &Creditor) -> ProtocolState {
        self.protocol.get(creditor).cloned().unwrap_or_default()
    }

    /// Stored position snapshot, zeroed if the pair has never
    /// deposited.
    pub fn asset_state(&self, creditor: &Creditor, asset: &AssetKey) -> DerivedAssetState {
        let underlying_count = self
            .underlying_of
            .get(asset)
            .map(|u| u.len())
            .unwrap_or_default();
        self.state
            .get(&(creditor.clone(), asset.clone()))
            .cloned()
            .unwrap_or_else(|| DerivedAssetState::with_underlying_count(underlying_count))
    }

    /// Shared deposit/withdrawal path. Returns the position's new
    /// total exposure and usd value.
    fn apply(
        &mut self,
        router: &mut dyn ModuleRouter,
        creditor: &Creditor,
        asset: &AssetKey,
        amount: u128,
        flow: Flow,
    ) -> EngineResult<(u128, u128)> {
        let underlying = self
            .underlying_of
            .get(asset)
            .cloned()
            .ok_or_else(|| EngineError::AssetNotInRegistry(asset.clone()))?;
        let mut state = self.asset_state(creditor, asset);

        let new_exposure_asset = match flow {
            Flow::Deposit => state
                .exposure_asset_last
                .checked_add(amount)
                .ok_or(MathError::Overflow)?,
            Flow::Withdrawal => state
                .exposure_asset_last
                .checked_sub(amount)
                .ok_or(MathError::Underflow)?,
        };

        let mut new_usd_value: u128 = 0;
        for (i, underlying_asset) in underlying.iter().enumerate() {
            let delta = self
                .strategy
                .underlying_delta(asset, underlying_asset, amount)?;
            let share_last = state.exposure_to_underlying_last[i];
            let new_share = match flow {
                Flow::Deposit => share_last.checked_add(delta).ok_or(MathError::Overflow)?,
                Flow::Withdrawal => share_last.checked_sub(delta).ok_or(MathError::Underflow)?,
            };
            let usd_share = match flow {
                Flow::Deposit => {
                    router.route_indirect_deposit(creditor, underlying_asset, delta, new_share)?
                }
                Flow::Withdrawal => {
                    router.route_indirect_withdrawal(creditor, underlying_asset, delta, new_share)?
                }
            };
            state.exposure_to_underlying_last[i] = new_share;
            new_usd_value = new_usd_value
                .checked_add(usd_share)
                .ok_or(MathError::Overflow)?;
        }

        // incremental protocol update: delta applied, never resummed
        let mut protocol = self.protocol_state(creditor);
        protocol.usd_exposure_protocol_last = protocol
            .usd_exposure_protocol_last
            .checked_sub(state.usd_value_exposure_asset_last)
            .ok_or(MathError::Underflow)?
            .checked_add(new_usd_value)
            .ok_or(MathError::Overflow)?;

        if flow == Flow::Deposit
            && protocol.usd_exposure_protocol_last > protocol.max_usd_exposure_protocol
        {
            debug!(
                "derived deposit rejected: {creditor}/{asset} protocol exposure {} > max {}",
                protocol.usd_exposure_protocol_last, protocol.max_usd_exposure_protocol
            );
            return Err(EngineError::ExposureNotInLimits);
        }

        state.exposure_asset_last = new_exposure_asset;
        state.usd_value_exposure_asset_last = new_usd_value;
        self.state
            .insert((creditor.clone(), asset.clone()), state);
        self.protocol.insert(creditor.clone(), protocol);

        Ok((new_exposure_asset, new_usd_value))
    }
}

impl AssetModule for DerivedAssetModule {
    fn asset_type(&self) -> AssetType {
        AssetType::Derived
    }

    fn process_deposit(
        &mut self,
        router: &mut dyn ModuleRouter,
        creditor: &Creditor,
        asset: &AssetKey,
        amount: u128,
    ) -> EngineResult<(u128, AssetType)> {
        let (_, new_usd_value) = self.apply(router, creditor, asset, amount, Flow::Deposit)?;
        Ok((new_usd_value, AssetType::Derived))
    }

    fn process_withdrawal(
        &mut self,
        router: &mut dyn ModuleRouter,
        creditor: &Creditor,
        asset: &AssetKey,
        amount: u128,
    ) -> EngineResult<(u128, AssetType)> {
        let (_, new_usd_value) = self.apply(router, creditor, asset, amount, Flow::Withdrawal)?;
        Ok((new_usd_value, AssetType::Derived))
    }

    fn process_indirect_deposit(
        &mut self,
        router: &mut dyn ModuleRouter,
        creditor: &Creditor,
        asset: &AssetKey,
        delta_exposure: u128,
        exposure_upper_asset: u128,
    ) -> EngineResult<u128> {
        let (new_exposure, new_usd_value) =
            self.apply(router, creditor, asset, delta_exposure, Flow::Deposit)?;
        // the parent owns a pro-rata slice of this asset's usd value
        if new_exposure == 0 {
            return Ok(0);
        }
        Ok(mul_div_down(exposure_upper_asset, new_usd_value, new_exposure)?)
    }

    fn process_indirect_withdrawal(
        &mut self,
        router: &mut dyn ModuleRouter,
        creditor: &Creditor,
        asset: &AssetKey,
        delta_exposure: u128,
        exposure_upper_asset: u128,
    ) -> EngineResult<u128> {
        let (new_exposure, new_usd_value) =
            self.apply(router, creditor, asset, delta_exposure, Flow::Withdrawal)?;
        if new_exposure == 0 {
            return Ok(0);
        }
        Ok(mul_div_down(exposure_upper_asset, new_usd_value, new_exposure)?)
    }

    fn risk_params(&self, creditor: &Creditor, asset: &AssetKey) -> RiskParams {
        let state = self.asset_state(creditor, asset);
        let protocol = self.protocol_state(creditor);
        let risk_factor = self.risk_factors.get(creditor).copied().unwrap_or_default();
        // a single risk factor serves as both discount levels; the
        // usd-denominated protocol ceiling plays the max-exposure role
        RiskParams {
            last_exposure_asset: state.exposure_asset_last,
            max_exposure: protocol.max_usd_exposure_protocol,
            collateral_factor: risk_factor,
            liquidation_factor: risk_factor,
        }
    }

    fn usd_value_exposure_to_asset(
        &self,
        creditor: &Creditor,
        asset: &AssetKey,
    ) -> EngineResult<u128> {
        Ok(self
            .asset_state(creditor, asset)
            .usd_value_exposure_asset_last)
    }
}
