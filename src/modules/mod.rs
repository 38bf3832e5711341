//! Asset modules: the per-asset-kind implementations of the exposure
//! accounting contract.
//!
//! Every module kind implements the [`AssetModule`] capability trait.
//! The registry dispatches to modules through a lookup table; derived
//! modules recurse into their underlying assets through the
//! [`ModuleRouter`] capability handed into each call, never through
//! direct references — the composition graph is held together by asset
//! keys, not object links.

pub mod derived;
pub mod primary;

use crate::core::asset::{AssetKey, AssetType, Creditor};
use crate::core::risk_params::RiskParams;
use crate::error::EngineResult;
pub use derived::DerivedAssetModule;
pub use primary::PrimaryAssetModule;

/// Recursion capability: routes indirect deposits and withdrawals to
/// the module owning an underlying asset. Implemented by the registry;
/// modules never hold references to each other.
pub trait ModuleRouter {
    /// Apply `delta_exposure` to the underlying asset and return the
    /// usd value of the calling asset's share `exposure_upper_asset`.
    fn route_indirect_deposit(
        &mut self,
        creditor: &Creditor,
        asset: &AssetKey,
        delta_exposure: u128,
        exposure_upper_asset: u128,
    ) -> EngineResult<u128>;

    /// Mirror image of [`ModuleRouter::route_indirect_deposit`] for
    /// withdrawals; never enforces exposure ceilings.
    fn route_indirect_withdrawal(
        &mut self,
        creditor: &Creditor,
        asset: &AssetKey,
        delta_exposure: u128,
        exposure_upper_asset: u128,
    ) -> EngineResult<u128>;
}

/// Uniform surface implemented by every asset-module kind.
///
/// Mutating operations are only reachable through the registry, which
/// owns the modules, serializes calls, and guarantees all-or-nothing
/// semantics around them.
pub trait AssetModule {
    fn asset_type(&self) -> AssetType;

    /// Process a deposit originated by the external vault layer.
    /// Returns the asset's new usd exposure and its type tag.
    fn process_deposit(
        &mut self,
        router: &mut dyn ModuleRouter,
        creditor: &Creditor,
        asset: &AssetKey,
        amount: u128,
    ) -> EngineResult<(u128, AssetType)>;

    /// Process a withdrawal. Monotonic decrease is always safe, so no
    /// exposure ceiling applies.
    fn process_withdrawal(
        &mut self,
        router: &mut dyn ModuleRouter,
        creditor: &Creditor,
        asset: &AssetKey,
        amount: u128,
    ) -> EngineResult<(u128, AssetType)>;

    /// Process a deposit forwarded by a parent derived module.
    ///
    /// Applies `delta_exposure` to this asset's counters (with the
    /// same limit checks as a direct deposit) and returns the usd
    /// value of the parent's share `exposure_upper_asset` of this
    /// asset's exposure.
    fn process_indirect_deposit(
        &mut self,
        router: &mut dyn ModuleRouter,
        creditor: &Creditor,
        asset: &AssetKey,
        delta_exposure: u128,
        exposure_upper_asset: u128,
    ) -> EngineResult<u128>;

    /// Mirror image of [`AssetModule::process_indirect_deposit`].
    fn process_indirect_withdrawal(
        &mut self,
        router: &mut dyn ModuleRouter,
        creditor: &Creditor,
        asset: &AssetKey,
        delta_exposure: u128,
        exposure_upper_asset: u128,
    ) -> EngineResult<u128>;

    /// Snapshot of the stored risk parameters for a (creditor, asset)
    /// pair. Unset pairs report zeroed parameters.
    fn risk_params(&self, creditor: &Creditor, asset: &AssetKey) -> RiskParams;

    /// Read-only snapshot of the asset's current usd exposure.
    fn usd_value_exposure_to_asset(
        &self,
        creditor: &Creditor,
        asset: &AssetKey,
    ) -> EngineResult<u128>;
}

/// Module kinds the registry can host. Enum dispatch keeps the arena
/// cloneable for the registry's transactional snapshots.
#[derive(Clone)]
pub enum ModuleKind {
    Primary(PrimaryAssetModule),
    Derived(DerivedAssetModule),
}

impl AssetModule for ModuleKind {
    fn asset_type(&self) -> AssetType {
        match self {
            ModuleKind::Primary(m) => m.asset_type(),
            ModuleKind::Derived(m) => m.asset_type(),
        }
    }

    fn process_deposit(
        &mut self,
        router: &mut dyn ModuleRouter,
        creditor: &Creditor,
        asset: &AssetKey,
        amount: u128,
    ) -> EngineResult<(u128, AssetType)> {
        match self {
            ModuleKind::Primary(m) => m.process_deposit(router, creditor, asset, amount),
            ModuleKind::Derived(m) => m.process_deposit(router, creditor, asset, amount),
        }
    }

    fn process_withdrawal(
        &mut self,
        router: &mut dyn ModuleRouter,
        creditor: &Creditor,
        asset: &AssetKey,
        amount: u128,
    ) -> EngineResult<(u128, AssetType)> {
        match self {
            ModuleKind::Primary(m) => m.process_withdrawal(router, creditor, asset, amount),
            ModuleKind::Derived(m) => m.process_withdrawal(router, creditor, asset, amount),
        }
    }

    fn process_indirect_deposit(
        &mut self,
        router: &mut dyn ModuleRouter,
        creditor: &Creditor,
        asset: &AssetKey,
        delta_exposure: u128,
        exposure_upper_asset: u128,
    ) -> EngineResult<u128> {
        match self {
            ModuleKind::Primary(m) => {
                m.process_indirect_deposit(router, creditor, asset, delta_exposure, exposure_upper_asset)
            }
            ModuleKind::Derived(m) => {
                m.process_indirect_deposit(router, creditor, asset, delta_exposure, exposure_upper_asset)
            }
        }
    }

    fn process_indirect_withdrawal(
        &mut self,
        router: &mut dyn ModuleRouter,
        creditor: &Creditor,
        asset: &AssetKey,
        delta_exposure: u128,
        exposure_upper_asset: u128,
    ) -> EngineResult<u128> {
        match self {
            ModuleKind::Primary(m) => m.process_indirect_withdrawal(
                router,
                creditor,
                asset,
                delta_exposure,
                exposure_upper_asset,
            ),
            ModuleKind::Derived(m) => m.process_indirect_withdrawal(
                router,
                creditor,
                asset,
                delta_exposure,
                exposure_upper_asset,
            ),
        }
    }

    fn risk_params(&self, creditor: &Creditor, asset: &AssetKey) -> RiskParams {
        match self {
            ModuleKind::Primary(m) => m.risk_params(creditor, asset),
            ModuleKind::Derived(m) => m.risk_params(creditor, asset),
        }
    }

    fn usd_value_exposure_to_asset(
        &self,
        creditor: &Creditor,
        asset: &AssetKey,
    ) -> EngineResult<u128> {
        match self {
            ModuleKind::Primary(m) => m.usd_value_exposure_to_asset(creditor, asset),
            ModuleKind::Derived(m) => m.usd_value_exposure_to_asset(creditor, asset),
        }
    }
}
