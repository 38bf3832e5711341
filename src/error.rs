use crate::core::asset::{AccountId, AssetKey};
use crate::core::math::MathError;
use crate::oracle::OracleError;
use thiserror::Error;

/// Engine-wide error taxonomy.
///
/// Every failure is fatal to the call that raised it: nothing is
/// caught and recovered internally, and the registry entry points
/// guarantee that a failed call — including any recursive sub-calls
/// already performed — leaves persisted state unchanged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    // --- Authorization ---
    /// Caller does not hold the risk-manager role.
    #[error("account {0} does not hold the risk manager role")]
    Unauthorized(AccountId),
    /// Asset registration attempted by something other than a
    /// registered asset module.
    #[error("only a registered asset module may register assets")]
    OnlyAssetModule,
    /// A module already in flight was entered again. Stacked derived
    /// assets must live in separate module instances.
    #[error("reentrant call into an asset module handling {0}")]
    ReentrantCall(AssetKey),

    // --- Invariant violations ---
    #[error("collateral factor {collateral} exceeds liquidation factor {liquidation}")]
    CollateralFactorExceedsLiquidationFactor { collateral: u16, liquidation: u16 },
    #[error("risk factor {factor} exceeds ONE")]
    RiskFactorOutOfBounds { factor: u16 },
    #[error("asset {0} is already in the registry")]
    AssetAlreadyInRegistry(AssetKey),
    #[error("asset {0} is not in the registry")]
    AssetNotInRegistry(AssetKey),
    /// The routed module is not of the kind the operation expects
    /// (e.g. primary risk parameters set on a derived asset).
    #[error("asset {0} is handled by a module of a different kind")]
    ModuleKindMismatch(AssetKey),
    /// Linking the underlying would close a cycle in the composition
    /// graph.
    #[error("underlying link from {asset} to {underlying} would create a cycle")]
    CycleDetected { asset: AssetKey, underlying: AssetKey },
    /// The underlying chain would exceed the composition depth bound.
    #[error("composition chain below {asset} would exceed the depth bound of {max}")]
    MaxDepthExceeded { asset: AssetKey, max: usize },

    // --- Business limits ---
    /// Exposure ceiling breached. Routine: the caller should retry
    /// with a smaller amount.
    #[error("exposure not in limits")]
    ExposureNotInLimits,

    // --- Arithmetic ---
    #[error(transparent)]
    Math(#[from] MathError),

    // --- External collaborators ---
    #[error(transparent)]
    Oracle(#[from] OracleError),
}

pub type EngineResult<T> = Result<T, EngineError>;
