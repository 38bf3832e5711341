//! # collateral-engine
//!
//! Collateral-risk accounting engine for a multi-creditor lending
//! protocol. Tracks, per (creditor, asset) pair, how much economic
//! exposure an asset contributes, converts that exposure into usd
//! value, and enforces collateralization limits before any deposit or
//! withdrawal commits.
//!
//! Assets are **primary** (priced directly by an oracle) or **derived**
//! (priced through one or more underlying assets, recursively). The
//! heart of the crate is the derived-asset propagation engine: every
//! deposit or withdrawal forwards converted exposure deltas down the
//! composition graph, pulls the usd values back up, and applies an
//! exact incremental update to the protocol-wide exposure ceiling —
//! atomically, or not at all.
//!
//! ## Architecture
//!
//! - **core** — Asset/creditor identity, risk parameters, checked
//!   fixed-point math
//! - **modules** — The `AssetModule` capability trait and its Primary
//!   / Derived implementations
//! - **registry** — Routing, administrative setters, transactional
//!   entry points, reentrancy guard
//! - **graph** — Registration-time validation of the composition DAG
//! - **risk** — Pure collateral/liquidation value aggregation
//! - **oracle** — Consumed pricing and access-control interfaces

pub mod core;
pub mod error;
pub mod graph;
pub mod modules;
pub mod oracle;
pub mod registry;
pub mod risk;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::core::asset::{AccountId, AssetAddress, AssetKey, AssetType, Creditor};
    pub use crate::core::math::{mul_div_down, mul_div_up, ONE, PRICE_PRECISION};
    pub use crate::core::risk_params::RiskParams;
    pub use crate::error::{EngineError, EngineResult};
    pub use crate::modules::derived::{DerivedAssetModule, ExposureStrategy, FixedRatio, OneToOne};
    pub use crate::modules::primary::PrimaryAssetModule;
    pub use crate::modules::{AssetModule, ModuleKind, ModuleRouter};
    pub use crate::oracle::{AccessControl, FixedRateOracle, Oracle, SingleManager};
    pub use crate::registry::{ModuleId, Registry};
    pub use crate::risk::{calculate_weighted_risk_values, AssetValueAndRiskFactors, RiskValues};
}
