//! Foundational types: asset and creditor identity, risk parameters,
//! and the checked fixed-point primitives everything else is built on.

pub mod asset;
pub mod math;
pub mod risk_params;
