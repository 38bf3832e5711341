//! Asset-composition graph: registration-time validation of the
//! derived-asset DAG (acyclicity and depth bound).

pub mod composition;

pub use composition::{CompositionGraph, MAX_COMPOSITION_DEPTH};
