//! Weighted transition cost between two body states.
//!
//! Purpose
//! - Model foot assignment as energy minimization: every biomechanically awkward pattern
//!   contributes an additive, independently tunable, non-negative penalty.
//! - `CostModel::cost` returns the full breakdown so that exported graphs can explain
//!   every edge weight.
//!
//! Layout
//! - `weights.rs`: `CostTerm`, `Weights` (defaults, map updates), `CostBreakdown`.
//! - `model.rs`: `CostModel`, `CostCfg` time thresholds, and column merging.

mod model;
mod weights;

pub use model::{combine_columns, CostCfg, CostModel};
pub use weights::{CostBreakdown, CostTerm, Weights, OVERRIDE_KEY, TOTAL_KEY};
