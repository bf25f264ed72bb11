//! Step-parity inference for dance-pad charts.
//!
//! Given a time-sorted note list, infer which foot part (left/right heel/toe) hits each
//! note. Every row of simultaneous notes is expanded into its legal foot placements, each
//! transition between placements is scored by a weighted biomechanical cost model, and the
//! cheapest path through the resulting layered DAG is selected.
//!
//! Pipeline
//! - `rows`: notes → one `Row` per timestamp (holds, hold tails, look-ahead mines).
//! - `analysis`: rows → `StepParityGraph` via placement enumeration and `cost::CostModel`,
//!   honoring user overrides; cheapest path → per-row placement.
//! - `tech`: placements → technique tags (XO, FS, SS, JA, BR, DS).
//! - `engine`: the stateful orchestrator with undoable overrides/weights, annotations,
//!   change events and persistence.
//!
//! Cross-module invariants
//! - Node ids grow with row index; edges only go to the next layer.
//! - A heel and toe of one foot only share a row on bracketable columns.
//! - Every cost term is non-negative and `TOTAL` is their sum (plus any override penalty).

pub mod analysis;
pub mod api;
pub mod chart;
pub mod cost;
pub mod engine;
pub mod error;
pub mod foot;
pub mod gen;
pub mod graph;
pub mod layout;
pub mod rows;
pub mod tech;

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use error::{ParityError, Result};
pub use foot::Foot;
pub use nalgebra::Vector2 as Vec2;

/// Common exports for hosts embedding the engine.
pub mod prelude {
    pub use crate::chart::{Chart, ConstantBpm, Note, NoteKind, NoteSource, TimingLookup};
    pub use crate::cost::{CostTerm, Weights};
    pub use crate::engine::{EventSink, ParityEngine, ParityEvent};
    pub use crate::error::{ParityError, Result};
    pub use crate::foot::Foot;
    pub use crate::layout::StageLayout;
}
