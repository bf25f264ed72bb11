//! Curated surface for tools built on this crate (the CLI, benches, batch scripts).
//!
//! Not a stable API: items move when the modules behind them are reorganized.

// Chart input
pub use crate::chart::{
    assign_seconds, Chart, ConstantBpm, Note, NoteAnnotation, NoteKind, NoteSource, TimingLookup,
};
pub use crate::gen::{random_chart, ChartGenParams, ChartGenerator};
pub use crate::layout::StageLayout;
pub use crate::rows::{build_rows, Row};
// Scoring
pub use crate::cost::{CostBreakdown, CostCfg, CostModel, CostTerm, Weights};
pub use crate::foot::{Foot, FootSet, FEET_LABELS};
// Graph and analysis
pub use crate::analysis::{
    enumerate_permutations, parity_differences, Analysis, Analyzer, BeatOverrides, OVERRIDE_PENALTY,
};
pub use crate::graph::{GraphExport, NodeId, State, StepParityGraph};
pub use crate::tech::{calculate_tech_counts, Tech, TechCounts, TechReport};
// Orchestration
pub use crate::engine::{
    parse_parity_data, serialize_parity_data, ActionHistory, AnnotationPayload, ParityEngine,
    ParityEvent,
};
