//! Value types of the step-parity graph.

use serde::{Deserialize, Serialize};

use crate::cost::CostBreakdown;
use crate::foot::{Foot, FootSet};

/// Dense node identifier; ids grow with row index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub usize);

/// Hypothesis of where every foot part rests after one row.
///
/// Equality is structural and drives node deduplication within a row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct State {
    /// `-1` for the synthetic start, `rows.len()` for the synthetic end.
    pub row_index: isize,
    pub second: f64,
    pub beat: f64,
    /// Feet placed on this row only.
    pub columns: Vec<Foot>,
    /// Where feet rest after this row (placed plus unmoved).
    pub combined_columns: Vec<Foot>,
    pub moved_feet: FootSet,
    pub hold_feet: FootSet,
}

impl State {
    /// Empty-pad state used for the synthetic start and end nodes.
    pub fn boundary(row_index: isize, second: f64, beat: f64, column_count: usize) -> Self {
        Self {
            row_index,
            second,
            beat,
            columns: vec![Foot::None; column_count],
            combined_columns: vec![Foot::None; column_count],
            moved_feet: FootSet::new(),
            hold_feet: FootSet::new(),
        }
    }
}

/// Graph node: one deduplicated state.
#[derive(Clone, Debug)]
pub struct StepParityNode {
    pub id: NodeId,
    pub state: State,
}

/// Directed edge `from → to` with the full cost breakdown.
#[derive(Clone, Debug)]
pub struct EdgeData {
    pub from: NodeId,
    pub to: NodeId,
    pub cost: CostBreakdown,
}
