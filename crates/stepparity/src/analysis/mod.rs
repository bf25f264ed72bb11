//! Graph construction and path selection.
//!
//! Purpose
//! - Expand every row into its legal foot placements, score each transition with the
//!   `CostModel`, and keep the resulting layered DAG in a `StepParityGraph`.
//! - Honor user overrides in one of two ways:
//!   - filtering (`build_graph` with overrides): only placements agreeing with the override
//!     are generated; an override no placement satisfies is dropped with a warning;
//!   - penalty (`apply_override_penalties`): the full graph is kept and every edge entering a
//!     contradicting node is charged `OVERRIDE_PENALTY`, so override validation can still
//!     inspect every state.
//!
//! Layout
//! - `permute.rs`: legal placement enumeration with a per-mask cache.
//! - `overrides.rs`: `BeatOverrides`, beat quantization, contradiction test.

mod overrides;
mod permute;

pub use overrides::{beat_key, BeatOverrides, OVERRIDE_PENALTY, ROWS_PER_BEAT};
pub use permute::{enumerate_permutations, PermutationCache};

use std::collections::BTreeMap;
use std::time::Instant;

use crate::chart::{Note, TimingLookup};
use crate::cost::{combine_columns, CostBreakdown, CostModel, Weights};
use crate::error::{ParityError, Result};
use crate::foot::{Foot, FootSet};
use crate::graph::{NodeId, State, StepParityGraph};
use crate::layout::StageLayout;
use crate::rows::{build_rows, Row};
use crate::tech::{calculate_tech_counts, TechReport};

/// Everything one analysis pass derives from a chart.
#[derive(Clone, Debug, Default)]
pub struct Analysis {
    pub rows: Vec<Row>,
    pub graph: StepParityGraph,
    pub selected_nodes: Vec<NodeId>,
    pub selected_states: Vec<State>,
    /// Chosen placement per row (`selected_states[i].columns`).
    pub parities: Vec<Vec<Foot>>,
    pub tech: TechReport,
}

/// Row building, graph construction and cheapest-path selection for one layout.
#[derive(Clone, Debug)]
pub struct Analyzer {
    model: CostModel,
    permutations: PermutationCache,
}

impl Analyzer {
    pub fn new(layout: StageLayout, weights: Weights) -> Self {
        Self {
            model: CostModel::new(layout, weights),
            permutations: PermutationCache::new(),
        }
    }

    #[inline]
    pub fn layout(&self) -> &StageLayout {
        self.model.layout()
    }

    #[inline]
    pub fn model(&self) -> &CostModel {
        &self.model
    }

    pub fn set_weights(&mut self, weights: Weights) {
        self.model.set_weights(weights);
    }

    pub fn build_rows(&self, notes: &[Note], timing: &dyn TimingLookup) -> Vec<Row> {
        build_rows(notes, self.layout().column_count(), timing)
    }

    /// Placements for `row`; with overrides present at its beat, only the agreeing ones.
    ///
    /// An override nothing agrees with is removed from `overrides`.
    fn candidate_columns(&mut self, row: &Row, overrides: Option<&mut BeatOverrides>) -> Vec<Vec<Foot>> {
        let all = self.permutations.for_row(self.model.layout(), row);
        let Some(overrides) = overrides else {
            return all.to_vec();
        };
        if !overrides.has(row.beat) {
            return all.to_vec();
        }
        let pinned = overrides.get(row.beat);
        let kept: Vec<Vec<Foot>> = all
            .iter()
            .filter(|cols| BeatOverrides::matches(&pinned, cols))
            .cloned()
            .collect();
        if kept.is_empty() {
            tracing::warn!(
                beat = row.beat,
                "no valid placement satisfies the override; dropping it"
            );
            overrides.remove_beat_override(row.beat);
            return all.to_vec();
        }
        kept
    }

    /// Can any legal placement of `row` satisfy the override `feet`?
    pub fn supports_override(&mut self, row: &Row, feet: &[Foot]) -> bool {
        self.permutations
            .for_row(self.model.layout(), row)
            .iter()
            .any(|cols| BeatOverrides::matches(feet, cols))
    }

    /// State reached by placing `columns` on `row` after `initial`.
    ///
    /// A foot moved unless it keeps holding the same column; combined columns merge in
    /// every part that stayed put.
    pub fn init_result_state(&self, initial: &State, row: &Row, row_index: usize, columns: Vec<Foot>) -> State {
        let mut moved_feet = FootSet::new();
        let mut hold_feet = FootSet::new();
        for (c, &foot) in columns.iter().enumerate() {
            if foot == Foot::None {
                continue;
            }
            let held = row.holds[c].is_some();
            if !held || initial.combined_columns.get(c) != Some(&foot) {
                moved_feet.insert(foot);
            }
            if held {
                hold_feet.insert(foot);
            }
        }
        let mut state = State {
            row_index: row_index as isize,
            second: row.second,
            beat: row.beat,
            columns,
            combined_columns: Vec::new(),
            moved_feet,
            hold_feet,
        };
        state.combined_columns = combine_columns(&initial.combined_columns, &state);
        state
    }

    /// Layered graph over `rows` between a synthetic start (one second before the first
    /// row) and end (one second after the last).
    pub fn build_graph(&mut self, rows: &[Row], mut overrides: Option<&mut BeatOverrides>) -> StepParityGraph {
        let mut graph = StepParityGraph::new();
        let n = self.layout().column_count();
        let (Some(first), Some(last)) = (rows.first(), rows.last()) else {
            return graph;
        };

        let start = graph.add_or_get_node(State::boundary(-1, first.second - 1.0, first.beat - 1.0, n));
        graph.set_start(start);

        let mut previous: Vec<NodeId> = vec![start];
        for (i, row) in rows.iter().enumerate() {
            let candidates = self.candidate_columns(row, overrides.as_deref_mut());
            let mut reached: Vec<NodeId> = Vec::new();
            for &from in &previous {
                let initial = graph.state(from).clone();
                for columns in &candidates {
                    let result = self.init_result_state(&initial, row, i, columns.clone());
                    let cost = self.model.cost(&initial, &result, rows, i);
                    let to = graph.add_or_get_node(result);
                    graph.add_edge(from, to, cost);
                    if !reached.contains(&to) {
                        reached.push(to);
                    }
                }
            }
            previous = reached;
        }

        let end = graph.add_or_get_node(State::boundary(
            rows.len() as isize,
            last.second + 1.0,
            last.beat + 1.0,
            n,
        ));
        graph.set_end(end);
        for from in previous {
            graph.add_edge(from, end, CostBreakdown::zero());
        }
        graph
    }

    /// Charge every edge entering a node that contradicts `overrides`. Returns the number
    /// of penalized nodes.
    pub fn apply_override_penalties(graph: &mut StepParityGraph, overrides: &BeatOverrides) -> usize {
        if overrides.is_empty() {
            return 0;
        }
        let flagged: Vec<NodeId> = graph
            .nodes()
            .iter()
            .filter(|node| overrides.should_node_be_overridden(&node.state))
            .map(|node| node.id)
            .collect();
        for &id in &flagged {
            graph.penalize_incoming(id, OVERRIDE_PENALTY);
        }
        flagged.len()
    }

    /// Cheapest-path states, one per row (fewer only if the path is broken).
    pub fn select_states(graph: &StepParityGraph, row_count: usize) -> (Vec<NodeId>, Vec<State>) {
        let path = graph.cheapest_path();
        if path.len() != row_count {
            tracing::warn!(path = path.len(), rows = row_count, "cheapest path does not cover every row");
        }
        let nodes: Vec<NodeId> = path.into_iter().take(row_count).collect();
        let states = nodes.iter().map(|&id| graph.state(id).clone()).collect();
        (nodes, states)
    }

    /// Full pass on the unconstrained graph; overrides act through the penalty.
    pub fn analyze(
        &mut self,
        notes: &[Note],
        timing: &dyn TimingLookup,
        overrides: Option<&BeatOverrides>,
    ) -> Result<Analysis> {
        let t0 = Instant::now();
        let rows = self.build_rows(notes, timing);
        if rows.is_empty() {
            return Err(ParityError::EmptyChart);
        }
        let mut graph = self.build_graph(&rows, None);
        let penalized = overrides.map_or(0, |o| Self::apply_override_penalties(&mut graph, o));
        let (selected_nodes, selected_states) = Self::select_states(&graph, rows.len());
        let parities: Vec<Vec<Foot>> = selected_states.iter().map(|s| s.columns.clone()).collect();
        let tech = calculate_tech_counts(&rows, &parities, self.layout());
        tracing::debug!(
            rows = rows.len(),
            nodes = graph.len(),
            edges = graph.edge_count(),
            penalized,
            cost = graph.path_cost(&selected_nodes),
            elapsed_ms = t0.elapsed().as_secs_f64() * 1e3,
            "analysis complete"
        );
        Ok(Analysis {
            rows,
            graph,
            selected_nodes,
            selected_states,
            parities,
            tech,
        })
    }

    /// Cheapest placements with overrides applied as filters. Overrides that no placement
    /// satisfies are removed from `overrides`.
    pub fn generate_parities(
        &mut self,
        notes: &[Note],
        timing: &dyn TimingLookup,
        overrides: Option<&mut BeatOverrides>,
    ) -> Result<Vec<Vec<Foot>>> {
        let rows = self.build_rows(notes, timing);
        if rows.is_empty() {
            return Err(ParityError::EmptyChart);
        }
        let graph = self.build_graph(&rows, overrides);
        let (_, states) = Self::select_states(&graph, rows.len());
        Ok(states.into_iter().map(|s| s.columns).collect())
    }
}

/// Rows where `p2` differs from `p1`, holding `p2`'s value on the differing columns and
/// `Foot::None` elsewhere. Rows missing from `p2` are skipped.
pub fn parity_differences(p1: &[Vec<Foot>], p2: &[Vec<Foot>]) -> BTreeMap<usize, Vec<Foot>> {
    let mut out = BTreeMap::new();
    for (r, (a, b)) in p1.iter().zip(p2).enumerate() {
        let diffs: Vec<Foot> = a
            .iter()
            .zip(b)
            .map(|(x, y)| if x != y { *y } else { Foot::None })
            .collect();
        if a.iter().zip(b).any(|(x, y)| x != y) {
            out.insert(r, diffs);
        }
    }
    out
}
