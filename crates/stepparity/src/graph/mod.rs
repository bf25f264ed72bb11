//! Step-parity graph: deduplicated states per row, cost-weighted edges, cheapest path.
//!
//! Purpose
//! - Hold every candidate foot placement of every row plus two synthetic boundary nodes.
//! - Node ids are assigned in non-decreasing row order and edges only go to later rows,
//!   so the graph is a DAG in topological id order and a single forward relaxation finds
//!   the cheapest start→end path (`path.rs`).
//!
//! Storage
//! - Nodes and edges live in arenas; `out_adj`/`in_adj` hold edge indices, so a penalty
//!   written to an edge is visible from both endpoints.
//! - `by_row` restricts deduplication to the states of a single row.

mod export;
mod path;
mod types;

pub use export::{GraphExport, NodeExport};
pub use types::{EdgeData, NodeId, State, StepParityNode};

use std::collections::BTreeMap;

use crate::cost::CostBreakdown;

#[derive(Clone, Debug, Default)]
pub struct StepParityGraph {
    nodes: Vec<StepParityNode>,
    edges: Vec<EdgeData>,
    out_adj: Vec<Vec<usize>>,
    in_adj: Vec<Vec<usize>>,
    by_row: BTreeMap<isize, Vec<NodeId>>,
    start: Option<NodeId>,
    end: Option<NodeId>,
}

impl StepParityGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the node holding a state equal to `state`, creating it if needed.
    pub fn add_or_get_node(&mut self, state: State) -> NodeId {
        let row = self.by_row.entry(state.row_index).or_default();
        if let Some(&id) = row.iter().find(|id| self.nodes[id.0].state == state) {
            return id;
        }
        let id = NodeId(self.nodes.len());
        row.push(id);
        self.nodes.push(StepParityNode { id, state });
        self.out_adj.push(Vec::new());
        self.in_adj.push(Vec::new());
        id
    }

    /// Add `from → to`; an existing edge between the same pair gets its cost replaced.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId, cost: CostBreakdown) {
        if let Some(&e) = self.out_adj[from.0].iter().find(|&&e| self.edges[e].to == to) {
            self.edges[e].cost = cost;
            return;
        }
        let e = self.edges.len();
        self.edges.push(EdgeData { from, to, cost });
        self.out_adj[from.0].push(e);
        self.in_adj[to.0].push(e);
    }

    pub fn set_start(&mut self, id: NodeId) {
        self.start = Some(id);
    }

    pub fn set_end(&mut self, id: NodeId) {
        self.end = Some(id);
    }

    #[inline]
    pub fn start(&self) -> Option<NodeId> {
        self.start
    }

    #[inline]
    pub fn end(&self) -> Option<NodeId> {
        self.end
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &StepParityNode {
        &self.nodes[id.0]
    }

    #[inline]
    pub fn state(&self, id: NodeId) -> &State {
        &self.nodes[id.0].state
    }

    pub fn nodes(&self) -> &[StepParityNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[EdgeData] {
        &self.edges
    }

    /// Node ids of one row, in creation order (empty for unknown rows).
    pub fn nodes_at_row(&self, row_index: isize) -> &[NodeId] {
        self.by_row.get(&row_index).map_or(&[], Vec::as_slice)
    }

    /// Outgoing `(target, cost)` pairs in insertion order.
    pub fn neighbors(&self, id: NodeId) -> impl Iterator<Item = (NodeId, &CostBreakdown)> + '_ {
        self.out_adj[id.0].iter().map(|&e| (self.edges[e].to, &self.edges[e].cost))
    }

    /// Incoming `(source, cost)` pairs in insertion order.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = (NodeId, &CostBreakdown)> + '_ {
        self.in_adj[id.0].iter().map(|&e| (self.edges[e].from, &self.edges[e].cost))
    }

    pub fn edge_cost(&self, from: NodeId, to: NodeId) -> Option<&CostBreakdown> {
        self.out_adj[from.0]
            .iter()
            .map(|&e| &self.edges[e])
            .find(|edge| edge.to == to)
            .map(|edge| &edge.cost)
    }

    /// Add `penalty` to the override term of every edge entering `id`.
    pub fn penalize_incoming(&mut self, id: NodeId, penalty: f64) {
        for &e in &self.in_adj[id.0] {
            self.edges[e].cost.add_override_penalty(penalty);
        }
    }
}

#[cfg(test)]
mod tests;
