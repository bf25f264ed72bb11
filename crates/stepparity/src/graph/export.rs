//! JSON interchange form of a graph (nodes with neighbor/ancestor cost maps, plus states).

use serde::{Deserialize, Serialize};

use crate::cost::CostBreakdown;
use crate::error::{ParityError, Result};

use super::{NodeId, State, StepParityGraph};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeExport {
    pub id: NodeId,
    pub state_idx: usize,
    pub row_index: isize,
    pub neighbors: Vec<(NodeId, CostBreakdown)>,
    pub ancestors: Vec<(NodeId, CostBreakdown)>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphExport {
    pub nodes: Vec<NodeExport>,
    pub states: Vec<State>,
    pub start_node: Option<NodeId>,
    pub end_node: Option<NodeId>,
}

impl StepParityGraph {
    pub fn export(&self) -> GraphExport {
        let nodes = self
            .nodes
            .iter()
            .map(|n| NodeExport {
                id: n.id,
                state_idx: n.id.0,
                row_index: n.state.row_index,
                neighbors: self.neighbors(n.id).map(|(id, c)| (id, c.clone())).collect(),
                ancestors: self.ancestors(n.id).map(|(id, c)| (id, c.clone())).collect(),
            })
            .collect();
        GraphExport {
            nodes,
            states: self.nodes.iter().map(|n| n.state.clone()).collect(),
            start_node: self.start,
            end_node: self.end,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.export())?)
    }

    /// Rebuild a graph from its export. Edges are taken from the neighbor lists; ancestor
    /// lists are implied.
    pub fn from_export(export: GraphExport) -> Result<Self> {
        if export.nodes.len() != export.states.len() {
            return Err(ParityError::InvalidGraph(format!(
                "{} nodes but {} states",
                export.nodes.len(),
                export.states.len()
            )));
        }
        let mut graph = StepParityGraph::new();
        for (i, state) in export.states.into_iter().enumerate() {
            let id = graph.add_or_get_node(state);
            if id.0 != i {
                return Err(ParityError::InvalidGraph(format!(
                    "state {i} duplicates state {}",
                    id.0
                )));
            }
        }
        let count = graph.len();
        for node in &export.nodes {
            for (to, cost) in &node.neighbors {
                if node.id.0 >= count || to.0 >= count {
                    tracing::warn!(from = node.id.0, to = to.0, "edge outside exported node range; skipped");
                    continue;
                }
                graph.add_edge(node.id, *to, cost.clone());
            }
        }
        graph.start = export.start_node.filter(|id| id.0 < count);
        graph.end = export.end_node.filter(|id| id.0 < count);
        Ok(graph)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_export(serde_json::from_str(json)?)
    }
}
