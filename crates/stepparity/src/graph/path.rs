//! Cheapest start→end path by one forward relaxation over ids.

use super::{NodeId, StepParityGraph};

impl StepParityGraph {
    /// Cheapest path from the start node to the end node, both excluded.
    ///
    /// Returns an empty path for a graph without boundary nodes. A broken predecessor chain
    /// (end unreachable) is logged and yields the partial path collected so far.
    pub fn cheapest_path(&self) -> Vec<NodeId> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => self.cheapest_path_between(start, end),
            _ => Vec::new(),
        }
    }

    pub fn cheapest_path_between(&self, start: NodeId, end: NodeId) -> Vec<NodeId> {
        let n = self.nodes.len();
        let mut cost = vec![f64::INFINITY; n];
        let mut predecessor: Vec<Option<NodeId>> = vec![None; n];
        cost[start.0] = 0.0;

        // ids are a topological order
        for i in start.0..=end.0.min(n.saturating_sub(1)) {
            if !cost[i].is_finite() {
                continue;
            }
            for &e in &self.out_adj[i] {
                let edge = &self.edges[e];
                let candidate = cost[i] + edge.cost.total();
                if candidate < cost[edge.to.0] {
                    cost[edge.to.0] = candidate;
                    predecessor[edge.to.0] = Some(NodeId(i));
                }
            }
        }

        let mut path = Vec::new();
        let mut current = end;
        while current != start {
            if current != end {
                path.push(current);
            }
            match predecessor[current.0] {
                Some(p) => current = p,
                None => {
                    tracing::warn!(
                        start = start.0,
                        end = end.0,
                        at = current.0,
                        "broken predecessor chain while extracting cheapest path"
                    );
                    break;
                }
            }
        }
        path.reverse();
        path
    }

    /// Sum of edge totals along `start → path… → end`, if every edge exists.
    pub fn path_cost(&self, path: &[NodeId]) -> Option<f64> {
        let (start, end) = (self.start?, self.end?);
        let mut total = 0.0;
        let mut prev = start;
        for &id in path.iter().chain(std::iter::once(&end)) {
            total += self.edge_cost(prev, id)?.total();
            prev = id;
        }
        Some(total)
    }
}
