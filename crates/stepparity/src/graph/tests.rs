use super::*;
use crate::cost::{CostBreakdown, CostTerm};
use crate::foot::Foot;

fn state(row: isize, cols: [Foot; 4]) -> State {
    let mut s = State::boundary(row, row as f64, row as f64, 4);
    s.columns = cols.to_vec();
    s.combined_columns = cols.to_vec();
    s.moved_feet = cols.iter().copied().filter(|f| *f != Foot::None).collect();
    s
}

fn cost(total: f64) -> CostBreakdown {
    let mut c = CostBreakdown::zero();
    c.set(CostTerm::Distance, total);
    c.finalize();
    c
}

const N: Foot = Foot::None;
const L: Foot = Foot::LeftHeel;
const R: Foot = Foot::RightHeel;

/// start → {a, b} → end with `a` cheaper.
fn diamond() -> (StepParityGraph, NodeId, NodeId, NodeId, NodeId) {
    let mut g = StepParityGraph::new();
    let s = g.add_or_get_node(State::boundary(-1, -1.0, -1.0, 4));
    let a = g.add_or_get_node(state(0, [L, N, N, N]));
    let b = g.add_or_get_node(state(0, [R, N, N, N]));
    let e = g.add_or_get_node(State::boundary(1, 1.0, 1.0, 4));
    g.set_start(s);
    g.set_end(e);
    g.add_edge(s, a, cost(1.0));
    g.add_edge(s, b, cost(5.0));
    g.add_edge(a, e, CostBreakdown::zero());
    g.add_edge(b, e, CostBreakdown::zero());
    (g, s, a, b, e)
}

#[test]
fn dedup_is_scoped_to_the_row() {
    let mut g = StepParityGraph::new();
    let a = g.add_or_get_node(state(0, [L, N, N, N]));
    let again = g.add_or_get_node(state(0, [L, N, N, N]));
    let other_row = g.add_or_get_node(state(1, [L, N, N, N]));
    assert_eq!(a, again);
    assert_ne!(a, other_row);
    assert_eq!(g.len(), 2);
    assert_eq!(g.nodes_at_row(0), &[a]);
    assert!(g.nodes_at_row(7).is_empty());
}

#[test]
fn cheapest_path_skips_boundaries() {
    let (g, _, a, _, _) = diamond();
    assert_eq!(g.cheapest_path(), vec![a]);
    assert_eq!(g.path_cost(&[a]), Some(1.0));
}

#[test]
fn re_adding_an_edge_replaces_its_cost() {
    let (mut g, s, a, b, _) = diamond();
    g.add_edge(s, a, cost(10.0));
    assert_eq!(g.edge_count(), 4);
    assert_eq!(g.edge_cost(s, a).unwrap().total(), 10.0);
    assert_eq!(g.cheapest_path(), vec![b]);
}

#[test]
fn penalty_is_visible_from_both_endpoints() {
    let (mut g, s, a, b, _) = diamond();
    g.penalize_incoming(a, 100_000.0);
    let (_, via_ancestor) = g.ancestors(a).next().unwrap();
    assert_eq!(via_ancestor.override_penalty(), 100_000.0);
    assert_eq!(g.edge_cost(s, a).unwrap().total(), 100_001.0);
    assert_eq!(g.cheapest_path(), vec![b]);
}

#[test]
fn unreachable_end_yields_partial_path() {
    let mut g = StepParityGraph::new();
    let s = g.add_or_get_node(State::boundary(-1, -1.0, -1.0, 4));
    let a = g.add_or_get_node(state(0, [L, N, N, N]));
    let e = g.add_or_get_node(State::boundary(1, 1.0, 1.0, 4));
    g.set_start(s);
    g.set_end(e);
    g.add_edge(s, a, cost(1.0));
    assert!(g.cheapest_path().is_empty());
    assert_eq!(g.path_cost(&[a]), None);
}

#[test]
fn edges_point_forward_in_id_and_row() {
    let (g, ..) = diamond();
    for edge in g.edges() {
        assert!(edge.from < edge.to);
        assert!(g.state(edge.from).row_index < g.state(edge.to).row_index);
    }
}

#[test]
fn export_round_trips_through_json() {
    let (mut g, _, a, ..) = diamond();
    g.penalize_incoming(a, 100_000.0);
    let json = g.to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["startNode"], 0);
    assert_eq!(value["nodes"][1]["ancestors"][0][1]["OVERRIDE"], 100_000.0);
    assert_eq!(value["nodes"][0]["neighbors"][0][1]["TOTAL"], 100_001.0);
    assert_eq!(value["nodes"][0]["neighbors"][1][1]["TOTAL"], 5.0);

    let back = StepParityGraph::from_json(&json).unwrap();
    assert_eq!(back.len(), g.len());
    assert_eq!(back.cheapest_path(), g.cheapest_path());
    assert_eq!(back.to_json().unwrap(), json);
}

#[test]
fn inconsistent_export_is_rejected() {
    let (g, ..) = diamond();
    let mut export = g.export();
    export.states.pop();
    assert!(StepParityGraph::from_export(export).is_err());
}

#[test]
fn duplicated_state_in_export_is_rejected() {
    let (g, ..) = diamond();
    let mut export = g.export();
    export.states[2] = export.states[1].clone();
    assert!(matches!(
        StepParityGraph::from_export(export),
        Err(crate::error::ParityError::InvalidGraph(_))
    ));
}
