use std::collections::BTreeMap;
use std::sync::mpsc;

use super::*;
use crate::chart::{ConstantBpm, Note};
use crate::cost::CostTerm;

const N: Foot = Foot::None;
const L: Foot = Foot::LeftHeel;
const R: Foot = Foot::RightHeel;

type Engine = ParityEngine<Vec<Note>, ConstantBpm>;

// left then right panel, one beat apart at 120 BPM
fn two_taps() -> Vec<Note> {
    vec![Note::tap(0, 0.0, 0.0), Note::tap(3, 1.0, 0.5)]
}

fn engine(notes: Vec<Note>) -> Engine {
    ParityEngine::new(notes, ConstantBpm::new(120.0), StageLayout::dance_single())
}

fn analyzed(notes: Vec<Note>) -> Engine {
    let mut e = engine(notes);
    assert!(e.analyze().unwrap());
    e
}

#[test]
fn analysis_annotates_every_judged_note() {
    let (tx, rx) = mpsc::channel();
    let mut e = engine(two_taps()).with_event_sink(tx);
    assert!(e.analyze().unwrap());

    let notes = e.source();
    let a0 = notes[0].annotation.as_ref().unwrap();
    let a1 = notes[1].annotation.as_ref().unwrap();
    assert_eq!(a0.parity, L);
    assert_eq!(a0.label(), "L");
    assert_eq!(a1.parity, R);
    assert_eq!(a1.tech, "");
    assert!(!a1.parity_override);

    let events: Vec<ParityEvent> = rx.try_iter().collect();
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], ParityEvent::ParityUpdated { rows: 2, cost: Some(_) }));
}

#[test]
fn empty_chart_clears_results() {
    let (tx, rx) = mpsc::channel();
    let mut e = engine(vec![Note::mine(0, 0.0, 0.0)]).with_event_sink(tx);
    assert!(e.analyze().unwrap());
    assert!(e.analysis().is_none());
    assert!(e.parities().is_empty());
    assert!(e.selected_states().is_empty());
    assert_eq!(rx.try_recv().unwrap(), ParityEvent::ParityUpdated { rows: 0, cost: None });
    assert!(matches!(e.load_parity_data("[]"), Err(ParityError::EmptyChart)));
}

#[test]
fn analysis_in_flight_drops_new_requests() {
    let mut e = engine(two_taps());
    e.analyzing = true;
    assert!(!e.analyze().unwrap());
    assert!(e.analysis().is_none());
    e.analyzing = false;
    assert!(e.analyze().unwrap());
}

#[test]
fn unsupported_override_is_rejected_without_side_effects() {
    let mut e = analyzed(vec![Note::tap(1, 0.0, 0.0), Note::tap(3, 1.0, 0.5)]);
    let before = e.parities().to_vec();
    // column 0 has no note at beat 0, so no state can put a foot there
    assert!(!e.is_note_override_valid(0.0, 0, R));
    assert!(!e.update_note_override(0.0, 0, R).unwrap());
    assert!(e.overrides().is_empty());
    assert_eq!(e.parities(), before.as_slice());
    assert!(!e.undo().unwrap());
    // no analyzed row at this beat
    assert!(!e.is_note_override_valid(0.5, 1, L));
}

#[test]
fn override_moves_the_path_and_is_undoable() {
    let (tx, rx) = mpsc::channel();
    let mut e = engine(two_taps()).with_event_sink(tx);
    e.analyze().unwrap();
    assert_eq!(e.parity_for_beat(1.0), Some(&[N, N, N, R][..]));

    assert!(e.is_note_override_valid(1.0, 3, L));
    assert!(e.update_note_override(1.0, 3, L).unwrap());
    assert_eq!(e.parity_for_beat(1.0), Some(&[N, N, N, L][..]));
    assert_eq!(e.overrides_at_beat(1.0), vec![N, N, N, L]);
    assert!(e.source()[1].annotation.as_ref().unwrap().parity_override);
    assert!(!e.source()[0].annotation.as_ref().unwrap().parity_override);

    let events: Vec<ParityEvent> = rx.try_iter().collect();
    assert!(events.contains(&ParityEvent::OverridesChanged { beats: 1 }));

    assert!(e.undo().unwrap());
    assert!(e.overrides().is_empty());
    assert_eq!(e.parity_for_beat(1.0), Some(&[N, N, N, R][..]));
    assert!(e.redo().unwrap());
    assert_eq!(e.parity_for_beat(1.0), Some(&[N, N, N, L][..]));

    // releasing the column is an edit too
    assert!(e.update_note_override(1.0, 3, N).unwrap());
    assert!(e.overrides().is_empty());
    assert!(!e.remove_note_override(1.0, 3).unwrap());
}

#[test]
fn row_overrides_replace_the_whole_row() {
    let mut e = analyzed(vec![Note::tap(0, 0.0, 0.0), Note::tap(3, 0.0, 0.0)]);
    assert_eq!(e.parities()[0], vec![L, N, N, R]);
    assert!(!e.update_row_override(0.0, vec![L, N, N, L]).unwrap());
    assert!(e.update_row_override(0.0, vec![R, N, N, L]).unwrap());
    assert_eq!(e.parities()[0], vec![R, N, N, L]);
    assert!(e.remove_beat_override(0.0).unwrap());
    assert_eq!(e.parities()[0], vec![L, N, N, R]);
}

#[test]
fn imported_parity_recovers_the_overridden_rows() {
    let mut pinned = analyzed(two_taps());
    pinned.update_note_override(1.0, 3, L).unwrap();
    let json = pinned.serialize_parity_data(false).unwrap();
    assert_eq!(json, "[[3,0,0,0],[0,0,0,1]]");

    let mut fresh = analyzed(two_taps());
    assert_eq!(fresh.load_parity_data(&json).unwrap(), 2);
    assert_eq!(fresh.parities(), pinned.parities());

    let by_row = fresh.overrides_by_row();
    assert_eq!(by_row.keys().copied().collect::<Vec<_>>(), vec![0, 1]);
    assert_eq!(by_row[&0], vec![R, N, N, N]);
    assert_eq!(by_row[&1], vec![N, N, N, L]);

    // importing is undoable like any other override edit
    assert!(fresh.undo().unwrap());
    assert!(fresh.overrides().is_empty());
}

#[test]
fn malformed_import_leaves_state_untouched() {
    let mut e = analyzed(two_taps());
    let before = e.parities().to_vec();
    assert!(matches!(e.load_parity_data("[[1,0"), Err(ParityError::MalformedPayload(_))));
    assert!(matches!(
        e.load_parity_data("[[1,0,0,0]]"),
        Err(ParityError::RowCountMismatch { expected: 2, found: 1 })
    ));
    assert!(matches!(
        e.load_parity_data("[[1,0,0,0],[0,0,3]]"),
        Err(ParityError::ColumnCountMismatch { row: 1, .. })
    ));
    assert!(e.overrides().is_empty());
    assert_eq!(e.parities(), before.as_slice());
    assert!(!e.undo().unwrap());
}

#[test]
fn weight_edits_are_undoable() {
    let mut e = analyzed(two_taps());
    assert!(!e.reset_weights().unwrap());

    let mut update = BTreeMap::new();
    update.insert("JACK".to_string(), 0.0);
    update.insert("BOGUS".to_string(), 3.0);
    assert_eq!(e.update_weights(&update).unwrap(), 1);
    assert_eq!(e.weights().get(CostTerm::Jack), 0.0);
    // same values again: nothing to record
    assert_eq!(e.update_weights(&update).unwrap(), 0);

    assert!(e.undo().unwrap());
    assert_eq!(e.weights(), &Engine::default_weights());
    assert!(e.redo().unwrap());
    assert!(e.reset_weights().unwrap());
    assert_eq!(e.weights().get(CostTerm::Jack), 30.0);
}

#[test]
fn lookups_by_beat() {
    let e = analyzed(two_taps());
    assert_eq!(e.row_index_for_beat(1.0), Some(1));
    assert_eq!(e.row_index_for_beat(0.5), None);
    assert_eq!(e.parity_for_beat(0.5), None);
    assert_eq!(e.states_for_beat(0.0).len(), 2);
    assert!(e.states_for_beat(3.0).is_empty());
    assert_eq!(e.selected_states().len(), 2);
    assert_eq!(e.selected_states()[1].columns, vec![N, N, N, R]);
    assert_eq!(e.tech().unwrap().counts.as_array(), [0; 6]);
}

#[test]
fn repeated_analysis_is_deterministic() {
    let mut e = analyzed(two_taps());
    let first = e.serialize_step_graph().unwrap();
    e.analyze().unwrap();
    assert_eq!(e.serialize_step_graph().unwrap(), first);
    let restored = StepParityGraph::from_json(&first).unwrap();
    assert_eq!(restored.len(), e.graph().unwrap().len());
}

#[test]
fn annotation_payload_matches_the_selected_path() {
    let mut e = analyzed(two_taps());
    e.update_note_override(1.0, 3, L).unwrap();
    let payload = e.annotation_payload().unwrap();
    assert_eq!(payload.selected_nodes, e.analysis().unwrap().selected_nodes);
    assert_eq!(payload.parities, e.parities());
    assert_eq!(payload.overrides.len(), 1);
    assert_eq!(payload.overrides[&1], vec![N, N, N, L]);
}

#[test]
fn clear_state_drops_overrides_and_results() {
    let mut e = analyzed(two_taps());
    e.update_note_override(1.0, 3, L).unwrap();
    e.clear_state();
    assert!(e.overrides().is_empty());
    assert!(e.graph().is_none());
    assert!(e.source().iter().all(|n| n.annotation.is_none()));
    assert_eq!(e.serialize_parity_data(false).unwrap(), "[]");
    assert!(e.annotation_payload().is_none());
}

#[test]
fn filtered_generation_agrees_with_penalized_analysis() {
    let mut e = analyzed(two_taps());
    e.update_note_override(1.0, 3, L).unwrap();
    let (parities, kept) = e.generate_parities().unwrap();
    assert_eq!(parities, e.parities());
    assert_eq!(&kept, e.overrides());
}

#[test]
fn imported_rows_without_a_legal_placement_are_dropped() {
    let mut e = analyzed(two_taps());
    // a toe with no heel cannot stand alone; the second row is fine
    assert_eq!(e.load_parity_data("[[2,0,0,0],[0,0,0,1]]").unwrap(), 1);
    assert_eq!(e.overrides_by_row().keys().copied().collect::<Vec<_>>(), vec![1]);
    assert_eq!(e.parities()[1], vec![N, N, N, L]);
    assert!(!e.source()[0].annotation.as_ref().unwrap().parity_override);
    assert!(e.source()[1].annotation.as_ref().unwrap().parity_override);
}

#[test]
fn imported_bracket_across_the_pad_is_dropped() {
    let mut e = analyzed(vec![
        Note::tap(0, 0.0, 0.0),
        Note::tap(3, 0.0, 0.0),
        Note::tap(1, 1.0, 0.5),
    ]);
    let mut imported = e.parities().to_vec();
    assert_eq!(imported[0], vec![L, N, N, R]);
    // right heel and right toe on the far-apart left and right panels
    imported[0] = vec![R, N, N, Foot::RightToe];
    let json = serialize_parity_data(&imported, false).unwrap();
    assert_eq!(e.load_parity_data(&json).unwrap(), 0);
    assert!(e.overrides().is_empty());
    assert_eq!(e.parities()[0], vec![L, N, N, R]);
}
