//! User parity corrections keyed by beat.

use std::collections::BTreeMap;

use crate::foot::{Foot, FootSet};
use crate::graph::State;
use crate::rows::Row;

/// Beat resolution of override keys (48 rows per beat, 192nd notes).
pub const ROWS_PER_BEAT: f64 = 48.0;

/// Additive penalty on edges entering a node that contradicts an override.
pub const OVERRIDE_PENALTY: f64 = 100_000.0;

/// Quantized beat; two beats within half a note row share a key.
#[inline]
pub fn beat_key(beat: f64) -> i64 {
    (beat * ROWS_PER_BEAT).round() as i64
}

/// Sparse beat → per-column foot override. `Foot::None` entries are unconstrained.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BeatOverrides {
    column_count: usize,
    rows: BTreeMap<i64, Vec<Foot>>,
}

impl BeatOverrides {
    pub fn new(column_count: usize) -> Self {
        Self {
            column_count,
            rows: BTreeMap::new(),
        }
    }

    #[inline]
    pub fn column_count(&self) -> usize {
        self.column_count
    }

    /// True if the beat carries at least one constrained column.
    pub fn has(&self, beat: f64) -> bool {
        self.rows
            .get(&beat_key(beat))
            .is_some_and(|feet| feet.iter().any(|f| *f != Foot::None))
    }

    /// Override array at `beat`; all `None` when nothing is set.
    pub fn get(&self, beat: f64) -> Vec<Foot> {
        self.rows
            .get(&beat_key(beat))
            .cloned()
            .unwrap_or_else(|| vec![Foot::None; self.column_count])
    }

    pub fn is_empty(&self) -> bool {
        !self.rows.values().any(|feet| feet.iter().any(|f| *f != Foot::None))
    }

    /// Number of beats with at least one constrained column.
    pub fn len(&self) -> usize {
        self.rows
            .values()
            .filter(|feet| feet.iter().any(|f| *f != Foot::None))
            .count()
    }

    /// Pin one column. Setting `Foot::None` clears that column.
    pub fn add_note_override(&mut self, beat: f64, column: usize, foot: Foot) -> bool {
        if column >= self.column_count {
            return false;
        }
        let n = self.column_count;
        self.rows.entry(beat_key(beat)).or_insert_with(|| vec![Foot::None; n])[column] = foot;
        true
    }

    /// Replace a whole row. Rejected if a foot part appears twice, no foot is set, or the
    /// width does not match the layout.
    pub fn add_row_override(&mut self, beat: f64, feet: Vec<Foot>) -> bool {
        if feet.len() != self.column_count {
            return false;
        }
        let mut seen = FootSet::new();
        for &f in &feet {
            if f == Foot::None {
                continue;
            }
            if seen.contains(f) {
                return false;
            }
            seen.insert(f);
        }
        if seen.is_empty() {
            return false;
        }
        self.rows.insert(beat_key(beat), feet);
        true
    }

    pub fn remove_note_override(&mut self, beat: f64, column: usize) -> bool {
        if let Some(feet) = self.rows.get_mut(&beat_key(beat)) {
            if let Some(slot) = feet.get_mut(column) {
                *slot = Foot::None;
            }
        }
        true
    }

    pub fn remove_beat_override(&mut self, beat: f64) -> bool {
        self.rows.remove(&beat_key(beat)).is_some()
    }

    pub fn reset(&mut self) {
        self.rows.clear();
    }

    /// Does `columns` agree with every constrained column of `overrides`?
    pub fn matches(overrides: &[Foot], columns: &[Foot]) -> bool {
        overrides
            .iter()
            .zip(columns)
            .all(|(o, c)| *o == Foot::None || o == c)
    }

    /// A state contradicting the override at its beat must be avoided.
    pub fn should_node_be_overridden(&self, state: &State) -> bool {
        if state.row_index < 0 || !self.has(state.beat) {
            return false;
        }
        !Self::matches(&self.get(state.beat), &state.columns)
    }

    /// Row index → override array for every row whose beat is overridden.
    pub fn by_row(&self, rows: &[Row]) -> BTreeMap<usize, Vec<Foot>> {
        rows.iter()
            .enumerate()
            .filter(|(_, r)| self.has(r.beat))
            .map(|(i, r)| (i, self.get(r.beat)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const N: Foot = Foot::None;

    #[test]
    fn note_overrides_accumulate_per_beat() {
        let mut o = BeatOverrides::new(4);
        assert!(!o.has(1.0));
        assert_eq!(o.get(1.0), vec![N; 4]);
        assert!(o.add_note_override(1.0, 0, Foot::LeftHeel));
        assert!(o.add_note_override(1.0, 3, Foot::RightHeel));
        assert!(!o.add_note_override(1.0, 4, Foot::RightHeel));
        assert_eq!(o.get(1.0), vec![Foot::LeftHeel, N, N, Foot::RightHeel]);
        o.remove_note_override(1.0, 0);
        o.remove_note_override(1.0, 3);
        // an all-None row is no override at all
        assert!(!o.has(1.0));
        assert!(o.is_empty());
    }

    #[test]
    fn beats_are_quantized() {
        let mut o = BeatOverrides::new(4);
        o.add_note_override(1.0 / 3.0, 1, Foot::LeftToe);
        assert!(o.has(0.333_333));
        assert!(!o.has(0.5));
        assert_eq!(beat_key(0.25), 12);
    }

    #[test]
    fn row_override_rejects_duplicates_and_empty_rows() {
        let mut o = BeatOverrides::new(4);
        assert!(!o.add_row_override(0.0, vec![Foot::LeftHeel, N, N, Foot::LeftHeel]));
        assert!(!o.add_row_override(0.0, vec![N; 4]));
        assert!(!o.add_row_override(0.0, vec![Foot::LeftHeel]));
        assert!(o.add_row_override(0.0, vec![Foot::LeftHeel, N, N, Foot::RightHeel]));
        assert_eq!(o.len(), 1);
        assert!(o.remove_beat_override(0.0));
        assert!(!o.remove_beat_override(0.0));
    }

    #[test]
    fn contradicting_states_are_flagged() {
        let mut o = BeatOverrides::new(4);
        o.add_note_override(2.0, 0, Foot::RightHeel);
        let mut s = State::boundary(3, 1.0, 2.0, 4);
        s.columns = vec![Foot::LeftHeel, N, N, Foot::RightHeel];
        assert!(o.should_node_be_overridden(&s));
        s.columns = vec![Foot::RightHeel, N, N, Foot::LeftHeel];
        assert!(!o.should_node_be_overridden(&s));
        // other beats are untouched
        s.beat = 3.0;
        s.columns = vec![Foot::LeftHeel, N, N, Foot::RightHeel];
        assert!(!o.should_node_be_overridden(&s));
    }
}
