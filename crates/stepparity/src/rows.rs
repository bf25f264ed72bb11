//! Row building: collapse a time-sorted note list into one `Row` per distinct timestamp.
//!
//! Rules
//! - Fake notes are dropped, except fake mines which are tracked next to real mines.
//! - Mines are hazards for the *upcoming* placement: a mine is attached to the row whose
//!   timestamp it shares, or else to the next row after it. Mines after the last row are
//!   dropped.
//! - A hold is active on every later row until a row's beat passes its end beat; the row
//!   whose beat matches the end beat (within `HOLD_TAIL_TOLERANCE`) records it as a tail.

use std::collections::BTreeSet;

use crate::chart::{Note, NoteKind, TimingLookup};

/// Beat slack when matching a hold end to a row.
pub const HOLD_TAIL_TOLERANCE: f64 = 0.0005;

/// A judged note placed on a row (`index` points into the source note list).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RowNote {
    pub index: usize,
    pub kind: NoteKind,
}

/// A hold or roll that is still down while a row is played.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActiveHold {
    pub index: usize,
    pub column: usize,
    pub start_beat: f64,
    pub start_second: f64,
    pub end_beat: f64,
    pub end_second: f64,
}

/// One discretized instant of the chart.
#[derive(Clone, Debug, PartialEq)]
pub struct Row {
    pub notes: Vec<Option<RowNote>>,
    pub holds: Vec<Option<ActiveHold>>,
    pub hold_tails: BTreeSet<usize>,
    pub mines: Vec<Option<f64>>,
    pub fake_mines: Vec<Option<f64>>,
    pub second: f64,
    pub beat: f64,
}

impl Row {
    fn empty(column_count: usize, second: f64, beat: f64) -> Self {
        Self {
            notes: vec![None; column_count],
            holds: vec![None; column_count],
            hold_tails: BTreeSet::new(),
            mines: vec![None; column_count],
            fake_mines: vec![None; column_count],
            second,
            beat,
        }
    }

    /// Number of judged notes starting on this row.
    pub fn note_count(&self) -> usize {
        self.notes.iter().filter(|n| n.is_some()).count()
    }

    /// Any real or fake mine attached to this row.
    pub fn has_mines(&self) -> bool {
        self.mines.iter().any(Option::is_some) || self.fake_mines.iter().any(Option::is_some)
    }

    /// Bit `c` set iff column `c` carries a note or an active hold.
    pub fn occupied_mask(&self) -> u32 {
        let mut mask = 0u32;
        for c in 0..self.notes.len() {
            if self.notes[c].is_some() || self.holds[c].is_some() {
                mask |= 1 << c;
            }
        }
        mask
    }

    /// Columns carrying a note or an active hold, ascending.
    pub fn occupied_columns(&self) -> Vec<usize> {
        (0..self.notes.len())
            .filter(|&c| self.notes[c].is_some() || self.holds[c].is_some())
            .collect()
    }
}

/// Build rows from notes sorted by time. Unsorted input yields unspecified rows.
pub fn build_rows(notes: &[Note], column_count: usize, timing: &dyn TimingLookup) -> Vec<Row> {
    let mut builder = RowBuilder::new(column_count, timing);
    for (index, note) in notes.iter().enumerate() {
        if note.column >= column_count {
            tracing::warn!(index, column = note.column, column_count, "note outside layout; skipped");
            continue;
        }
        builder.push(index, note);
    }
    builder.finish()
}

struct RowBuilder<'a> {
    column_count: usize,
    timing: &'a dyn TimingLookup,
    rows: Vec<Row>,
    current: Option<Row>,
    active_holds: Vec<Option<ActiveHold>>,
    // mines seen since the current row started, waiting for the next row
    mines: Vec<Option<f64>>,
    fake_mines: Vec<Option<f64>>,
}

impl<'a> RowBuilder<'a> {
    fn new(column_count: usize, timing: &'a dyn TimingLookup) -> Self {
        Self {
            column_count,
            timing,
            rows: Vec::new(),
            current: None,
            active_holds: vec![None; column_count],
            mines: vec![None; column_count],
            fake_mines: vec![None; column_count],
        }
    }

    fn push(&mut self, index: usize, note: &Note) {
        let col = note.column;
        if note.kind == NoteKind::Mine {
            let fake = note.is_fake();
            match self.current.as_mut() {
                Some(row) if row.second == note.second => {
                    if fake {
                        row.fake_mines[col] = Some(note.second);
                    } else {
                        row.mines[col] = Some(note.second);
                    }
                }
                _ => {
                    if fake {
                        self.fake_mines[col] = Some(note.second);
                    } else {
                        self.mines[col] = Some(note.second);
                    }
                }
            }
            return;
        }
        if note.is_fake() {
            return;
        }
        let starts_row = self
            .current
            .as_ref()
            .map_or(true, |row| row.second != note.second);
        if starts_row {
            self.flush();
            let mut row = Row::empty(self.column_count, note.second, note.beat);
            row.mines = std::mem::replace(&mut self.mines, vec![None; self.column_count]);
            row.fake_mines = std::mem::replace(&mut self.fake_mines, vec![None; self.column_count]);
            for slot in self.active_holds.iter_mut() {
                if matches!(slot, Some(h) if note.beat > h.end_beat) {
                    *slot = None;
                }
            }
            self.current = Some(row);
        }
        if let Some(row) = self.current.as_mut() {
            row.notes[col] = Some(RowNote {
                index,
                kind: note.kind,
            });
        }
        if note.kind.is_hold() {
            self.active_holds[col] = Some(ActiveHold {
                index,
                column: col,
                start_beat: note.beat,
                start_second: note.second,
                end_beat: note.end_beat(),
                end_second: self.timing.second_at_beat(note.end_beat()),
            });
        }
    }

    /// Close the current row: attach holds that started strictly before it and tails ending on it.
    fn flush(&mut self) {
        let Some(mut row) = self.current.take() else {
            return;
        };
        for (c, slot) in self.active_holds.iter().enumerate() {
            let Some(hold) = slot else {
                continue;
            };
            if hold.start_second < row.second {
                row.holds[c] = Some(*hold);
            }
            if (hold.end_beat - row.beat).abs() <= HOLD_TAIL_TOLERANCE {
                row.hold_tails.insert(hold.column);
            }
        }
        self.rows.push(row);
    }

    fn finish(mut self) -> Vec<Row> {
        self.flush();
        self.rows
    }
}
