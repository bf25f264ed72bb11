//! Chart-side collaborators: notes, the note-data provider, and the timing lookup.
//!
//! The engine never reorders notes. It only reads them and writes back one
//! `NoteAnnotation` per judged note after each analysis.

use serde::{Deserialize, Serialize};

use crate::foot::Foot;

/// Note type as authored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NoteKind {
    Tap,
    Hold,
    Roll,
    Mine,
    Lift,
    Fake,
}

impl NoteKind {
    #[inline]
    pub fn is_hold(self) -> bool {
        matches!(self, NoteKind::Hold | NoteKind::Roll)
    }
}

/// Result written back onto a note by the engine.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteAnnotation {
    pub parity: Foot,
    /// Comma-joined tech tags of the note's row (`XO,FS`), empty if none.
    #[serde(default)]
    pub tech: String,
    /// True if the row's placement was pinned by a user override.
    #[serde(default)]
    pub parity_override: bool,
}

impl NoteAnnotation {
    /// Single-character foot label (`.`, `L`, `l`, `R`, `r`).
    #[inline]
    pub fn label(&self) -> &'static str {
        self.parity.label()
    }
}

/// One chart note. `hold` is the hold/roll length in beats (0 for everything else).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    #[serde(rename = "col")]
    pub column: usize,
    pub beat: f64,
    #[serde(default)]
    pub second: f64,
    #[serde(rename = "type")]
    pub kind: NoteKind,
    #[serde(default)]
    pub fake: bool,
    #[serde(default)]
    pub hold: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation: Option<NoteAnnotation>,
}

impl Note {
    pub fn tap(column: usize, beat: f64, second: f64) -> Self {
        Self {
            column,
            beat,
            second,
            kind: NoteKind::Tap,
            fake: false,
            hold: 0.0,
            annotation: None,
        }
    }

    pub fn hold(column: usize, beat: f64, second: f64, length_beats: f64) -> Self {
        Self {
            kind: NoteKind::Hold,
            hold: length_beats,
            ..Self::tap(column, beat, second)
        }
    }

    pub fn mine(column: usize, beat: f64, second: f64) -> Self {
        Self {
            kind: NoteKind::Mine,
            ..Self::tap(column, beat, second)
        }
    }

    /// Authoring-flagged as non-judged.
    #[inline]
    pub fn is_fake(&self) -> bool {
        self.fake || self.kind == NoteKind::Fake
    }

    #[inline]
    pub fn end_beat(&self) -> f64 {
        self.beat + self.hold
    }
}

/// Note-data provider: an ordered note sequence that accepts parity annotations.
pub trait NoteSource {
    /// Notes sorted by time.
    fn notes(&self) -> &[Note];

    /// Store the engine's result for the note at `index`.
    fn annotate(&mut self, index: usize, annotation: NoteAnnotation);

    /// Remove every annotation.
    fn clear_annotations(&mut self);
}

impl NoteSource for Vec<Note> {
    fn notes(&self) -> &[Note] {
        self
    }

    fn annotate(&mut self, index: usize, annotation: NoteAnnotation) {
        if let Some(n) = self.get_mut(index) {
            n.annotation = Some(annotation);
        }
    }

    fn clear_annotations(&mut self) {
        for n in self.iter_mut() {
            n.annotation = None;
        }
    }
}

/// Self-contained chart document: pad type, tempo and notes, as read by the CLI.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    #[serde(rename = "type", alias = "layout")]
    pub layout: String,
    pub bpm: f64,
    #[serde(default)]
    pub offset: f64,
    pub notes: Vec<Note>,
}

impl Chart {
    pub fn timing(&self) -> ConstantBpm {
        ConstantBpm {
            bpm: self.bpm,
            offset: self.offset,
        }
    }
}

impl NoteSource for Chart {
    fn notes(&self) -> &[Note] {
        &self.notes
    }

    fn annotate(&mut self, index: usize, annotation: NoteAnnotation) {
        self.notes.annotate(index, annotation);
    }

    fn clear_annotations(&mut self) {
        self.notes.clear_annotations();
    }
}

/// Beat ↔ second conversion, injected by the host.
pub trait TimingLookup {
    fn second_at_beat(&self, beat: f64) -> f64;
    fn beat_at_second(&self, second: f64) -> f64;
}

/// Single tempo, StepMania offset convention (`second = beat·60/bpm − offset`).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConstantBpm {
    pub bpm: f64,
    pub offset: f64,
}

impl ConstantBpm {
    pub fn new(bpm: f64) -> Self {
        Self { bpm, offset: 0.0 }
    }
}

impl TimingLookup for ConstantBpm {
    fn second_at_beat(&self, beat: f64) -> f64 {
        beat * 60.0 / self.bpm - self.offset
    }

    fn beat_at_second(&self, second: f64) -> f64 {
        (second + self.offset) * self.bpm / 60.0
    }
}

/// Fill `second` on every note from its beat.
pub fn assign_seconds(notes: &mut [Note], timing: &dyn TimingLookup) {
    for n in notes.iter_mut() {
        n.second = timing.second_at_beat(n.beat);
    }
}
