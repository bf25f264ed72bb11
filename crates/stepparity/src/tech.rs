//! Technique tags over a resolved foot assignment.
//!
//! A linear scan comparing each row with the previous one:
//! - `JA`/`DS`: single-note row after a single-note row, same foot on the same column
//!   within `JACK_CUTOFF` (jack) or on another column (doublestep).
//! - `BR`: one foot on two columns of a multi-note row.
//! - `FS`/`SS`: a column taken over by the other foot (outer columns count as sideswitch).
//! - `XO`: right foot newly on the leftmost column, or left foot on the rightmost.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::chart::NoteKind;
use crate::foot::{Foot, FootPlacement, FEET};
use crate::layout::StageLayout;
use crate::rows::Row;

/// Same-column repeats faster than this (seconds) count as jacks.
pub const JACK_CUTOFF: f64 = 0.176;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tech {
    Crossover,
    Footswitch,
    Sideswitch,
    Jack,
    Bracket,
    Doublestep,
}

impl Tech {
    pub const ALL: [Tech; 6] = [
        Tech::Crossover,
        Tech::Footswitch,
        Tech::Sideswitch,
        Tech::Jack,
        Tech::Bracket,
        Tech::Doublestep,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Tech::Crossover => "XO",
            Tech::Footswitch => "FS",
            Tech::Sideswitch => "SS",
            Tech::Jack => "JA",
            Tech::Bracket => "BR",
            Tech::Doublestep => "DS",
        }
    }
}

/// Occurrences per technique, in `Tech::ALL` order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(into = "BTreeMap<String, usize>")]
pub struct TechCounts([usize; 6]);

impl TechCounts {
    #[inline]
    pub fn get(&self, tech: Tech) -> usize {
        self.0[tech as usize]
    }

    fn bump(&mut self, tech: Tech) {
        self.0[tech as usize] += 1;
    }

    pub fn as_array(&self) -> [usize; 6] {
        self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = (Tech, usize)> + '_ {
        Tech::ALL.into_iter().map(|t| (t, self.get(t)))
    }
}

impl From<TechCounts> for BTreeMap<String, usize> {
    fn from(c: TechCounts) -> Self {
        c.iter().map(|(t, n)| (t.label().to_string(), n)).collect()
    }
}

/// Totals plus the tags of every row.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TechReport {
    pub counts: TechCounts,
    pub row_tags: Vec<Vec<Tech>>,
}

impl TechReport {
    /// Comma-joined labels of one row (`"XO,FS"`), empty when untagged.
    pub fn tag_string(&self, row: usize) -> String {
        self.row_tags
            .get(row)
            .map(|tags| tags.iter().map(|t| t.label()).collect::<Vec<_>>().join(","))
            .unwrap_or_default()
    }
}

/// Tag every row of `rows` given the chosen `parities` (one column array per row).
pub fn calculate_tech_counts(rows: &[Row], parities: &[Vec<Foot>], layout: &StageLayout) -> TechReport {
    let n = layout.column_count();
    let (left_side, right_side) = layout.side_columns();
    let mut report = TechReport {
        counts: TechCounts::default(),
        row_tags: Vec::with_capacity(rows.len()),
    };
    let mut prev_columns = vec![Foot::None; n];
    let mut prev_placement = FootPlacement::default();
    let mut prev_note_count = 0usize;

    for (r, row) in rows.iter().enumerate() {
        let mut columns = vec![Foot::None; n];
        let mut note_count = 0usize;
        let parity = parities.get(r);
        for c in 0..n {
            let Some(note) = row.notes[c] else { continue };
            if !matches!(note.kind, NoteKind::Tap | NoteKind::Hold) {
                continue;
            }
            note_count += 1;
            let foot = parity.and_then(|p| p.get(c)).copied().unwrap_or(Foot::None);
            if foot != Foot::None {
                columns[c] = foot;
            }
        }
        let placement = FootPlacement::from_columns(&columns);
        let mut tags = Vec::new();

        if r > 0 && note_count == 1 && prev_note_count == 1 {
            let dt = row.second - rows[r - 1].second;
            for foot in FEET {
                let (Some(now), Some(before)) = (placement.get(foot), prev_placement.get(foot)) else {
                    continue;
                };
                if now == before {
                    if dt < JACK_CUTOFF {
                        tags.push(Tech::Jack);
                    }
                } else {
                    tags.push(Tech::Doublestep);
                }
            }
        }

        if note_count >= 2 {
            if placement.left_bracket() {
                tags.push(Tech::Bracket);
            }
            if placement.right_bracket() {
                tags.push(Tech::Bracket);
            }
        }

        for c in 0..n {
            let (now, before) = (columns[c], prev_columns[c]);
            if now == Foot::None {
                continue;
            }
            if before != Foot::None && before != now && before.other_part() != now {
                if c == left_side || c == right_side {
                    tags.push(Tech::Sideswitch);
                } else {
                    tags.push(Tech::Footswitch);
                }
            } else if before == Foot::None
                && ((c == left_side && now.is_right()) || (c == right_side && now.is_left()))
            {
                tags.push(Tech::Crossover);
            }
        }

        for &t in &tags {
            report.counts.bump(t);
        }
        report.row_tags.push(tags);
        prev_columns = columns;
        prev_placement = placement;
        prev_note_count = note_count;
    }

    tracing::debug!(
        crossovers = report.counts.get(Tech::Crossover),
        footswitches = report.counts.get(Tech::Footswitch),
        sideswitches = report.counts.get(Tech::Sideswitch),
        jacks = report.counts.get(Tech::Jack),
        brackets = report.counts.get(Tech::Bracket),
        doublesteps = report.counts.get(Tech::Doublestep),
        "tech counts"
    );
    report
}
