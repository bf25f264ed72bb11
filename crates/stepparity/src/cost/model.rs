use nalgebra::Vector2;

use crate::foot::{column_of, Foot, FootPlacement};
use crate::graph::State;
use crate::layout::StageLayout;
use crate::rows::Row;

use super::weights::{CostBreakdown, CostTerm, Weights};

/// Time thresholds (seconds) and scale factors of the cost terms.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CostCfg {
    /// Jacks faster than this are penalized (16th notes at 150 BPM).
    pub jack_max_elapsed: f64,
    /// Single-foot brackets slower than this are penalized.
    pub slow_bracket_threshold: f64,
    /// Footswitches are penalized inside `[slow_footswitch_threshold, slow_footswitch_ignore)`.
    pub slow_footswitch_threshold: f64,
    pub slow_footswitch_ignore: f64,
    /// Distance multiplier for a foot that moves into a bracket.
    pub bracket_distance_discount: f64,
    pub facing_exponent: f64,
    pub facing_scale: f64,
}

impl Default for CostCfg {
    fn default() -> Self {
        Self {
            jack_max_elapsed: 0.1,
            slow_bracket_threshold: 0.15,
            slow_footswitch_threshold: 0.2,
            slow_footswitch_ignore: 0.4,
            bracket_distance_discount: 0.2,
            facing_exponent: 1.8,
            facing_scale: 100.0,
        }
    }
}

/// Where the feet rest after `result`: newly placed parts win; a previous heel stays
/// unless that heel moved, a previous toe stays only if neither part of its foot moved.
pub fn combine_columns(initial_combined: &[Foot], result: &State) -> Vec<Foot> {
    result
        .columns
        .iter()
        .enumerate()
        .map(|(i, &placed)| {
            if placed != Foot::None {
                return placed;
            }
            let prev = initial_combined.get(i).copied().unwrap_or(Foot::None);
            let kept = match prev {
                Foot::None => false,
                Foot::LeftHeel | Foot::RightHeel => !result.moved_feet.contains(prev),
                Foot::LeftToe | Foot::RightToe => {
                    !result.moved_feet.contains(prev) && !result.moved_feet.contains(prev.heel())
                }
            };
            if kept {
                prev
            } else {
                Foot::None
            }
        })
        .collect()
}

#[inline]
fn stepped(state: &State, f: Foot) -> bool {
    state.moved_feet.contains(f) && !state.hold_feet.contains(f)
}

/// Motion flags shared by several terms, computed once per transition.
#[derive(Clone, Copy, Debug, Default)]
struct Motion {
    moved_left: bool,
    moved_right: bool,
    /// Both feet stepped (not held) on the previous row.
    did_jump: bool,
    prev_left_stepped: bool,
    prev_right_stepped: bool,
    jacked_left: bool,
    jacked_right: bool,
}

impl Motion {
    fn detect(initial: &State, result: &State, placed: &FootPlacement) -> Self {
        let prev_left_stepped = stepped(initial, Foot::LeftHeel) || stepped(initial, Foot::LeftToe);
        let prev_right_stepped =
            stepped(initial, Foot::RightHeel) || stepped(initial, Foot::RightToe);
        let mut m = Motion {
            moved_left: result.moved_feet.has_left(),
            moved_right: result.moved_feet.has_right(),
            did_jump: prev_left_stepped && prev_right_stepped,
            prev_left_stepped,
            prev_right_stepped,
            ..Default::default()
        };
        if m.did_jump {
            return m;
        }
        // same part back on the column it just stepped on
        let repeats = |part: Foot| {
            placed.get(part).is_some_and(|c| {
                initial.combined_columns.get(c) == Some(&part) && !result.hold_feet.contains(part)
            })
        };
        if placed.left_heel.is_some() && m.moved_left && prev_left_stepped {
            m.jacked_left = repeats(Foot::LeftHeel) || repeats(Foot::LeftToe);
        }
        if placed.right_heel.is_some() && m.moved_right && prev_right_stepped {
            m.jacked_right = repeats(Foot::RightHeel) || repeats(Foot::RightToe);
        }
        m
    }

    #[inline]
    fn one_foot(&self) -> bool {
        self.moved_left != self.moved_right
    }

    #[inline]
    fn jacked(&self) -> bool {
        self.jacked_left || self.jacked_right
    }
}

/// Scores transitions between states for one pad layout.
#[derive(Clone, Debug)]
pub struct CostModel {
    layout: StageLayout,
    weights: Weights,
    cfg: CostCfg,
}

impl CostModel {
    pub fn new(layout: StageLayout, weights: Weights) -> Self {
        Self {
            layout,
            weights,
            cfg: CostCfg::default(),
        }
    }

    pub fn with_cfg(mut self, cfg: CostCfg) -> Self {
        self.cfg = cfg;
        self
    }

    #[inline]
    pub fn layout(&self) -> &StageLayout {
        &self.layout
    }

    #[inline]
    pub fn weights(&self) -> &Weights {
        &self.weights
    }

    pub fn set_weights(&mut self, weights: Weights) {
        self.weights = weights;
    }

    #[inline]
    pub fn cfg(&self) -> &CostCfg {
        &self.cfg
    }

    #[inline]
    fn w(&self, term: CostTerm) -> f64 {
        self.weights.get(term)
    }

    /// Cost of moving from `initial` to `result`, where `result` places the feet of
    /// `rows[row_index]` and already carries its combined columns.
    pub fn cost(&self, initial: &State, result: &State, rows: &[Row], row_index: usize) -> CostBreakdown {
        let row = &rows[row_index];
        let elapsed = result.second - initial.second;
        let combined = &result.combined_columns;

        let initial_placement = FootPlacement::from_columns(&initial.combined_columns);
        let result_placement = FootPlacement::from_columns(&result.columns);
        let mut combined_placement = FootPlacement::from_columns(combined);
        let motion = Motion::detect(initial, result, &result_placement);

        let mut c = CostBreakdown::zero();
        c.set(CostTerm::Mine, self.mine_cost(combined, row));
        c.set(CostTerm::HoldSwitch, self.hold_switch_cost(initial, combined, row));
        c.set(
            CostTerm::BracketTap,
            self.bracket_tap_cost(initial, row, &result_placement, elapsed),
        );
        c.set(CostTerm::Other, self.other_foot_off_pad_cost(initial, result));
        c.set(CostTerm::BracketJack, self.bracket_jack_cost(result, &motion));
        c.set(
            CostTerm::Doublestep,
            self.doublestep_cost(result, &motion, rows, row_index),
        );
        c.set(CostTerm::Jump, self.jump_cost(row, &motion, elapsed));
        c.set(CostTerm::SlowBracket, self.slow_bracket_cost(row, &motion, elapsed));
        c.set(CostTerm::TwistedFoot, self.twisted_foot_cost(&combined_placement));

        // a foot without a placed toe faces along its heel
        if combined_placement.left_toe.is_none() {
            combined_placement.left_toe = combined_placement.left_heel;
        }
        if combined_placement.right_toe.is_none() {
            combined_placement.right_toe = combined_placement.right_heel;
        }
        c.set(CostTerm::Facing, self.facing_cost(&combined_placement));
        c.set(CostTerm::Spin, self.spin_cost(initial, &combined_placement));
        c.set(CostTerm::Footswitch, self.footswitch_cost(initial, result, row, elapsed));
        c.set(CostTerm::Sideswitch, self.sideswitch_cost(initial, result));
        c.set(CostTerm::MissedFootswitch, self.missed_footswitch_cost(row, &motion));
        c.set(CostTerm::Jack, self.jack_cost(&motion, elapsed));
        c.set(CostTerm::Distance, self.distance_cost(initial, result, elapsed));
        c.set(
            CostTerm::CrowdedBracket,
            self.crowded_bracket_cost(&initial_placement, &result_placement, elapsed),
        );
        c.finalize();
        c
    }

    fn mine_cost(&self, combined: &[Foot], row: &Row) -> f64 {
        let stepped_on_mine = combined
            .iter()
            .zip(&row.mines)
            .any(|(f, m)| *f != Foot::None && m.is_some());
        if stepped_on_mine {
            self.w(CostTerm::Mine)
        } else {
            0.0
        }
    }

    fn hold_switch_cost(&self, initial: &State, combined: &[Foot], row: &Row) -> f64 {
        let mut cost = 0.0;
        for (c, hold) in row.holds.iter().enumerate() {
            if hold.is_none() {
                continue;
            }
            let now = combined[c];
            let before = initial.combined_columns.get(c).copied().unwrap_or(Foot::None);
            let switched = (now.is_left() && !before.is_left()) || (now.is_right() && !before.is_right());
            if !switched {
                continue;
            }
            let scale = match column_of(&initial.combined_columns, now) {
                Some(prev) => self.layout.distance_sq(c, prev).sqrt(),
                None => 1.0,
            };
            cost += self.w(CostTerm::HoldSwitch) * scale;
        }
        cost
    }

    fn bracket_tap_cost(&self, initial: &State, row: &Row, placed: &FootPlacement, elapsed: f64) -> f64 {
        let held = |c: Option<usize>| c.is_some_and(|c| row.holds[c].is_some());
        let mut cost = 0.0;
        for (heel, toe, moved_before) in [
            (placed.left_heel, placed.left_toe, initial.moved_feet.has_left()),
            (placed.right_heel, placed.right_toe, initial.moved_feet.has_right()),
        ] {
            if heel.is_none() || toe.is_none() {
                continue;
            }
            let jack_penalty = if moved_before { 1.0 / elapsed } else { 1.0 };
            if held(heel) && !held(toe) {
                cost += self.w(CostTerm::BracketTap) * jack_penalty;
            }
            if held(toe) && !held(heel) {
                cost += self.w(CostTerm::BracketTap) * jack_penalty;
            }
        }
        cost
    }

    fn other_foot_off_pad_cost(&self, initial: &State, result: &State) -> f64 {
        let prev = &initial.combined_columns;
        if prev.iter().all(|f| *f == Foot::None) {
            return 0.0;
        }
        let left_on = prev.iter().any(|f| f.is_left());
        let right_on = prev.iter().any(|f| f.is_right());
        result
            .moved_feet
            .iter()
            .filter(|f| (f.is_left() && !right_on) || (f.is_right() && !left_on))
            .count() as f64
            * self.w(CostTerm::Other)
    }

    fn bracket_jack_cost(&self, result: &State, m: &Motion) -> f64 {
        if !m.one_foot() || !result.hold_feet.is_empty() || m.did_jump {
            return 0.0;
        }
        let both = |h: Foot, t: Foot| result.moved_feet.contains(h) && result.moved_feet.contains(t);
        let mut cost = 0.0;
        if m.jacked_left && both(Foot::LeftHeel, Foot::LeftToe) {
            cost += self.w(CostTerm::BracketJack);
        }
        if m.jacked_right && both(Foot::RightHeel, Foot::RightToe) {
            cost += self.w(CostTerm::BracketJack);
        }
        cost
    }

    fn doublestep_cost(&self, result: &State, m: &Motion, rows: &[Row], row_index: usize) -> f64 {
        if !m.one_foot() || !result.hold_feet.is_empty() || m.did_jump {
            return 0.0;
        }
        let mut doublestepped = (m.moved_left && !m.jacked_left && m.prev_left_stepped)
            || (m.moved_right && !m.jacked_right && m.prev_right_stepped);
        if let Some(last) = row_index.checked_sub(1).and_then(|i| rows.get(i)) {
            // a hold tail reaching past the previous row frees the holding foot to step again
            if last.holds.iter().flatten().any(|h| h.end_beat > last.beat) {
                doublestepped = false;
            }
        }
        if doublestepped {
            self.w(CostTerm::Doublestep)
        } else {
            0.0
        }
    }

    fn jump_cost(&self, row: &Row, m: &Motion, elapsed: f64) -> f64 {
        if m.moved_left && m.moved_right && row.note_count() >= 2 {
            self.w(CostTerm::Jump) / elapsed
        } else {
            0.0
        }
    }

    fn slow_bracket_cost(&self, row: &Row, m: &Motion, elapsed: f64) -> f64 {
        let threshold = self.cfg.slow_bracket_threshold;
        if elapsed > threshold && m.one_foot() && row.note_count() >= 2 {
            (elapsed - threshold) * self.w(CostTerm::SlowBracket)
        } else {
            0.0
        }
    }

    fn foot_position(&self, heel: Option<usize>, toe: Option<usize>) -> Vector2<f64> {
        self.layout.average_point(heel, toe)
    }

    fn twisted_foot_cost(&self, p: &FootPlacement) -> f64 {
        let left = self.foot_position(p.left_heel, p.left_toe);
        let right = self.foot_position(p.right_heel, p.right_toe);
        let crossed_over = right.x < left.x;
        let backwards = |heel: Option<usize>, toe: Option<usize>| match (heel, toe) {
            (Some(h), Some(t)) => self.layout.point(t).y < self.layout.point(h).y,
            _ => false,
        };
        if !crossed_over && (backwards(p.right_heel, p.right_toe) || backwards(p.left_heel, p.left_toe)) {
            self.w(CostTerm::TwistedFoot)
        } else {
            0.0
        }
    }

    fn facing_cost(&self, p: &FootPlacement) -> f64 {
        let x_diff = |a: Option<usize>, b: Option<usize>| match (a, b) {
            (Some(a), Some(b)) => self.layout.x_difference(a, b),
            _ => 0.0,
        };
        let y_diff = |a: Option<usize>, b: Option<usize>| match (a, b) {
            (Some(a), Some(b)) => self.layout.y_difference(a, b),
            _ => 0.0,
        };
        let facings = [
            x_diff(p.left_heel, p.right_heel),
            x_diff(p.left_toe, p.right_toe),
            y_diff(p.left_heel, p.left_toe),
            y_diff(p.right_heel, p.right_toe),
        ];
        facings
            .into_iter()
            .map(|v| (-v.min(0.0)).powf(self.cfg.facing_exponent) * self.cfg.facing_scale)
            .filter(|penalty| *penalty > 0.0)
            .map(|penalty| penalty * self.w(CostTerm::Facing))
            .sum()
    }

    fn spin_cost(&self, initial: &State, p: &FootPlacement) -> f64 {
        let prev = &initial.combined_columns;
        let prev_left = self.foot_position(column_of(prev, Foot::LeftHeel), column_of(prev, Foot::LeftToe));
        let prev_right =
            self.foot_position(column_of(prev, Foot::RightHeel), column_of(prev, Foot::RightToe));
        let left = self.foot_position(p.left_heel, p.left_toe);
        let right = self.foot_position(p.right_heel, p.right_toe);

        let crossed = right.x < left.x && prev_right.x < prev_left.x;
        let mut cost = 0.0;
        if crossed && right.y < left.y && prev_right.y > prev_left.y {
            cost += self.w(CostTerm::Spin);
        }
        if crossed && right.y > left.y && prev_right.y < prev_left.y {
            cost += self.w(CostTerm::Spin);
        }
        cost
    }

    /// A column changes feet (not just heel ↔ toe of one foot).
    fn switched_feet(before: Foot, placed: Foot) -> bool {
        before != Foot::None && placed != Foot::None && before != placed && before != placed.other_part()
    }

    fn footswitch_cost(&self, initial: &State, result: &State, row: &Row, elapsed: f64) -> f64 {
        let lo = self.cfg.slow_footswitch_threshold;
        if elapsed < lo || elapsed >= self.cfg.slow_footswitch_ignore || row.has_mines() {
            return 0.0;
        }
        let time_scaled = elapsed - lo;
        let switches = initial
            .combined_columns
            .iter()
            .zip(&result.columns)
            .filter(|(b, p)| Self::switched_feet(**b, **p))
            .count();
        switches as f64 * (time_scaled / (lo + time_scaled)) * self.w(CostTerm::Footswitch)
    }

    fn sideswitch_cost(&self, initial: &State, result: &State) -> f64 {
        let (left, right) = self.layout.side_columns();
        [left, right]
            .into_iter()
            .filter(|&c| {
                let before = initial.combined_columns.get(c).copied().unwrap_or(Foot::None);
                Self::switched_feet(before, result.columns[c])
            })
            .count() as f64
            * self.w(CostTerm::Sideswitch)
    }

    fn missed_footswitch_cost(&self, row: &Row, m: &Motion) -> f64 {
        if m.jacked() && row.has_mines() {
            self.w(CostTerm::MissedFootswitch)
        } else {
            0.0
        }
    }

    fn jack_cost(&self, m: &Motion, elapsed: f64) -> f64 {
        let max = self.cfg.jack_max_elapsed;
        if elapsed < max && m.one_foot() && m.jacked() {
            let remaining = max - elapsed;
            (1.0 / remaining - 1.0 / max) * self.w(CostTerm::Jack)
        } else {
            0.0
        }
    }

    fn distance_cost(&self, initial: &State, result: &State, elapsed: f64) -> f64 {
        let mut cost = 0.0;
        for foot in result.moved_feet.iter() {
            if foot == Foot::None {
                continue;
            }
            let Some(from) = column_of(&initial.combined_columns, foot) else {
                continue;
            };
            let Some(to) = column_of(&result.columns, foot) else {
                continue;
            };
            let partner = column_of(&result.columns, foot.other_part());
            // toe taking over the heel's old column is not a real move
            if partner == Some(from) {
                continue;
            }
            let mut dist = self.layout.distance_sq(from, to).sqrt() * self.w(CostTerm::Distance) / elapsed;
            if partner.is_some() {
                dist *= self.cfg.bracket_distance_discount;
            }
            cost += dist;
        }
        cost
    }

    fn crowded_bracket_cost(&self, initial: &FootPlacement, placed: &FootPlacement, elapsed: f64) -> f64 {
        let penalty = self.w(CostTerm::CrowdedBracket) / elapsed;
        let left_onto_right = overlaps(
            [initial.right_heel, initial.right_toe],
            [placed.left_heel, placed.left_toe],
        );
        let right_onto_left = overlaps(
            [initial.left_heel, initial.left_toe],
            [placed.right_heel, placed.right_toe],
        );
        let mut cost = 0.0;
        if (placed.left_bracket() && left_onto_right) || (initial.left_bracket() && right_onto_left) {
            cost += penalty;
        }
        if (placed.right_bracket() && right_onto_left) || (initial.right_bracket() && left_onto_right) {
            cost += penalty;
        }
        cost
    }
}

/// Does any part in `now` land on a column listed in `before`?
fn overlaps(before: [Option<usize>; 2], now: [Option<usize>; 2]) -> bool {
    before
        .iter()
        .flatten()
        .any(|c| now.iter().flatten().any(|n| n == c))
}
