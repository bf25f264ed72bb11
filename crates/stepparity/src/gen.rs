//! Reproducible random charts for tests, benches and the CLI `sample` command.
//!
//! Charts are single-tempo and quantized to `subdivision` steps per beat. Each step gets
//! one tap or a multi-note row on columns not covered by a running hold; any step may be
//! preceded by a mine half a step earlier. Rows of three or four notes only start while no
//! hold runs and stay inside one four-panel block, so every row has a legal placement.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::chart::{ConstantBpm, Note, TimingLookup};
use crate::error::{ParityError, Result};

#[derive(Clone, Debug, PartialEq)]
pub struct ChartGenParams {
    /// Number of steps (some may stay empty while holds run).
    pub steps: usize,
    /// Steps per beat (4 = 16th notes).
    pub subdivision: u32,
    pub bpm: f64,
    pub jump_prob: f64,
    pub hold_prob: f64,
    pub mine_prob: f64,
    /// Largest multi-note row (2..=4); rows above two notes need `jump_prob` to fire first.
    pub max_row_notes: usize,
    /// Longest hold, in steps.
    pub max_hold_steps: u32,
}

impl Default for ChartGenParams {
    fn default() -> Self {
        Self {
            steps: 64,
            subdivision: 2,
            bpm: 150.0,
            jump_prob: 0.1,
            hold_prob: 0.1,
            mine_prob: 0.05,
            max_row_notes: 2,
            max_hold_steps: 4,
        }
    }
}

impl ChartGenParams {
    fn validate(&self) -> Result<()> {
        if self.subdivision == 0 {
            return Err(ParityError::InvalidParams("subdivision must be > 0".into()));
        }
        if !(self.bpm.is_finite() && self.bpm > 0.0) {
            return Err(ParityError::InvalidParams("bpm must be finite and > 0".into()));
        }
        for (name, p) in [
            ("jump_prob", self.jump_prob),
            ("hold_prob", self.hold_prob),
            ("mine_prob", self.mine_prob),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(ParityError::InvalidParams(format!("{name} must lie in [0, 1]")));
            }
        }
        if !(2..=4).contains(&self.max_row_notes) {
            return Err(ParityError::InvalidParams("max_row_notes must lie in 2..=4".into()));
        }
        if self.max_hold_steps == 0 {
            return Err(ParityError::InvalidParams("max_hold_steps must be > 0".into()));
        }
        Ok(())
    }
}

/// Seeded chart source; the same seed and params always give the same notes.
pub struct ChartGenerator {
    params: ChartGenParams,
    column_count: usize,
    rng: StdRng,
}

impl ChartGenerator {
    pub fn new(params: ChartGenParams, column_count: usize, seed: u64) -> Result<Self> {
        params.validate()?;
        if column_count < 2 {
            return Err(ParityError::InvalidParams("need at least two columns".into()));
        }
        Ok(Self {
            params,
            column_count,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    pub fn params(&self) -> &ChartGenParams {
        &self.params
    }

    pub fn timing(&self) -> ConstantBpm {
        ConstantBpm::new(self.params.bpm)
    }

    /// Next chart from the stream, sorted by time.
    pub fn generate(&mut self) -> Vec<Note> {
        let p = self.params.clone();
        let timing = self.timing();
        let step = 1.0 / f64::from(p.subdivision);
        let n = self.column_count;
        let mut hold_end = vec![f64::NEG_INFINITY; n];
        let mut notes = Vec::new();

        for i in 0..p.steps {
            let beat = i as f64 * step;
            let free: Vec<usize> = (0..n).filter(|&c| beat > hold_end[c] + 1e-9).collect();
            let held = n - free.len();
            if free.is_empty() || held >= 2 {
                continue;
            }
            let mut want = 1;
            if held == 0 && self.rng.gen_bool(p.jump_prob) {
                want = if p.max_row_notes > 2 {
                    self.rng.gen_range(2..=p.max_row_notes)
                } else {
                    2
                };
            }
            let pool: Vec<usize> = if want > 2 {
                let block = self.rng.gen_range(0..n.div_ceil(4)) * 4;
                (block..(block + 4).min(n)).collect()
            } else {
                free.clone()
            };
            let mut chosen: Vec<usize> = pool
                .choose_multiple(&mut self.rng, want.min(pool.len()))
                .copied()
                .collect();
            chosen.sort_unstable();

            if i > 0 && self.rng.gen_bool(p.mine_prob) {
                let open: Vec<usize> = free.iter().copied().filter(|c| !chosen.contains(c)).collect();
                if let Some(&c) = open.choose(&mut self.rng) {
                    let mine_beat = beat - step / 2.0;
                    notes.push(Note::mine(c, mine_beat, timing.second_at_beat(mine_beat)));
                }
            }

            let second = timing.second_at_beat(beat);
            for c in chosen {
                if self.rng.gen_bool(p.hold_prob) {
                    let len = f64::from(self.rng.gen_range(1..=p.max_hold_steps)) * step;
                    hold_end[c] = beat + len;
                    notes.push(Note::hold(c, beat, second, len));
                } else {
                    notes.push(Note::tap(c, beat, second));
                }
            }
        }
        notes
    }
}

/// One-shot helper: the first chart of the stream for `seed`.
pub fn random_chart(params: ChartGenParams, column_count: usize, seed: u64) -> Result<Vec<Note>> {
    Ok(ChartGenerator::new(params, column_count, seed)?.generate())
}
