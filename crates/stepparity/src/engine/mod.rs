//! Parity engine: the stateful orchestrator a host embeds.
//!
//! Purpose
//! - Own the chart (`NoteSource`), its timing, the weights and the override set.
//! - Run full analysis passes and write the result back onto the notes.
//! - Validate and apply override edits against the current graph, as undoable commands.
//! - Serialize the parity result, the step graph and the annotation payload.
//!
//! Every mutation of weights or overrides goes through a `Command` recorded in the
//! `CommandLog`; after the command (or its undo) runs, the engine re-analyzes from scratch.
//!
//! Layout
//! - `history.rs`: `ParitySettings`, `Command`, `CommandLog`, `ActionHistory`.
//! - `events.rs`: `ParityEvent` and sinks.
//! - `persist.rs`: parity result and annotation payload formats.

mod events;
mod history;
mod persist;

pub use events::{EventSink, NullSink, ParityEvent};
pub use history::{ActionHistory, Command, CommandLog, ParitySettings};
pub use persist::{parse_parity_data, serialize_parity_data, AnnotationPayload};

use std::collections::BTreeMap;

use crate::analysis::{beat_key, parity_differences, Analysis, Analyzer, BeatOverrides};
use crate::chart::{NoteAnnotation, NoteSource, TimingLookup};
use crate::cost::Weights;
use crate::error::{ParityError, Result};
use crate::foot::Foot;
use crate::graph::{State, StepParityGraph};
use crate::layout::StageLayout;
use crate::tech::TechReport;

pub struct ParityEngine<S: NoteSource, T: TimingLookup> {
    source: S,
    timing: T,
    analyzer: Analyzer,
    settings: ParitySettings,
    analysis: Option<Analysis>,
    analyzing: bool,
    history: Box<dyn CommandLog>,
    events: Box<dyn EventSink>,
}

impl<S: NoteSource, T: TimingLookup> ParityEngine<S, T> {
    pub fn new(source: S, timing: T, layout: StageLayout) -> Self {
        let settings = ParitySettings::new(layout.column_count());
        Self {
            source,
            timing,
            analyzer: Analyzer::new(layout, settings.weights.clone()),
            settings,
            analysis: None,
            analyzing: false,
            history: Box::new(ActionHistory::default()),
            events: Box::new(NullSink),
        }
    }

    pub fn with_event_sink(mut self, sink: impl EventSink + 'static) -> Self {
        self.events = Box::new(sink);
        self
    }

    pub fn with_command_log(mut self, log: impl CommandLog + 'static) -> Self {
        self.history = Box::new(log);
        self
    }

    #[inline]
    pub fn layout(&self) -> &StageLayout {
        self.analyzer.layout()
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn into_source(self) -> S {
        self.source
    }

    pub fn settings(&self) -> &ParitySettings {
        &self.settings
    }

    /// Full pass: rows, graph, override penalties, cheapest path, tech tags, annotations.
    ///
    /// Returns `Ok(false)` if a pass is already running (the request is dropped). An empty
    /// chart clears all results and is not an error.
    pub fn analyze(&mut self) -> Result<bool> {
        if self.analyzing {
            tracing::debug!("analysis already in progress; request dropped");
            return Ok(false);
        }
        self.analyzing = true;
        let outcome = self.run_analysis();
        self.analyzing = false;
        outcome.map(|()| true)
    }

    fn run_analysis(&mut self) -> Result<()> {
        self.analyzer.set_weights(self.settings.weights.clone());
        let result = self
            .analyzer
            .analyze(self.source.notes(), &self.timing, Some(&self.settings.overrides));
        self.source.clear_annotations();
        let analysis = match result {
            Ok(analysis) => analysis,
            Err(ParityError::EmptyChart) => {
                self.analysis = None;
                self.events.publish(ParityEvent::ParityUpdated { rows: 0, cost: None });
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        for (r, row) in analysis.rows.iter().enumerate() {
            let Some(parity) = analysis.parities.get(r) else {
                break;
            };
            let tech = analysis.tech.tag_string(r);
            let pinned = self.settings.overrides.has(row.beat);
            for (c, note) in row.notes.iter().enumerate() {
                let Some(note) = note else { continue };
                self.source.annotate(
                    note.index,
                    NoteAnnotation {
                        parity: parity[c],
                        tech: tech.clone(),
                        parity_override: pinned,
                    },
                );
            }
        }

        let cost = analysis.graph.path_cost(&analysis.selected_nodes);
        self.events.publish(ParityEvent::ParityUpdated {
            rows: analysis.rows.len(),
            cost,
        });
        self.analysis = Some(analysis);
        Ok(())
    }

    /// Cheapest placements with overrides applied as filters instead of penalties.
    /// Overrides no placement satisfies are left out of the returned copy.
    pub fn generate_parities(&mut self) -> Result<(Vec<Vec<Foot>>, BeatOverrides)> {
        let mut overrides = self.settings.overrides.clone();
        self.analyzer.set_weights(self.settings.weights.clone());
        let parities =
            self.analyzer
                .generate_parities(self.source.notes(), &self.timing, Some(&mut overrides))?;
        Ok((parities, overrides))
    }

    /// Drop overrides, results and annotations. Weights and history are kept.
    pub fn clear_state(&mut self) {
        self.settings.overrides.reset();
        self.analysis = None;
        self.source.clear_annotations();
        self.events.publish(ParityEvent::OverridesChanged { beats: 0 });
    }

    fn execute(&mut self, command: Command) -> Result<()> {
        tracing::debug!(label = command.label(), "applying command");
        let before = self.settings.overrides.clone();
        command.apply(&mut self.settings);
        self.history.record(command);
        self.after_settings_change(&before)
    }

    fn after_settings_change(&mut self, overrides_before: &BeatOverrides) -> Result<()> {
        if self.settings.overrides != *overrides_before {
            self.events.publish(ParityEvent::OverridesChanged {
                beats: self.settings.overrides.len(),
            });
        }
        self.analyze().map(|_| ())
    }

    fn edit_overrides(&mut self, label: &str, edit: impl FnOnce(&mut BeatOverrides) -> bool) -> Result<bool> {
        let before = self.settings.overrides.clone();
        let mut after = before.clone();
        if !edit(&mut after) || after == before {
            return Ok(false);
        }
        self.execute(Command::snapshot(label, before, after, |s| &mut s.overrides))?;
        Ok(true)
    }

    /// Revert the last command and re-analyze. `Ok(false)` when there is nothing to undo.
    pub fn undo(&mut self) -> Result<bool> {
        let before = self.settings.overrides.clone();
        match self.history.undo(&mut self.settings) {
            Some(label) => {
                tracing::debug!(label = %label, "undo");
                self.after_settings_change(&before)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn redo(&mut self) -> Result<bool> {
        let before = self.settings.overrides.clone();
        match self.history.redo(&mut self.settings) {
            Some(label) => {
                tracing::debug!(label = %label, "redo");
                self.after_settings_change(&before)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Could some already computed state at `beat` carry `foot` on `column`, given the
    /// other columns already pinned there?
    pub fn is_note_override_valid(&self, beat: f64, column: usize, foot: Foot) -> bool {
        let mut proposed = self.settings.overrides.get(beat);
        let Some(slot) = proposed.get_mut(column) else {
            return false;
        };
        *slot = foot;
        self.is_row_override_valid(beat, &proposed)
    }

    /// Is `feet` compatible with at least one state of the current graph at `beat`?
    pub fn is_row_override_valid(&self, beat: f64, feet: &[Foot]) -> bool {
        self.states_for_beat(beat)
            .into_iter()
            .any(|state| BeatOverrides::matches(feet, &state.columns))
    }

    /// Pin (or, with `Foot::None`, release) one column at `beat`.
    ///
    /// Returns `Ok(false)` without touching anything if no current state supports it.
    pub fn update_note_override(&mut self, beat: f64, column: usize, foot: Foot) -> Result<bool> {
        if foot == Foot::None {
            return self.remove_note_override(beat, column);
        }
        if !self.is_note_override_valid(beat, column, foot) {
            tracing::warn!(beat, column, ?foot, "override rejected: no state supports it");
            return Ok(false);
        }
        self.edit_overrides("set note parity", |o| o.add_note_override(beat, column, foot))
    }

    /// Replace every column override at `beat`.
    pub fn update_row_override(&mut self, beat: f64, feet: Vec<Foot>) -> Result<bool> {
        if !self.is_row_override_valid(beat, &feet) {
            tracing::warn!(beat, ?feet, "row override rejected: no state supports it");
            return Ok(false);
        }
        self.edit_overrides("set row parity", |o| o.add_row_override(beat, feet))
    }

    pub fn remove_note_override(&mut self, beat: f64, column: usize) -> Result<bool> {
        self.edit_overrides("clear note parity", |o| o.remove_note_override(beat, column))
    }

    pub fn remove_beat_override(&mut self, beat: f64) -> Result<bool> {
        self.edit_overrides("clear row parity", |o| o.remove_beat_override(beat))
    }

    pub fn reset_overrides(&mut self) -> Result<bool> {
        self.edit_overrides("reset parity overrides", |o| {
            o.reset();
            true
        })
    }

    pub fn overrides(&self) -> &BeatOverrides {
        &self.settings.overrides
    }

    /// Override array at `beat`, all `Foot::None` if nothing is pinned.
    pub fn overrides_at_beat(&self, beat: f64) -> Vec<Foot> {
        self.settings.overrides.get(beat)
    }

    /// Row index → override array for every overridden row of the current analysis.
    pub fn overrides_by_row(&self) -> BTreeMap<usize, Vec<Foot>> {
        self.analysis
            .as_ref()
            .map(|a| self.settings.overrides.by_row(&a.rows))
            .unwrap_or_default()
    }

    pub fn weights(&self) -> &Weights {
        &self.settings.weights
    }

    pub fn default_weights() -> Weights {
        Weights::default()
    }

    /// Apply the recognized keys of `update`; returns how many weights changed.
    pub fn update_weights(&mut self, update: &BTreeMap<String, f64>) -> Result<usize> {
        let before = self.settings.weights.clone();
        let mut after = before.clone();
        let changed = after.update_from_map(update);
        if changed > 0 {
            self.execute(Command::snapshot("update weights", before, after, |s| &mut s.weights))?;
        }
        Ok(changed)
    }

    pub fn reset_weights(&mut self) -> Result<bool> {
        let before = self.settings.weights.clone();
        if before == Weights::default() {
            return Ok(false);
        }
        self.execute(Command::snapshot(
            "reset weights",
            before,
            Weights::default(),
            |s| &mut s.weights,
        ))?;
        Ok(true)
    }

    pub fn analysis(&self) -> Option<&Analysis> {
        self.analysis.as_ref()
    }

    pub fn graph(&self) -> Option<&StepParityGraph> {
        self.analysis.as_ref().map(|a| &a.graph)
    }

    pub fn selected_states(&self) -> &[State] {
        self.analysis
            .as_ref()
            .map(|a| a.selected_states.as_slice())
            .unwrap_or_default()
    }

    pub fn parities(&self) -> &[Vec<Foot>] {
        self.analysis
            .as_ref()
            .map(|a| a.parities.as_slice())
            .unwrap_or_default()
    }

    pub fn tech(&self) -> Option<&TechReport> {
        self.analysis.as_ref().map(|a| &a.tech)
    }

    /// Index of the analyzed row at `beat` (same quantization as override keys).
    pub fn row_index_for_beat(&self, beat: f64) -> Option<usize> {
        let rows = &self.analysis.as_ref()?.rows;
        let key = beat_key(beat);
        let i = rows.partition_point(|r| beat_key(r.beat) < key);
        (i < rows.len() && beat_key(rows[i].beat) == key).then_some(i)
    }

    /// Chosen placement of the row at `beat`.
    pub fn parity_for_beat(&self, beat: f64) -> Option<&[Foot]> {
        let r = self.row_index_for_beat(beat)?;
        self.parities().get(r).map(Vec::as_slice)
    }

    /// Every graph state of the row at `beat`.
    pub fn states_for_beat(&self, beat: f64) -> Vec<&State> {
        let (Some(graph), Some(r)) = (self.graph(), self.row_index_for_beat(beat)) else {
            return Vec::new();
        };
        graph
            .nodes_at_row(r as isize)
            .iter()
            .map(|&id| graph.state(id))
            .collect()
    }

    pub fn serialize_parity_data(&self, pretty: bool) -> Result<String> {
        serialize_parity_data(self.parities(), pretty)
    }

    /// Graph export JSON; an empty graph when nothing has been analyzed.
    pub fn serialize_step_graph(&self) -> Result<String> {
        match self.graph() {
            Some(graph) => graph.to_json(),
            None => StepParityGraph::new().to_json(),
        }
    }

    pub fn annotation_payload(&self) -> Option<AnnotationPayload> {
        let analysis = self.analysis.as_ref()?;
        Some(AnnotationPayload {
            selected_nodes: analysis.selected_nodes.clone(),
            overrides: self.settings.overrides.by_row(&analysis.rows),
            parities: analysis.parities.clone(),
        })
    }

    /// Import a parity result: every row where it differs from the unconstrained solution
    /// becomes a beat override (replacing the current set), then the chart is re-analyzed.
    /// Rows no legal placement can match are dropped; returns the number of beats kept.
    ///
    /// Malformed or mis-shaped input is an error and leaves the engine untouched.
    pub fn load_parity_data(&mut self, json: &str) -> Result<usize> {
        let n = self.layout().column_count();
        let rows = self.analyzer.build_rows(self.source.notes(), &self.timing);
        if rows.is_empty() {
            return Err(ParityError::EmptyChart);
        }
        let imported = parse_parity_data(json, rows.len(), n)?;

        self.analyzer.set_weights(self.settings.weights.clone());
        let free = self
            .analyzer
            .generate_parities(self.source.notes(), &self.timing, None)?;
        let mut overrides = BeatOverrides::new(n);
        for (r, feet) in parity_differences(&free, &imported) {
            if !self.analyzer.supports_override(&rows[r], &feet) {
                tracing::warn!(row = r, beat = rows[r].beat, ?feet, "imported row has no legal placement; dropped");
                continue;
            }
            if !overrides.add_row_override(rows[r].beat, feet) {
                tracing::debug!(row = r, "imported row has no usable difference; skipped");
            }
        }
        let beats = overrides.len();
        tracing::debug!(rows = rows.len(), beats, "parity data imported");

        let before = self.settings.overrides.clone();
        self.execute(Command::snapshot("import parity", before, overrides, |s| {
            &mut s.overrides
        }))?;
        Ok(beats)
    }
}

#[cfg(test)]
mod tests;
