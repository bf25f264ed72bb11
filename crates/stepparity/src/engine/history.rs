//! Undoable commands over the user-editable settings (weights + overrides).
//!
//! Commands mutate `ParitySettings` only; derived state (graph, selected path,
//! annotations) is always rebuilt by the engine after an action or undo runs.

use crate::analysis::BeatOverrides;
use crate::cost::Weights;

/// Everything a user can change and undo.
#[derive(Clone, Debug, PartialEq)]
pub struct ParitySettings {
    pub weights: Weights,
    pub overrides: BeatOverrides,
}

impl ParitySettings {
    pub fn new(column_count: usize) -> Self {
        Self {
            weights: Weights::default(),
            overrides: BeatOverrides::new(column_count),
        }
    }
}

type Apply = Box<dyn Fn(&mut ParitySettings) + Send>;

/// A labelled `{action, undo}` pair.
pub struct Command {
    label: String,
    action: Apply,
    undo: Apply,
}

impl Command {
    pub fn new(
        label: impl Into<String>,
        action: impl Fn(&mut ParitySettings) + Send + 'static,
        undo: impl Fn(&mut ParitySettings) + Send + 'static,
    ) -> Self {
        Self {
            label: label.into(),
            action: Box::new(action),
            undo: Box::new(undo),
        }
    }

    /// Swap in `after` for one part of the settings, restoring `before` on undo.
    pub fn snapshot<T: Clone + Send + 'static>(
        label: impl Into<String>,
        before: T,
        after: T,
        field: fn(&mut ParitySettings) -> &mut T,
    ) -> Self {
        Self::new(
            label,
            move |s| *field(s) = after.clone(),
            move |s| *field(s) = before.clone(),
        )
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn apply(&self, settings: &mut ParitySettings) {
        (self.action)(settings);
    }

    pub fn revert(&self, settings: &mut ParitySettings) {
        (self.undo)(settings);
    }
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command").field("label", &self.label).finish_non_exhaustive()
    }
}

/// Host-side command log. The engine appends already-applied commands and asks the log to
/// step backwards or forwards; it never looks at the entries.
pub trait CommandLog {
    fn record(&mut self, command: Command);
    /// Revert the latest command; returns its label.
    fn undo(&mut self, settings: &mut ParitySettings) -> Option<String>;
    /// Re-apply the latest undone command; returns its label.
    fn redo(&mut self, settings: &mut ParitySettings) -> Option<String>;
    fn clear(&mut self);
}

/// Bounded linear undo/redo stacks. Recording drops the redo branch.
#[derive(Debug)]
pub struct ActionHistory {
    done: Vec<Command>,
    undone: Vec<Command>,
    limit: usize,
}

impl Default for ActionHistory {
    fn default() -> Self {
        Self::with_limit(256)
    }
}

impl ActionHistory {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            done: Vec::new(),
            undone: Vec::new(),
            limit: limit.max(1),
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.done.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.undone.is_empty()
    }

    pub fn len(&self) -> usize {
        self.done.len()
    }

    pub fn is_empty(&self) -> bool {
        self.done.is_empty()
    }
}

impl CommandLog for ActionHistory {
    fn record(&mut self, command: Command) {
        tracing::trace!(label = command.label(), "command recorded");
        self.undone.clear();
        self.done.push(command);
        if self.done.len() > self.limit {
            self.done.remove(0);
        }
    }

    fn undo(&mut self, settings: &mut ParitySettings) -> Option<String> {
        let command = self.done.pop()?;
        command.revert(settings);
        let label = command.label.clone();
        self.undone.push(command);
        Some(label)
    }

    fn redo(&mut self, settings: &mut ParitySettings) -> Option<String> {
        let command = self.undone.pop()?;
        command.apply(settings);
        let label = command.label.clone();
        self.done.push(command);
        Some(label)
    }

    fn clear(&mut self) {
        self.done.clear();
        self.undone.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::CostTerm;
    use crate::foot::Foot;

    fn weights_with_jack(v: f64) -> Weights {
        let mut w = Weights::default();
        w.set(CostTerm::Jack, v);
        w
    }

    #[test]
    fn undo_redo_walks_the_stack() {
        let mut settings = ParitySettings::new(4);
        let mut log = ActionHistory::default();

        let cmd = Command::snapshot(
            "jack weight",
            settings.weights.clone(),
            weights_with_jack(5.0),
            |s| &mut s.weights,
        );
        cmd.apply(&mut settings);
        log.record(cmd);
        assert_eq!(settings.weights.get(CostTerm::Jack), 5.0);

        assert_eq!(log.undo(&mut settings).as_deref(), Some("jack weight"));
        assert_eq!(settings.weights, Weights::default());
        assert!(log.can_redo());
        assert!(log.undo(&mut settings).is_none());

        log.redo(&mut settings);
        assert_eq!(settings.weights.get(CostTerm::Jack), 5.0);
        assert!(!log.can_redo());
    }

    #[test]
    fn recording_drops_redo_branch_and_respects_limit() {
        let mut settings = ParitySettings::new(4);
        let mut log = ActionHistory::with_limit(2);
        for beat in 0..3 {
            let before = settings.overrides.clone();
            let mut after = before.clone();
            after.add_note_override(f64::from(beat), 0, Foot::LeftHeel);
            let cmd = Command::snapshot("override", before, after, |s| &mut s.overrides);
            cmd.apply(&mut settings);
            log.record(cmd);
        }
        assert_eq!(log.len(), 2);
        log.undo(&mut settings);
        assert_eq!(settings.overrides.len(), 2);
        log.record(Command::new("noop", |_| {}, |_| {}));
        assert!(!log.can_redo());
        log.clear();
        assert!(log.is_empty());
    }
}
