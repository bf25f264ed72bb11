//! Change notifications for external views. Fire-and-forget: the engine never waits for
//! or inspects a reply.

use std::sync::mpsc::Sender;

/// What changed after an engine operation.
#[derive(Clone, Debug, PartialEq)]
pub enum ParityEvent {
    /// A new parity result is in place (`rows == 0` after the chart emptied).
    ParityUpdated { rows: usize, cost: Option<f64> },
    /// The override set was mutated; `beats` is the number of overridden beats now.
    OverridesChanged { beats: usize },
}

pub trait EventSink {
    fn publish(&mut self, event: ParityEvent);
}

/// Discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn publish(&mut self, _event: ParityEvent) {}
}

/// Forwards events over a channel; a hung-up receiver is ignored.
impl EventSink for Sender<ParityEvent> {
    fn publish(&mut self, event: ParityEvent) {
        if self.send(event).is_err() {
            tracing::trace!("event receiver gone");
        }
    }
}
