//! Event scheduler: at-most-once firing of scripted events.
//!
//! Forward play asks the scheduler for the event registered at each new
//! elapsed second. A timestamp is handed out once; after that it sits in
//! the fired set until a rewind to a time at or before it clears it.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::script::ScriptEvent;

/// Maps elapsed seconds to one-shot events and tracks which have fired.
#[derive(Debug, Clone, Default)]
pub struct EventScheduler {
    /// Registered events keyed by timestamp.
    table: BTreeMap<u64, ScriptEvent>,
    /// Timestamps already fired during forward play.
    fired: BTreeSet<u64>,
}

impl EventScheduler {
    /// Register the given events. A later event at an already registered
    /// timestamp replaces the earlier one.
    pub fn new(events: &[ScriptEvent]) -> Self {
        let table = events.iter().map(|e| (e.at, e.clone())).collect();
        Self {
            table,
            fired: BTreeSet::new(),
        }
    }

    /// Take the event registered at `elapsed` if it has not fired yet,
    /// marking it fired.
    pub fn take_due(&mut self, elapsed: u64) -> Option<ScriptEvent> {
        let event = self.table.get(&elapsed)?;
        if !self.fired.insert(elapsed) {
            debug!(elapsed, "event already fired, skipping");
            return None;
        }
        Some(event.clone())
    }

    /// Clear fired markers at or after `target` so forward play can fire
    /// them again.
    pub fn rewind(&mut self, target: u64) {
        self.fired.retain(|&t| t < target);
    }

    /// Clear every fired marker.
    pub fn reset(&mut self) {
        self.fired.clear();
    }

    /// Whether the event at `elapsed` has fired.
    pub fn has_fired(&self, elapsed: u64) -> bool {
        self.fired.contains(&elapsed)
    }

    /// Fired timestamps in ascending order.
    pub fn fired(&self) -> impl Iterator<Item = u64> + '_ {
        self.fired.iter().copied()
    }

    /// Whether an event is registered at `elapsed`.
    pub fn is_registered(&self, elapsed: u64) -> bool {
        self.table.contains_key(&elapsed)
    }
}
