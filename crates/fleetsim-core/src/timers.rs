//! The single virtual-time queue behind every engine timer.
//!
//! The clock increment, the telemetry sampler, log reveals, delayed
//! narrative cards, and playbook cascades are all entries in one
//! [`TimerQueue`], ordered by `(due_ms, seq)` so entries due at the same
//! millisecond run in scheduling order. Every entry belongs to a
//! [`TimerGroup`]; cancelling a group (or everything, on reset and seek)
//! is a single operation, so no stale entry can outlive the run that
//! scheduled it.

use std::collections::BTreeMap;

use fleetsim_types::LogChannel;
use tracing::trace;

use crate::playbook::CascadeStep;

/// Owner of a scheduled entry, used for bulk cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimerGroup {
    /// The 1 Hz clock increment.
    Clock,
    /// The kinematics/telemetry sampler.
    Sampler,
    /// Pending line appends for one log panel.
    Reveal(LogChannel),
    /// Delayed narrative presentation (highlight cards).
    Narrative,
    /// Playbook execution cascade steps.
    Cascade,
}

/// Work carried by a scheduled entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Task {
    /// Increment the clock and fire any event at the new timestamp.
    ClockTick,
    /// Advance positions and resample telemetry.
    SampleTick,
    /// Append one line to a log panel.
    RevealLine {
        /// Target panel.
        channel: LogChannel,
        /// Line text.
        line: String,
    },
    /// Hide a log panel.
    HideLog(LogChannel),
    /// Show the highlight card.
    ShowHighlight(String),
    /// Advance a playbook cascade.
    Cascade(CascadeStep),
}

/// A scheduled entry.
#[derive(Debug, Clone, PartialEq)]
struct Entry {
    /// Owning group.
    group: TimerGroup,
    /// Work to perform.
    task: Task,
}

/// A task popped from the queue, ready for dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct DueTask {
    /// Virtual millisecond the task was due at.
    pub due_ms: u64,
    /// Owning group.
    pub group: TimerGroup,
    /// Work to perform.
    pub task: Task,
}

/// Ordered queue of pending timer entries in virtual milliseconds.
#[derive(Debug, Default)]
pub struct TimerQueue {
    /// Pending entries keyed by `(due_ms, seq)`.
    entries: BTreeMap<(u64, u64), Entry>,
    /// Next insertion sequence number.
    next_seq: u64,
}

impl TimerQueue {
    /// Create an empty queue.
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_seq: 0,
        }
    }

    /// Schedule `task` at virtual millisecond `due_ms`.
    pub fn schedule(&mut self, due_ms: u64, group: TimerGroup, task: Task) {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        trace!(due_ms, seq, ?group, "timer scheduled");
        self.entries.insert((due_ms, seq), Entry { group, task });
    }

    /// Pop the earliest entry due at or before `until_ms`.
    pub fn pop_due(&mut self, until_ms: u64) -> Option<DueTask> {
        let (&(due_ms, _), _) = self.entries.first_key_value()?;
        if due_ms > until_ms {
            return None;
        }
        let ((due_ms, _), entry) = self.entries.pop_first()?;
        Some(DueTask {
            due_ms,
            group: entry.group,
            task: entry.task,
        })
    }

    /// Virtual millisecond of the earliest pending entry.
    pub fn next_due(&self) -> Option<u64> {
        self.entries.first_key_value().map(|(&(due, _), _)| due)
    }

    /// Cancel every entry owned by `group`. Returns how many were removed.
    pub fn cancel_group(&mut self, group: TimerGroup) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.group != group);
        before.saturating_sub(self.entries.len())
    }

    /// Cancel everything. Returns how many entries were removed.
    pub fn cancel_all(&mut self) -> usize {
        let removed = self.entries.len();
        self.entries.clear();
        removed
    }

    /// Number of pending entries owned by `group`.
    pub fn pending(&self, group: TimerGroup) -> usize {
        self.entries.values().filter(|e| e.group == group).count()
    }

    /// Total number of pending entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line(text: &str) -> Task {
        Task::RevealLine {
            channel: LogChannel::Diagnostics,
            line: text.to_owned(),
        }
    }

    #[test]
    fn pops_in_due_order_then_insertion_order() {
        let mut q = TimerQueue::new();
        q.schedule(300, TimerGroup::Sampler, Task::SampleTick);
        q.schedule(100, TimerGroup::Reveal(LogChannel::Diagnostics), line("a"));
        q.schedule(100, TimerGroup::Reveal(LogChannel::Diagnostics), line("b"));
        q.schedule(200, TimerGroup::Clock, Task::ClockTick);

        assert_eq!(q.next_due(), Some(100));
        assert_eq!(q.pop_due(1000).unwrap().task, line("a"));
        assert_eq!(q.pop_due(1000).unwrap().task, line("b"));
        assert_eq!(q.pop_due(1000).unwrap().task, Task::ClockTick);
        let last = q.pop_due(1000).unwrap();
        assert_eq!(last.due_ms, 300);
        assert_eq!(last.group, TimerGroup::Sampler);
        assert!(q.is_empty());
    }

    #[test]
    fn nothing_pops_before_due() {
        let mut q = TimerQueue::new();
        q.schedule(500, TimerGroup::Clock, Task::ClockTick);
        assert!(q.pop_due(499).is_none());
        assert!(q.pop_due(500).is_some());
    }

    #[test]
    fn cancel_group_leaves_other_groups() {
        let mut q = TimerQueue::new();
        q.schedule(10, TimerGroup::Reveal(LogChannel::Diagnostics), line("a"));
        q.schedule(20, TimerGroup::Reveal(LogChannel::Execution), line("b"));
        q.schedule(30, TimerGroup::Clock, Task::ClockTick);

        assert_eq!(q.cancel_group(TimerGroup::Reveal(LogChannel::Diagnostics)), 1);
        assert_eq!(q.pending(TimerGroup::Reveal(LogChannel::Execution)), 1);
        assert_eq!(q.pending(TimerGroup::Clock), 1);
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn cancel_all_empties_queue() {
        let mut q = TimerQueue::new();
        q.schedule(10, TimerGroup::Narrative, Task::ShowHighlight("x".to_owned()));
        q.schedule(20, TimerGroup::Cascade, Task::Cascade(CascadeStep::CompleteDemo));
        assert_eq!(q.cancel_all(), 2);
        assert!(q.is_empty());
        assert_eq!(q.next_due(), None);
    }
}
