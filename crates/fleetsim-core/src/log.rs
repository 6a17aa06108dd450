//! Staggered-reveal log panels.
//!
//! Each [`LogChannel`] has one panel. A reveal cancels every pending append
//! for that panel, clears it, and schedules one append per line at
//! `i * interval` from now. Pending appends live in the shared
//! [`TimerQueue`] under [`TimerGroup::Reveal`], so resetting the engine
//! drops them with everything else.

use fleetsim_types::{LogChannel, LogView};

use crate::script::LogScript;
use crate::timers::{Task, TimerGroup, TimerQueue};

/// One panel's revealed content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Panel {
    /// Current title.
    title: String,
    /// Lines revealed so far.
    lines: Vec<String>,
    /// Whether the panel is shown.
    visible: bool,
}

/// The diagnostics and execution log panels.
#[derive(Debug, Clone, Default)]
pub struct LogPresenter {
    /// Diagnostics panel.
    diagnostics: Panel,
    /// Playbook execution panel.
    execution: Panel,
}

impl LogPresenter {
    /// Create two empty, hidden panels.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start revealing `script` on `channel` at virtual time `now_ms`.
    pub fn reveal(
        &mut self,
        timers: &mut TimerQueue,
        now_ms: u64,
        channel: LogChannel,
        script: &LogScript,
    ) {
        timers.cancel_group(TimerGroup::Reveal(channel));
        let panel = self.panel_mut(channel);
        panel.title.clone_from(&script.title);
        panel.lines.clear();
        panel.visible = true;

        let mut due = now_ms;
        for line in &script.lines {
            timers.schedule(
                due,
                TimerGroup::Reveal(channel),
                Task::RevealLine {
                    channel,
                    line: line.clone(),
                },
            );
            due = due.saturating_add(script.interval_ms);
        }
    }

    /// Append a revealed line. Called when a scheduled append fires.
    pub fn append(&mut self, channel: LogChannel, line: String) {
        self.panel_mut(channel).lines.push(line);
    }

    /// Abort pending appends for `channel`, keeping revealed lines.
    pub fn cancel(timers: &mut TimerQueue, channel: LogChannel) -> usize {
        timers.cancel_group(TimerGroup::Reveal(channel))
    }

    /// Hide a panel. Pending appends are left alone.
    pub fn hide(&mut self, channel: LogChannel) {
        self.panel_mut(channel).visible = false;
    }

    /// Abort all pending appends and clear both panels.
    pub fn clear_all(&mut self, timers: &mut TimerQueue) {
        for channel in [LogChannel::Diagnostics, LogChannel::Execution] {
            Self::cancel(timers, channel);
        }
        self.diagnostics = Panel::default();
        self.execution = Panel::default();
    }

    /// Snapshot views of both panels.
    pub fn views(&self) -> Vec<LogView> {
        [
            (LogChannel::Diagnostics, &self.diagnostics),
            (LogChannel::Execution, &self.execution),
        ]
        .into_iter()
        .map(|(channel, panel)| LogView {
            channel,
            title: panel.title.clone(),
            lines: panel.lines.clone(),
            visible: panel.visible,
        })
        .collect()
    }

    /// Revealed lines of one panel.
    pub fn lines(&self, channel: LogChannel) -> &[String] {
        &self.panel(channel).lines
    }

    /// Whether a panel is shown.
    pub fn is_visible(&self, channel: LogChannel) -> bool {
        self.panel(channel).visible
    }

    const fn panel(&self, channel: LogChannel) -> &Panel {
        match channel {
            LogChannel::Diagnostics => &self.diagnostics,
            LogChannel::Execution => &self.execution,
        }
    }

    const fn panel_mut(&mut self, channel: LogChannel) -> &mut Panel {
        match channel {
            LogChannel::Diagnostics => &mut self.diagnostics,
            LogChannel::Execution => &mut self.execution,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn script(lines: &[&str], interval_ms: u64) -> LogScript {
        LogScript {
            title: "Test".to_owned(),
            lines: lines.iter().map(|l| (*l).to_owned()).collect(),
            interval_ms,
        }
    }

    /// Drain due reveal tasks into the presenter, as the engine would.
    fn run_until(presenter: &mut LogPresenter, timers: &mut TimerQueue, until_ms: u64) {
        while let Some(due) = timers.pop_due(until_ms) {
            if let Task::RevealLine { channel, line } = due.task {
                presenter.append(channel, line);
            }
        }
    }

    #[test]
    fn lines_appear_at_interval_offsets() {
        let mut presenter = LogPresenter::new();
        let mut timers = TimerQueue::new();
        presenter.reveal(
            &mut timers,
            1000,
            LogChannel::Diagnostics,
            &script(&["a", "b", "c"], 800),
        );

        run_until(&mut presenter, &mut timers, 1000);
        assert_eq!(presenter.lines(LogChannel::Diagnostics), ["a"]);
        run_until(&mut presenter, &mut timers, 1799);
        assert_eq!(presenter.lines(LogChannel::Diagnostics).len(), 1);
        run_until(&mut presenter, &mut timers, 2600);
        assert_eq!(presenter.lines(LogChannel::Diagnostics), ["a", "b", "c"]);
        assert!(presenter.is_visible(LogChannel::Diagnostics));
    }

    #[test]
    fn new_reveal_cancels_prior_one() {
        let mut presenter = LogPresenter::new();
        let mut timers = TimerQueue::new();
        presenter.reveal(
            &mut timers,
            0,
            LogChannel::Diagnostics,
            &script(&["a", "b", "c"], 100),
        );
        run_until(&mut presenter, &mut timers, 0);
        presenter.reveal(
            &mut timers,
            50,
            LogChannel::Diagnostics,
            &script(&["x"], 100),
        );
        run_until(&mut presenter, &mut timers, 10_000);
        assert_eq!(presenter.lines(LogChannel::Diagnostics), ["x"]);
    }

    #[test]
    fn cancel_keeps_revealed_lines() {
        let mut presenter = LogPresenter::new();
        let mut timers = TimerQueue::new();
        presenter.reveal(
            &mut timers,
            0,
            LogChannel::Execution,
            &script(&["a", "b"], 100),
        );
        run_until(&mut presenter, &mut timers, 0);
        assert_eq!(LogPresenter::cancel(&mut timers, LogChannel::Execution), 1);
        run_until(&mut presenter, &mut timers, 10_000);
        assert_eq!(presenter.lines(LogChannel::Execution), ["a"]);
    }

    #[test]
    fn channels_are_independent() {
        let mut presenter = LogPresenter::new();
        let mut timers = TimerQueue::new();
        presenter.reveal(
            &mut timers,
            0,
            LogChannel::Diagnostics,
            &script(&["d1", "d2"], 100),
        );
        presenter.reveal(&mut timers, 0, LogChannel::Execution, &script(&["e1"], 100));
        run_until(&mut presenter, &mut timers, 100);
        assert_eq!(presenter.lines(LogChannel::Diagnostics), ["d1", "d2"]);
        assert_eq!(presenter.lines(LogChannel::Execution), ["e1"]);
    }

    #[test]
    fn clear_all_drops_everything() {
        let mut presenter = LogPresenter::new();
        let mut timers = TimerQueue::new();
        presenter.reveal(
            &mut timers,
            0,
            LogChannel::Diagnostics,
            &script(&["a", "b"], 100),
        );
        run_until(&mut presenter, &mut timers, 0);
        presenter.clear_all(&mut timers);
        assert!(timers.is_empty());
        let views = presenter.views();
        assert_eq!(views.len(), 2);
        assert!(views.iter().all(|v| v.lines.is_empty() && !v.visible));
    }
}
