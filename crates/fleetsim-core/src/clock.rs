//! Scenario clock.
//!
//! The clock is the single source of truth for elapsed simulated seconds.
//! It never advances on its own: the engine increments it once per clock
//! timer firing while the demo is running, and sets it directly on seek,
//! reset, and completion.

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ClockError {
    /// Elapsed counter would overflow.
    #[error("elapsed time overflow: cannot advance beyond u64::MAX")]
    Overflow,
}

/// Elapsed simulated seconds since the start of the scenario.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScenarioClock {
    /// Current elapsed seconds.
    elapsed: u64,
}

impl ScenarioClock {
    /// Create a clock at `t = 0`.
    pub const fn new() -> Self {
        Self { elapsed: 0 }
    }

    /// Advance by exactly one second. Returns the new elapsed time.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::Overflow`] if the counter would exceed
    /// `u64::MAX`.
    pub fn advance(&mut self) -> Result<u64, ClockError> {
        self.elapsed = self.elapsed.checked_add(1).ok_or(ClockError::Overflow)?;
        Ok(self.elapsed)
    }

    /// Return the current elapsed seconds.
    pub const fn elapsed(&self) -> u64 {
        self.elapsed
    }

    /// Jump to an arbitrary elapsed time (seek).
    pub const fn set(&mut self, elapsed: u64) {
        self.elapsed = elapsed;
    }

    /// Return to `t = 0`.
    pub const fn reset(&mut self) {
        self.elapsed = 0;
    }
}

/// Format elapsed seconds as `MM:SS` for logs and the dashboard header.
pub fn format_elapsed(seconds: u64) -> String {
    let mins = seconds.checked_div(60).unwrap_or(0);
    let secs = seconds.checked_rem(60).unwrap_or(0);
    format!("{mins:02}:{secs:02}")
}
