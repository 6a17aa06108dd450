//! Timeline phases and coarse navigation.
//!
//! The timeline is an ordered, immutable list of [`Phase`] markers with
//! strictly increasing timestamps. A phase's window runs from its own
//! timestamp up to (excluding) the next phase's timestamp; the last phase's
//! window is unbounded.

use fleetsim_types::Phase;

use crate::operator::SeekTarget;

/// Latest elapsed second a timestamp seek may target (one simulated day).
///
/// Keeps the clock far below the point where a tick could overflow.
pub const MAX_SEEK_SECONDS: u64 = 86_400;

/// Errors that can occur when building or navigating the timeline.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TimelineError {
    /// The timeline must contain at least one phase.
    #[error("timeline has no phases")]
    Empty,

    /// Phase timestamps must strictly increase.
    #[error("phase {index} at t={timestamp} does not follow t={previous}")]
    NotIncreasing {
        /// Index of the offending phase.
        index: usize,
        /// Timestamp of the preceding phase.
        previous: u64,
        /// Timestamp of the offending phase.
        timestamp: u64,
    },

    /// A seek referenced a phase index that does not exist.
    #[error("unknown phase index {index} (timeline has {len} phases)")]
    UnknownPhase {
        /// The requested index.
        index: usize,
        /// Number of phases.
        len: usize,
    },

    /// A seek timestamp lies past [`MAX_SEEK_SECONDS`].
    #[error("seek target t={timestamp} is beyond t={limit}")]
    BeyondHorizon {
        /// The requested timestamp.
        timestamp: u64,
        /// The latest accepted timestamp.
        limit: u64,
    },
}

/// The fixed sequence of phase markers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeline {
    /// Phases in timestamp order.
    phases: Vec<Phase>,
}

impl Timeline {
    /// Build a timeline, validating strictly increasing timestamps.
    ///
    /// # Errors
    ///
    /// Returns [`TimelineError::Empty`] for an empty list and
    /// [`TimelineError::NotIncreasing`] for out-of-order or duplicate
    /// timestamps.
    pub fn new(phases: Vec<Phase>) -> Result<Self, TimelineError> {
        if phases.is_empty() {
            return Err(TimelineError::Empty);
        }
        for (index, pair) in phases.windows(2).enumerate() {
            if let [prev, next] = pair {
                if next.timestamp <= prev.timestamp {
                    return Err(TimelineError::NotIncreasing {
                        index: index.saturating_add(1),
                        previous: prev.timestamp,
                        timestamp: next.timestamp,
                    });
                }
            }
        }
        Ok(Self { phases })
    }

    /// Return all phases.
    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    /// Return the number of phases.
    pub const fn len(&self) -> usize {
        self.phases.len()
    }

    /// Always `false`: construction rejects empty timelines.
    pub const fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    /// Index of the phase whose window contains `elapsed`.
    ///
    /// Times before the first phase resolve to the first phase.
    pub fn index_at(&self, elapsed: u64) -> usize {
        self.phases
            .iter()
            .rposition(|p| p.timestamp <= elapsed)
            .unwrap_or(0)
    }

    /// Timestamp of the phase after the one containing `elapsed`, or
    /// `None` at the last phase.
    pub fn next_target(&self, elapsed: u64) -> Option<u64> {
        let index = self.index_at(elapsed).checked_add(1)?;
        self.phases.get(index).map(|p| p.timestamp)
    }

    /// Timestamp of the phase before the one containing `elapsed`, or
    /// `None` at the first phase.
    pub fn previous_target(&self, elapsed: u64) -> Option<u64> {
        let index = self.index_at(elapsed).checked_sub(1)?;
        self.phases.get(index).map(|p| p.timestamp)
    }

    /// Resolve a seek target to an elapsed timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`TimelineError::UnknownPhase`] for an out-of-range phase
    /// index and [`TimelineError::BeyondHorizon`] for a timestamp past
    /// [`MAX_SEEK_SECONDS`].
    pub fn resolve(&self, target: SeekTarget) -> Result<u64, TimelineError> {
        match target {
            SeekTarget::Timestamp(timestamp) if timestamp > MAX_SEEK_SECONDS => {
                Err(TimelineError::BeyondHorizon {
                    timestamp,
                    limit: MAX_SEEK_SECONDS,
                })
            }
            SeekTarget::Timestamp(timestamp) => Ok(timestamp),
            SeekTarget::Phase(index) => self
                .phases
                .get(index)
                .map(|p| p.timestamp)
                .ok_or(TimelineError::UnknownPhase {
                    index,
                    len: self.phases.len(),
                }),
        }
    }
}
