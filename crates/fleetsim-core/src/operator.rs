//! Operator intents.
//!
//! Every user action on the dashboard reaches the engine as an [`Intent`].
//! Intents are serializable so they can cross a channel or a socket
//! unchanged; the engine applies them one at a time and publishes a fresh
//! snapshot after each.

use fleetsim_types::PlaybookId;
use serde::{Deserialize, Serialize};

/// Where a seek should land.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SeekTarget {
    /// The timestamp of the phase at this index.
    Phase(usize),
    /// An arbitrary elapsed second.
    Timestamp(u64),
}

/// An operator action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Intent {
    /// Reset everything and start running from `t = 0`.
    Start,
    /// Suspend the clock and the sampler.
    Pause,
    /// Re-arm the clock and the sampler.
    Resume,
    /// Pause when running, resume when paused.
    TogglePause,
    /// Jump to a phase or timestamp.
    Seek {
        /// Destination.
        target: SeekTarget,
    },
    /// Jump to the next phase.
    Next,
    /// Jump to the previous phase.
    Previous,
    /// Return to the initial idle state.
    Reset,
    /// Open the approval gate for a proposed playbook.
    RequestApproval {
        /// Playbook to approve.
        playbook_id: PlaybookId,
    },
    /// Submit the confirmation phrase for the open gate.
    Confirm {
        /// Playbook being confirmed.
        playbook_id: PlaybookId,
        /// Phrase typed by the operator.
        phrase: String,
    },
    /// Close the approval gate without approving.
    Cancel {
        /// Playbook whose gate is open.
        playbook_id: PlaybookId,
    },
}

impl Intent {
    /// Short name used in logs and error messages.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::TogglePause => "toggle_pause",
            Self::Seek { .. } => "seek",
            Self::Next => "next",
            Self::Previous => "previous",
            Self::Reset => "reset",
            Self::RequestApproval { .. } => "request_approval",
            Self::Confirm { .. } => "confirm",
            Self::Cancel { .. } => "cancel",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn intents_use_snake_case_tags() {
        let json = serde_json::to_string(&Intent::RequestApproval {
            playbook_id: PlaybookId::from("Playbook-04"),
        })
        .unwrap();
        assert_eq!(json, r#"{"type":"request_approval","playbook_id":"Playbook-04"}"#);
    }

    #[test]
    fn seek_parses_from_json() {
        let intent: Intent =
            serde_json::from_str(r#"{"type":"seek","target":{"kind":"phase","value":4}}"#).unwrap();
        assert_eq!(
            intent,
            Intent::Seek {
                target: SeekTarget::Phase(4)
            }
        );
    }

    #[test]
    fn names_match_tags() {
        assert_eq!(Intent::TogglePause.name(), "toggle_pause");
        assert_eq!(
            Intent::Seek {
                target: SeekTarget::Timestamp(3)
            }
            .name(),
            "seek"
        );
    }
}
