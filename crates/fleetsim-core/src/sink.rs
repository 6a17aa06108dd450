//! Fire-and-forget approval notifications.
//!
//! After a successful confirmation the engine hands an [`ApprovalNotice`]
//! to its [`ApprovalSink`]. The engine never waits on the sink and never
//! learns whether delivery succeeded; persisting the approval is the
//! collaborator's job.

use fleetsim_types::PlaybookId;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::warn;

/// What the engine reports about an approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalNotice {
    /// Approved playbook.
    pub playbook_id: PlaybookId,
    /// Its display name.
    pub playbook_name: String,
    /// Its actions, in execution order.
    pub actions: Vec<String>,
    /// Simulated second at which the approval happened.
    pub elapsed_time: u64,
}

/// Receiver of approval notices.
///
/// Implementations must not block: the call happens inside the engine's
/// synchronous intent handling.
pub trait ApprovalSink: Send {
    /// Deliver one notice.
    fn playbook_approved(&mut self, notice: ApprovalNotice);
}

/// A sink that drops every notice.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpSink;

impl NoOpSink {
    /// Create a new no-op sink.
    pub const fn new() -> Self {
        Self
    }
}

impl ApprovalSink for NoOpSink {
    fn playbook_approved(&mut self, _notice: ApprovalNotice) {}
}

/// A sink that forwards notices over an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    /// Sending half; the consumer owns the receiver.
    tx: mpsc::UnboundedSender<ApprovalNotice>,
}

impl ChannelSink {
    /// Create a sink and the receiver its notices arrive on.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ApprovalNotice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ApprovalSink for ChannelSink {
    fn playbook_approved(&mut self, notice: ApprovalNotice) {
        if let Err(err) = self.tx.send(notice) {
            warn!(playbook = %err.0.playbook_id, "approval notice dropped, receiver closed");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn notice() -> ApprovalNotice {
        ApprovalNotice {
            playbook_id: PlaybookId::from("Playbook-04"),
            playbook_name: "Availability / Degrade Response".to_owned(),
            actions: vec!["Reduce payload transmission rate".to_owned()],
            elapsed_time: 16,
        }
    }

    #[test]
    fn channel_sink_forwards() {
        let (mut sink, mut rx) = ChannelSink::channel();
        sink.playbook_approved(notice());
        assert_eq!(rx.try_recv().unwrap(), notice());
    }

    #[test]
    fn closed_receiver_does_not_fail() {
        let (mut sink, rx) = ChannelSink::channel();
        drop(rx);
        sink.playbook_approved(notice());
    }

    #[test]
    fn noop_sink_accepts_anything() {
        let mut sink = NoOpSink::new();
        sink.playbook_approved(notice());
    }
}
