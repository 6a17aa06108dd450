//! Hash-chained audit trail of operator approvals.
//!
//! The scenario engine reports every successful playbook confirmation as a
//! fire-and-forget [`ApprovalNotice`]. This crate is the collaborator on
//! the other end: it appends each notice to an in-memory, bounded,
//! append-only [`AuditStore`] whose entries are chained with SHA-256.
//!
//! # Modules
//!
//! - [`store`] -- [`AuditStore`] and [`AuditEvent`]: append, query, verify.
//! - [`recorder`] -- [`record_approvals`], the async consumer that turns
//!   approval notices into `PLAYBOOK_APPROVED` audit events.
//!
//! # Chain
//!
//! ```text
//! hash_n = sha256(prev_hash || recorded_at || event || dataset || engine || payload)
//! prev_hash_0 = "GENESIS"
//! ```
//!
//! [`ApprovalNotice`]: fleetsim_core::sink::ApprovalNotice
//! [`AuditStore`]: store::AuditStore
//! [`AuditEvent`]: store::AuditEvent
//! [`record_approvals`]: recorder::record_approvals

pub mod recorder;
pub mod store;

pub use recorder::record_approvals;
pub use store::{AuditEvent, AuditRecord, AuditStore, GENESIS_HASH};

/// Errors raised by the audit trail.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    /// The store must hold at least one event.
    #[error("audit store capacity must be greater than zero")]
    ZeroCapacity,

    /// A payload could not be serialized for hashing.
    #[error("failed to serialize audit payload: {source}")]
    Serialize {
        /// The underlying serialization error.
        #[from]
        source: serde_json::Error,
    },

    /// An event's stored hash does not match its contents.
    #[error("audit event {index} hash mismatch")]
    HashMismatch {
        /// Position of the event among retained events.
        index: usize,
    },

    /// An event does not link to its predecessor.
    #[error("audit event {index} does not link to its predecessor")]
    BrokenLink {
        /// Position of the event among retained events.
        index: usize,
    },
}
