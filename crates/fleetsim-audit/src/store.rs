//! Bounded, append-only, hash-chained event store.

use std::collections::VecDeque;

use chrono::{DateTime, SecondsFormat, Utc};
use fleetsim_types::AuditEventId;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::AuditError;

/// `prev_hash` of the first event ever appended.
pub const GENESIS_HASH: &str = "GENESIS";

/// Content of an event before it is stamped and chained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Event kind, e.g. `PLAYBOOK_APPROVED`.
    pub event: String,
    /// Dataset the event belongs to.
    pub dataset: String,
    /// Engine that produced it.
    pub engine: String,
    /// Free-form structured details.
    pub payload: serde_json::Value,
}

/// A stamped, chained audit event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique, time-ordered identifier.
    pub id: AuditEventId,
    /// When the event was appended.
    pub recorded_at: DateTime<Utc>,
    /// Event kind.
    pub event: String,
    /// Dataset the event belongs to.
    pub dataset: String,
    /// Engine that produced it.
    pub engine: String,
    /// Structured details.
    pub payload: serde_json::Value,
    /// Hash of the preceding event, or [`GENESIS_HASH`].
    pub prev_hash: String,
    /// Hash over `prev_hash` and this event's contents.
    pub hash: String,
}

/// Compute the chained hash of one event.
///
/// # Errors
///
/// Returns [`AuditError::Serialize`] if the payload cannot be serialized.
pub fn chain_hash(
    prev_hash: &str,
    recorded_at: &DateTime<Utc>,
    record: &AuditRecord,
) -> Result<String, AuditError> {
    let payload = serde_json::to_string(&record.payload)?;
    let mut hasher = Sha256::new();
    hasher.update(prev_hash.as_bytes());
    hasher.update(
        recorded_at
            .to_rfc3339_opts(SecondsFormat::Nanos, true)
            .as_bytes(),
    );
    hasher.update(record.event.as_bytes());
    hasher.update(record.dataset.as_bytes());
    hasher.update(record.engine.as_bytes());
    hasher.update(payload.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

/// In-memory audit log. Oldest events are evicted once `capacity` is
/// reached; the chain of retained events stays verifiable.
#[derive(Debug)]
pub struct AuditStore {
    /// Retained events, oldest first.
    events: Mutex<VecDeque<AuditEvent>>,
    /// Maximum number of retained events.
    capacity: usize,
}

impl AuditStore {
    /// Default number of retained events.
    pub const DEFAULT_CAPACITY: usize = 200;

    /// Create an empty store.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::ZeroCapacity`] for a zero capacity.
    pub fn new(capacity: usize) -> Result<Self, AuditError> {
        if capacity == 0 {
            return Err(AuditError::ZeroCapacity);
        }
        Ok(Self {
            events: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        })
    }

    /// Stamp, chain, and append a record. Returns the stored event.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::Serialize`] if the payload cannot be hashed.
    pub async fn append(&self, record: AuditRecord) -> Result<AuditEvent, AuditError> {
        let mut events = self.events.lock().await;
        let prev_hash = events
            .back()
            .map_or_else(|| GENESIS_HASH.to_owned(), |e| e.hash.clone());
        let recorded_at = Utc::now();
        let hash = chain_hash(&prev_hash, &recorded_at, &record)?;

        let event = AuditEvent {
            id: AuditEventId::new(),
            recorded_at,
            event: record.event,
            dataset: record.dataset,
            engine: record.engine,
            payload: record.payload,
            prev_hash,
            hash,
        };

        if events.len() >= self.capacity {
            events.pop_front();
            debug!(capacity = self.capacity, "oldest audit event evicted");
        }
        events.push_back(event.clone());
        info!(event = %event.event, id = %event.id, hash = %event.hash, "audit event appended");
        Ok(event)
    }

    /// The most recent `limit` events, oldest first.
    pub async fn latest(&self, limit: usize) -> Vec<AuditEvent> {
        let events = self.events.lock().await;
        let skip = events.len().saturating_sub(limit);
        events.iter().skip(skip).cloned().collect()
    }

    /// Number of retained events.
    pub async fn len(&self) -> usize {
        self.events.lock().await.len()
    }

    /// Whether no events are retained.
    pub async fn is_empty(&self) -> bool {
        self.events.lock().await.is_empty()
    }

    /// Maximum number of retained events.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Recompute every retained hash and check each link.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::HashMismatch`] or [`AuditError::BrokenLink`]
    /// at the first inconsistent event.
    pub async fn verify(&self) -> Result<(), AuditError> {
        let events = self.events.lock().await;
        verify_chain(events.iter())
    }
}

/// Verify a sequence of events, oldest first.
///
/// The first event's predecessor may have been evicted, so only its own
/// hash is checked.
///
/// # Errors
///
/// Returns [`AuditError::HashMismatch`] or [`AuditError::BrokenLink`].
pub fn verify_chain<'a>(events: impl Iterator<Item = &'a AuditEvent>) -> Result<(), AuditError> {
    let mut previous: Option<&AuditEvent> = None;
    for (index, event) in events.enumerate() {
        if let Some(prev) = previous {
            if event.prev_hash != prev.hash {
                return Err(AuditError::BrokenLink { index });
            }
        }
        let record = AuditRecord {
            event: event.event.clone(),
            dataset: event.dataset.clone(),
            engine: event.engine.clone(),
            payload: event.payload.clone(),
        };
        if chain_hash(&event.prev_hash, &event.recorded_at, &record)? != event.hash {
            return Err(AuditError::HashMismatch { index });
        }
        previous = Some(event);
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn record(n: u64) -> AuditRecord {
        AuditRecord {
            event: "PLAYBOOK_APPROVED".to_owned(),
            dataset: "scenario-demo".to_owned(),
            engine: "fleetsim".to_owned(),
            payload: json!({ "n": n }),
        }
    }

    #[test]
    fn zero_capacity_is_rejected() {
        assert!(matches!(AuditStore::new(0), Err(AuditError::ZeroCapacity)));
    }

    #[tokio::test]
    async fn first_event_links_to_genesis() {
        let store = AuditStore::new(10).unwrap();
        let first = store.append(record(1)).await.unwrap();
        assert_eq!(first.prev_hash, GENESIS_HASH);
        assert_eq!(first.hash.len(), 64);
        let second = store.append(record(2)).await.unwrap();
        assert_eq!(second.prev_hash, first.hash);
        store.verify().await.unwrap();
    }

    #[tokio::test]
    async fn latest_returns_newest_in_order() {
        let store = AuditStore::new(10).unwrap();
        for n in 0..5 {
            store.append(record(n)).await.unwrap();
        }
        let latest = store.latest(2).await;
        assert_eq!(latest.len(), 2);
        assert_eq!(latest.first().unwrap().payload, json!({ "n": 3 }));
        assert_eq!(latest.last().unwrap().payload, json!({ "n": 4 }));
        assert_eq!(store.latest(50).await.len(), 5);
    }

    #[tokio::test]
    async fn capacity_evicts_oldest_and_chain_still_verifies() {
        let store = AuditStore::new(3).unwrap();
        for n in 0..7 {
            store.append(record(n)).await.unwrap();
        }
        assert_eq!(store.len().await, 3);
        let retained = store.latest(3).await;
        assert_ne!(retained.first().unwrap().prev_hash, GENESIS_HASH);
        store.verify().await.unwrap();
    }

    #[tokio::test]
    async fn tampering_is_detected() {
        let store = AuditStore::new(10).unwrap();
        for n in 0..3 {
            store.append(record(n)).await.unwrap();
        }
        let mut events = store.latest(3).await;
        if let Some(middle) = events.get_mut(1) {
            middle.payload = json!({ "n": 99 });
        }
        assert!(matches!(
            verify_chain(events.iter()),
            Err(AuditError::HashMismatch { index: 1 })
        ));

        let mut events = store.latest(3).await;
        if let Some(last) = events.get_mut(2) {
            last.prev_hash = GENESIS_HASH.to_owned();
        }
        assert!(matches!(
            verify_chain(events.iter()),
            Err(AuditError::BrokenLink { index: 2 })
        ));
    }

    #[test]
    fn hash_depends_on_every_field() {
        let at = Utc::now();
        let base = chain_hash(GENESIS_HASH, &at, &record(1)).unwrap();
        assert_eq!(base, chain_hash(GENESIS_HASH, &at, &record(1)).unwrap());
        assert_ne!(base, chain_hash("other", &at, &record(1)).unwrap());
        assert_ne!(base, chain_hash(GENESIS_HASH, &at, &record(2)).unwrap());
        let mut renamed = record(1);
        renamed.engine = "other".to_owned();
        assert_ne!(base, chain_hash(GENESIS_HASH, &at, &renamed).unwrap());
    }
}
