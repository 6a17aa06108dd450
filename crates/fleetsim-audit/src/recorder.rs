//! Consumer that records approval notices in the audit store.

use std::sync::Arc;

use fleetsim_core::sink::ApprovalNotice;
use serde_json::json;
use tokio::sync::mpsc;
use tracing::info;

use crate::AuditError;
use crate::store::{AuditRecord, AuditStore};

/// Event kind recorded for each approval.
pub const PLAYBOOK_APPROVED: &str = "PLAYBOOK_APPROVED";

/// Dataset name stamped on scenario approvals.
pub const SCENARIO_DATASET: &str = "scenario-demo";

/// Engine name stamped on scenario approvals.
pub const SCENARIO_ENGINE: &str = "fleetsim";

/// Build the audit record for one approval.
pub fn approval_record(notice: &ApprovalNotice, operator: &str) -> AuditRecord {
    AuditRecord {
        event: PLAYBOOK_APPROVED.to_owned(),
        dataset: SCENARIO_DATASET.to_owned(),
        engine: SCENARIO_ENGINE.to_owned(),
        payload: json!({
            "playbook_id": notice.playbook_id,
            "playbook_name": notice.playbook_name,
            "actions": notice.actions,
            "elapsed_time": notice.elapsed_time,
            "operator": operator,
        }),
    }
}

/// Append a `PLAYBOOK_APPROVED` event for every notice until the sending
/// side closes. Returns how many events were recorded.
///
/// # Errors
///
/// Returns [`AuditError`] if an event cannot be appended.
pub async fn record_approvals(
    store: Arc<AuditStore>,
    mut notices: mpsc::UnboundedReceiver<ApprovalNotice>,
    operator: String,
) -> Result<usize, AuditError> {
    let mut recorded: usize = 0;
    while let Some(notice) = notices.recv().await {
        let event = store.append(approval_record(&notice, &operator)).await?;
        recorded = recorded.saturating_add(1);
        info!(
            playbook = %notice.playbook_id,
            elapsed = notice.elapsed_time,
            hash = %event.hash,
            "Approval recorded"
        );
    }
    info!(recorded, "Approval recorder stopped");
    Ok(recorded)
}
