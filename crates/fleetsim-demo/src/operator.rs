//! Scripted operator that drives the approval workflow unattended.
//!
//! The operator watches published snapshots and, for every playbook the
//! engine proposes, waits the configured delay and then opens the approval
//! gate and confirms it with the configured phrase. It stops once the demo
//! reports completion or the snapshot channel closes.

use std::collections::BTreeSet;

use fleetsim_core::config::ScenarioConfig;
use fleetsim_core::operator::Intent;
use fleetsim_types::{EngineSnapshot, PlaybookId, PlaybookState};
use tokio::sync::{mpsc, watch};
use tokio::time::Duration;
use tracing::{debug, info};

use crate::error::DemoError;

/// Approves proposed playbooks on a fixed delay.
#[derive(Debug, Clone)]
pub struct ScriptedOperator {
    /// Operator name recorded with each approval.
    name: String,
    /// Confirmation phrase typed into the gate.
    phrase: String,
    /// Pause between seeing a proposal and approving it.
    approve_delay: Duration,
    /// Playbooks already approved, so each is confirmed once.
    handled: BTreeSet<PlaybookId>,
}

impl ScriptedOperator {
    /// Build an operator from the `operator` and `approval` config sections.
    pub fn new(config: &ScenarioConfig) -> Self {
        Self {
            name: config.operator.name.clone(),
            phrase: config.approval.phrase.clone(),
            approve_delay: Duration::from_millis(config.operator.approve_delay_ms),
            handled: BTreeSet::new(),
        }
    }

    /// Proposed playbooks in `snapshot` this operator has not acted on yet,
    /// in display order.
    pub fn pending(&self, snapshot: &EngineSnapshot) -> Vec<PlaybookId> {
        snapshot
            .active_playbooks
            .iter()
            .filter(|p| p.state == PlaybookState::Proposed && !self.handled.contains(&p.id))
            .map(|p| p.id.clone())
            .collect()
    }

    /// Watch `snapshots` and approve every proposal until the demo completes.
    ///
    /// Returns the number of playbooks approved.
    pub async fn run(
        mut self,
        mut snapshots: watch::Receiver<EngineSnapshot>,
        intents: mpsc::Sender<Intent>,
    ) -> Result<usize, DemoError> {
        let mut approved: usize = 0;
        info!(operator = %self.name, "Scripted operator watching for proposals");

        loop {
            let pending = {
                let snapshot = snapshots.borrow_and_update();
                if snapshot.demo_completed {
                    break;
                }
                self.pending(&snapshot)
            };

            for id in pending {
                tokio::time::sleep(self.approve_delay).await;
                self.approve(&intents, id).await?;
                approved = approved.saturating_add(1);
            }

            if snapshots.changed().await.is_err() {
                debug!("Snapshot channel closed, operator stopping");
                break;
            }
        }

        info!(operator = %self.name, approved, "Scripted operator finished");
        Ok(approved)
    }

    async fn approve(
        &mut self,
        intents: &mpsc::Sender<Intent>,
        id: PlaybookId,
    ) -> Result<(), DemoError> {
        info!(operator = %self.name, playbook = %id, "Approving playbook");
        self.handled.insert(id.clone());
        send(
            intents,
            Intent::RequestApproval {
                playbook_id: id.clone(),
            },
        )
        .await?;
        send(
            intents,
            Intent::Confirm {
                playbook_id: id,
                phrase: self.phrase.clone(),
            },
        )
        .await
    }
}

async fn send(intents: &mpsc::Sender<Intent>, intent: Intent) -> Result<(), DemoError> {
    let name = intent.name();
    intents.send(intent).await.map_err(|e| DemoError::ChannelClosed {
        message: format!("intent {name} not delivered: {e}"),
    })
}
