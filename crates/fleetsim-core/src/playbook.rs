//! Playbook workflow: proposal, confirmation gate, and execution planning.
//!
//! The workflow exclusively owns the in-flight playbooks. A playbook enters
//! in `PROPOSED`, moves to `APPROVED` only through [`PlaybookWorkflow::confirm`]
//! with the exact confirmation phrase, and is retired as `EXECUTED` once its
//! action log has played out. Timing of that execution is planned here
//! ([`ExecutionPlan`]) and scheduled by the engine.

use fleetsim_types::{ApprovalGate, Playbook, PlaybookId, PlaybookState};
use tracing::{info, warn};

use crate::script::{LogScript, PlaybookTemplate};

/// Errors raised by the approval workflow.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum WorkflowError {
    /// The playbook is not in the active set.
    #[error("unknown playbook {0}")]
    UnknownPlaybook(PlaybookId),

    /// A playbook with this id is already active.
    #[error("playbook {0} is already active")]
    DuplicateProposal(PlaybookId),

    /// The playbook has left the `PROPOSED` state.
    #[error("playbook {id} is {state:?}, not proposed")]
    NotProposed {
        /// Playbook id.
        id: PlaybookId,
        /// Its current state.
        state: PlaybookState,
    },

    /// No approval gate is open for this playbook.
    #[error("no approval gate open for playbook {0}")]
    GateNotOpen(PlaybookId),

    /// The typed phrase did not match. The gate stays open.
    #[error("confirmation phrase mismatch")]
    PhraseMismatch,
}

/// A step in a playbook's post-approval cascade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CascadeStep {
    /// The action log has played out: apply the post effect and retire.
    FinishExecution(PlaybookId),
    /// Mission data transfer begins.
    StartDataTransfer,
    /// The mission hand-off is complete; the demo ends.
    CompleteDemo,
}

/// Timing of one playbook execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionPlan {
    /// The execution log to reveal.
    pub log: LogScript,
    /// Delay from approval until [`CascadeStep::FinishExecution`].
    pub finish_after_ms: u64,
}

/// Build the execution log for an approved playbook.
///
/// One line announces execution, one line per action follows, then a
/// completion line. The post effect is due one interval after the
/// completion line.
pub fn execution_plan(playbook: &Playbook, interval_ms: u64) -> ExecutionPlan {
    let mut lines = Vec::with_capacity(playbook.actions.len().saturating_add(2));
    lines.push(format!("Executing {}...", playbook.id));
    lines.extend(playbook.actions.iter().map(|a| format!("> {a}")));
    lines.push(format!("\u{2713} {} executed successfully", playbook.id));

    let slots = u64::try_from(lines.len()).unwrap_or(u64::MAX);
    ExecutionPlan {
        log: LogScript {
            title: format!("Executing {}", playbook.name),
            lines,
            interval_ms,
        },
        finish_after_ms: slots.saturating_mul(interval_ms),
    }
}

/// Owner of the active playbooks and the approval gate.
#[derive(Debug, Clone)]
pub struct PlaybookWorkflow {
    /// The exact literal an operator must type to approve.
    phrase: String,
    /// Proposed and approved playbooks, in proposal order.
    active: Vec<Playbook>,
    /// Executed playbooks, in completion order.
    retired: Vec<Playbook>,
    /// The open confirmation dialog, if any.
    gate: Option<ApprovalGate>,
}

impl PlaybookWorkflow {
    /// Create an empty workflow requiring `phrase` for approval.
    pub fn new(phrase: impl Into<String>) -> Self {
        Self {
            phrase: phrase.into(),
            active: Vec::new(),
            retired: Vec::new(),
            gate: None,
        }
    }

    /// Add a playbook to the active set in `PROPOSED` state.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::DuplicateProposal`] if the id is already
    /// active.
    pub fn propose(&mut self, template: &PlaybookTemplate) -> Result<(), WorkflowError> {
        if self.find(&template.id).is_some() {
            return Err(WorkflowError::DuplicateProposal(template.id.clone()));
        }
        info!(playbook = %template.id, name = %template.name, "playbook proposed");
        self.active.push(Playbook {
            id: template.id.clone(),
            name: template.name.clone(),
            state: PlaybookState::Proposed,
            actions: template.actions.clone(),
        });
        Ok(())
    }

    /// Open the confirmation gate for a proposed playbook. Replaces any
    /// other open gate. Never mutates playbook state.
    pub fn request_approval(&mut self, id: &PlaybookId) -> Result<(), WorkflowError> {
        self.require_proposed(id)?;
        self.gate = Some(ApprovalGate {
            playbook_id: id.clone(),
            error: None,
        });
        Ok(())
    }

    /// Submit the confirmation phrase.
    ///
    /// On an exact match the playbook moves to `APPROVED`, the gate
    /// closes, and a copy of the approved playbook is returned. On a
    /// mismatch the gate stays open with a retryable message and no
    /// playbook is touched.
    pub fn confirm(&mut self, id: &PlaybookId, phrase: &str) -> Result<Playbook, WorkflowError> {
        let gate = self
            .gate
            .as_mut()
            .filter(|g| &g.playbook_id == id)
            .ok_or_else(|| WorkflowError::GateNotOpen(id.clone()))?;

        if phrase != self.phrase {
            warn!(playbook = %id, "confirmation phrase mismatch");
            gate.error = Some(format!(
                "Please type exactly \"{}\" to confirm.",
                self.phrase
            ));
            return Err(WorkflowError::PhraseMismatch);
        }

        self.require_proposed(id)?;
        self.gate = None;
        let playbook = self
            .active
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or_else(|| WorkflowError::UnknownPlaybook(id.clone()))?;
        playbook.state = PlaybookState::Approved;
        info!(playbook = %id, "playbook approved");
        Ok(playbook.clone())
    }

    /// Close the gate for `id` without approving.
    pub fn cancel(&mut self, id: &PlaybookId) -> Result<(), WorkflowError> {
        match &self.gate {
            Some(gate) if &gate.playbook_id == id => {
                self.gate = None;
                Ok(())
            }
            _ => Err(WorkflowError::GateNotOpen(id.clone())),
        }
    }

    /// Mark an approved playbook `EXECUTED` and move it out of the active
    /// set. Returns the retired playbook.
    pub fn retire(&mut self, id: &PlaybookId) -> Result<Playbook, WorkflowError> {
        let index = self
            .active
            .iter()
            .position(|p| &p.id == id)
            .ok_or_else(|| WorkflowError::UnknownPlaybook(id.clone()))?;
        let mut playbook = self.active.remove(index);
        playbook.state = PlaybookState::Executed;
        info!(playbook = %id, "playbook executed");
        self.retired.push(playbook.clone());
        Ok(playbook)
    }

    /// Drop every playbook and close the gate.
    pub fn reset(&mut self) {
        self.active.clear();
        self.retired.clear();
        self.gate = None;
    }

    /// Proposed and approved playbooks.
    pub fn active(&self) -> &[Playbook] {
        &self.active
    }

    /// Executed playbooks.
    pub fn retired(&self) -> &[Playbook] {
        &self.retired
    }

    /// The open gate, if any.
    pub const fn gate(&self) -> Option<&ApprovalGate> {
        self.gate.as_ref()
    }

    /// The required confirmation phrase.
    pub fn phrase(&self) -> &str {
        &self.phrase
    }

    /// Look up an active playbook.
    pub fn find(&self, id: &PlaybookId) -> Option<&Playbook> {
        self.active.iter().find(|p| &p.id == id)
    }

    fn require_proposed(&self, id: &PlaybookId) -> Result<(), WorkflowError> {
        let playbook = self
            .find(id)
            .ok_or_else(|| WorkflowError::UnknownPlaybook(id.clone()))?;
        if playbook.state != PlaybookState::Proposed {
            return Err(WorkflowError::NotProposed {
                id: id.clone(),
                state: playbook.state,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::script::{AVAILABILITY_PLAYBOOK, CONTINUITY_PLAYBOOK, ScenarioScript};

    const PHRASE: &str = "Action Approve";

    fn workflow_with(ids: &[&str]) -> PlaybookWorkflow {
        let script = ScenarioScript::flock_jamming();
        let mut wf = PlaybookWorkflow::new(PHRASE);
        for id in ids {
            wf.propose(script.playbook(&PlaybookId::from(*id)).unwrap())
                .unwrap();
        }
        wf
    }

    fn id04() -> PlaybookId {
        PlaybookId::from(AVAILABILITY_PLAYBOOK)
    }

    #[test]
    fn propose_rejects_duplicates() {
        let script = ScenarioScript::flock_jamming();
        let mut wf = workflow_with(&[AVAILABILITY_PLAYBOOK]);
        let err = wf.propose(script.playbook(&id04()).unwrap()).unwrap_err();
        assert_eq!(err, WorkflowError::DuplicateProposal(id04()));
        assert_eq!(wf.active().len(), 1);
    }

    #[test]
    fn request_approval_opens_gate_without_mutation() {
        let mut wf = workflow_with(&[AVAILABILITY_PLAYBOOK]);
        wf.request_approval(&id04()).unwrap();
        assert_eq!(wf.gate().unwrap().playbook_id, id04());
        assert_eq!(wf.find(&id04()).unwrap().state, PlaybookState::Proposed);
    }

    #[test]
    fn exact_phrase_approves() {
        let mut wf = workflow_with(&[AVAILABILITY_PLAYBOOK]);
        wf.request_approval(&id04()).unwrap();
        let approved = wf.confirm(&id04(), PHRASE).unwrap();
        assert_eq!(approved.state, PlaybookState::Approved);
        assert!(wf.gate().is_none());
    }

    #[test]
    fn near_miss_phrases_leave_gate_open() {
        let mut wf = workflow_with(&[AVAILABILITY_PLAYBOOK]);
        wf.request_approval(&id04()).unwrap();
        for phrase in ["action approve", "Action Approved", "", " Action Approve"] {
            assert_eq!(wf.confirm(&id04(), phrase), Err(WorkflowError::PhraseMismatch));
            assert_eq!(wf.find(&id04()).unwrap().state, PlaybookState::Proposed);
        }
        let gate = wf.gate().unwrap();
        assert_eq!(
            gate.error.as_deref(),
            Some("Please type exactly \"Action Approve\" to confirm.")
        );
        assert!(wf.confirm(&id04(), PHRASE).is_ok());
    }

    #[test]
    fn confirm_requires_matching_gate() {
        let mut wf = workflow_with(&[AVAILABILITY_PLAYBOOK, CONTINUITY_PLAYBOOK]);
        assert_eq!(
            wf.confirm(&id04(), PHRASE),
            Err(WorkflowError::GateNotOpen(id04()))
        );
        wf.request_approval(&PlaybookId::from(CONTINUITY_PLAYBOOK))
            .unwrap();
        assert!(wf.confirm(&id04(), PHRASE).is_err());
    }

    #[test]
    fn cancel_closes_gate_only() {
        let mut wf = workflow_with(&[AVAILABILITY_PLAYBOOK]);
        wf.request_approval(&id04()).unwrap();
        wf.cancel(&id04()).unwrap();
        assert!(wf.gate().is_none());
        assert_eq!(wf.find(&id04()).unwrap().state, PlaybookState::Proposed);
        assert!(wf.cancel(&id04()).is_err());
    }

    #[test]
    fn approved_playbooks_cannot_be_reapproved() {
        let mut wf = workflow_with(&[AVAILABILITY_PLAYBOOK]);
        wf.request_approval(&id04()).unwrap();
        wf.confirm(&id04(), PHRASE).unwrap();
        assert!(matches!(
            wf.request_approval(&id04()),
            Err(WorkflowError::NotProposed { .. })
        ));
    }

    #[test]
    fn retire_moves_to_executed() {
        let mut wf = workflow_with(&[AVAILABILITY_PLAYBOOK]);
        wf.request_approval(&id04()).unwrap();
        wf.confirm(&id04(), PHRASE).unwrap();
        let done = wf.retire(&id04()).unwrap();
        assert_eq!(done.state, PlaybookState::Executed);
        assert!(wf.active().is_empty());
        assert_eq!(wf.retired().len(), 1);
    }

    #[test]
    fn execution_plan_has_one_line_per_action() {
        let wf = workflow_with(&[AVAILABILITY_PLAYBOOK]);
        let plan = execution_plan(wf.find(&id04()).unwrap(), 600);
        assert_eq!(plan.log.lines.len(), 6);
        assert_eq!(plan.log.lines.first().unwrap(), "Executing Playbook-04...");
        assert_eq!(
            plan.log.lines.get(1).unwrap(),
            "> Activate out-of-band relay (ISL tunnel)"
        );
        assert_eq!(
            plan.log.lines.last().unwrap(),
            "\u{2713} Playbook-04 executed successfully"
        );
        assert_eq!(plan.finish_after_ms, 3600);
    }
}
