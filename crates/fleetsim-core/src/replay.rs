//! State replayer: the canonical data state for any elapsed time.
//!
//! [`derive_state`] recomputes, from the `t = 0` baseline, the link states,
//! threat estimate, and proposed playbooks that forward play would have
//! produced by `t`. It folds only the data effects of the events at or
//! before `t`; narrative presentation is never part of data state, so a
//! seek can skip or re-present it freely.
//!
//! Forward play applies exactly the same [`ScriptEffect`]s through
//! [`DataState::apply`], so the two paths cannot diverge.

use std::collections::BTreeMap;

use fleetsim_types::{LinkState, PlaybookId, SatelliteId, ThreatEstimate};

use crate::script::{ScenarioScript, ScriptEffect};

/// The authoritative, time-derived part of engine state.
///
/// Continuous fields (positions, telemetry) are deliberately absent.
#[derive(Debug, Clone, PartialEq)]
pub struct DataState {
    /// Link state per satellite.
    pub link_states: BTreeMap<SatelliteId, LinkState>,
    /// Threat estimate, once classified.
    pub threat: Option<ThreatEstimate>,
    /// Active playbook ids in proposal order.
    pub playbooks: Vec<PlaybookId>,
}

impl DataState {
    /// State at `t = 0`: every link OK, no threat, nothing proposed.
    pub fn baseline(script: &ScenarioScript) -> Self {
        Self {
            link_states: script
                .roster
                .iter()
                .map(|s| (s.id.clone(), LinkState::Ok))
                .collect(),
            threat: None,
            playbooks: Vec::new(),
        }
    }

    /// Apply one scripted effect.
    pub fn apply(&mut self, effect: &ScriptEffect) {
        match effect {
            ScriptEffect::SetLinkState { targets, state } => {
                for (id, link) in &mut self.link_states {
                    if targets.includes(id) {
                        *link = *state;
                    }
                }
            }
            ScriptEffect::ActivateThreat(estimate) => self.threat = Some(*estimate),
            ScriptEffect::ProposePlaybook(id) => {
                if !self.playbooks.contains(id) {
                    self.playbooks.push(id.clone());
                }
            }
        }
    }

    /// Link state of one satellite.
    pub fn link_state(&self, id: &SatelliteId) -> Option<LinkState> {
        self.link_states.get(id).copied()
    }
}

/// Derive the data state forward play reaches at elapsed time `t`.
pub fn derive_state(script: &ScenarioScript, t: u64) -> DataState {
    let mut state = DataState::baseline(script);
    for event in script.events.iter().filter(|e| e.at <= t) {
        for effect in &event.effects {
            state.apply(effect);
        }
    }
    state
}
