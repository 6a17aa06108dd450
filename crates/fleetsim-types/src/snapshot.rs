//! The observable engine snapshot.
//!
//! The rendering layer only ever reads an [`EngineSnapshot`]; it never holds
//! a reference into engine state. Every intent it sends produces a fresh
//! snapshot.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{DemoRunState, LogChannel};
use crate::ids::PlaybookId;
use crate::structs::{Phase, Playbook, Satellite, ThreatEstimate};

/// The revealed portion of one log panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct LogView {
    /// Which panel this is.
    pub channel: LogChannel,
    /// Panel title (may be empty).
    pub title: String,
    /// Lines revealed so far, oldest first.
    pub lines: Vec<String>,
    /// Whether the panel is shown.
    pub visible: bool,
}

/// Out-of-band relay overlays driven by executed playbooks.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RelayDisplay {
    /// Inter-satellite link tunnel diagram.
    pub isl_tunnel: bool,
    /// Command relay badges on the relay endpoints.
    pub command_relay: bool,
    /// Command flow animation along the relay chain.
    pub command_flow: bool,
    /// Mission data transfer animation.
    pub data_transfer: bool,
    /// Relay lines drawn between satellites on the map.
    pub isl_map_lines: bool,
}

/// An open approval confirmation dialog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ApprovalGate {
    /// Playbook awaiting confirmation.
    pub playbook_id: PlaybookId,
    /// Retryable validation message from the last failed attempt.
    pub error: Option<String>,
}

/// Everything the dashboard renders, captured at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct EngineSnapshot {
    /// Simulated seconds since start.
    pub elapsed_time: u64,
    /// Demo lifecycle state.
    pub run_state: DemoRunState,
    /// The fleet.
    pub satellites: Vec<Satellite>,
    /// Active threat estimate, if classified.
    pub threat_estimate: Option<ThreatEstimate>,
    /// Proposed and executing playbooks.
    pub active_playbooks: Vec<Playbook>,
    /// Log panels.
    pub visible_logs: Vec<LogView>,
    /// Whether the mission-continuity cascade has finished.
    pub demo_completed: bool,
    /// Open approval dialog, if any.
    pub approval_gate: Option<ApprovalGate>,
    /// Highlight card text, if shown.
    pub highlight: Option<String>,
    /// Relay overlays.
    pub relay: RelayDisplay,
    /// Whether impaired footprints should flash.
    pub footprint_alert: bool,
    /// The fixed timeline phases.
    pub phases: Vec<Phase>,
    /// Index into `phases` of the window containing `elapsed_time`.
    pub current_phase: usize,
}

impl EngineSnapshot {
    /// Look up a playbook in the active set.
    pub fn playbook(&self, id: &PlaybookId) -> Option<&Playbook> {
        self.active_playbooks.iter().find(|p| &p.id == id)
    }

    /// Look up the log panel for a channel.
    pub fn log(&self, channel: LogChannel) -> Option<&LogView> {
        self.visible_logs.iter().find(|l| l.channel == channel)
    }
}
