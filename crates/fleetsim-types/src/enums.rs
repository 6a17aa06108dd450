//! Enumeration types for the scenario engine.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Link state
// ---------------------------------------------------------------------------

/// Discrete health classification of a satellite's communication channel.
///
/// Exactly one link state holds for a satellite at any instant. Telemetry
/// sampling is a function of the link state; only scripted events and
/// executed playbooks change it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export, export_to = "bindings/")]
pub enum LinkState {
    /// Nominal primary link.
    Ok,
    /// Primary link jammed: heavy packet loss, collapsing SNR.
    Degraded,
    /// No link at all.
    Down,
    /// Traffic rerouted over the inter-satellite (out-of-band) relay.
    OutOfBand,
}

impl LinkState {
    /// Whether the satellite footprint should be flagged on the map.
    pub const fn is_impaired(self) -> bool {
        matches!(self, Self::Degraded | Self::Down)
    }
}

// ---------------------------------------------------------------------------
// Run state
// ---------------------------------------------------------------------------

/// Lifecycle of one scenario demo run.
///
/// Valid transitions: `Idle -> Running` (start), `Running <-> Paused`
/// (pause/resume), `Running -> Completed` (mission-continuity cascade),
/// `Completed -> Idle` (reset).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum DemoRunState {
    /// Not started, or reset.
    Idle,
    /// Clock and sampler advancing.
    Running,
    /// Clock and sampler halted; elapsed time retained.
    Paused,
    /// Terminal state reached through the mission-continuity playbook.
    Completed,
}

impl DemoRunState {
    /// Whether the clock and the sampler should be advancing.
    pub const fn is_advancing(self) -> bool {
        matches!(self, Self::Running)
    }
}

// ---------------------------------------------------------------------------
// Playbook state
// ---------------------------------------------------------------------------

/// Lifecycle state of a remediation playbook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export, export_to = "bindings/")]
pub enum PlaybookState {
    /// Emitted by a scripted event; awaiting operator approval.
    Proposed,
    /// Confirmed by the operator; action log playing out.
    Approved,
    /// Action log complete and post-execution effect applied.
    Executed,
}

// ---------------------------------------------------------------------------
// Log channels
// ---------------------------------------------------------------------------

/// Independent staggered-reveal log panels shown by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum LogChannel {
    /// Boot-style diagnostic narrative (degradation, troubleshooting, ...).
    Diagnostics,
    /// Playbook execution log.
    Execution,
}
