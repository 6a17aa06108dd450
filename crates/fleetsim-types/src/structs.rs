//! Core entity structs: satellites, telemetry, threat estimates, playbooks,
//! and timeline phases.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{LinkState, PlaybookState};
use crate::ids::{PlaybookId, SatelliteId};

/// A geographic position in floating degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GeoPoint {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
}

/// Constant ground-track velocity, in degrees per sampler tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Velocity {
    /// Latitude rate.
    pub lat: f64,
    /// Longitude rate.
    pub lon: f64,
}

/// Sampled link telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Telemetry {
    /// Signal-to-noise ratio in dB.
    pub snr_db: f64,
    /// Packet loss percentage in `[0, 100]`.
    pub packet_loss_pct: f64,
}

/// One satellite of the fleet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Satellite {
    /// Satellite identity.
    pub id: SatelliteId,
    /// Current sub-satellite point. Only ever advanced by velocity.
    pub position: GeoPoint,
    /// Orbit altitude in kilometres (display only).
    pub altitude_km: f64,
    /// Constant velocity vector.
    pub velocity: Velocity,
    /// Current discrete link state.
    pub link_state: LinkState,
    /// Latest sampled telemetry.
    pub telemetry: Telemetry,
}

/// A circular zone on the ground.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GeoZone {
    /// Centre latitude in degrees.
    pub lat: f64,
    /// Centre longitude in degrees.
    pub lon: f64,
    /// Radius in metres.
    pub radius_meters: f64,
}

/// Inferred interference source and its impact radius.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ThreatEstimate {
    /// Area where links are affected.
    pub impact_zone: GeoZone,
    /// Estimated location of the emitter, when triangulated.
    pub source_zone: Option<GeoZone>,
    /// Classification confidence in `[0, 1]`.
    pub confidence: f64,
}

/// A named, ordered set of remediation actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Playbook {
    /// Playbook identity.
    pub id: PlaybookId,
    /// Human-readable name.
    pub name: String,
    /// Lifecycle state.
    pub state: PlaybookState,
    /// Ordered remediation actions.
    pub actions: Vec<String>,
}

/// A named checkpoint on the simulation timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Phase {
    /// Elapsed seconds at which the phase begins.
    pub timestamp: u64,
    /// Display label.
    pub label: String,
}

impl Phase {
    /// Create a phase marker.
    pub fn new(timestamp: u64, label: impl Into<String>) -> Self {
        Self {
            timestamp,
            label: label.into(),
        }
    }
}
