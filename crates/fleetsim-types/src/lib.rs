//! Shared type definitions for the satellite-fleet incident scenario engine.
//!
//! This crate is the single source of truth for the data model read by the
//! dashboard. Types defined here flow downstream to `TypeScript` via `ts-rs`
//! so the rendering layer consumes exactly what the engine publishes.
//!
//! # Modules
//!
//! - [`ids`] -- Identifier newtypes (satellites, playbooks, audit events)
//! - [`enums`] -- Link state, run state, playbook state, log channels
//! - [`structs`] -- Satellites, telemetry, threat estimates, playbooks, phases
//! - [`snapshot`] -- The observable [`EngineSnapshot`] and its parts

pub mod enums;
pub mod ids;
pub mod snapshot;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{DemoRunState, LinkState, LogChannel, PlaybookState};
pub use ids::{AuditEventId, PlaybookId, SatelliteId};
pub use snapshot::{ApprovalGate, EngineSnapshot, LogView, RelayDisplay};
pub use structs::{
    GeoPoint, GeoZone, Phase, Playbook, Satellite, Telemetry, ThreatEstimate, Velocity,
};
