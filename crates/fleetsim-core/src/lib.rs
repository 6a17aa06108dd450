//! Scenario engine for the satellite-fleet incident demo.
//!
//! This crate owns the deterministic, time-indexed state machine behind the
//! "Scenario Demo": a logical clock, one-shot scripted events, continuous
//! satellite kinematics and synthetic telemetry, seek/rewind through the
//! timeline, and the confirmation-gated playbook approval workflow.
//!
//! # Modules
//!
//! - [`clock`] -- Elapsed simulated seconds with checked advancement.
//! - [`config`] -- Configuration loading from `fleetsim-config.yaml`.
//! - [`engine`] -- [`ScenarioEngine`], the single owner of all simulation
//!   state, and its intent operations.
//! - [`events`] -- At-most-once firing of scripted events per timestamp.
//! - [`log`] -- Staggered-reveal log panels.
//! - [`operator`] -- Serializable operator [`Intent`]s.
//! - [`playbook`] -- Proposal, approval gate, and execution planning.
//! - [`replay`] -- Canonical derivation of data state for any timestamp.
//! - [`runner`] -- Async driver mapping wall time onto the engine.
//! - [`script`] -- The scripted jamming-incident narrative.
//! - [`sink`] -- Fire-and-forget approval notifications.
//! - [`telemetry`] -- Kinematics and telemetry sampling.
//! - [`timeline`] -- Fixed phase markers and navigation.
//! - [`timers`] -- The single virtual-time queue behind every timer.
//!
//! [`ScenarioEngine`]: engine::ScenarioEngine
//! [`Intent`]: operator::Intent

pub mod clock;
pub mod config;
pub mod engine;
pub mod events;
pub mod log;
pub mod operator;
pub mod playbook;
pub mod replay;
pub mod runner;
pub mod script;
pub mod sink;
pub mod telemetry;
pub mod timeline;
pub mod timers;
