//! Scenario demo binary for the satellite-fleet incident engine.
//!
//! Wires the scenario engine to a real-time runner, a scripted operator
//! that approves proposed playbooks, and the hash-chained approval audit
//! trail. It runs the jamming incident from start to completion and then
//! prints the recorded trail.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `fleetsim-config.yaml` (or the path in argv)
//! 2. Initialize structured logging (tracing)
//! 3. Build the engine with the scripted jamming incident
//! 4. Spawn the approval recorder and the engine runner
//! 5. Start the demo and hand control to the scripted operator
//! 6. Wait for completion (or Ctrl-C)
//! 7. Dispose the engine and verify the audit trail

mod error;
mod operator;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use fleetsim_audit::{AuditStore, record_approvals};
use fleetsim_core::config::{SEED_ENV_VAR, ScenarioConfig};
use fleetsim_core::engine::ScenarioEngine;
use fleetsim_core::operator::Intent;
use fleetsim_core::runner::run_engine;
use fleetsim_core::script::ScenarioScript;
use fleetsim_core::sink::ChannelSink;
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::DemoError;
use crate::operator::ScriptedOperator;

/// Default config file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "fleetsim-config.yaml";

/// Capacity of the operator intent channel.
const INTENT_BUFFER: usize = 32;

/// Number of audit events printed at shutdown.
const TRAIL_PREVIEW: usize = 10;

/// Application entry point for the scenario demo.
///
/// # Errors
///
/// Returns an error if any initialization step or the run itself fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let config = load_config(std::env::args_os().nth(1).map(PathBuf::from))?;

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!(
        seed = config.engine.seed,
        clock_interval_ms = config.engine.clock_interval_ms,
        sample_interval_ms = config.engine.sample_interval_ms,
        auto_approve = config.operator.auto_approve,
        "Configuration loaded"
    );

    run(config).await?;
    Ok(())
}

async fn run(config: ScenarioConfig) -> Result<(), DemoError> {
    // 3. Build the engine.
    let (sink, notices) = ChannelSink::channel();
    let engine = ScenarioEngine::new(&config, ScenarioScript::flock_jamming())?
        .with_sink(sink);
    info!(
        satellites = engine.script().roster.len(),
        phases = engine.script().phases.len(),
        events = engine.script().events.len(),
        "Scenario engine built"
    );

    // 4. Spawn the recorder and the runner.
    let store = Arc::new(AuditStore::new(AuditStore::DEFAULT_CAPACITY)?);
    let recorder = tokio::spawn(record_approvals(
        Arc::clone(&store),
        notices,
        config.operator.name.clone(),
    ));

    let (intent_tx, intent_rx) = mpsc::channel(INTENT_BUFFER);
    let (snap_tx, mut snap_rx) = watch::channel(engine.snapshot());
    let runner = tokio::spawn(run_engine(engine, intent_rx, snap_tx));

    // 5. Start the demo and hand control to the operator.
    intent_tx
        .send(Intent::Start)
        .await
        .map_err(|e| DemoError::ChannelClosed {
            message: format!("start not delivered: {e}"),
        })?;

    let operator = if config.operator.auto_approve {
        Some(tokio::spawn(
            ScriptedOperator::new(&config).run(snap_rx.clone(), intent_tx.clone()),
        ))
    } else {
        info!("Auto-approve disabled, demo will idle at the first proposal");
        None
    };

    // 6. Wait for completion.
    tokio::select! {
        done = snap_rx.wait_for(|s| s.demo_completed) => {
            if done.is_err() {
                warn!("Engine stopped publishing before completion");
            } else {
                info!("Scenario demo completed");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, shutting down");
        }
    }

    // 7. Dispose the engine and verify the trail.
    drop(intent_tx);
    if let Some(operator) = operator {
        operator.abort();
        match operator.await {
            Ok(result) => {
                let approved = result?;
                info!(approved, "Operator stopped");
            }
            Err(e) if e.is_cancelled() => {}
            Err(e) => {
                return Err(DemoError::Task {
                    message: format!("operator task failed: {e}"),
                });
            }
        }
    }

    let summary = runner.await.map_err(|e| DemoError::Task {
        message: format!("runner task failed: {e}"),
    })??;
    info!(
        elapsed = summary.final_snapshot.elapsed_time,
        intents_applied = summary.intents_applied,
        timers_cancelled = summary.timers_cancelled,
        "Engine disposed"
    );

    let recorded = recorder.await.map_err(|e| DemoError::Task {
        message: format!("recorder task failed: {e}"),
    })??;

    store.verify().await?;
    for event in store.latest(TRAIL_PREVIEW).await {
        info!(
            id = %event.id,
            recorded_at = %event.recorded_at,
            payload = %event.payload,
            hash = %event.hash,
            prev_hash = %event.prev_hash,
            "{}", event.event
        );
    }
    info!(recorded, "Audit trail verified");

    Ok(())
}

/// Load the scenario configuration.
///
/// Uses `path` when given, otherwise `fleetsim-config.yaml` in the current
/// working directory. A missing default file falls back to built-in
/// defaults; a missing explicit file is an error.
fn load_config(path: Option<PathBuf>) -> Result<ScenarioConfig, DemoError> {
    if let Some(path) = path {
        return Ok(ScenarioConfig::from_file(&path)?);
    }

    let default_path = Path::new(DEFAULT_CONFIG_PATH);
    if default_path.exists() {
        Ok(ScenarioConfig::from_file(default_path)?)
    } else {
        let mut config = ScenarioConfig::default();
        config.apply_seed_override(std::env::var(SEED_ENV_VAR).ok().as_deref());
        config.validate()?;
        Ok(config)
    }
}
