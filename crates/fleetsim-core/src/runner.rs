//! Async driver for the scenario engine.
//!
//! [`run_engine`] maps wall time onto the engine's virtual milliseconds:
//! it sleeps until the next pending timer, advances the engine to the
//! current wall offset, and publishes a snapshot. Operator intents arrive
//! over an mpsc channel and are applied between timer dispatches; each
//! produces a fresh snapshot on the `watch` channel. Dropping every intent
//! sender disposes the engine and ends the run.

use fleetsim_types::EngineSnapshot;
use tokio::sync::{mpsc, watch};
use tokio::time::{Duration, Instant};
use tracing::{info, warn};

use crate::clock::ClockError;
use crate::engine::ScenarioEngine;
use crate::operator::Intent;

/// Errors that end a run early.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// The engine clock could not advance.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },
}

/// What happened during a run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Intents applied successfully.
    pub intents_applied: u64,
    /// Intents the engine rejected.
    pub intents_rejected: u64,
    /// Timers still pending when the engine was disposed.
    pub timers_cancelled: usize,
    /// Snapshot taken after disposal.
    pub final_snapshot: EngineSnapshot,
}

/// Drive `engine` in real time until the intent channel closes.
///
/// # Errors
///
/// Returns [`RunnerError`] if the engine clock overflows.
pub async fn run_engine(
    mut engine: ScenarioEngine,
    mut intents: mpsc::Receiver<Intent>,
    snapshots: watch::Sender<EngineSnapshot>,
) -> Result<RunSummary, RunnerError> {
    let origin = Instant::now();
    let base_ms = engine.now_ms();
    let mut intents_applied: u64 = 0;
    let mut intents_rejected: u64 = 0;

    info!(base_ms, "Engine runner starting");
    snapshots.send_replace(engine.snapshot());

    loop {
        let wake = engine.next_due_ms().and_then(|due| {
            origin.checked_add(Duration::from_millis(due.saturating_sub(base_ms)))
        });

        tokio::select! {
            intent = intents.recv() => {
                let Some(intent) = intent else {
                    break;
                };
                engine.advance_to(virtual_now(origin, base_ms))?;
                match engine.apply(intent) {
                    Ok(()) => intents_applied = intents_applied.saturating_add(1),
                    Err(_) => intents_rejected = intents_rejected.saturating_add(1),
                }
            }
            () = sleep_until(wake) => {
                engine.advance_to(virtual_now(origin, base_ms))?;
            }
        }

        snapshots.send_replace(engine.snapshot());
    }

    let timers_cancelled = engine.dispose();
    let final_snapshot = engine.snapshot();
    snapshots.send_replace(final_snapshot.clone());
    if intents_rejected > 0 {
        warn!(intents_rejected, "Some intents were rejected during the run");
    }
    info!(
        intents_applied,
        intents_rejected,
        timers_cancelled,
        run_state = ?final_snapshot.run_state,
        "Engine runner stopped"
    );

    Ok(RunSummary {
        intents_applied,
        intents_rejected,
        timers_cancelled,
        final_snapshot,
    })
}

/// Virtual milliseconds corresponding to the current wall time.
fn virtual_now(origin: Instant, base_ms: u64) -> u64 {
    let wall_ms = u64::try_from(origin.elapsed().as_millis()).unwrap_or(u64::MAX);
    base_ms.saturating_add(wall_ms)
}

/// Sleep until `deadline`, or forever when nothing is scheduled.
async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
