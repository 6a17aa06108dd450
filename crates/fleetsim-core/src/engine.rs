//! The scenario engine.
//!
//! [`ScenarioEngine`] is the single owner of all simulation state: clock,
//! fired-event set, fleet, threat estimate, playbook workflow, log panels,
//! and the timer queue. It runs on virtual milliseconds. The caller (the
//! async runner, or a test) moves virtual time forward with
//! [`ScenarioEngine::advance_to`] and feeds operator [`Intent`]s through
//! [`ScenarioEngine::apply`]; between calls, [`ScenarioEngine::snapshot`]
//! captures everything a dashboard renders.
//!
//! # Data and presentation
//!
//! Link states, the threat estimate, and proposals are data. Both paths go
//! through [`DataState`]: forward play folds each event's effects into the
//! current data state as the clock reaches it, a seek rebuilds it from
//! [`derive_state`], and either result is projected onto the fleet and the
//! workflow the same way. Log panels and the highlight card are
//! presentation: forward play reveals them as events fire, a seek
//! re-presents the narrative of the regime it lands in.
//!
//! # Lifecycle
//!
//! ```text
//! Idle -> start -> Running <-> Paused (seek | next | previous) -> Completed
//!  ^                                                                |
//!  +------------------------------ reset <--------------------------+
//! ```
//!
//! `start` is accepted only while idle. Navigation is accepted only while
//! running or paused. `reset` returns to idle from any state.
//!
//! Every reset, start, and seek cancels every pending timer before doing
//! anything else, so nothing scheduled by an earlier run can fire later.

use fleetsim_types::{
    DemoRunState, EngineSnapshot, LinkState, LogChannel, PlaybookId, RelayDisplay, Satellite,
    ThreatEstimate,
};
use tracing::{debug, info, warn};

use crate::clock::{ClockError, ScenarioClock, format_elapsed};
use crate::config::ScenarioConfig;
use crate::events::EventScheduler;
use crate::log::LogPresenter;
use crate::operator::{Intent, SeekTarget};
use crate::playbook::{CascadeStep, PlaybookWorkflow, WorkflowError, execution_plan};
use crate::replay::{DataState, derive_state};
use crate::script::{Narrative, PostEffect, ScenarioScript, ScriptEvent};
use crate::sink::{ApprovalNotice, ApprovalSink, NoOpSink};
use crate::telemetry::TelemetrySampler;
use crate::timeline::{Timeline, TimelineError};
use crate::timers::{DueTask, Task, TimerGroup, TimerQueue};

/// Errors returned when an intent cannot be applied.
///
/// Every variant is recoverable: the engine is left exactly as it was
/// before the intent, except that a phrase mismatch records a retryable
/// message on the open approval gate.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum IntentError {
    /// The intent is not valid in the current run state.
    #[error("cannot {intent} while {state:?}")]
    InvalidTransition {
        /// Name of the rejected intent.
        intent: &'static str,
        /// Run state at the time.
        state: DemoRunState,
    },

    /// A seek target could not be resolved.
    #[error("timeline error: {source}")]
    Timeline {
        /// The underlying timeline error.
        #[from]
        source: TimelineError,
    },

    /// The approval workflow rejected the intent.
    #[error("workflow error: {source}")]
    Workflow {
        /// The underlying workflow error.
        #[from]
        source: WorkflowError,
    },

    /// The clock could not advance.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },
}

/// Fixed timing parameters taken from configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Timing {
    /// Virtual milliseconds per simulated second.
    clock_interval_ms: u64,
    /// Virtual milliseconds between sampler ticks.
    sample_interval_ms: u64,
    /// Delay between execution log lines.
    action_interval_ms: u64,
    /// Sampler seed, reapplied on every reset.
    seed: u64,
    /// Velocity multiplier per sampler tick.
    tick_scale: f64,
}

/// The scenario engine. See the module documentation.
pub struct ScenarioEngine {
    /// The scripted scenario.
    script: ScenarioScript,
    /// Phase markers.
    timeline: Timeline,
    /// Configured timing.
    timing: Timing,
    /// Elapsed simulated seconds.
    clock: ScenarioClock,
    /// One-shot event table and fired set.
    events: EventScheduler,
    /// Every pending timer.
    timers: TimerQueue,
    /// Kinematics and telemetry source.
    sampler: TelemetrySampler,
    /// Diagnostics and execution panels.
    logs: LogPresenter,
    /// Proposals, approval gate, and retired playbooks.
    workflow: PlaybookWorkflow,
    /// Receiver of approval notices.
    sink: Box<dyn ApprovalSink>,
    /// The fleet.
    satellites: Vec<Satellite>,
    /// Active threat estimate.
    threat: Option<ThreatEstimate>,
    /// Demo lifecycle state.
    run_state: DemoRunState,
    /// Whether the mission-continuity cascade has completed.
    demo_completed: bool,
    /// Completion arrived while paused; applied on resume.
    completion_pending: bool,
    /// Highlight card text.
    highlight: Option<String>,
    /// Relay overlays.
    relay: RelayDisplay,
    /// Current virtual time in milliseconds. Never decreases.
    now_ms: u64,
}

impl ScenarioEngine {
    /// Build an idle engine at `t = 0` for `script`.
    ///
    /// # Errors
    ///
    /// Returns [`TimelineError`] if the script's phases are empty or not
    /// strictly increasing.
    pub fn new(config: &ScenarioConfig, script: ScenarioScript) -> Result<Self, TimelineError> {
        let timeline = Timeline::new(script.phases.clone())?;
        let timing = Timing {
            clock_interval_ms: config.engine.clock_interval_ms,
            sample_interval_ms: config.engine.sample_interval_ms,
            action_interval_ms: config.approval.action_interval_ms,
            seed: config.engine.seed,
            tick_scale: config.engine.tick_scale,
        };
        let mut sampler = TelemetrySampler::new(timing.seed, timing.tick_scale);
        let satellites = baseline_fleet(&script, &mut sampler);
        let events = EventScheduler::new(&script.events);

        info!(
            satellites = satellites.len(),
            phases = timeline.len(),
            events = script.events.len(),
            seed = timing.seed,
            "Scenario engine created"
        );

        Ok(Self {
            script,
            timeline,
            timing,
            clock: ScenarioClock::new(),
            events,
            timers: TimerQueue::new(),
            sampler,
            logs: LogPresenter::new(),
            workflow: PlaybookWorkflow::new(config.approval.phrase.clone()),
            sink: Box::new(NoOpSink::new()),
            satellites,
            threat: None,
            run_state: DemoRunState::Idle,
            demo_completed: false,
            completion_pending: false,
            highlight: None,
            relay: RelayDisplay::default(),
            now_ms: 0,
        })
    }

    /// Replace the approval sink.
    #[must_use]
    pub fn with_sink(mut self, sink: impl ApprovalSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    // ----- Virtual time -----

    /// Current virtual time in milliseconds.
    pub const fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Virtual millisecond of the next pending timer, if any.
    pub fn next_due_ms(&self) -> Option<u64> {
        self.timers.next_due()
    }

    /// Run every timer due at or before `target_ms`, in order, then move
    /// virtual time to `target_ms`. Earlier targets are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::Overflow`] if the clock cannot advance.
    pub fn advance_to(&mut self, target_ms: u64) -> Result<(), ClockError> {
        while let Some(due) = self.timers.pop_due(target_ms) {
            self.now_ms = self.now_ms.max(due.due_ms);
            self.dispatch(due)?;
        }
        self.now_ms = self.now_ms.max(target_ms);
        Ok(())
    }

    /// Advance virtual time by `delta_ms`.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::Overflow`] if the clock cannot advance.
    pub fn advance_by(&mut self, delta_ms: u64) -> Result<(), ClockError> {
        self.advance_to(self.now_ms.saturating_add(delta_ms))
    }

    /// Run anything due right now (zero-delay reveals, for instance).
    fn pump(&mut self) -> Result<(), ClockError> {
        self.advance_to(self.now_ms)
    }

    // ----- Intents -----

    /// Apply one operator intent.
    ///
    /// # Errors
    ///
    /// Returns [`IntentError`] if the intent is rejected; see the
    /// individual operations.
    pub fn apply(&mut self, intent: Intent) -> Result<(), IntentError> {
        debug!(intent = intent.name(), state = ?self.run_state, "applying intent");
        let result = match intent {
            Intent::Start => self.start(),
            Intent::Pause => self.pause(),
            Intent::Resume => self.resume(),
            Intent::TogglePause => self.toggle_pause(),
            Intent::Seek { target } => self.seek(target),
            Intent::Next => self.next(),
            Intent::Previous => self.previous(),
            Intent::Reset => self.reset(),
            Intent::RequestApproval { playbook_id } => self.request_approval(&playbook_id),
            Intent::Confirm {
                playbook_id,
                phrase,
            } => self.confirm(&playbook_id, &phrase),
            Intent::Cancel { playbook_id } => self.cancel(&playbook_id),
        };
        if let Err(err) = &result {
            warn!(error = %err, "intent rejected");
        }
        result
    }

    /// Reset to the `t = 0` baseline and start running. Valid only while
    /// idle; a completed demo must be reset first.
    pub fn start(&mut self) -> Result<(), IntentError> {
        self.require(DemoRunState::Idle, "start")?;
        self.reset_state();
        self.run_state = DemoRunState::Running;
        info!(now_ms = self.now_ms, "Demo started");

        self.arm_running_timers();
        let start_log = self.script.start_log.clone();
        self.logs.reveal(
            &mut self.timers,
            self.now_ms,
            LogChannel::Diagnostics,
            &start_log,
        );
        self.timers.schedule(
            self.now_ms.saturating_add(self.script.start_log_hide_ms),
            TimerGroup::Reveal(LogChannel::Diagnostics),
            Task::HideLog(LogChannel::Diagnostics),
        );
        self.pump()?;
        Ok(())
    }

    /// Halt the clock and the sampler. Valid only while running.
    pub fn pause(&mut self) -> Result<(), IntentError> {
        self.require(DemoRunState::Running, "pause")?;
        self.disarm_running_timers();
        self.run_state = DemoRunState::Paused;
        info!(elapsed = %format_elapsed(self.clock.elapsed()), "Demo paused");
        Ok(())
    }

    /// Re-arm the clock and the sampler. Valid only while paused.
    ///
    /// A completion that arrived while paused is applied immediately.
    pub fn resume(&mut self) -> Result<(), IntentError> {
        self.require(DemoRunState::Paused, "resume")?;
        self.run_state = DemoRunState::Running;
        info!(elapsed = %format_elapsed(self.clock.elapsed()), "Demo resumed");
        if self.completion_pending {
            self.complete_demo();
            return Ok(());
        }
        self.arm_running_timers();
        Ok(())
    }

    /// Pause when running, resume when paused.
    pub fn toggle_pause(&mut self) -> Result<(), IntentError> {
        match self.run_state {
            DemoRunState::Running => self.pause(),
            DemoRunState::Paused => self.resume(),
            state => Err(IntentError::InvalidTransition {
                intent: "toggle_pause",
                state,
            }),
        }
    }

    /// Jump to a phase or timestamp.
    ///
    /// Cancels every timer, discards approval progress and relay displays,
    /// rebuilds data state for the target, re-presents the narrative of the
    /// regime the target falls in, and re-arms the clock if running.
    /// Valid only while running or paused.
    pub fn seek(&mut self, target: SeekTarget) -> Result<(), IntentError> {
        self.require_navigable("seek")?;
        let target = self.timeline.resolve(target)?;
        self.seek_to(target)
    }

    /// Jump to the next phase. A no-op at the last phase.
    pub fn next(&mut self) -> Result<(), IntentError> {
        self.require_navigable("next")?;
        match self.timeline.next_target(self.clock.elapsed()) {
            Some(target) => self.seek_to(target),
            None => {
                debug!("already at last phase");
                Ok(())
            }
        }
    }

    /// Jump to the previous phase. A no-op at the first phase.
    pub fn previous(&mut self) -> Result<(), IntentError> {
        self.require_navigable("previous")?;
        match self.timeline.previous_target(self.clock.elapsed()) {
            Some(target) => self.seek_to(target),
            None => {
                debug!("already at first phase");
                Ok(())
            }
        }
    }

    /// Return to the idle `t = 0` baseline. Valid from any state.
    pub fn reset(&mut self) -> Result<(), IntentError> {
        self.reset_state();
        self.run_state = DemoRunState::Idle;
        info!("Demo reset");
        Ok(())
    }

    /// Open the approval gate for a proposed playbook.
    pub fn request_approval(&mut self, id: &PlaybookId) -> Result<(), IntentError> {
        self.workflow.request_approval(id)?;
        info!(playbook = %id, "Approval requested");
        Ok(())
    }

    /// Confirm the open gate with the typed phrase.
    ///
    /// On success the playbook is approved, its execution log starts
    /// revealing, its post effect is scheduled, and the approval sink is
    /// notified.
    pub fn confirm(&mut self, id: &PlaybookId, phrase: &str) -> Result<(), IntentError> {
        let playbook = self.workflow.confirm(id, phrase)?;
        let plan = execution_plan(&playbook, self.timing.action_interval_ms);

        self.logs.reveal(
            &mut self.timers,
            self.now_ms,
            LogChannel::Execution,
            &plan.log,
        );
        self.timers.schedule(
            self.now_ms.saturating_add(plan.finish_after_ms),
            TimerGroup::Cascade,
            Task::Cascade(CascadeStep::FinishExecution(playbook.id.clone())),
        );
        info!(
            playbook = %playbook.id,
            finish_after_ms = plan.finish_after_ms,
            elapsed = self.clock.elapsed(),
            "Playbook execution started"
        );

        self.sink.playbook_approved(ApprovalNotice {
            playbook_id: playbook.id,
            playbook_name: playbook.name,
            actions: playbook.actions,
            elapsed_time: self.clock.elapsed(),
        });
        self.pump()?;
        Ok(())
    }

    /// Close the gate without approving.
    pub fn cancel(&mut self, id: &PlaybookId) -> Result<(), IntentError> {
        self.workflow.cancel(id)?;
        info!(playbook = %id, "Approval cancelled");
        Ok(())
    }

    /// Cancel every pending timer. The engine stays readable.
    pub fn dispose(&mut self) -> usize {
        let cancelled = self.timers.cancel_all();
        info!(cancelled, "Scenario engine disposed");
        cancelled
    }

    // ----- Observation -----

    /// Capture everything a dashboard renders.
    pub fn snapshot(&self) -> EngineSnapshot {
        let elapsed = self.clock.elapsed();
        EngineSnapshot {
            elapsed_time: elapsed,
            run_state: self.run_state,
            satellites: self.satellites.clone(),
            threat_estimate: self.threat,
            active_playbooks: self.workflow.active().to_vec(),
            visible_logs: self.logs.views(),
            demo_completed: self.demo_completed,
            approval_gate: self.workflow.gate().cloned(),
            highlight: self.highlight.clone(),
            relay: self.relay,
            footprint_alert: self.satellites.iter().any(|s| s.link_state.is_impaired()),
            phases: self.timeline.phases().to_vec(),
            current_phase: self.timeline.index_at(elapsed),
        }
    }

    /// The current data state, comparable with [`derive_state`].
    ///
    /// Post-execution effects (the out-of-band failover, retired
    /// playbooks) show up here too, since they act on the same fleet.
    pub fn data_state(&self) -> DataState {
        DataState {
            link_states: self
                .satellites
                .iter()
                .map(|s| (s.id.clone(), s.link_state))
                .collect(),
            threat: self.threat,
            playbooks: self.workflow.active().iter().map(|p| p.id.clone()).collect(),
        }
    }

    /// Current run state.
    pub const fn run_state(&self) -> DemoRunState {
        self.run_state
    }

    /// Elapsed simulated seconds.
    pub const fn elapsed(&self) -> u64 {
        self.clock.elapsed()
    }

    /// Number of pending timers across all groups.
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Number of pending timers in one group.
    pub fn pending_in(&self, group: TimerGroup) -> usize {
        self.timers.pending(group)
    }

    /// Timestamps of events fired since the last reset or rewind.
    pub fn fired_events(&self) -> Vec<u64> {
        self.events.fired().collect()
    }

    /// The scripted scenario.
    pub const fn script(&self) -> &ScenarioScript {
        &self.script
    }

    // ----- Dispatch -----

    fn dispatch(&mut self, due: DueTask) -> Result<(), ClockError> {
        match due.task {
            Task::ClockTick => self.on_clock_tick(due.due_ms)?,
            Task::SampleTick => {
                self.sampler.step(&mut self.satellites);
                self.timers.schedule(
                    due.due_ms.saturating_add(self.timing.sample_interval_ms),
                    TimerGroup::Sampler,
                    Task::SampleTick,
                );
            }
            Task::RevealLine { channel, line } => self.logs.append(channel, line),
            Task::HideLog(channel) => self.logs.hide(channel),
            Task::ShowHighlight(text) => self.highlight = Some(text),
            Task::Cascade(step) => self.on_cascade(step),
        }
        Ok(())
    }

    fn on_clock_tick(&mut self, due_ms: u64) -> Result<(), ClockError> {
        let elapsed = self.clock.advance()?;
        self.timers.schedule(
            due_ms.saturating_add(self.timing.clock_interval_ms),
            TimerGroup::Clock,
            Task::ClockTick,
        );
        debug!(elapsed, "clock tick");
        if let Some(event) = self.events.take_due(elapsed) {
            self.fire(&event);
        }
        Ok(())
    }

    fn fire(&mut self, event: &ScriptEvent) {
        info!(
            at = event.at,
            effects = event.effects.len(),
            "Scripted event fired"
        );
        let mut data = self.data_state();
        for effect in &event.effects {
            data.apply(effect);
        }
        self.project(&data, false);
        if let Some(narrative) = &event.narrative {
            self.present(narrative);
        }
    }

    /// Make the fleet, threat, and workflow match `data`.
    ///
    /// Satellites whose link state changes get fresh telemetry for the new
    /// state; with `resample_all` every satellite does. Playbooks in `data`
    /// that are not active yet are proposed in order.
    fn project(&mut self, data: &DataState, resample_all: bool) {
        for sat in &mut self.satellites {
            let state = data.link_state(&sat.id).unwrap_or(LinkState::Ok);
            if resample_all || state != sat.link_state {
                self.sampler.assign(sat, state);
            }
        }

        if let (None, Some(estimate)) = (self.threat, data.threat) {
            info!(confidence = estimate.confidence, "Threat estimate published");
        }
        self.threat = data.threat;

        for id in &data.playbooks {
            if self.workflow.find(id).is_some() {
                continue;
            }
            match self.script.playbook(id) {
                Some(template) => {
                    if let Err(err) = self.workflow.propose(template) {
                        warn!(error = %err, "proposal skipped");
                    }
                }
                None => warn!(playbook = %id, "proposal for unknown playbook"),
            }
        }
    }

    fn present(&mut self, narrative: &Narrative) {
        match narrative {
            Narrative::Reveal { log, highlight } => {
                self.logs.reveal(&mut self.timers, self.now_ms, LogChannel::Diagnostics, log);
                self.timers.cancel_group(TimerGroup::Narrative);
                if let Some(card) = highlight {
                    self.timers.schedule(
                        self.now_ms.saturating_add(card.delay_ms),
                        TimerGroup::Narrative,
                        Task::ShowHighlight(card.text.clone()),
                    );
                }
            }
            Narrative::ClearDiagnostics => {
                LogPresenter::cancel(&mut self.timers, LogChannel::Diagnostics);
                self.timers.cancel_group(TimerGroup::Narrative);
                self.logs.hide(LogChannel::Diagnostics);
                self.highlight = None;
            }
        }
    }

    fn on_cascade(&mut self, step: CascadeStep) {
        match step {
            CascadeStep::FinishExecution(id) => self.finish_execution(&id),
            CascadeStep::StartDataTransfer => {
                self.relay.data_transfer = true;
                self.relay.isl_map_lines = true;
                self.relay.command_flow = false;
                info!("Mission data transfer started");
            }
            CascadeStep::CompleteDemo => match self.run_state {
                DemoRunState::Running => self.complete_demo(),
                DemoRunState::Paused => {
                    info!("Demo completion deferred until resume");
                    self.completion_pending = true;
                }
                DemoRunState::Idle | DemoRunState::Completed => {}
            },
        }
    }

    fn finish_execution(&mut self, id: &PlaybookId) {
        let Some(effect) = self.script.playbook(id).map(|t| t.post_effect.clone()) else {
            warn!(playbook = %id, "finished playbook missing from catalog");
            return;
        };

        match effect {
            PostEffect::OutOfBandFailover { keep } => {
                for sat in &mut self.satellites {
                    let state = if sat.id == keep {
                        LinkState::Ok
                    } else {
                        LinkState::OutOfBand
                    };
                    self.sampler.assign(sat, state);
                }
                self.relay.isl_tunnel = true;
                self.highlight = None;
                self.logs.hide(LogChannel::Execution);
                info!(playbook = %id, kept = %keep, "Fleet moved to out-of-band relay");
            }
            PostEffect::MissionContinuity(continuity) => {
                self.logs.hide(LogChannel::Execution);
                self.relay.command_relay = true;
                self.relay.command_flow = true;
                self.logs.reveal(
                    &mut self.timers,
                    self.now_ms,
                    LogChannel::Diagnostics,
                    &continuity.relay_log,
                );
                self.timers.schedule(
                    self.now_ms.saturating_add(continuity.transfer_delay_ms),
                    TimerGroup::Cascade,
                    Task::Cascade(CascadeStep::StartDataTransfer),
                );
                self.timers.schedule(
                    self.now_ms.saturating_add(continuity.complete_delay_ms),
                    TimerGroup::Cascade,
                    Task::Cascade(CascadeStep::CompleteDemo),
                );
                info!(playbook = %id, "Command relay mode activating");
            }
        }

        if let Err(err) = self.workflow.retire(id) {
            warn!(error = %err, "could not retire playbook");
        }
    }

    // ----- Helpers -----

    fn seek_to(&mut self, target: u64) -> Result<(), IntentError> {
        let from = self.clock.elapsed();
        let cancelled = self.timers.cancel_all();
        self.logs.clear_all(&mut self.timers);
        self.workflow.reset();
        self.highlight = None;
        self.relay = RelayDisplay::default();
        self.completion_pending = false;

        self.events.rewind(target);
        self.clock.set(target);

        let data = derive_state(&self.script, target);
        self.project(&data, true);

        let narrative = self
            .script
            .regime_at(target)
            .and_then(|event| event.narrative.clone());
        if let Some(narrative) = narrative {
            self.present(&narrative);
        }

        if self.run_state == DemoRunState::Running {
            self.arm_running_timers();
        }
        info!(
            from = %format_elapsed(from),
            to = %format_elapsed(target),
            cancelled,
            "Seek"
        );
        self.pump()?;
        Ok(())
    }

    fn reset_state(&mut self) {
        let cancelled = self.timers.cancel_all();
        debug!(cancelled, "timers cancelled on reset");
        self.clock.reset();
        self.events.reset();
        self.workflow.reset();
        self.logs.clear_all(&mut self.timers);
        self.sampler = TelemetrySampler::new(self.timing.seed, self.timing.tick_scale);
        self.satellites = baseline_fleet(&self.script, &mut self.sampler);
        self.threat = None;
        self.highlight = None;
        self.relay = RelayDisplay::default();
        self.demo_completed = false;
        self.completion_pending = false;
    }

    fn complete_demo(&mut self) {
        self.disarm_running_timers();
        self.clock.reset();
        self.run_state = DemoRunState::Completed;
        self.demo_completed = true;
        self.completion_pending = false;
        info!("Demo completed");
    }

    fn arm_running_timers(&mut self) {
        self.disarm_running_timers();
        self.timers.schedule(
            self.now_ms.saturating_add(self.timing.clock_interval_ms),
            TimerGroup::Clock,
            Task::ClockTick,
        );
        self.timers.schedule(
            self.now_ms.saturating_add(self.timing.sample_interval_ms),
            TimerGroup::Sampler,
            Task::SampleTick,
        );
    }

    fn disarm_running_timers(&mut self) {
        self.timers.cancel_group(TimerGroup::Clock);
        self.timers.cancel_group(TimerGroup::Sampler);
    }

    fn require(&self, expected: DemoRunState, intent: &'static str) -> Result<(), IntentError> {
        if self.run_state == expected {
            Ok(())
        } else {
            Err(IntentError::InvalidTransition {
                intent,
                state: self.run_state,
            })
        }
    }

    fn require_navigable(&self, intent: &'static str) -> Result<(), IntentError> {
        match self.run_state {
            DemoRunState::Running | DemoRunState::Paused => Ok(()),
            state => Err(IntentError::InvalidTransition { intent, state }),
        }
    }
}

/// The roster at `t = 0`, every link OK with fresh telemetry.
fn baseline_fleet(script: &ScenarioScript, sampler: &mut TelemetrySampler) -> Vec<Satellite> {
    script
        .roster
        .iter()
        .map(|spec| Satellite {
            id: spec.id.clone(),
            position: spec.position,
            altitude_km: spec.altitude_km,
            velocity: spec.velocity,
            link_state: LinkState::Ok,
            telemetry: sampler.initial(LinkState::Ok),
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use fleetsim_types::PlaybookState;

    use super::*;
    use crate::script::{
        AVAILABILITY_PLAYBOOK, CONTINUITY_PLAYBOOK, PROTECTED_SATELLITE,
        SECONDARY_FAILURE_SATELLITE,
    };
    use crate::sink::ChannelSink;

    const PHRASE: &str = "Action Approve";

    fn engine() -> ScenarioEngine {
        ScenarioEngine::new(&ScenarioConfig::default(), ScenarioScript::flock_jamming()).unwrap()
    }

    fn started() -> ScenarioEngine {
        let mut engine = engine();
        engine.start().unwrap();
        engine
    }

    fn run_seconds(engine: &mut ScenarioEngine, seconds: u64) {
        engine.advance_by(seconds * 1000).unwrap();
    }

    fn approve(engine: &mut ScenarioEngine, id: &str) {
        let id = PlaybookId::from(id);
        engine.request_approval(&id).unwrap();
        engine.confirm(&id, PHRASE).unwrap();
    }

    fn diagnostics(engine: &ScenarioEngine) -> fleetsim_types::LogView {
        engine
            .snapshot()
            .log(LogChannel::Diagnostics)
            .unwrap()
            .clone()
    }

    #[test]
    fn new_engine_is_idle_and_quiet() {
        let engine = engine();
        let snap = engine.snapshot();
        assert_eq!(snap.run_state, DemoRunState::Idle);
        assert_eq!(snap.elapsed_time, 0);
        assert_eq!(snap.satellites.len(), 5);
        assert!(snap.satellites.iter().all(|s| s.link_state == LinkState::Ok));
        assert_eq!(engine.pending_timers(), 0);
    }

    #[test]
    fn start_arms_clock_and_sampler() {
        let engine = started();
        assert_eq!(engine.run_state(), DemoRunState::Running);
        assert_eq!(engine.pending_in(TimerGroup::Clock), 1);
        assert_eq!(engine.pending_in(TimerGroup::Sampler), 1);
        assert_eq!(diagnostics(&engine).lines, ["Demo Start..."]);
    }

    #[test]
    fn clock_increments_once_per_interval() {
        let mut engine = started();
        engine.advance_to(999).unwrap();
        assert_eq!(engine.elapsed(), 0);
        engine.advance_to(1000).unwrap();
        assert_eq!(engine.elapsed(), 1);
        engine.advance_to(4500).unwrap();
        assert_eq!(engine.elapsed(), 4);
    }

    #[test]
    fn event_is_visible_with_its_increment() {
        let mut engine = started();
        engine.advance_to(1000).unwrap();
        let snap = engine.snapshot();
        assert_eq!(snap.elapsed_time, 1);
        let degraded = snap
            .satellites
            .iter()
            .filter(|s| s.link_state == LinkState::Degraded)
            .count();
        assert_eq!(degraded, 4);
        assert!(snap.footprint_alert);
        let diag = snap.log(LogChannel::Diagnostics).unwrap();
        assert_eq!(diag.title, "Link Degradation Detected");
        assert_eq!(diag.lines, ["Satellites link degradation detected"]);
    }

    #[test]
    fn event_reveal_supersedes_start_log_hide() {
        let mut engine = started();
        engine.advance_to(2000).unwrap();
        let diag = diagnostics(&engine);
        assert!(diag.visible);
        assert_eq!(diag.lines.len(), 2);
    }

    #[test]
    fn sampler_moves_satellites_while_running() {
        let mut engine = started();
        let before = engine.snapshot().satellites.first().unwrap().position;
        engine.advance_to(300).unwrap();
        let after = engine.snapshot().satellites.first().unwrap().position;
        assert!(after.lat > before.lat);
    }

    #[test]
    fn pause_and_resume_are_validated() {
        let mut engine = engine();
        assert_eq!(
            engine.pause(),
            Err(IntentError::InvalidTransition {
                intent: "pause",
                state: DemoRunState::Idle
            })
        );
        engine.start().unwrap();
        assert!(engine.resume().is_err());
        engine.pause().unwrap();
        assert!(engine.pause().is_err());
        engine.resume().unwrap();
    }

    #[test]
    fn pause_halts_clock_and_sampler() {
        let mut engine = started();
        run_seconds(&mut engine, 3);
        engine.pause().unwrap();
        let positions = engine.snapshot().satellites;
        run_seconds(&mut engine, 60);
        assert_eq!(engine.elapsed(), 3);
        assert_eq!(engine.snapshot().satellites, positions);
        engine.toggle_pause().unwrap();
        run_seconds(&mut engine, 1);
        assert_eq!(engine.elapsed(), 4);
    }

    #[test]
    fn highlight_follows_threat_by_delay() {
        let mut engine = started();
        engine.advance_to(10_000 + 3199).unwrap();
        assert!(engine.snapshot().highlight.is_none());
        engine.advance_to(10_000 + 3200).unwrap();
        assert_eq!(
            engine.snapshot().highlight.as_deref(),
            Some("Impact radius = 500 km (confidence: 0.87)")
        );
    }

    #[test]
    fn proposal_clears_diagnostics_and_highlight() {
        let mut engine = started();
        run_seconds(&mut engine, 15);
        let snap = engine.snapshot();
        assert!(snap.highlight.is_none());
        assert!(!snap.log(LogChannel::Diagnostics).unwrap().visible);
        assert_eq!(snap.active_playbooks.len(), 1);
        assert_eq!(engine.pending_in(TimerGroup::Narrative), 0);
    }

    #[test]
    fn seek_presents_regime_narrative() {
        let mut engine = started();
        engine.pause().unwrap();
        engine.seek(SeekTarget::Timestamp(12)).unwrap();
        let snap = engine.snapshot();
        assert_eq!(snap.elapsed_time, 12);
        assert_eq!(snap.run_state, DemoRunState::Paused);
        assert!(snap.threat_estimate.is_some());
        assert_eq!(snap.log(LogChannel::Diagnostics).unwrap().title, "Threat Analysis");
        assert_eq!(engine.pending_in(TimerGroup::Narrative), 1);
        assert_eq!(engine.pending_in(TimerGroup::Clock), 0);
    }

    #[test]
    fn seek_to_start_presents_nothing() {
        let mut engine = started();
        run_seconds(&mut engine, 6);
        engine.seek(SeekTarget::Phase(0)).unwrap();
        let snap = engine.snapshot();
        assert_eq!(snap.elapsed_time, 0);
        assert!(snap.visible_logs.iter().all(|l| !l.visible));
        assert!(snap.satellites.iter().all(|s| s.link_state == LinkState::Ok));
        assert_eq!(engine.pending_in(TimerGroup::Clock), 1);
    }

    #[test]
    fn seek_backward_allows_refire() {
        let mut engine = started();
        run_seconds(&mut engine, 11);
        engine.seek(SeekTarget::Timestamp(5)).unwrap();
        assert_eq!(engine.fired_events(), vec![1]);
        assert!(engine.snapshot().threat_estimate.is_none());
        run_seconds(&mut engine, 5);
        assert_eq!(engine.elapsed(), 10);
        assert_eq!(engine.fired_events(), vec![1, 10]);
        assert!(engine.snapshot().threat_estimate.is_some());
    }

    #[test]
    fn unknown_phase_is_rejected() {
        let mut engine = started();
        assert!(matches!(
            engine.seek(SeekTarget::Phase(99)),
            Err(IntentError::Timeline { .. })
        ));
    }

    #[test]
    fn next_and_previous_walk_phases() {
        let mut engine = started();
        engine.previous().unwrap();
        assert_eq!(engine.elapsed(), 0);
        engine.next().unwrap();
        assert_eq!(engine.elapsed(), 1);
        engine.next().unwrap();
        assert_eq!(engine.elapsed(), 5);
        engine.seek(SeekTarget::Timestamp(7)).unwrap();
        engine.previous().unwrap();
        assert_eq!(engine.elapsed(), 1);
        engine.seek(SeekTarget::Phase(6)).unwrap();
        engine.next().unwrap();
        assert_eq!(engine.elapsed(), 25);
    }

    #[test]
    fn availability_playbook_moves_fleet_out_of_band() {
        let mut engine = started();
        run_seconds(&mut engine, 15);
        approve(&mut engine, AVAILABILITY_PLAYBOOK);

        let id = PlaybookId::from(AVAILABILITY_PLAYBOOK);
        assert_eq!(
            engine.snapshot().playbook(&id).unwrap().state,
            PlaybookState::Approved
        );
        assert_eq!(
            engine.snapshot().log(LogChannel::Execution).unwrap().lines,
            ["Executing Playbook-04..."]
        );

        engine.advance_by(3600).unwrap();
        let snap = engine.snapshot();
        assert!(snap.playbook(&id).is_none());
        assert!(snap.relay.isl_tunnel);
        assert!(!snap.log(LogChannel::Execution).unwrap().visible);
        for sat in &snap.satellites {
            let expected = if sat.id.as_str() == PROTECTED_SATELLITE {
                LinkState::Ok
            } else {
                LinkState::OutOfBand
            };
            assert_eq!(sat.link_state, expected);
        }
    }

    #[test]
    fn continuity_playbook_completes_demo() {
        let mut engine = started();
        run_seconds(&mut engine, 18);
        approve(&mut engine, CONTINUITY_PLAYBOOK);

        engine.advance_by(3000).unwrap();
        let snap = engine.snapshot();
        assert!(snap.relay.command_relay && snap.relay.command_flow);
        assert_eq!(
            snap.log(LogChannel::Diagnostics).unwrap().title,
            "Command Relay Mode Activation"
        );

        engine.advance_by(7700).unwrap();
        let snap = engine.snapshot();
        assert!(snap.relay.data_transfer && snap.relay.isl_map_lines);
        assert!(!snap.relay.command_flow);

        engine.advance_by(2000).unwrap();
        let snap = engine.snapshot();
        assert_eq!(snap.run_state, DemoRunState::Completed);
        assert_eq!(snap.elapsed_time, 0);
        assert!(snap.demo_completed);
        assert_eq!(engine.pending_in(TimerGroup::Clock), 0);
        assert_eq!(
            engine.seek(SeekTarget::Timestamp(3)).unwrap_err(),
            IntentError::InvalidTransition {
                intent: "seek",
                state: DemoRunState::Completed,
            }
        );
    }

    #[test]
    fn completion_waits_for_resume_when_paused() {
        let mut engine = started();
        run_seconds(&mut engine, 18);
        approve(&mut engine, CONTINUITY_PLAYBOOK);
        engine.pause().unwrap();
        engine.advance_by(20_000).unwrap();
        assert_eq!(engine.run_state(), DemoRunState::Paused);
        assert_eq!(engine.elapsed(), 18);
        engine.resume().unwrap();
        assert_eq!(engine.run_state(), DemoRunState::Completed);
        assert_eq!(engine.elapsed(), 0);
    }

    #[test]
    fn confirm_notifies_sink() {
        let (sink, mut rx) = ChannelSink::channel();
        let mut engine = engine().with_sink(sink);
        engine.start().unwrap();
        run_seconds(&mut engine, 15);
        approve(&mut engine, AVAILABILITY_PLAYBOOK);
        let notice = rx.try_recv().unwrap();
        assert_eq!(notice.playbook_id, PlaybookId::from(AVAILABILITY_PLAYBOOK));
        assert_eq!(notice.elapsed_time, 15);
        assert_eq!(notice.actions.len(), 4);
    }

    #[test]
    fn phrase_mismatch_surfaces_in_snapshot() {
        let mut engine = started();
        run_seconds(&mut engine, 15);
        let id = PlaybookId::from(AVAILABILITY_PLAYBOOK);
        engine.request_approval(&id).unwrap();
        assert!(engine.confirm(&id, "action approve").is_err());
        let snap = engine.snapshot();
        assert!(snap.approval_gate.as_ref().unwrap().error.is_some());
        assert_eq!(snap.playbook(&id).unwrap().state, PlaybookState::Proposed);
        assert_eq!(engine.pending_in(TimerGroup::Cascade), 0);
    }

    #[test]
    fn reset_cancels_everything() {
        let mut engine = started();
        run_seconds(&mut engine, 15);
        approve(&mut engine, AVAILABILITY_PLAYBOOK);
        engine.reset().unwrap();
        assert_eq!(engine.pending_timers(), 0);
        let snap = engine.snapshot();
        assert_eq!(snap.run_state, DemoRunState::Idle);
        assert!(snap.active_playbooks.is_empty());
        engine.advance_by(60_000).unwrap();
        assert_eq!(engine.snapshot(), snap);
    }

    #[test]
    fn restart_replays_identically() {
        let mut a = started();
        run_seconds(&mut a, 12);
        let first = a.snapshot();
        a.reset().unwrap();
        a.start().unwrap();
        run_seconds(&mut a, 12);
        assert_eq!(a.snapshot().satellites, first.satellites);
    }

    #[test]
    fn start_is_rejected_unless_idle() {
        let mut engine = started();
        assert_eq!(
            engine.start(),
            Err(IntentError::InvalidTransition {
                intent: "start",
                state: DemoRunState::Running,
            })
        );
        engine.pause().unwrap();
        assert!(engine.start().is_err());
        assert_eq!(engine.run_state(), DemoRunState::Paused);

        engine.resume().unwrap();
        run_seconds(&mut engine, 18);
        approve(&mut engine, CONTINUITY_PLAYBOOK);
        engine.advance_by(15_000).unwrap();
        assert_eq!(engine.run_state(), DemoRunState::Completed);
        assert_eq!(
            engine.start(),
            Err(IntentError::InvalidTransition {
                intent: "start",
                state: DemoRunState::Completed,
            })
        );
        assert!(engine.snapshot().demo_completed);

        engine.reset().unwrap();
        engine.start().unwrap();
        assert_eq!(engine.run_state(), DemoRunState::Running);
    }

    #[test]
    fn navigation_is_rejected_while_idle() {
        let mut engine = engine();
        let before = engine.snapshot();
        for result in [
            engine.seek(SeekTarget::Timestamp(18)),
            engine.next(),
            engine.previous(),
        ] {
            assert!(matches!(
                result,
                Err(IntentError::InvalidTransition {
                    state: DemoRunState::Idle,
                    ..
                })
            ));
        }
        assert_eq!(engine.snapshot(), before);

        let id = PlaybookId::from(CONTINUITY_PLAYBOOK);
        assert!(engine.request_approval(&id).is_err());
        engine.advance_by(20_000).unwrap();
        let snap = engine.snapshot();
        assert_eq!(snap.run_state, DemoRunState::Idle);
        assert!(!snap.demo_completed);
    }

    #[test]
    fn seek_past_horizon_leaves_clock_running() {
        let mut engine = started();
        run_seconds(&mut engine, 3);
        assert!(matches!(
            engine.seek(SeekTarget::Timestamp(u64::MAX)),
            Err(IntentError::Timeline {
                source: TimelineError::BeyondHorizon { .. }
            })
        ));
        assert_eq!(engine.elapsed(), 3);
        assert_eq!(engine.pending_in(TimerGroup::Clock), 1);
        run_seconds(&mut engine, 1);
        assert_eq!(engine.elapsed(), 4);
    }

    #[test]
    fn later_events_fold_into_current_fleet_state() {
        let mut config = ScenarioConfig::default();
        config.approval.action_interval_ms = 100;
        let mut engine = ScenarioEngine::new(&config, ScenarioScript::flock_jamming()).unwrap();
        engine.start().unwrap();
        run_seconds(&mut engine, 15);
        approve(&mut engine, AVAILABILITY_PLAYBOOK);
        run_seconds(&mut engine, 3);

        let data = engine.data_state();
        assert_eq!(
            data.link_state(&SECONDARY_FAILURE_SATELLITE.into()),
            Some(LinkState::Down)
        );
        assert_eq!(
            data.link_state(&PROTECTED_SATELLITE.into()),
            Some(LinkState::Ok)
        );
        let out_of_band = data
            .link_states
            .values()
            .filter(|l| **l == LinkState::OutOfBand)
            .count();
        assert_eq!(out_of_band, 3);
        assert_eq!(data.playbooks, vec![PlaybookId::from(CONTINUITY_PLAYBOOK)]);
    }

    #[test]
    fn dispose_cancels_pending_timers() {
        let mut engine = started();
        assert!(engine.dispose() >= 2);
        assert_eq!(engine.pending_timers(), 0);
    }
}
