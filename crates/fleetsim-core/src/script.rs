//! The scripted jamming-incident narrative.
//!
//! A [`ScenarioScript`] is pure data: the fleet roster, the timeline
//! phases, the one-shot events keyed by elapsed second, the playbook
//! catalog with each playbook's post-execution effect, and the diagnostic
//! log texts. The engine interprets it; nothing here holds mutable state.
//!
//! The bundled script, [`ScenarioScript::flock_jamming`], reproduces a
//! ground-based wideband jamming incident over the Taiwan Strait against
//! five Flock satellites.

use fleetsim_types::{
    GeoPoint, GeoZone, LinkState, Phase, PlaybookId, SatelliteId, ThreatEstimate, Velocity,
};

// ---------------------------------------------------------------------------
// Roster
// ---------------------------------------------------------------------------

/// Initial description of one satellite.
#[derive(Debug, Clone, PartialEq)]
pub struct SatelliteSpec {
    /// Satellite identity.
    pub id: SatelliteId,
    /// Position at `t = 0`.
    pub position: GeoPoint,
    /// Orbit altitude in kilometres.
    pub altitude_km: f64,
    /// Constant ground-track velocity.
    pub velocity: Velocity,
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Which satellites an effect applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Targets {
    /// Every satellite except the named one.
    AllExcept(SatelliteId),
    /// Only the named satellite.
    Only(SatelliteId),
}

impl Targets {
    /// Whether `id` is targeted.
    pub fn includes(&self, id: &SatelliteId) -> bool {
        match self {
            Self::AllExcept(excluded) => excluded != id,
            Self::Only(only) => only == id,
        }
    }
}

/// A data mutation carried by a scripted event.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptEffect {
    /// Assign a link state.
    SetLinkState {
        /// Affected satellites.
        targets: Targets,
        /// New link state.
        state: LinkState,
    },
    /// Publish the threat estimate.
    ActivateThreat(ThreatEstimate),
    /// Propose a catalog playbook.
    ProposePlaybook(PlaybookId),
}

/// Text revealed line by line in a log panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogScript {
    /// Panel title.
    pub title: String,
    /// Lines in reveal order.
    pub lines: Vec<String>,
    /// Delay between consecutive lines.
    pub interval_ms: u64,
}

impl LogScript {
    fn new(title: &str, lines: &[&str], interval_ms: u64) -> Self {
        Self {
            title: title.to_owned(),
            lines: lines.iter().map(|l| (*l).to_owned()).collect(),
            interval_ms,
        }
    }

    /// Delay from the first line to the last one.
    pub fn duration_ms(&self) -> u64 {
        let steps = u64::try_from(self.lines.len().saturating_sub(1)).unwrap_or(u64::MAX);
        steps.saturating_mul(self.interval_ms)
    }
}

/// A highlight card shown after a delay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Highlight {
    /// Delay from the event.
    pub delay_ms: u64,
    /// Card text.
    pub text: String,
}

/// Presentation attached to an event. Never load-bearing for data state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Narrative {
    /// Reveal a diagnostics log, optionally followed by a highlight card.
    Reveal {
        /// Log to reveal.
        log: LogScript,
        /// Card to show afterwards.
        highlight: Option<Highlight>,
    },
    /// Hide the diagnostics panel and the highlight card.
    ClearDiagnostics,
}

/// One-shot event registered at an elapsed second.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptEvent {
    /// Elapsed second at which the event fires.
    pub at: u64,
    /// Data mutations, applied in order.
    pub effects: Vec<ScriptEffect>,
    /// Presentation, if any.
    pub narrative: Option<Narrative>,
}

// ---------------------------------------------------------------------------
// Playbooks
// ---------------------------------------------------------------------------

/// Timing of the mission-continuity hand-off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContinuityScript {
    /// Relay activation log revealed when the playbook finishes.
    pub relay_log: LogScript,
    /// Delay from activation until data transfer starts.
    pub transfer_delay_ms: u64,
    /// Delay from activation until the demo completes.
    pub complete_delay_ms: u64,
}

/// Fleet and display mutation applied when a playbook finishes executing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostEffect {
    /// Move every satellite except `keep` onto the out-of-band relay and
    /// show the relay tunnel.
    OutOfBandFailover {
        /// Satellite left on its primary link.
        keep: SatelliteId,
    },
    /// Activate command relay, then data transfer, then complete the demo.
    MissionContinuity(ContinuityScript),
}

/// A playbook the script can propose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybookTemplate {
    /// Playbook identity.
    pub id: PlaybookId,
    /// Human-readable name.
    pub name: String,
    /// Ordered remediation actions.
    pub actions: Vec<String>,
    /// Effect applied after the action log completes.
    pub post_effect: PostEffect,
}

// ---------------------------------------------------------------------------
// Script
// ---------------------------------------------------------------------------

/// A complete scripted scenario.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioScript {
    /// Fleet at `t = 0`.
    pub roster: Vec<SatelliteSpec>,
    /// Timeline phases.
    pub phases: Vec<Phase>,
    /// One-shot events in timestamp order.
    pub events: Vec<ScriptEvent>,
    /// Proposable playbooks.
    pub playbooks: Vec<PlaybookTemplate>,
    /// Log shown when the demo starts.
    pub start_log: LogScript,
    /// Delay after start before the start log is hidden.
    pub start_log_hide_ms: u64,
}

/// Satellite outside the impact zone; never degraded.
pub const PROTECTED_SATELLITE: &str = "Flock 4g-14";

/// Satellite that fails completely at the secondary-failure event.
pub const SECONDARY_FAILURE_SATELLITE: &str = "Flock 4g-16";

/// Availability/degrade playbook.
pub const AVAILABILITY_PLAYBOOK: &str = "Playbook-04";

/// Mission-continuity playbook.
pub const CONTINUITY_PLAYBOOK: &str = "Playbook-07";

/// Threat classification confidence published at the threat event.
pub const THREAT_CONFIDENCE: f64 = 0.87;

impl ScenarioScript {
    /// Look up a catalog playbook.
    pub fn playbook(&self, id: &PlaybookId) -> Option<&PlaybookTemplate> {
        self.playbooks.iter().find(|p| &p.id == id)
    }

    /// The event registered at exactly `at`.
    pub fn event_at(&self, at: u64) -> Option<&ScriptEvent> {
        self.events.iter().find(|e| e.at == at)
    }

    /// The regime `elapsed` falls into: the latest event at or before it.
    pub fn regime_at(&self, elapsed: u64) -> Option<&ScriptEvent> {
        self.events.iter().rev().find(|e| e.at <= elapsed)
    }

    /// The jamming-incident scenario over the Taiwan Strait.
    #[allow(clippy::too_many_lines)]
    pub fn flock_jamming() -> Self {
        let protected = SatelliteId::from(PROTECTED_SATELLITE);

        let roster = vec![
            sat(PROTECTED_SATELLITE, 25.912, 117.0802, 491.37, 0.0635, -0.0145),
            sat("Flock 4g-32", 23.6981, 118.7943, 466.88, 0.0642, -0.0142),
            sat("Flock 4g-17", 20.3357, 117.6394, 493.17, 0.0635, -0.0136),
            sat(SECONDARY_FAILURE_SATELLITE, 20.3911, 121.3309, 443.06, 0.0642, -0.0137),
            sat("Flock 4g-28", 19.5924, 123.0113, 434.63, 0.0479, -0.0135),
        ];

        let phases = vec![
            Phase::new(0, "Start"),
            Phase::new(1, "Link Degradation"),
            Phase::new(5, "Troubleshooting"),
            Phase::new(10, "Threat Classified"),
            Phase::new(15, "Playbook-04"),
            Phase::new(18, "4g-16 Down"),
            Phase::new(25, "Transfer"),
        ];

        let threat = ThreatEstimate {
            impact_zone: GeoZone {
                lat: 23.5,
                lon: 120.5,
                radius_meters: 500_000.0,
            },
            source_zone: Some(GeoZone {
                lat: 21.5,
                lon: 120.0,
                radius_meters: 150_000.0,
            }),
            confidence: THREAT_CONFIDENCE,
        };

        let events = vec![
            ScriptEvent {
                at: 1,
                effects: vec![ScriptEffect::SetLinkState {
                    targets: Targets::AllExcept(protected.clone()),
                    state: LinkState::Degraded,
                }],
                narrative: Some(Narrative::Reveal {
                    log: LogScript::new(
                        "Link Degradation Detected",
                        &[
                            "Satellites link degradation detected",
                            "4 LEO satellites reporting packet loss",
                            "Flock 4g-14 unaffected - outside impact zone",
                            "Forming cluster....",
                            "SNR drop detected across cluster",
                        ],
                        800,
                    ),
                    highlight: None,
                }),
            },
            ScriptEvent {
                at: 5,
                effects: Vec::new(),
                narrative: Some(Narrative::Reveal {
                    log: LogScript::new(
                        "Troubleshooting",
                        &[
                            "Cluster engine troubleshooting...",
                            "Checking onboard computer issues...",
                            "Checking consistency within the cluster...",
                            "Hardware fault ruled out",
                        ],
                        1000,
                    ),
                    highlight: None,
                }),
            },
            ScriptEvent {
                at: 10,
                effects: vec![ScriptEffect::ActivateThreat(threat)],
                narrative: Some(Narrative::Reveal {
                    log: LogScript::new(
                        "Threat Analysis",
                        &[
                            "Threat classified = Ground-based wideband jamming",
                            "Threat triangulation complete",
                            "Estimated jamming source location identified",
                        ],
                        800,
                    ),
                    highlight: Some(Highlight {
                        delay_ms: 3200,
                        text: "Impact radius = 500 km (confidence: 0.87)".to_owned(),
                    }),
                }),
            },
            ScriptEvent {
                at: 15,
                effects: vec![ScriptEffect::ProposePlaybook(PlaybookId::from(
                    AVAILABILITY_PLAYBOOK,
                ))],
                narrative: Some(Narrative::ClearDiagnostics),
            },
            ScriptEvent {
                at: 18,
                effects: vec![
                    ScriptEffect::SetLinkState {
                        targets: Targets::Only(SatelliteId::from(SECONDARY_FAILURE_SATELLITE)),
                        state: LinkState::Down,
                    },
                    ScriptEffect::ProposePlaybook(PlaybookId::from(CONTINUITY_PLAYBOOK)),
                ],
                narrative: None,
            },
        ];

        let relay_log = LogScript::new(
            "Command Relay Mode Activation",
            &[
                "Activating Out-of-band tunnel...",
                "Establishing secure ISL channel...",
                "Flock 4g-17: Initiating command relay...",
                "Flock 4g-16: Configuring as relay hub...",
                "Flock 4g-28: Initiating command relay...",
                "Routing commands via ISL mesh...",
                "Validating relay parameters...",
                "All relay nodes synchronized",
                "\u{2713} Command Relay Mode Activated",
            ],
            800,
        );
        // Data transfer starts half a second after the ninth line slot, and
        // the demo completes two seconds after that.
        let transfer_delay_ms = 9 * 800 + 500;
        let complete_delay_ms = 9 * 800 + 2500;

        let playbooks = vec![
            PlaybookTemplate {
                id: PlaybookId::from(AVAILABILITY_PLAYBOOK),
                name: "Availability / Degrade Response".to_owned(),
                actions: strings(&[
                    "Activate out-of-band relay (ISL tunnel)",
                    "RF downlink degrade (graceful degradation)",
                    "Reduce payload transmission rate",
                    "Prioritize critical telemetry channels",
                ]),
                post_effect: PostEffect::OutOfBandFailover { keep: protected },
            },
            PlaybookTemplate {
                id: PlaybookId::from(CONTINUITY_PLAYBOOK),
                name: "Mission Continuity Protocol".to_owned(),
                actions: strings(&[
                    "Publish mission state summary (signed + anti-replay)",
                    "Select candidate replacement satellites (Flock 4g-17 / Flock 4g-28)",
                    "Recommend switching window and degradation strategy",
                ]),
                post_effect: PostEffect::MissionContinuity(ContinuityScript {
                    relay_log,
                    transfer_delay_ms,
                    complete_delay_ms,
                }),
            },
        ];

        Self {
            roster,
            phases,
            events,
            playbooks,
            start_log: LogScript::new("", &["Demo Start..."], 500),
            start_log_hide_ms: 1500,
        }
    }
}

fn sat(
    id: &str,
    lat: f64,
    lon: f64,
    altitude_km: f64,
    vel_lat: f64,
    vel_lon: f64,
) -> SatelliteSpec {
    SatelliteSpec {
        id: SatelliteId::from(id),
        position: GeoPoint { lat, lon },
        altitude_km,
        velocity: Velocity {
            lat: vel_lat,
            lon: vel_lon,
        },
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_owned()).collect()
}
