//! Kinematics and synthetic telemetry.
//!
//! The sampler moves each satellite along its constant velocity and
//! redraws its telemetry from ranges chosen by the current link state. It
//! never changes a link state itself.

use fleetsim_types::{LinkState, Satellite, Telemetry};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Upper bound of the degraded SNR random walk.
const DEGRADED_SNR_CEILING: f64 = 7.0;

/// Seeded source of positions and telemetry.
#[derive(Debug, Clone)]
pub struct TelemetrySampler {
    /// Random source for all telemetry draws.
    rng: SmallRng,
    /// Multiplier applied to velocity on every sample tick.
    tick_scale: f64,
}

impl TelemetrySampler {
    /// Create a sampler with a fixed seed.
    pub fn new(seed: u64, tick_scale: f64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
            tick_scale,
        }
    }

    /// Draw telemetry for a satellite whose link state was just assigned.
    pub fn initial(&mut self, state: LinkState) -> Telemetry {
        match state {
            LinkState::Ok => Telemetry {
                snr_db: self.rng.random_range(15.0..25.0),
                packet_loss_pct: self.rng.random_range(0.0..5.0),
            },
            LinkState::Degraded => Telemetry {
                snr_db: self.rng.random_range(5.0..DEGRADED_SNR_CEILING),
                packet_loss_pct: self.rng.random_range(70.0..93.0),
            },
            LinkState::Down => Telemetry {
                snr_db: 0.0,
                packet_loss_pct: 100.0,
            },
            LinkState::OutOfBand => Telemetry {
                snr_db: self.rng.random_range(18.0..25.0),
                packet_loss_pct: self.rng.random_range(0.0..3.0),
            },
        }
    }

    /// Assign a link state and redraw the satellite's telemetry for it.
    pub fn assign(&mut self, satellite: &mut Satellite, state: LinkState) {
        satellite.link_state = state;
        satellite.telemetry = self.initial(state);
    }

    /// Advance one sample tick for every satellite.
    pub fn step(&mut self, satellites: &mut [Satellite]) {
        for sat in satellites {
            sat.position.lat = sat.velocity.lat.mul_add(self.tick_scale, sat.position.lat);
            sat.position.lon = sat.velocity.lon.mul_add(self.tick_scale, sat.position.lon);
            sat.telemetry = self.resample(sat.link_state, sat.telemetry);
        }
    }

    fn resample(&mut self, state: LinkState, previous: Telemetry) -> Telemetry {
        match state {
            // SNR drifts down with jitter biased negative.
            LinkState::Degraded => {
                let jitter = (self.rng.random::<f64>() - 0.6) * 0.5;
                Telemetry {
                    snr_db: (previous.snr_db - 0.1 + jitter).clamp(0.0, DEGRADED_SNR_CEILING),
                    packet_loss_pct: self.rng.random_range(70.0..93.0),
                }
            }
            other => self.initial(other),
        }
    }
}
