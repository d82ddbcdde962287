//! Synthetic hot-wire response for demonstration and headless testing.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::regression::FitWindow;
use super::series::{Sample, SampleSeries};

/// Baseline temperature of the simulated wire in °C.
pub const SIM_BASE_TEMPERATURE: f64 = 20.0;
/// Simulated ln(t) slope in °C.
pub const SIM_SLOPE: f64 = 5.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Number of samples generated over the requested duration.
    pub points: usize,
    /// Standard deviation of the Gaussian temperature noise in °C.
    pub noise_std: f64,
    /// Fixed RNG seed; `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            points: 500,
            noise_std: 0.05,
            seed: None,
        }
    }
}

impl SimulationConfig {
    /// Duration that comfortably covers a fit window: `max(5 s, end + 1 s)`.
    pub fn duration_for(window: &FitWindow) -> f64 {
        (window.end + 1.0).max(5.0)
    }
}

/// `T = 20 + 5·ln(t) + noise` with default settings.
pub fn simulate_acquisition(duration: f64) -> SampleSeries {
    simulate_with(duration, &SimulationConfig::default())
}

/// Generate `cfg.points` samples with `t` evenly spaced over `(0, duration]`.
pub fn simulate_with(duration: f64, cfg: &SimulationConfig) -> SampleSeries {
    let mut rng = match cfg.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let n = cfg.points;
    if n == 0 || !(duration > 0.0) {
        return SampleSeries::new();
    }
    let dt = duration / n as f64;
    (1..=n)
        .map(|i| {
            let t = dt * i as f64;
            let noise = if cfg.noise_std > 0.0 {
                cfg.noise_std * standard_normal(&mut rng)
            } else {
                0.0
            };
            Sample::new(t, SIM_BASE_TEMPERATURE + SIM_SLOPE * t.ln() + noise)
        })
        .collect()
}

/// Box-Muller transform.
fn standard_normal<R: Rng>(rng: &mut R) -> f64 {
    // u1 in (0, 1] keeps ln finite.
    let u1: f64 = 1.0 - rng.random::<f64>();
    let u2: f64 = rng.random::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_span_open_to_closed_interval() {
        let cfg = SimulationConfig {
            points: 50,
            noise_std: 0.0,
            seed: Some(1),
        };
        let series = simulate_with(5.0, &cfg);
        assert_eq!(series.len(), 50);
        let first = series.iter().next().unwrap().timestamp;
        assert!(first > 0.0);
        assert!((series.last().unwrap().timestamp - 5.0).abs() < 1e-12);
    }

    #[test]
    fn normal_draws_are_centered() {
        let mut rng = StdRng::seed_from_u64(7);
        let n = 20_000;
        let mean = (0..n).map(|_| standard_normal(&mut rng)).sum::<f64>() / n as f64;
        assert!(mean.abs() < 0.05);
    }
}
