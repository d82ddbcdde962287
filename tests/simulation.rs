use hotwire::data::simulation::{simulate_with, SimulationConfig, SIM_BASE_TEMPERATURE, SIM_SLOPE};
use hotwire::{simulate_acquisition, FitWindow};

#[test]
fn seeded_runs_are_reproducible() {
    let cfg = SimulationConfig {
        seed: Some(1234),
        ..SimulationConfig::default()
    };
    let a = simulate_with(5.0, &cfg);
    let b = simulate_with(5.0, &cfg);
    assert_eq!(a.snapshot().samples(), b.snapshot().samples());
}

#[test]
fn timestamps_cover_the_duration() {
    let series = simulate_acquisition(6.0);
    assert_eq!(series.len(), 500);
    let ts: Vec<f64> = series.snapshot().timestamps().collect();
    assert!(ts[0] > 0.0);
    assert!(ts.windows(2).all(|w| w[1] > w[0]));
    assert!((ts[ts.len() - 1] - 6.0).abs() < 1e-12);
}

#[test]
fn noiseless_run_follows_the_model() {
    let cfg = SimulationConfig {
        points: 50,
        noise_std: 0.0,
        seed: Some(0),
    };
    for s in simulate_with(5.0, &cfg).iter() {
        let expected = SIM_BASE_TEMPERATURE + SIM_SLOPE * s.timestamp.ln();
        assert!((s.temperature - expected).abs() < 1e-12);
    }
}

#[test]
fn degenerate_requests_yield_empty_series() {
    let none = SimulationConfig {
        points: 0,
        ..SimulationConfig::default()
    };
    assert!(simulate_with(5.0, &none).is_empty());
    assert!(simulate_acquisition(0.0).is_empty());
    assert!(simulate_acquisition(f64::NAN).is_empty());
}

#[test]
fn default_duration_covers_the_fit_window() {
    assert_eq!(SimulationConfig::duration_for(&FitWindow::default()), 5.0);
    assert_eq!(SimulationConfig::duration_for(&FitWindow::new(1.0, 9.0)), 10.0);
}
