use approx::assert_abs_diff_eq;

use hotwire::data::regression::{calculate_lambda, FitWindow, PhysicalParameters, MIN_FIT_SAMPLES};
use hotwire::data::series::{Sample, SampleSeries};
use hotwire::data::simulation::{simulate_with, SimulationConfig};
use hotwire::RegressionError;

fn log_series(ts: impl IntoIterator<Item = f64>) -> Vec<Sample> {
    ts.into_iter()
        .map(|t| Sample::new(t, 20.0 + 5.0 * t.ln()))
        .collect()
}

fn linspace(a: f64, b: f64, n: usize) -> impl Iterator<Item = f64> {
    (0..n).map(move |i| a + (b - a) * i as f64 / (n - 1) as f64)
}

#[test]
fn noiseless_series_recovers_slope_and_intercept() {
    let samples = log_series(linspace(0.1, 10.0, 200));
    let fit = calculate_lambda(&samples, FitWindow::new(0.2, 4.0), &PhysicalParameters::default())
        .expect("fit");
    assert_abs_diff_eq!(fit.slope, 5.0, epsilon = 1e-3);
    assert_abs_diff_eq!(fit.intercept, 20.0, epsilon = 1e-3);
    assert_abs_diff_eq!(fit.r_squared, 1.0, epsilon = 1e-9);
    assert!(fit.predicted.iter().all(|p| p[0] >= 0.2 && p[0] <= 4.0));
    assert_eq!(fit.predicted.len(), fit.samples_used);
}

#[test]
fn conductivity_from_known_slope() {
    let samples = log_series(linspace(0.1, 10.0, 100));
    let params = PhysicalParameters {
        current: 0.5,
        wire_resistance: 10.0,
        wire_length: 0.1,
    };
    let fit = calculate_lambda(&samples, FitWindow::new(0.2, 4.0), &params).unwrap();
    assert_abs_diff_eq!(fit.power, 2.5, epsilon = 1e-12);
    assert_abs_diff_eq!(fit.linear_power, 25.0, epsilon = 1e-12);
    assert_abs_diff_eq!(fit.lambda, 0.3979, epsilon = 1e-4);
    assert_abs_diff_eq!(
        fit.lambda,
        25.0 / (4.0 * std::f64::consts::PI * 5.0),
        epsilon = 1e-9
    );
}

#[test]
fn nine_samples_are_not_enough_ten_are() {
    let nine = log_series((1..=9).map(f64::from));
    let window = FitWindow::new(0.5, 20.0);
    let params = PhysicalParameters::default();
    assert_eq!(
        calculate_lambda(&nine, window, &params),
        Err(RegressionError::InsufficientData {
            found: 9,
            required: MIN_FIT_SAMPLES
        })
    );

    let ten = log_series((1..=10).map(f64::from));
    let fit = calculate_lambda(&ten, window, &params).expect("ten samples fit");
    assert_eq!(fit.samples_used, 10);
}

#[test]
fn inverted_window_is_rejected_before_scanning() {
    // An empty series would otherwise report missing data.
    let params = PhysicalParameters::default();
    for (start, end) in [(4.0, 0.2), (1.0, 1.0), (f64::NAN, 1.0)] {
        let err = calculate_lambda(&[], FitWindow::new(start, end), &params).unwrap_err();
        assert!(matches!(err, RegressionError::InvalidWindow { .. }), "{err:?}");
    }
}

#[test]
fn non_positive_timestamps_are_excluded() {
    let mut samples = vec![
        Sample::new(-1.0, 0.0),
        Sample::new(0.0, 0.0),
        Sample::new(0.0, 100.0),
    ];
    samples.extend(log_series((1..=10).map(f64::from)));
    let fit = calculate_lambda(&samples, FitWindow::new(-5.0, 20.0), &PhysicalParameters::default())
        .unwrap();
    assert_eq!(fit.samples_used, 10);
    assert_abs_diff_eq!(fit.slope, 5.0, epsilon = 1e-9);
}

#[test]
fn flat_temperature_is_a_division_by_zero() {
    let samples: Vec<Sample> = (1..=20).map(|t| Sample::new(f64::from(t), 21.0)).collect();
    assert_eq!(
        calculate_lambda(&samples, FitWindow::new(0.0, 30.0), &PhysicalParameters::default()),
        Err(RegressionError::DivisionByZero)
    );
}

#[test]
fn identical_timestamps_are_degenerate() {
    let samples: Vec<Sample> = (0..12).map(|i| Sample::new(1.0, 20.0 + i as f64)).collect();
    assert_eq!(
        calculate_lambda(&samples, FitWindow::new(0.5, 3.0), &PhysicalParameters::default()),
        Err(RegressionError::DegenerateWindow)
    );
}

#[test]
fn invalid_wire_length_is_rejected() {
    let samples = log_series((1..=10).map(f64::from));
    let params = PhysicalParameters {
        wire_length: 0.0,
        ..PhysicalParameters::default()
    };
    assert!(matches!(
        calculate_lambda(&samples, FitWindow::new(0.5, 20.0), &params),
        Err(RegressionError::InvalidParameters(_))
    ));
}

#[test]
fn fit_is_deterministic() {
    let cfg = SimulationConfig {
        seed: Some(42),
        ..SimulationConfig::default()
    };
    let series: SampleSeries = simulate_with(5.0, &cfg);
    let snap = series.snapshot();
    let window = FitWindow::default();
    let params = PhysicalParameters::default();
    let a = calculate_lambda(&snap, window, &params).unwrap();
    let b = calculate_lambda(&snap, window, &params).unwrap();
    assert_eq!(a, b);
}

#[test]
fn noisy_simulation_fits_close_to_model() {
    let cfg = SimulationConfig {
        seed: Some(7),
        ..SimulationConfig::default()
    };
    let series = simulate_with(SimulationConfig::duration_for(&FitWindow::default()), &cfg);
    let fit = calculate_lambda(&series.snapshot(), FitWindow::default(), &PhysicalParameters::default())
        .unwrap();
    assert_abs_diff_eq!(fit.slope, 5.0, epsilon = 0.05);
    assert_abs_diff_eq!(fit.intercept, 20.0, epsilon = 0.05);
}
