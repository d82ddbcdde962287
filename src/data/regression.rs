//! Logarithmic regression and hot-wire physics.
//!
//! For an infinite line source heated with constant linear power `q`, the
//! late-time temperature rise follows `T(t) = m·ln(t) + b` with
//! `m = q / (4π·λ)`. Fitting `T` against `ln(t)` over a window therefore gives
//! the thermal conductivity `λ = q / (4π·m)`.

use serde::{Deserialize, Serialize};

use super::series::Sample;
use crate::error::RegressionError;

/// Minimum number of samples a fit window must contain.
pub const MIN_FIT_SAMPLES: usize = 10;

/// Slopes smaller than this in magnitude are treated as zero.
pub const SLOPE_EPSILON: f64 = 1e-12;

/// Electrical parameters of the heated wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicalParameters {
    /// Heating current in A.
    pub current: f64,
    /// Wire resistance in Ω.
    pub wire_resistance: f64,
    /// Wire length in m.
    pub wire_length: f64,
}

impl Default for PhysicalParameters {
    fn default() -> Self {
        Self {
            current: 0.5,
            wire_resistance: 10.0,
            wire_length: 0.1,
        }
    }
}

impl PhysicalParameters {
    /// Dissipated power `P = I²·R` in W.
    pub fn power(&self) -> f64 {
        self.current * self.current * self.wire_resistance
    }

    /// Linear power density `q = P / L` in W/m.
    pub fn linear_power(&self) -> f64 {
        self.power() / self.wire_length
    }

    fn validate(&self) -> Result<(), RegressionError> {
        if !self.current.is_finite() {
            return Err(RegressionError::InvalidParameters("current must be finite"));
        }
        if !self.wire_resistance.is_finite() || self.wire_resistance < 0.0 {
            return Err(RegressionError::InvalidParameters(
                "wire resistance must be finite and non-negative",
            ));
        }
        if !self.wire_length.is_finite() || self.wire_length <= 0.0 {
            return Err(RegressionError::InvalidParameters(
                "wire length must be finite and positive",
            ));
        }
        Ok(())
    }
}

/// Inclusive time range `[start, end]` (seconds) the regression runs over.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitWindow {
    pub start: f64,
    pub end: f64,
}

impl Default for FitWindow {
    fn default() -> Self {
        Self {
            start: 0.2,
            end: 4.0,
        }
    }
}

impl FitWindow {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// `start < end`; NaN bounds never validate.
    pub fn validate(&self) -> Result<(), RegressionError> {
        if self.start < self.end {
            Ok(())
        } else {
            Err(RegressionError::InvalidWindow {
                start: self.start,
                end: self.end,
            })
        }
    }

    #[inline]
    pub fn contains(&self, t: f64) -> bool {
        t >= self.start && t <= self.end
    }
}

/// Outcome of a successful fit.
#[derive(Debug, Clone, PartialEq)]
pub struct FitResult {
    /// `m` in °C per ln(s).
    pub slope: f64,
    /// `b` in °C.
    pub intercept: f64,
    /// Thermal conductivity λ in W/(m·K).
    pub lambda: f64,
    /// Electrical power P in W.
    pub power: f64,
    /// Linear power density q in W/m.
    pub linear_power: f64,
    /// `[t, m·ln(t)+b]` at every sample used by the fit.
    pub predicted: Vec<[f64; 2]>,
    pub samples_used: usize,
    /// Coefficient of determination of the ln(t) fit.
    pub r_squared: f64,
}

/// Slope and intercept of an ordinary least-squares line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
}

/// Least-squares fit of `y = slope·x + intercept` using centered sums.
///
/// Returns `None` for fewer than two points or when all `x` are equal.
pub fn linear_least_squares(xs: &[f64], ys: &[f64]) -> Option<LinearFit> {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return None;
    }
    let nf = n as f64;
    let mean_x = xs[..n].iter().sum::<f64>() / nf;
    let mean_y = ys[..n].iter().sum::<f64>() / nf;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    let mut syy = 0.0;
    for (x, y) in xs[..n].iter().zip(&ys[..n]) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxx += dx * dx;
        sxy += dx * dy;
        syy += dy * dy;
    }
    if sxx <= 0.0 {
        return None;
    }
    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;
    // A flat series is fitted exactly by a zero slope.
    let r_squared = if syy > 0.0 { (sxy * sxy) / (sxx * syy) } else { 1.0 };
    Some(LinearFit {
        slope,
        intercept,
        r_squared,
    })
}

/// Fit `T` against `ln(t)` over `window` and derive λ.
pub fn calculate_lambda(
    samples: &[Sample],
    window: FitWindow,
    params: &PhysicalParameters,
) -> Result<FitResult, RegressionError> {
    window.validate()?;
    params.validate()?;

    // ln(t) is undefined for t <= 0.
    let selected: Vec<Sample> = samples
        .iter()
        .copied()
        .filter(|s| window.contains(s.timestamp) && s.timestamp > 0.0)
        .collect();

    if selected.len() < MIN_FIT_SAMPLES {
        return Err(RegressionError::InsufficientData {
            found: selected.len(),
            required: MIN_FIT_SAMPLES,
        });
    }

    let ln_t: Vec<f64> = selected.iter().map(|s| s.timestamp.ln()).collect();
    let temps: Vec<f64> = selected.iter().map(|s| s.temperature).collect();

    let fit = linear_least_squares(&ln_t, &temps).ok_or(RegressionError::DegenerateWindow)?;
    if !fit.slope.is_finite() || fit.slope.abs() < SLOPE_EPSILON {
        return Err(RegressionError::DivisionByZero);
    }

    let power = params.power();
    let linear_power = params.linear_power();
    let lambda = linear_power / (4.0 * std::f64::consts::PI * fit.slope);

    let predicted = selected
        .iter()
        .zip(&ln_t)
        .map(|(s, x)| [s.timestamp, fit.slope * x + fit.intercept])
        .collect();

    log::debug!(
        "ln(t) fit over [{}, {}] s: m={:.6}, b={:.6}, λ={:.4} W/(m·K), n={}",
        window.start,
        window.end,
        fit.slope,
        fit.intercept,
        lambda,
        ln_t.len()
    );

    Ok(FitResult {
        slope: fit.slope,
        intercept: fit.intercept,
        lambda,
        power,
        linear_power,
        predicted,
        samples_used: ln_t.len(),
        r_squared: fit.r_squared,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_recovers_exact_line() {
        let xs = [0.0, 1.0, 2.0, 3.0];
        let ys = [1.0, 3.0, 5.0, 7.0];
        let fit = linear_least_squares(&xs, &ys).unwrap();
        assert!((fit.slope - 2.0).abs() < 1e-12);
        assert!((fit.intercept - 1.0).abs() < 1e-12);
        assert!((fit.r_squared - 1.0).abs() < 1e-12);
    }

    #[test]
    fn least_squares_rejects_constant_x() {
        assert!(linear_least_squares(&[2.0, 2.0, 2.0], &[1.0, 2.0, 3.0]).is_none());
        assert!(linear_least_squares(&[1.0], &[1.0]).is_none());
    }
}
