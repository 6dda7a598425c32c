//! Power-law trend fitting for band spacings.
//!
//! Band spacing in a stratified sample tends to follow
//! `y = coef * x^pow + offset` along the band index. This module fits that
//! model with a box-constrained Levenberg-Marquardt solver: each step solves
//! the damped 3x3 normal equations and projects the candidate back onto the
//! parameter bounds.

use crate::error::BandError;
use nalgebra::{Matrix3, Vector3};

/// Fitted `y = coef * x^pow + offset`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerLaw {
    pub pow: f64,
    pub coef: f64,
    pub offset: f64,
    /// RMS of the fit residuals
    pub residual_rms: f64,
    /// Solver iterations used
    pub iterations: usize,
}

impl PowerLaw {
    pub fn eval(&self, x: f64) -> f64 {
        model(&Vector3::new(self.pow, self.coef, self.offset), x)
    }
}

/// Bounds and stopping rules for [`fit_power_law`].
///
/// Parameter vectors are ordered `[pow, coef, offset]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerFitOptions {
    /// Starting point; `None` uses `[0.9, 1.0, min(y)]`
    pub initial: Option<[f64; 3]>,
    pub lower: [f64; 3],
    pub upper: [f64; 3],
    pub max_iterations: usize,
    /// Stop once an accepted step improves the cost by less than this fraction
    pub tolerance: f64,
}

impl Default for PowerFitOptions {
    fn default() -> Self {
        Self {
            initial: None,
            lower: [0.001, 0.001, 0.0],
            upper: [100.0, 2.5, 1000.0],
            max_iterations: 200,
            tolerance: 1e-12,
        }
    }
}

const LAMBDA_INIT: f64 = 1e-3;
const LAMBDA_MAX: f64 = 1e12;

fn model(p: &Vector3<f64>, x: f64) -> f64 {
    p[1] * x.powf(p[0]) + p[2]
}

/// Partial derivatives of the model with respect to `[pow, coef, offset]`
fn gradient(p: &Vector3<f64>, x: f64) -> Vector3<f64> {
    let xp = x.powf(p[0]);
    let d_pow = if x > 0.0 { p[1] * xp * x.ln() } else { 0.0 };
    Vector3::new(d_pow, xp, 1.0)
}

fn cost(p: &Vector3<f64>, xs: &[f64], ys: &[f64]) -> f64 {
    xs.iter()
        .zip(ys)
        .map(|(&x, &y)| {
            let r = y - model(p, x);
            r * r
        })
        .sum()
}

fn project(p: Vector3<f64>, lower: &[f64; 3], upper: &[f64; 3]) -> Vector3<f64> {
    Vector3::from_fn(|i, _| p[i].clamp(lower[i], upper[i]))
}

/// Fit `y = coef * x^pow + offset` to `ys`.
///
/// `xs` defaults to `0, 1, 2, ...` when `None`.
///
/// # Errors
/// * `BandError::FitFailed` - fewer than three points, mismatched or
///   non-finite inputs, or a non-finite solution
pub fn fit_power_law(
    ys: &[f64],
    xs: Option<&[f64]>,
    options: &PowerFitOptions,
) -> Result<PowerLaw, BandError> {
    if ys.len() < 3 {
        return Err(BandError::FitFailed(format!(
            "need at least 3 points, got {}",
            ys.len()
        )));
    }

    let xs: Vec<f64> = match xs {
        Some(xs) if xs.len() != ys.len() => {
            return Err(BandError::FitFailed(format!(
                "{} x values for {} y values",
                xs.len(),
                ys.len()
            )));
        }
        Some(xs) => xs.to_vec(),
        None => (0..ys.len()).map(|i| i as f64).collect(),
    };

    if xs.iter().chain(ys).any(|v| !v.is_finite()) {
        return Err(BandError::FitFailed("non-finite input".to_string()));
    }

    let y_min = ys.iter().copied().fold(f64::INFINITY, f64::min);
    let initial = options.initial.unwrap_or([0.9, 1.0, y_min]);
    let mut params = project(Vector3::from(initial), &options.lower, &options.upper);
    let mut current = cost(&params, &xs, ys);
    let mut lambda = LAMBDA_INIT;
    let mut iterations = 0;

    while iterations < options.max_iterations && lambda < LAMBDA_MAX && current > 0.0 {
        iterations += 1;

        let mut jtj = Matrix3::zeros();
        let mut jtr = Vector3::zeros();
        for (&x, &y) in xs.iter().zip(ys) {
            let g = gradient(&params, x);
            jtj += g * g.transpose();
            jtr += g * (y - model(&params, x));
        }

        let mut damped = jtj;
        for i in 0..3 {
            damped[(i, i)] += lambda * jtj[(i, i)].max(1e-12);
        }

        let Some(delta) = damped.lu().solve(&jtr) else {
            lambda *= 10.0;
            continue;
        };

        let candidate = project(params + delta, &options.lower, &options.upper);
        let candidate_cost = cost(&candidate, &xs, ys);

        if candidate_cost < current {
            let improvement = (current - candidate_cost) / current;
            params = candidate;
            current = candidate_cost;
            lambda = (lambda / 10.0).max(1e-12);
            if improvement < options.tolerance {
                break;
            }
        } else {
            lambda *= 10.0;
        }
    }

    if params.iter().any(|v| !v.is_finite()) || !current.is_finite() {
        return Err(BandError::FitFailed("solver diverged".to_string()));
    }

    let fit = PowerLaw {
        pow: params[0],
        coef: params[1],
        offset: params[2],
        residual_rms: (current / ys.len() as f64).sqrt(),
        iterations,
    };
    log::debug!(
        "Power-law fit: {:.4} * x^{:.4} + {:.4} (rms {:.4}, {} iterations)",
        fit.coef,
        fit.pow,
        fit.offset,
        fit.residual_rms,
        fit.iterations
    );

    Ok(fit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_recovers_exact_power_law() {
        let ys: Vec<f64> = (0..16).map(|i| 1.5 * (i as f64).powf(1.2) + 10.0).collect();
        let fit = fit_power_law(&ys, None, &PowerFitOptions::default()).unwrap();

        assert_relative_eq!(fit.pow, 1.2, epsilon = 1e-4);
        assert_relative_eq!(fit.coef, 1.5, epsilon = 1e-4);
        assert_relative_eq!(fit.offset, 10.0, epsilon = 1e-3);
        assert!(fit.residual_rms < 1e-4);
        assert_relative_eq!(fit.eval(4.0), ys[4], epsilon = 1e-3);
    }

    #[test]
    fn test_explicit_x_values() {
        let xs = [1.0, 2.0, 4.0, 8.0, 16.0];
        let ys: Vec<f64> = xs.iter().map(|x: &f64| 2.0 * x.powf(0.5) + 3.0).collect();
        let fit = fit_power_law(&ys, Some(&xs), &PowerFitOptions::default()).unwrap();
        assert_relative_eq!(fit.pow, 0.5, epsilon = 1e-3);
        assert_relative_eq!(fit.coef, 2.0, epsilon = 1e-3);
    }

    #[test]
    fn test_respects_bounds() {
        // Slope of 5 exceeds the coefficient bound of 2.5
        let ys: Vec<f64> = (0..10).map(|i| 5.0 * i as f64 + 2.0).collect();
        let options = PowerFitOptions::default();
        let fit = fit_power_law(&ys, None, &options).unwrap();

        assert!(fit.coef <= options.upper[1]);
        assert!(fit.coef >= options.lower[1]);
        assert!(fit.pow >= options.lower[0] && fit.pow <= options.upper[0]);
        assert!(fit.offset >= 0.0);
    }

    #[test]
    fn test_too_few_points() {
        assert!(matches!(
            fit_power_law(&[1.0, 2.0], None, &PowerFitOptions::default()),
            Err(BandError::FitFailed(_))
        ));
    }

    #[test]
    fn test_mismatched_x() {
        let result = fit_power_law(&[1.0, 2.0, 3.0], Some(&[0.0, 1.0]), &PowerFitOptions::default());
        assert!(result.is_err());
    }
}
