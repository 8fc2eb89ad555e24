//! Fitting one IAM model to one curve.
//!
//! Given:
//! - curve angles `θ_i` and observed IAM values `y_i`
//! - optional weights `w_i` (e.g. inverse variance)
//! - a model with initial guess and box bounds
//!
//! we minimize `Σ w_i (f(θ_i; p) - y_i)²` with the bounded Levenberg–Marquardt
//! solver and derive goodness-of-fit metrics and standard errors.
//!
//! `fit` never returns an error: any numerical failure is recorded in the
//! returned `FitResult` with `success = false`.

use std::cell::Cell;
use std::collections::BTreeMap;

use rayon::prelude::*;

use crate::domain::{CurveGrid, FitResult, IamCurvePoint, ParameterEstimate};
use crate::error::AnalysisError;
use crate::math::{LmOptions, solve_bounded};
use crate::models::{IamModel, ModelLibrary};

/// Solver settings applied to every model fit.
#[derive(Debug, Clone, Copy)]
pub struct FitOptions {
    /// Residual-evaluation budget per fit.
    pub max_evaluations: usize,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            max_evaluations: 10_000,
        }
    }
}

/// Fit `model` to `curve`.
pub fn fit(
    model: &dyn IamModel,
    curve: &[IamCurvePoint],
    weights: Option<&[f64]>,
    opts: &FitOptions,
) -> FitResult {
    let name = model.name();
    let n = curve.len();

    if n < model.min_points() {
        return FitResult::failed(
            name,
            format!(
                "insufficient data: {n} point(s), {} requires at least {}",
                model.display_name(),
                model.min_points()
            ),
            0,
        );
    }

    let sqrt_w: Vec<f64> = match weights {
        None => vec![1.0; n],
        Some(w) if w.len() == n && w.iter().all(|v| v.is_finite() && *v > 0.0) => {
            w.iter().map(|v| v.sqrt()).collect()
        }
        Some(w) => {
            return FitResult::failed(
                name,
                format!("invalid weights: expected {n} finite positive values, got {}", w.len()),
                0,
            );
        }
    };

    let angles: Vec<f64> = curve.iter().map(|p| p.angle).collect();
    let observed: Vec<f64> = curve.iter().map(|p| p.iam).collect();
    let (lower, upper): (Vec<f64>, Vec<f64>) = model.bounds().into_iter().unzip();

    let calls = Cell::new(0usize);
    let residuals = |p: &[f64]| -> Vec<f64> {
        calls.set(calls.get() + 1);
        angles
            .iter()
            .zip(&observed)
            .zip(&sqrt_w)
            .map(|((&a, &y), &s)| s * (model.evaluate(a, p) - y))
            .collect()
    };

    let lm_opts = LmOptions {
        max_evaluations: opts.max_evaluations,
        ..LmOptions::default()
    };
    let solution = match solve_bounded(residuals, &model.initial_guess(), &lower, &upper, &lm_opts) {
        Ok(s) => s,
        Err(err) => {
            tracing::warn!(model = %name, %err, "model fit failed");
            return FitResult::failed(name, err.to_string(), calls.get());
        }
    };

    let fitted = match predict(model, &solution.params, &angles) {
        Ok(v) => v,
        Err(err) => return FitResult::failed(name, err.to_string(), solution.evaluations),
    };
    let residuals: Vec<f64> = observed.iter().zip(&fitted).map(|(y, f)| y - f).collect();
    let (r_squared, rmse, mae) = goodness_of_fit(&observed, &fitted);

    let parameters: BTreeMap<String, ParameterEstimate> = model
        .parameter_names()
        .into_iter()
        .zip(solution.params.iter().zip(solution.std_errors()))
        .map(|(n, (&value, std_error))| (n, ParameterEstimate { value, std_error }))
        .collect();

    tracing::debug!(
        model = %name,
        evaluations = solution.evaluations,
        iterations = solution.iterations,
        r_squared,
        rmse,
        "model fit converged"
    );

    FitResult {
        model: name,
        parameters,
        r_squared,
        rmse,
        mae,
        fitted,
        residuals,
        success: true,
        error: None,
        evaluations: solution.evaluations,
    }
}

/// Fit every model in the library independently.
///
/// Fits run in parallel; the result map is ordered by model name so the
/// output does not depend on scheduling.
pub fn fit_all(library: &ModelLibrary, curve: &[IamCurvePoint], opts: &FitOptions) -> BTreeMap<String, FitResult> {
    library
        .models()
        .par_iter()
        .map(|m| (m.name(), fit(m.as_ref(), curve, None, opts)))
        .collect()
}

/// Evaluate a model at arbitrary angles.
pub fn predict(model: &dyn IamModel, params: &[f64], angles: &[f64]) -> Result<Vec<f64>, AnalysisError> {
    let expected = model.parameter_names().len();
    if params.len() != expected {
        return Err(AnalysisError::InvalidConfig(format!(
            "{} expects {expected} parameter(s), got {}",
            model.display_name(),
            params.len()
        )));
    }
    Ok(angles.iter().map(|&a| model.evaluate(a, params)).collect())
}

/// Evenly spaced 0–90° curve of a fitted model.
pub fn generate_smooth_curve(
    model: &dyn IamModel,
    params: &[f64],
    num_points: usize,
) -> Result<CurveGrid, AnalysisError> {
    let n = num_points.max(2);
    let angles: Vec<f64> = (0..n).map(|i| 90.0 * i as f64 / (n - 1) as f64).collect();
    let iam = predict(model, params, &angles)?;
    Ok(CurveGrid {
        model: model.name(),
        angles,
        iam,
    })
}

/// `(R², RMSE, MAE)` of `fitted` against `observed`.
///
/// R² is 0 when the observations have no spread.
pub fn goodness_of_fit(observed: &[f64], fitted: &[f64]) -> (f64, f64, f64) {
    let n = observed.len();
    if n == 0 || fitted.len() != n {
        return (0.0, f64::INFINITY, f64::INFINITY);
    }
    let nf = n as f64;
    let mean = observed.iter().sum::<f64>() / nf;
    let ss_tot: f64 = observed.iter().map(|y| (y - mean).powi(2)).sum();
    let ss_res: f64 = observed.iter().zip(fitted).map(|(y, f)| (y - f).powi(2)).sum();
    let sae: f64 = observed.iter().zip(fitted).map(|(y, f)| (y - f).abs()).sum();

    let r_squared = if ss_tot == 0.0 { 0.0 } else { 1.0 - ss_res / ss_tot };
    (r_squared, (ss_res / nf).sqrt(), sae / nf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{SyntheticOptions, default_angles, generate_measurements};
    use crate::curve::{CurveOptions, build_curve};
    use crate::models::{Ashrae, Physical, Polynomial};

    fn synthetic_curve(model: &dyn IamModel, params: &[f64], noise_sd: f64, seed: u64) -> Vec<IamCurvePoint> {
        let angles: Vec<f64> = (0..=18).map(|i| i as f64 * 5.0).collect();
        let opts = SyntheticOptions {
            noise_sd,
            seed,
            ..SyntheticOptions::default()
        };
        let ms = generate_measurements(model, params, &angles, &opts).unwrap();
        build_curve(&ms, &CurveOptions::default()).unwrap()
    }

    #[test]
    fn recovers_physical_parameter_from_noisy_curve() {
        let curve = synthetic_curve(&Physical, &[0.16], 0.003, 7);
        let fit = fit(&Physical, &curve, None, &FitOptions::default());
        assert!(fit.success, "{:?}", fit.error);
        let a_r = fit.parameters["a_r"];
        assert!((a_r.value - 0.16).abs() < 0.01, "a_r = {}", a_r.value);
        assert!(a_r.std_error.is_finite() && a_r.std_error > 0.0);
        assert!(fit.r_squared > 0.98, "R² = {}", fit.r_squared);
    }

    #[test]
    fn recovers_ashrae_parameter_from_noisy_curve() {
        let curve = synthetic_curve(&Ashrae, &[0.05], 0.003, 11);
        let fit = fit(&Ashrae, &curve, None, &FitOptions::default());
        assert!(fit.success, "{:?}", fit.error);
        assert!((fit.parameters["b0"].value - 0.05).abs() < 0.005);
        assert!(fit.r_squared > 0.98);
        assert_eq!(fit.fitted.len(), curve.len());
        assert_eq!(fit.residuals.len(), curve.len());
    }

    #[test]
    fn polynomial_fits_its_own_shape() {
        let poly = Polynomial::new(2).unwrap();
        let curve = synthetic_curve(&poly, &[-0.2, -0.5], 0.0, 1);
        let fit = fit(&poly, &curve, None, &FitOptions::default());
        assert!(fit.success, "{:?}", fit.error);
        assert!((fit.parameters["a1"].value + 0.2).abs() < 1e-4);
        assert!((fit.parameters["a2"].value + 0.5).abs() < 1e-4);
        assert!(fit.r_squared > 0.999);
    }

    #[test]
    fn insufficient_points_fail_without_panicking() {
        let curve = synthetic_curve(&Physical, &[0.16], 0.0, 1);
        let poly = Polynomial::new(4).unwrap();
        let fit = fit(&poly, &curve[..3], None, &FitOptions::default());
        assert!(!fit.success);
        assert!(fit.parameters.is_empty());
        assert_eq!(fit.r_squared, 0.0);
        assert!(fit.rmse.is_infinite());
        assert!(fit.error.unwrap().contains("insufficient data"));
    }

    #[test]
    fn weights_must_match_curve() {
        let curve = synthetic_curve(&Physical, &[0.16], 0.0, 1);
        let fit = fit(&Physical, &curve, Some(&[1.0, 2.0]), &FitOptions::default());
        assert!(!fit.success);

        let w = vec![1.0; curve.len()];
        let weighted = fit_weighted(&curve, &w);
        assert!(weighted.success);
    }

    fn fit_weighted(curve: &[IamCurvePoint], w: &[f64]) -> FitResult {
        fit(&Physical, curve, Some(w), &FitOptions::default())
    }

    #[test]
    fn exhausted_budget_is_a_failed_fit() {
        let curve = synthetic_curve(&Physical, &[0.3], 0.0, 1);
        let fit = fit(&Physical, &curve, None, &FitOptions { max_evaluations: 2 });
        assert!(!fit.success);
        assert!(fit.error.unwrap().contains("budget"));
        assert_eq!(fit.evaluations, 2);
    }

    #[test]
    fn fit_all_returns_every_model() {
        let curve = synthetic_curve(&Physical, &[0.16], 0.002, 3);
        let fits = fit_all(&ModelLibrary::default(), &curve, &FitOptions::default());
        assert_eq!(fits.len(), 3);
        assert!(fits.values().all(|f| f.success));
    }

    #[test]
    fn quartic_polynomial_converges_within_default_budget() {
        let opts = SyntheticOptions {
            noise_sd: 0.002,
            seed: 3,
            ..SyntheticOptions::default()
        };
        let ms = generate_measurements(&Physical, &[0.16], &default_angles(), &opts).unwrap();
        let curve = build_curve(&ms, &CurveOptions::default()).unwrap();

        let poly = Polynomial::new(4).unwrap();
        let fit = fit(&poly, &curve, None, &FitOptions::default());
        assert!(fit.success, "{:?}", fit.error);
        assert!(fit.evaluations <= 10_000, "evaluations = {}", fit.evaluations);
        assert!(fit.r_squared > 0.99, "R² = {}", fit.r_squared);
        assert!(fit.parameters.values().all(|p| (-2.0..=2.0).contains(&p.value)));
    }

    #[test]
    fn smooth_curve_spans_zero_to_ninety() {
        let grid = generate_smooth_curve(&Physical, &[0.16], 91).unwrap();
        assert_eq!(grid.angles.len(), 91);
        assert_eq!(grid.angles[0], 0.0);
        assert_eq!(grid.angles[90], 90.0);
        assert!((grid.iam[0] - 1.0).abs() < 1e-12);
        assert!(grid.iam.windows(2).all(|w| w[1] <= w[0] + 1e-12));
    }

    #[test]
    fn wrong_parameter_count_is_rejected() {
        assert!(predict(&Ashrae, &[], &[0.0, 45.0]).is_err());
        assert!(predict(&Physical, &[0.1, 0.2], &[30.0]).is_err());
        assert!(generate_smooth_curve(&Physical, &[], 10).is_err());
        assert_eq!(predict(&Ashrae, &[0.05], &[0.0]).unwrap(), vec![1.0]);
    }

    #[test]
    fn r_squared_is_zero_for_flat_observations() {
        let (r2, rmse, mae) = goodness_of_fit(&[1.0, 1.0], &[0.9, 1.1]);
        assert_eq!(r2, 0.0);
        assert!((rmse - 0.1).abs() < 1e-12);
        assert!((mae - 0.1).abs() < 1e-12);
    }
}
