//! End-to-end IAM analysis.
//!
//! Measurements -> curve -> {validation, per-model fits} -> selection -> result.
//!
//! Structural problems (no data, zero normalization value) are returned as
//! errors straight away. Validation problems only add warnings. Model fit
//! failures are recorded per model; only when *every* model fails does the
//! analysis fail with `NoValidFit`, and even then the curve, validation and all
//! fit attempts travel with the error.

use crate::curve::{CurveOptions, build_curve, statistics, validate};
use crate::domain::{AnalysisConfig, AnalysisResult, FitResult, Measurement};
use crate::error::{AnalysisError, PartialAnalysis};
use crate::fit::{FitOptions, classify_quality, fit_all, select_best};
use crate::models::ModelLibrary;

/// Configured analysis engine. Immutable once built; safe to share.
#[derive(Debug)]
pub struct IamAnalyzer {
    config: AnalysisConfig,
    library: ModelLibrary,
}

impl IamAnalyzer {
    pub fn new(config: AnalysisConfig) -> Result<Self, AnalysisError> {
        config.validate()?;
        let library = ModelLibrary::from_specs(&config.models)?;
        Ok(Self { config, library })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn library(&self) -> &ModelLibrary {
        &self.library
    }

    pub fn analyze(&self, measurements: &[Measurement]) -> Result<AnalysisResult, AnalysisError> {
        let config = &self.config;
        if measurements.is_empty() {
            return Err(AnalysisError::NoMeasurements);
        }

        let curve = build_curve(measurements, &CurveOptions::from(config))?;

        let validation = validate(&curve);
        for warning in &validation.warnings {
            tracing::warn!(%warning, "curve validation");
        }

        let fit_opts = FitOptions {
            max_evaluations: config.max_evaluations,
        };
        let fits = fit_all(&self.library, &curve, &fit_opts);
        let stats = statistics(&curve);
        let completeness_pct = data_completeness(
            measurements,
            &config.recommended_angles,
            config.completeness_tolerance,
        );

        let best_fit: FitResult = match select_best(&fits, config.criterion) {
            Ok(best) => best.clone(),
            Err(_) => {
                let fallback = fits.get(&config.default_model).cloned();
                match fallback {
                    Some(f) if f.success => {
                        tracing::warn!(model = %f.model, "selection failed; using default model");
                        f
                    }
                    fallback => {
                        tracing::warn!(
                            models = fits.len(),
                            "no model produced a valid fit; analysis inconclusive"
                        );
                        return Err(AnalysisError::NoValidFit {
                            partial: Some(Box::new(PartialAnalysis {
                                curve,
                                validation,
                                statistics: stats,
                                completeness_pct,
                                fits,
                                fallback,
                            })),
                        });
                    }
                }
            }
        };

        let quality_tier = classify_quality(best_fit.r_squared, &config.fit_quality_thresholds);
        tracing::info!(
            model = %best_fit.model,
            r_squared = best_fit.r_squared,
            tier = quality_tier.display_name(),
            completeness_pct,
            points = curve.len(),
            "IAM analysis complete"
        );

        Ok(AnalysisResult {
            metric: config.metric,
            normalization_angle: config.normalization_angle,
            curve,
            best_fit,
            fits,
            quality_tier,
            completeness_pct,
            validation,
            statistics: stats,
        })
    }
}

/// One-shot convenience: build an analyzer for `config` and run it.
pub fn analyze(measurements: &[Measurement], config: &AnalysisConfig) -> Result<AnalysisResult, AnalysisError> {
    IamAnalyzer::new(config.clone())?.analyze(measurements)
}

/// Percentage of `recommended` angles with a measurement within `tolerance`.
///
/// An empty recommended set counts as fully covered.
pub fn data_completeness(measurements: &[Measurement], recommended: &[f64], tolerance: f64) -> f64 {
    if recommended.is_empty() {
        return 100.0;
    }
    let covered = recommended
        .iter()
        .filter(|&&r| measurements.iter().any(|m| (m.angle - r).abs() <= tolerance))
        .count();
    100.0 * covered as f64 / recommended.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::interpolate;
    use crate::data::{SyntheticOptions, default_angles, generate_measurements};
    use crate::domain::{InterpolationMethod, Metric, ModelSpec, QualityTier};
    use crate::fit::FitOptions;
    use crate::models::Physical;

    fn pmax(angle: f64, value: f64) -> Measurement {
        Measurement::new(angle, Metric::Pmax, value, 1000.0)
    }

    fn scenario_one() -> Vec<Measurement> {
        vec![pmax(0.0, 300.0), pmax(30.0, 280.0), pmax(60.0, 180.0), pmax(80.0, 60.0)]
    }

    #[test]
    fn scenario_basic_four_angle_campaign() {
        let result = analyze(&scenario_one(), &AnalysisConfig::default()).unwrap();
        assert!((result.curve[0].iam - 1.0).abs() < 1e-12);
        assert!((result.curve[3].iam - 0.2).abs() < 1e-12);
        assert_eq!(result.fits.len(), 3);
        // Four points cannot support the degree-4 polynomial.
        assert!(!result.fits["polynomial_4"].success);
        assert!(result.best_fit.success);
        assert_ne!(result.best_fit.model, "polynomial_4");
        assert!((result.completeness_pct - 40.0).abs() < 1e-12);
        assert_eq!(result.statistics.count, 4);
        assert!(result.statistics.reference_at(60.0).is_some_and(|r| !r.interpolated));
    }

    #[test]
    fn scenario_zero_normalization_value() {
        let ms = vec![pmax(0.0, 0.0), pmax(30.0, 10.0), pmax(60.0, 5.0)];
        let err = analyze(&ms, &AnalysisConfig::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::DivisionByZero { .. }));
    }

    #[test]
    fn scenario_single_measurement() {
        let ms = vec![pmax(45.0, 250.0)];
        let config = AnalysisConfig::default();
        let analyzer = IamAnalyzer::new(config).unwrap();
        let curve = build_curve(&ms, &CurveOptions::from(analyzer.config())).unwrap();

        let fits = fit_all(analyzer.library(), &curve, &FitOptions::default());
        assert!(fits["ashrae"].success, "{:?}", fits["ashrae"].error);
        assert!(fits["physical"].success, "{:?}", fits["physical"].error);
        assert!(!fits["polynomial_4"].success);

        let interp = interpolate(&curve, &[30.0], InterpolationMethod::Cubic).unwrap();
        assert_eq!(interp[0].method, InterpolationMethod::Linear);

        let result = analyzer.analyze(&ms).unwrap();
        assert!((result.curve[0].iam - 1.0).abs() < 1e-12);
        assert_eq!(result.quality_tier, QualityTier::Poor);
    }

    #[test]
    fn scenario_overshoot_still_yields_full_result() {
        let ms = vec![
            pmax(0.0, 300.0),
            pmax(10.0, 330.0),
            pmax(30.0, 290.0),
            pmax(50.0, 250.0),
            pmax(60.0, 200.0),
            pmax(70.0, 140.0),
            pmax(80.0, 60.0),
        ];
        let result = analyze(&ms, &AnalysisConfig::default()).unwrap();
        assert!(!result.validation.is_valid);
        assert!(result.validation.warnings.iter().any(|w| w.contains("exceeds 1.05")));
        assert!(result.best_fit.success);
        assert_eq!(result.curve.len(), 7);
    }

    #[test]
    fn empty_input_is_no_measurements() {
        assert!(matches!(
            analyze(&[], &AnalysisConfig::default()),
            Err(AnalysisError::NoMeasurements)
        ));
    }

    #[test]
    fn every_model_failing_returns_partial_results() {
        let config = AnalysisConfig {
            models: vec![ModelSpec::Polynomial { degree: 4 }],
            default_model: "polynomial_4".into(),
            ..AnalysisConfig::default()
        };
        let ms = vec![pmax(0.0, 300.0), pmax(40.0, 270.0)];
        let err = analyze(&ms, &config).unwrap_err();
        let partial = match err {
            AnalysisError::NoValidFit { partial: Some(p) } => p,
            other => panic!("expected NoValidFit with partial results, got {other:?}"),
        };
        assert_eq!(partial.curve.len(), 2);
        assert_eq!(partial.fits.len(), 1);
        assert!(partial.fallback.as_ref().is_some_and(|f| !f.success));
        assert!((partial.completeness_pct - 20.0).abs() < 1e-12);
    }

    #[test]
    fn repeated_analysis_is_identical() {
        let opts = SyntheticOptions {
            noise_sd: 0.004,
            seed: 21,
            ..SyntheticOptions::default()
        };
        let ms = generate_measurements(&Physical, &[0.18], &default_angles(), &opts).unwrap();
        let config = AnalysisConfig::default();
        let a = analyze(&ms, &config).unwrap();
        let b = analyze(&ms, &config).unwrap();
        assert_eq!(a, b);
        assert!(a.best_fit.r_squared > 0.98);
        assert!(matches!(a.quality_tier, QualityTier::Excellent | QualityTier::Good));
    }

    #[test]
    fn best_fit_dominates_other_successes() {
        let opts = SyntheticOptions {
            noise_sd: 0.01,
            seed: 5,
            ..SyntheticOptions::default()
        };
        let ms = generate_measurements(&Physical, &[0.25], &default_angles(), &opts).unwrap();
        let result = analyze(&ms, &AnalysisConfig::default()).unwrap();
        for f in result.fits.values().filter(|f| f.success) {
            assert!(result.best_fit.r_squared >= f.r_squared);
        }
    }

    #[test]
    fn completeness_uses_tolerance() {
        let ms = vec![pmax(0.4, 1.0), pmax(10.9, 1.0), pmax(22.0, 1.0)];
        let pct = data_completeness(&ms, &[0.0, 10.0, 20.0, 30.0], 1.0);
        assert!((pct - 50.0).abs() < 1e-12);
        assert_eq!(data_completeness(&ms, &[], 1.0), 100.0);
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let config = AnalysisConfig {
            default_model: "nope".into(),
            ..AnalysisConfig::default()
        };
        assert!(matches!(IamAnalyzer::new(config), Err(AnalysisError::UnknownModel(_))));
    }
}
