//! Analysis configuration.
//!
//! The configuration is an explicit, caller-constructed value: the engine keeps
//! no global defaults, so unrelated analyses never share hidden state.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::domain::{Metric, ModelSpec, SelectionCriterion};
use crate::error::AnalysisError;

/// R² cut-offs for the qualitative quality tiers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitQualityThresholds {
    pub excellent: f64,
    pub good: f64,
    pub acceptable: f64,
}

impl Default for FitQualityThresholds {
    fn default() -> Self {
        Self {
            excellent: 0.99,
            good: 0.95,
            acceptable: 0.90,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub metric: Metric,
    /// Reference angle (degrees) the curve is normalized against.
    pub normalization_angle: f64,
    pub correct_irradiance: bool,
    /// Irradiance deviation (W/m²) above which a point is corrected.
    pub irradiance_tolerance: f64,
    /// Models to fit, in report order.
    pub models: Vec<ModelSpec>,
    /// Model reported when no fit succeeds.
    pub default_model: String,
    pub criterion: SelectionCriterion,
    pub fit_quality_thresholds: FitQualityThresholds,
    /// Angles a complete test campaign is expected to cover.
    pub recommended_angles: Vec<f64>,
    /// Match tolerance (degrees) for the completeness check.
    pub completeness_tolerance: f64,
    /// Solver budget of residual evaluations per model fit.
    pub max_evaluations: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            metric: Metric::Pmax,
            normalization_angle: 0.0,
            correct_irradiance: true,
            irradiance_tolerance: 10.0,
            models: ModelSpec::default_set(),
            default_model: ModelSpec::Physical.name(),
            criterion: SelectionCriterion::RSquared,
            fit_quality_thresholds: FitQualityThresholds::default(),
            recommended_angles: (0..=9).map(|i| i as f64 * 10.0).collect(),
            completeness_tolerance: 1.0,
            max_evaluations: 10_000,
        }
    }
}

impl AnalysisConfig {
    /// Reject settings the pipeline cannot honour.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        let bad = |msg: String| Err(AnalysisError::InvalidConfig(msg));

        if !self.normalization_angle.is_finite() {
            return bad("normalization_angle must be finite".into());
        }
        if !(self.irradiance_tolerance.is_finite() && self.irradiance_tolerance >= 0.0) {
            return bad("irradiance_tolerance must be finite and >= 0".into());
        }
        if !(self.completeness_tolerance.is_finite() && self.completeness_tolerance >= 0.0) {
            return bad("completeness_tolerance must be finite and >= 0".into());
        }
        if self.recommended_angles.iter().any(|a| !a.is_finite()) {
            return bad("recommended_angles must be finite".into());
        }
        if self.max_evaluations == 0 {
            return bad("max_evaluations must be > 0".into());
        }

        let t = self.fit_quality_thresholds;
        for (name, v) in [("excellent", t.excellent), ("good", t.good), ("acceptable", t.acceptable)] {
            if !(v.is_finite() && (0.0..=1.0).contains(&v)) {
                return bad(format!("fit quality threshold '{name}' must lie in [0, 1], got {v}"));
            }
        }
        if !(t.excellent >= t.good && t.good >= t.acceptable) {
            return bad("fit quality thresholds must satisfy excellent >= good >= acceptable".into());
        }

        if self.models.is_empty() {
            return bad("at least one model must be configured".into());
        }
        let mut seen = HashSet::new();
        for spec in &self.models {
            if let ModelSpec::Polynomial { degree } = spec {
                if !(2..=4).contains(degree) {
                    return bad(format!("polynomial degree must be 2..=4, got {degree}"));
                }
            }
            if !seen.insert(spec.name()) {
                return bad(format!("model '{}' configured twice", spec.name()));
            }
        }
        if !seen.contains(&self.default_model) {
            return Err(AnalysisError::UnknownModel(self.default_model.clone()));
        }

        Ok(())
    }
}
