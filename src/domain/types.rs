//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during curve building and fitting
//! - handed to a caller that embeds them in its own execution record
//! - exported to JSON/CSV by the `iam` binary

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Which performance metric the IAM curve is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// Maximum power (W).
    Pmax,
    /// Short-circuit current (A).
    Isc,
    /// Open-circuit voltage (V).
    Voc,
}

impl Metric {
    pub fn label(self) -> &'static str {
        match self {
            Metric::Pmax => "pmax",
            Metric::Isc => "isc",
            Metric::Voc => "voc",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Metric::Pmax => "W",
            Metric::Isc => "A",
            Metric::Voc => "V",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One angle-resolved measurement as captured by the lab.
///
/// A record may carry any subset of the three metrics; the curve builder only
/// requires the one it is asked to use.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Angle of incidence in degrees (0 = normal incidence).
    pub angle: f64,
    pub pmax: Option<f64>,
    pub isc: Option<f64>,
    pub voc: Option<f64>,
    /// Irradiance actually present during the measurement (W/m²).
    pub irradiance: f64,
}

impl Measurement {
    /// Measurement carrying a single metric value.
    pub fn new(angle: f64, metric: Metric, value: f64, irradiance: f64) -> Self {
        let mut m = Self {
            angle,
            pmax: None,
            isc: None,
            voc: None,
            irradiance,
        };
        match metric {
            Metric::Pmax => m.pmax = Some(value),
            Metric::Isc => m.isc = Some(value),
            Metric::Voc => m.voc = Some(value),
        }
        m
    }

    pub fn value(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Pmax => self.pmax,
            Metric::Isc => self.isc,
            Metric::Voc => self.voc,
        }
    }
}

/// One normalized point on an IAM curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IamCurvePoint {
    pub angle: f64,
    pub iam: f64,
    /// The metric value the IAM was derived from.
    pub raw_value: f64,
    pub irradiance: f64,
    pub irradiance_corrected: bool,
}

/// Fitted value of one model parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterEstimate {
    pub value: f64,
    /// Standard error from the covariance diagonal. `+∞` when the fit has
    /// zero residual degrees of freedom.
    pub std_error: f64,
}

/// Outcome of fitting one model to one curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    pub model: String,
    pub parameters: BTreeMap<String, ParameterEstimate>,
    pub r_squared: f64,
    pub rmse: f64,
    pub mae: f64,
    /// Model values at each curve angle (same order as the curve).
    pub fitted: Vec<f64>,
    /// `observed - fitted` at each curve angle.
    pub residuals: Vec<f64>,
    pub success: bool,
    pub error: Option<String>,
    /// Residual-function evaluations spent by the solver.
    pub evaluations: usize,
}

impl FitResult {
    /// A failed fit: no parameters, zero R², infinite error metrics.
    pub fn failed(model: impl Into<String>, message: impl Into<String>, evaluations: usize) -> Self {
        Self {
            model: model.into(),
            parameters: BTreeMap::new(),
            r_squared: 0.0,
            rmse: f64::INFINITY,
            mae: f64::INFINITY,
            fitted: Vec::new(),
            residuals: Vec::new(),
            success: false,
            error: Some(message.into()),
            evaluations,
        }
    }

    /// Parameter values in the order given by `names`.
    ///
    /// Returns `None` if any name is missing (e.g. a failed fit).
    pub fn values_for(&self, names: &[String]) -> Option<Vec<f64>> {
        names
            .iter()
            .map(|n| self.parameters.get(n).map(|p| p.value))
            .collect()
    }
}

/// Qualitative fit-quality tier derived from R².
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    Excellent,
    Good,
    Acceptable,
    Poor,
}

impl QualityTier {
    pub fn display_name(self) -> &'static str {
        match self {
            QualityTier::Excellent => "excellent",
            QualityTier::Good => "good",
            QualityTier::Acceptable => "acceptable",
            QualityTier::Poor => "poor",
        }
    }
}

/// Physical-plausibility verdict for a curve.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub warnings: Vec<String>,
}

/// IAM at a fixed reference angle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceIam {
    pub angle: f64,
    pub iam: f64,
    /// `true` when no measured point sits at this angle.
    pub interpolated: bool,
}

/// Summary statistics of a curve's IAM values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurveStatistics {
    pub count: usize,
    pub mean: f64,
    /// Population standard deviation.
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub reference: Vec<ReferenceIam>,
}

impl CurveStatistics {
    pub fn reference_at(&self, angle: f64) -> Option<&ReferenceIam> {
        self.reference.iter().find(|r| (r.angle - angle).abs() < 1e-9)
    }
}

/// Interpolation scheme for estimating IAM between measured angles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum InterpolationMethod {
    Linear,
    /// Local three-point quadratic.
    Quadratic,
    /// Natural cubic spline.
    Cubic,
}

impl InterpolationMethod {
    /// Minimum number of distinct angles the method needs.
    pub fn min_points(self) -> usize {
        match self {
            InterpolationMethod::Linear => 2,
            InterpolationMethod::Quadratic => 3,
            InterpolationMethod::Cubic => 4,
        }
    }
}

/// An IAM estimate at an arbitrary angle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InterpolatedPoint {
    pub angle: f64,
    pub iam: f64,
    /// Method actually used (may be lower-order than requested).
    pub method: InterpolationMethod,
    /// `false` only when the angle coincides with a measured point.
    pub interpolated: bool,
    /// Angle lies outside the measured range.
    pub extrapolated: bool,
}

/// Which metric `select_best` ranks successful fits by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SelectionCriterion {
    /// Highest R².
    RSquared,
    /// Lowest RMSE.
    Rmse,
    /// Lowest MAE.
    Mae,
}

/// Serializable choice of a model from the library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ModelSpec {
    Ashrae,
    Physical,
    Polynomial { degree: usize },
}

impl ModelSpec {
    /// Stable model name used as the key in fit maps and configs.
    pub fn name(self) -> String {
        match self {
            ModelSpec::Ashrae => "ashrae".to_string(),
            ModelSpec::Physical => "physical".to_string(),
            ModelSpec::Polynomial { degree } => format!("polynomial_{degree}"),
        }
    }

    /// The library used when the caller does not choose one.
    pub fn default_set() -> Vec<ModelSpec> {
        vec![
            ModelSpec::Ashrae,
            ModelSpec::Physical,
            ModelSpec::Polynomial { degree: 4 },
        ]
    }
}

impl FromStr for ModelSpec {
    type Err = String;

    /// Accepts `ashrae`, `physical`, `polynomial` (degree 4) or `polynomial_<d>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        match s.as_str() {
            "ashrae" => Ok(ModelSpec::Ashrae),
            "physical" => Ok(ModelSpec::Physical),
            "polynomial" => Ok(ModelSpec::Polynomial { degree: 4 }),
            other => {
                let degree = other
                    .strip_prefix("polynomial_")
                    .and_then(|d| d.parse::<usize>().ok())
                    .ok_or_else(|| format!("unknown model '{other}'"))?;
                Ok(ModelSpec::Polynomial { degree })
            }
        }
    }
}

/// A model evaluated on an evenly spaced angle grid (for plotting handoff).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveGrid {
    pub model: String,
    pub angles: Vec<f64>,
    pub iam: Vec<f64>,
}

/// Full output of one analysis call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub metric: Metric,
    pub normalization_angle: f64,
    pub curve: Vec<IamCurvePoint>,
    pub best_fit: FitResult,
    /// Every attempted fit, keyed by model name.
    pub fits: BTreeMap<String, FitResult>,
    pub quality_tier: QualityTier,
    /// Share of the recommended angles that were measured (0–100).
    pub completeness_pct: f64,
    pub validation: ValidationReport,
    pub statistics: CurveStatistics,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn measurement_exposes_only_its_metric() {
        let m = Measurement::new(30.0, Metric::Isc, 9.1, 1000.0);
        assert_eq!(m.value(Metric::Isc), Some(9.1));
        assert_eq!(m.value(Metric::Pmax), None);
    }

    #[test]
    fn model_spec_parses_names() {
        assert_eq!("ASHRAE".parse::<ModelSpec>(), Ok(ModelSpec::Ashrae));
        assert_eq!(
            "polynomial_3".parse::<ModelSpec>(),
            Ok(ModelSpec::Polynomial { degree: 3 })
        );
        assert_eq!(
            "polynomial".parse::<ModelSpec>(),
            Ok(ModelSpec::Polynomial { degree: 4 })
        );
        assert!("martin_ruiz".parse::<ModelSpec>().is_err());
        assert_eq!(ModelSpec::Polynomial { degree: 2 }.name(), "polynomial_2");
    }

    #[test]
    fn failed_fit_has_sentinel_metrics() {
        let f = FitResult::failed("ashrae", "boom", 3);
        assert!(!f.success);
        assert_eq!(f.r_squared, 0.0);
        assert!(f.rmse.is_infinite() && f.mae.is_infinite());
        assert!(f.values_for(&["b0".to_string()]).is_none());
    }

    #[test]
    fn model_spec_serde_is_tagged() {
        let json = serde_json::to_string(&ModelSpec::Polynomial { degree: 3 }).unwrap();
        assert_eq!(json, r#"{"kind":"polynomial","degree":3}"#);
        let back: ModelSpec = serde_json::from_str(r#"{"kind":"physical"}"#).unwrap();
        assert_eq!(back, ModelSpec::Physical);
    }
}
