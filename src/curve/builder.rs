//! Measurements → normalized IAM curve.
//!
//! Steps:
//! 1. validate every measurement (finite angle in [0, 90], finite metric,
//!    positive irradiance)
//! 2. order by angle
//! 3. pick the measurement nearest the normalization angle as the anchor
//! 4. divide every metric value by the anchor value
//! 5. optionally rescale points measured at a different irradiance than the
//!    anchor by `target / actual` (first-order linear sensitivity)
//!
//! Pure function of its inputs: no I/O, no global state.

use crate::domain::{AnalysisConfig, IamCurvePoint, Measurement, Metric};
use crate::error::AnalysisError;

/// Angles closer than this count as the same angle.
pub const ANGLE_EPS: f64 = 1e-6;

/// Default irradiance deviation (W/m²) that triggers a correction.
pub const DEFAULT_IRRADIANCE_TOLERANCE: f64 = 10.0;

/// Curve-building settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveOptions {
    pub metric: Metric,
    pub normalization_angle: f64,
    pub correct_irradiance: bool,
    pub irradiance_tolerance: f64,
}

impl Default for CurveOptions {
    fn default() -> Self {
        Self {
            metric: Metric::Pmax,
            normalization_angle: 0.0,
            correct_irradiance: true,
            irradiance_tolerance: DEFAULT_IRRADIANCE_TOLERANCE,
        }
    }
}

impl From<&AnalysisConfig> for CurveOptions {
    fn from(config: &AnalysisConfig) -> Self {
        Self {
            metric: config.metric,
            normalization_angle: config.normalization_angle,
            correct_irradiance: config.correct_irradiance,
            irradiance_tolerance: config.irradiance_tolerance,
        }
    }
}

/// Build the IAM curve, ordered by ascending angle.
pub fn build_curve(
    measurements: &[Measurement],
    opts: &CurveOptions,
) -> Result<Vec<IamCurvePoint>, AnalysisError> {
    if measurements.is_empty() {
        return Err(AnalysisError::NoMeasurements);
    }

    let mut rows: Vec<(f64, f64, f64, usize)> = Vec::with_capacity(measurements.len());
    for (index, m) in measurements.iter().enumerate() {
        let (angle, value, irradiance) = checked_row(index, m, opts.metric)?;
        rows.push((angle, value, irradiance, index));
    }
    rows.sort_by(|a, b| a.0.total_cmp(&b.0));

    let Some(&(anchor_angle, anchor_value, anchor_irradiance, _)) = rows.iter().min_by(|a, b| {
        let da = (a.0 - opts.normalization_angle).abs();
        let db = (b.0 - opts.normalization_angle).abs();
        da.total_cmp(&db)
    }) else {
        return Err(AnalysisError::NoMeasurements);
    };

    if (anchor_angle - opts.normalization_angle).abs() > ANGLE_EPS {
        tracing::warn!(
            requested = opts.normalization_angle,
            anchor = anchor_angle,
            "no measurement at the normalization angle; using the nearest one"
        );
    }
    if anchor_value == 0.0 {
        return Err(AnalysisError::DivisionByZero { angle: anchor_angle });
    }

    let mut curve = Vec::with_capacity(rows.len());
    for (angle, value, irradiance, index) in rows {
        let mut iam = value / anchor_value;
        let mut corrected = false;
        if opts.correct_irradiance && (irradiance - anchor_irradiance).abs() > opts.irradiance_tolerance {
            iam *= anchor_irradiance / irradiance;
            corrected = true;
        }
        if !iam.is_finite() {
            return Err(AnalysisError::InvalidMeasurement {
                index,
                reason: format!("IAM at {angle}° is not finite"),
            });
        }
        curve.push(IamCurvePoint {
            angle,
            iam,
            raw_value: value,
            irradiance,
            irradiance_corrected: corrected,
        });
    }

    Ok(curve)
}

fn checked_row(index: usize, m: &Measurement, metric: Metric) -> Result<(f64, f64, f64), AnalysisError> {
    let invalid = |reason: String| AnalysisError::InvalidMeasurement { index, reason };

    if !(m.angle.is_finite() && (0.0..=90.0).contains(&m.angle)) {
        return Err(invalid(format!("angle {} outside [0, 90]°", m.angle)));
    }
    if !(m.irradiance.is_finite() && m.irradiance > 0.0) {
        return Err(invalid(format!("irradiance {} must be positive", m.irradiance)));
    }
    let value = m.value(metric).ok_or(AnalysisError::MissingMetric { metric, index })?;
    if !value.is_finite() {
        return Err(invalid(format!("{metric} value is not finite")));
    }

    Ok((m.angle, value, m.irradiance))
}
