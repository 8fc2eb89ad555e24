//! Summary statistics of an IAM curve.

use crate::curve::{ANGLE_EPS, interpolate};
use crate::domain::{CurveStatistics, IamCurvePoint, InterpolationMethod, ReferenceIam};

/// Angles at which IAM is always reported.
pub const REFERENCE_ANGLES: [f64; 3] = [50.0, 60.0, 70.0];

/// Mean, population standard deviation, extrema and reference-angle IAMs.
///
/// Reference values come from the measured point when one sits at the angle,
/// otherwise from cubic interpolation (degraded automatically for sparse
/// curves). An empty curve yields all-zero statistics.
pub fn statistics(curve: &[IamCurvePoint]) -> CurveStatistics {
    let values: Vec<f64> = curve.iter().map(|p| p.iam).filter(|v| v.is_finite()).collect();
    if values.is_empty() {
        return CurveStatistics::default();
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let mut reference = Vec::with_capacity(REFERENCE_ANGLES.len());
    for &angle in &REFERENCE_ANGLES {
        if let Some(p) = curve.iter().find(|p| (p.angle - angle).abs() <= ANGLE_EPS) {
            reference.push(ReferenceIam {
                angle,
                iam: p.iam,
                interpolated: false,
            });
            continue;
        }
        match interpolate(curve, &[angle], InterpolationMethod::Cubic) {
            Ok(points) => {
                if let Some(p) = points.first() {
                    reference.push(ReferenceIam {
                        angle,
                        iam: p.iam,
                        interpolated: true,
                    });
                }
            }
            Err(err) => tracing::debug!(angle, %err, "reference IAM unavailable"),
        }
    }

    CurveStatistics {
        count: values.len(),
        mean,
        std_dev: var.sqrt(),
        min,
        max,
        reference,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(angle: f64, iam: f64) -> IamCurvePoint {
        IamCurvePoint {
            angle,
            iam,
            raw_value: iam,
            irradiance: 1000.0,
            irradiance_corrected: false,
        }
    }

    #[test]
    fn basic_moments() {
        let curve = vec![point(0.0, 1.0), point(60.0, 0.8), point(80.0, 0.3)];
        let s = statistics(&curve);
        assert_eq!(s.count, 3);
        assert!((s.mean - 0.7).abs() < 1e-12);
        let expected_std = ((0.09 + 0.01 + 0.16) / 3.0_f64).sqrt();
        assert!((s.std_dev - expected_std).abs() < 1e-12);
        assert_eq!(s.min, 0.3);
        assert_eq!(s.max, 1.0);
    }

    #[test]
    fn reference_angles_prefer_measured_points() {
        let curve = vec![point(0.0, 1.0), point(50.0, 0.9), point(70.0, 0.6), point(90.0, 0.0)];
        let s = statistics(&curve);
        let at50 = s.reference_at(50.0).unwrap();
        assert!(!at50.interpolated);
        assert_eq!(at50.iam, 0.9);
        let at60 = s.reference_at(60.0).unwrap();
        assert!(at60.interpolated);
        assert!(at60.iam > 0.6 && at60.iam < 0.9);
    }

    #[test]
    fn empty_curve_is_all_zero() {
        let s = statistics(&[]);
        assert_eq!(s.count, 0);
        assert!(s.reference.is_empty());
    }
}
