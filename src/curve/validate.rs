//! Physical-plausibility checks for a computed IAM curve.
//!
//! Never fails: problems become human-readable warnings and the curve is valid
//! exactly when there are none.

use crate::domain::{IamCurvePoint, ValidationReport};

/// Largest IAM tolerated anywhere on a normalized curve.
pub const MAX_IAM: f64 = 1.05;

/// Share of increasing angle-adjacent transitions above which the curve is
/// flagged as non-monotonic.
pub const MAX_INCREASING_FRACTION: f64 = 0.2;

/// Beyond this angle IAM is expected to be small.
pub const HIGH_ANGLE: f64 = 70.0;
pub const HIGH_ANGLE_MAX_IAM: f64 = 0.5;

pub fn validate(curve: &[IamCurvePoint]) -> ValidationReport {
    let mut sorted: Vec<&IamCurvePoint> = curve.iter().collect();
    sorted.sort_by(|a, b| a.angle.total_cmp(&b.angle));

    let mut warnings = Vec::new();

    let over: Vec<String> = sorted
        .iter()
        .filter(|p| p.iam > MAX_IAM)
        .map(|p| format!("{:.1}° ({:.3})", p.angle, p.iam))
        .collect();
    if !over.is_empty() {
        warnings.push(format!("IAM exceeds {MAX_IAM:.2} at {}", over.join(", ")));
    }

    let negative: Vec<String> = sorted
        .iter()
        .filter(|p| p.iam < 0.0)
        .map(|p| format!("{:.1}° ({:.3})", p.angle, p.iam))
        .collect();
    if !negative.is_empty() {
        warnings.push(format!("negative IAM at {}", negative.join(", ")));
    }

    if sorted.len() >= 2 {
        let transitions = sorted.len() - 1;
        let increasing = sorted.windows(2).filter(|w| w[1].iam > w[0].iam).count();
        let fraction = increasing as f64 / transitions as f64;
        if fraction > MAX_INCREASING_FRACTION {
            warnings.push(format!(
                "IAM is not monotonically decreasing: {increasing} of {transitions} transitions increase"
            ));
        }
    }

    let high: Vec<String> = sorted
        .iter()
        .filter(|p| p.angle > HIGH_ANGLE && p.iam > HIGH_ANGLE_MAX_IAM)
        .map(|p| format!("{:.1}° ({:.3})", p.angle, p.iam))
        .collect();
    if !high.is_empty() {
        warnings.push(format!(
            "unexpectedly high IAM (> {HIGH_ANGLE_MAX_IAM}) beyond {HIGH_ANGLE}°: {}",
            high.join(", ")
        ));
    }

    ValidationReport {
        is_valid: warnings.is_empty(),
        warnings,
    }
}
