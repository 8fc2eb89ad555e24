//! Parametric IAM models.
//!
//! Each model is a stateless value implementing `IamModel`. The fitter only
//! needs four things from a model: evaluate it, name its parameters, seed the
//! solver, and bound the search box. Every model clamps its own output, so a
//! prediction is always finite whatever the parameters.

use crate::domain::ModelSpec;
use crate::error::AnalysisError;

/// Floor for `cos θ` near grazing incidence.
const COS_EPS: f64 = 1e-6;

/// Floor for numerator/denominator of the physical model.
const PHYS_EPS: f64 = 1e-12;

/// Upper clamp for polynomial output (small overshoot tolerated as noise).
pub const POLYNOMIAL_MAX_IAM: f64 = 1.2;

/// Capability set of an IAM model.
pub trait IamModel: Send + Sync {
    /// Stable model name (used as map key and in configs).
    fn name(&self) -> String;

    /// Human-readable label for terminal output.
    fn display_name(&self) -> String;

    fn parameter_names(&self) -> Vec<String>;

    fn initial_guess(&self) -> Vec<f64>;

    /// `(lower, upper)` bound per parameter.
    fn bounds(&self) -> Vec<(f64, f64)>;

    /// IAM at `angle` degrees. Always finite.
    fn evaluate(&self, angle: f64, params: &[f64]) -> f64;

    /// Fewest curve points the model will be fitted to.
    fn min_points(&self) -> usize {
        self.parameter_names().len()
    }
}

fn cos_deg(angle: f64) -> f64 {
    angle.to_radians().cos()
}

/// ASHRAE incidence angle modifier:
/// `IAM = max(0, 1 - b0 (1/cos θ - 1))`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Ashrae;

impl IamModel for Ashrae {
    fn name(&self) -> String {
        ModelSpec::Ashrae.name()
    }

    fn display_name(&self) -> String {
        "ASHRAE".to_string()
    }

    fn parameter_names(&self) -> Vec<String> {
        vec!["b0".to_string()]
    }

    fn initial_guess(&self) -> Vec<f64> {
        vec![0.05]
    }

    fn bounds(&self) -> Vec<(f64, f64)> {
        vec![(0.0, 1.0)]
    }

    fn evaluate(&self, angle: f64, params: &[f64]) -> f64 {
        let b0 = params.first().copied().unwrap_or(0.0);
        let c = cos_deg(angle).max(COS_EPS);
        let iam = 1.0 - b0 * (1.0 / c - 1.0);
        if iam.is_finite() { iam.clamp(0.0, 1.0) } else { 0.0 }
    }
}

/// Martin–Ruiz style physical model with angular losses coefficient `a_r`:
/// `IAM = (1 - e^{-cos θ / a_r}) / (1 - e^{-1 / a_r})`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Physical;

impl IamModel for Physical {
    fn name(&self) -> String {
        ModelSpec::Physical.name()
    }

    fn display_name(&self) -> String {
        "Physical (a_r)".to_string()
    }

    fn parameter_names(&self) -> Vec<String> {
        vec!["a_r".to_string()]
    }

    fn initial_guess(&self) -> Vec<f64> {
        vec![0.16]
    }

    fn bounds(&self) -> Vec<(f64, f64)> {
        vec![(0.01, 0.5)]
    }

    fn evaluate(&self, angle: f64, params: &[f64]) -> f64 {
        let a_r = params.first().copied().unwrap_or(0.0).max(PHYS_EPS);
        let c = cos_deg(angle).max(0.0);
        // 1 - exp(-x) as -expm1(-x) to keep precision for small x.
        let numer = (-(-c / a_r).exp_m1()).max(PHYS_EPS);
        let denom = (-(-1.0 / a_r).exp_m1()).max(PHYS_EPS);
        let iam = numer / denom;
        if iam.is_finite() { iam.clamp(0.0, 1.0) } else { 0.0 }
    }
}

/// Empirical polynomial in normalized angle `u = θ / 90`:
/// `IAM = 1 + Σ_{i=1..d} a_i u^i`, clamped to `[0, 1.2]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Polynomial {
    pub(super) degree: usize,
}

impl Polynomial {
    pub fn new(degree: usize) -> Result<Self, AnalysisError> {
        if !(2..=4).contains(&degree) {
            return Err(AnalysisError::InvalidConfig(format!(
                "polynomial degree must be 2..=4, got {degree}"
            )));
        }
        Ok(Self { degree })
    }

    pub fn degree(&self) -> usize {
        self.degree
    }
}

impl IamModel for Polynomial {
    fn name(&self) -> String {
        ModelSpec::Polynomial { degree: self.degree }.name()
    }

    fn display_name(&self) -> String {
        format!("Polynomial (deg {})", self.degree)
    }

    fn parameter_names(&self) -> Vec<String> {
        (1..=self.degree).map(|i| format!("a{i}")).collect()
    }

    fn initial_guess(&self) -> Vec<f64> {
        vec![-0.1; self.degree]
    }

    fn bounds(&self) -> Vec<(f64, f64)> {
        vec![(-2.0, 2.0); self.degree]
    }

    fn evaluate(&self, angle: f64, params: &[f64]) -> f64 {
        let u = angle / 90.0;
        // Horner on a_d u^d + ... + a_1 u, then + 1.
        let mut acc = 0.0;
        for &a in params.iter().take(self.degree).rev() {
            acc = (acc + a) * u;
        }
        let iam = 1.0 + acc;
        if iam.is_finite() { iam.clamp(0.0, POLYNOMIAL_MAX_IAM) } else { 0.0 }
    }

    /// One point more than free coefficients, so the fit is never exactly
    /// determined.
    fn min_points(&self) -> usize {
        self.degree + 1
    }
}

/// Build a concrete model from its serializable spec.
pub fn build_model(spec: ModelSpec) -> Result<Box<dyn IamModel>, AnalysisError> {
    Ok(match spec {
        ModelSpec::Ashrae => Box::new(Ashrae),
        ModelSpec::Physical => Box::new(Physical),
        ModelSpec::Polynomial { degree } => Box::new(Polynomial::new(degree)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_models_are_unity_at_normal_incidence() {
        assert!((Ashrae.evaluate(0.0, &[0.05]) - 1.0).abs() < 1e-12);
        assert!((Physical.evaluate(0.0, &[0.16]) - 1.0).abs() < 1e-12);
        let poly = Polynomial::new(4).unwrap();
        assert!((poly.evaluate(0.0, &[-0.1; 4]) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn ashrae_matches_closed_form_and_clamps() {
        let iam = Ashrae.evaluate(60.0, &[0.05]);
        assert!((iam - 0.95).abs() < 1e-9, "got {iam}");
        assert_eq!(Ashrae.evaluate(90.0, &[0.05]), 0.0);
        assert_eq!(Ashrae.evaluate(89.9, &[1.0]), 0.0);
    }

    #[test]
    fn physical_stays_in_unit_interval() {
        for &a_r in &[0.01, 0.16, 0.5] {
            for i in 0..=90 {
                let v = Physical.evaluate(i as f64, &[a_r]);
                assert!(v.is_finite() && (0.0..=1.0).contains(&v), "a_r={a_r} θ={i} -> {v}");
            }
        }
        assert!(Physical.evaluate(90.0, &[0.16]) < 1e-9);
    }

    #[test]
    fn missing_parameters_evaluate_without_panicking() {
        for angle in [0.0, 45.0, 90.0] {
            assert!(Ashrae.evaluate(angle, &[]).is_finite());
            assert!(Physical.evaluate(angle, &[]).is_finite());
        }
        assert_eq!(Ashrae.evaluate(60.0, &[]), 1.0);
    }

    #[test]
    fn polynomial_is_clamped_to_overshoot_band() {
        let poly = Polynomial::new(2).unwrap();
        assert_eq!(poly.evaluate(90.0, &[2.0, 2.0]), POLYNOMIAL_MAX_IAM);
        assert_eq!(poly.evaluate(90.0, &[-2.0, -2.0]), 0.0);
        // 1 - 0.5 u - 0.5 u² at u = 0.5
        assert!((poly.evaluate(45.0, &[-0.5, -0.5]) - 0.625).abs() < 1e-12);
    }

    #[test]
    fn polynomial_gate_and_names() {
        let poly = Polynomial::new(3).unwrap();
        assert_eq!(poly.parameter_names(), vec!["a1", "a2", "a3"]);
        assert_eq!(poly.min_points(), 4);
        assert_eq!(Ashrae.min_points(), 1);
        assert!(Polynomial::new(5).is_err());
    }
}
