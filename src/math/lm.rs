//! Box-constrained Levenberg–Marquardt.
//!
//! We minimize `½ Σ r_i(p)²` subject to `lower ≤ p ≤ upper`, where the caller
//! supplies the residual vector `r(p)` (already weighted).
//!
//! Implementation choices:
//! - Jacobian by forward differences; the step flips to a backward difference
//!   when the forward probe would leave the box.
//! - Damped normal equations `(JᵀJ + λ·diag(JᵀJ)) δ = -Jᵀr`, solved via SVD.
//! - Active set: a parameter sitting on a bound with its gradient pointing out
//!   of the box is frozen for the iteration and the damped system is solved
//!   for the free parameters only. Trial points are still clamped into the
//!   box. Convergence is tested on the projected gradient.
//! - Every residual evaluation (including Jacobian probes) counts against
//!   `max_evaluations`; exhausting the budget is a failure, not a silent stop.
//!
//! On success the parameter covariance is `(JᵀJ)⁻¹ · SSE / (n - k)` evaluated
//! at the solution. With `n == k` there are no residual degrees of freedom and
//! the covariance is reported as `+∞`.

use nalgebra::{DMatrix, DVector};

use crate::math::solve_least_squares;

/// Convergence controls.
#[derive(Debug, Clone, Copy)]
pub struct LmOptions {
    pub max_evaluations: usize,
    /// Relative cost reduction below which we stop.
    pub ftol: f64,
    /// Relative step size below which we stop.
    pub xtol: f64,
    /// Max-norm of the gradient below which we stop.
    pub gtol: f64,
    pub initial_lambda: f64,
}

impl Default for LmOptions {
    fn default() -> Self {
        Self {
            max_evaluations: 10_000,
            ftol: 1e-10,
            xtol: 1e-10,
            gtol: 1e-10,
            initial_lambda: 1e-3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LmSolution {
    pub params: Vec<f64>,
    /// `k × k` parameter covariance.
    pub covariance: DMatrix<f64>,
    /// Sum of squared residuals at the solution.
    pub sse: f64,
    pub evaluations: usize,
    pub iterations: usize,
}

impl LmSolution {
    /// Square roots of the covariance diagonal.
    pub fn std_errors(&self) -> Vec<f64> {
        (0..self.covariance.nrows())
            .map(|i| {
                let v = self.covariance[(i, i)];
                if v.is_infinite() { f64::INFINITY } else { v.max(0.0).sqrt() }
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SolverError {
    #[error("insufficient data: {n} residuals for {k} parameters")]
    Underdetermined { n: usize, k: usize },

    #[error("invalid problem: {0}")]
    InvalidProblem(String),

    #[error("residuals are not finite at the starting point")]
    NonFiniteStart,

    #[error("optimal parameters not found: evaluation budget of {0} exhausted")]
    BudgetExhausted(usize),

    #[error("parameter covariance is singular")]
    SingularCovariance,
}

const LAMBDA_MIN: f64 = 1e-15;
const LAMBDA_MAX: f64 = 1e16;

struct Counted<F> {
    f: F,
    evaluations: usize,
    budget: usize,
}

impl<F: Fn(&[f64]) -> Vec<f64>> Counted<F> {
    fn eval(&mut self, p: &[f64]) -> Result<DVector<f64>, SolverError> {
        if self.evaluations >= self.budget {
            return Err(SolverError::BudgetExhausted(self.budget));
        }
        self.evaluations += 1;
        Ok(DVector::from_vec((self.f)(p)))
    }
}

/// Minimize the sum of squared residuals within `[lower, upper]`.
pub fn solve_bounded<F>(
    residuals: F,
    initial: &[f64],
    lower: &[f64],
    upper: &[f64],
    opts: &LmOptions,
) -> Result<LmSolution, SolverError>
where
    F: Fn(&[f64]) -> Vec<f64>,
{
    let k = initial.len();
    if k == 0 || lower.len() != k || upper.len() != k {
        return Err(SolverError::InvalidProblem(
            "parameter, lower and upper lengths must match and be non-zero".into(),
        ));
    }
    if lower.iter().zip(upper).any(|(lo, hi)| !(lo.is_finite() && hi.is_finite() && lo <= hi)) {
        return Err(SolverError::InvalidProblem("bounds must be finite with lower <= upper".into()));
    }

    let mut f = Counted {
        f: residuals,
        evaluations: 0,
        budget: opts.max_evaluations,
    };

    let mut x: Vec<f64> = initial
        .iter()
        .zip(lower.iter().zip(upper))
        .map(|(&v, (&lo, &hi))| v.clamp(lo, hi))
        .collect();
    let mut r = f.eval(&x)?;
    let n = r.len();
    if n < k {
        return Err(SolverError::Underdetermined { n, k });
    }
    if r.iter().any(|v| !v.is_finite()) {
        return Err(SolverError::NonFiniteStart);
    }

    let mut cost = r.norm_squared();
    let mut lambda = opts.initial_lambda;
    let mut iterations = 0usize;

    'outer: loop {
        if cost == 0.0 {
            break;
        }
        iterations += 1;

        let jac = jacobian(&mut f, &x, &r, lower, upper)?;
        let jtj = jac.transpose() * &jac;
        let grad = jac.transpose() * &r;

        let free = free_parameters(&x, grad.as_slice(), lower, upper);
        let projected_grad = free.iter().map(|&i| grad[i].abs()).fold(0.0, f64::max);
        if free.is_empty() || projected_grad <= opts.gtol {
            break;
        }

        let m = free.len();
        let jtj_free = DMatrix::from_fn(m, m, |a, b| jtj[(free[a], free[b])]);
        let neg_grad_free = DVector::from_fn(m, |a, _| -grad[free[a]]);
        let x_norm = x.iter().map(|v| v * v).sum::<f64>().sqrt();

        loop {
            let mut damped = jtj_free.clone();
            for a in 0..m {
                damped[(a, a)] += lambda * jtj_free[(a, a)].max(1e-12);
            }
            let Some(delta) = solve_least_squares(&damped, &neg_grad_free) else {
                lambda *= 10.0;
                if lambda > LAMBDA_MAX {
                    break 'outer;
                }
                continue;
            };
            if delta.norm() <= opts.xtol * (x_norm + opts.xtol) {
                break 'outer;
            }

            let mut trial = x.clone();
            for (a, &i) in free.iter().enumerate() {
                trial[i] = (x[i] + delta[a]).clamp(lower[i], upper[i]);
            }

            let moved = trial.iter().zip(&x).any(|(t, v)| t != v);
            if moved {
                let r_trial = f.eval(&trial)?;
                let cost_trial = r_trial.norm_squared();
                if cost_trial.is_finite() && cost_trial < cost {
                    let reduction = cost - cost_trial;
                    x = trial;
                    r = r_trial;
                    cost = cost_trial;
                    lambda = (lambda / 10.0).max(LAMBDA_MIN);
                    if reduction <= opts.ftol * cost.max(f64::MIN_POSITIVE) {
                        break 'outer;
                    }
                    break;
                }
            }

            lambda *= 10.0;
            if lambda > LAMBDA_MAX {
                // No descent direction left inside the box.
                break 'outer;
            }
        }
    }

    // Covariance probes are not charged to the budget.
    f.budget = usize::MAX;
    let jac = jacobian(&mut f, &x, &r, lower, upper)?;
    let jtj = jac.transpose() * &jac;
    let inv = jtj.try_inverse().ok_or(SolverError::SingularCovariance)?;
    if inv.iter().any(|v| !v.is_finite()) || (0..k).any(|i| inv[(i, i)] < 0.0) {
        return Err(SolverError::SingularCovariance);
    }

    let covariance = if n > k {
        inv * (cost / (n - k) as f64)
    } else {
        DMatrix::from_element(k, k, f64::INFINITY)
    };

    Ok(LmSolution {
        params: x,
        covariance,
        sse: cost,
        evaluations: f.evaluations,
        iterations,
    })
}

/// Indices of parameters the next step may move.
///
/// A parameter on a bound whose gradient pushes it further out is held
/// fixed (active constraint); everything else is free.
fn free_parameters(x: &[f64], grad: &[f64], lower: &[f64], upper: &[f64]) -> Vec<usize> {
    (0..x.len())
        .filter(|&i| {
            let at_lower = x[i] <= lower[i] && grad[i] > 0.0;
            let at_upper = x[i] >= upper[i] && grad[i] < 0.0;
            !(at_lower || at_upper)
        })
        .collect()
}

fn jacobian<F: Fn(&[f64]) -> Vec<f64>>(
    f: &mut Counted<F>,
    x: &[f64],
    r: &DVector<f64>,
    lower: &[f64],
    upper: &[f64],
) -> Result<DMatrix<f64>, SolverError> {
    let n = r.len();
    let k = x.len();
    let mut jac = DMatrix::<f64>::zeros(n, k);
    let mut probe = x.to_vec();

    for j in 0..k {
        let mut h = f64::EPSILON.sqrt() * x[j].abs().max(1.0);
        if x[j] + h > upper[j] {
            h = -h;
        }
        if x[j] + h < lower[j] {
            // Box narrower than the probe; the parameter is effectively fixed.
            continue;
        }
        probe[j] = x[j] + h;
        let r_probe = f.eval(&probe)?;
        probe[j] = x[j];
        for i in 0..n {
            let d = (r_probe[i] - r[i]) / h;
            jac[(i, j)] = if d.is_finite() { d } else { 0.0 };
        }
    }

    Ok(jac)
}
