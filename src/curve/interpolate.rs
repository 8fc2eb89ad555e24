//! IAM estimates at arbitrary angles.
//!
//! Methods:
//! - `Linear`: piecewise linear between neighbouring knots
//! - `Quadratic`: Lagrange parabola through the three knots nearest the target
//! - `Cubic`: natural cubic spline
//!
//! When the curve has too few distinct angles for the requested method we fall
//! back to the highest order it supports (cubic needs 4, quadratic 3). Targets
//! outside the measured range are extrapolated with the end segment and
//! flagged as such.

use nalgebra::{DMatrix, DVector};

use crate::curve::ANGLE_EPS;
use crate::domain::{IamCurvePoint, InterpolatedPoint, InterpolationMethod};
use crate::error::AnalysisError;
use crate::math::solve_least_squares;

/// Estimate IAM at each target angle.
pub fn interpolate(
    curve: &[IamCurvePoint],
    targets: &[f64],
    method: InterpolationMethod,
) -> Result<Vec<InterpolatedPoint>, AnalysisError> {
    let (xs, ys) = knots(curve);
    if xs.is_empty() {
        return Err(AnalysisError::NoMeasurements);
    }

    let mut method = effective_method(method, xs.len());
    let second_derivs = if method == InterpolationMethod::Cubic {
        let m = natural_spline_second_derivatives(&xs, &ys);
        if m.is_none() {
            tracing::debug!("spline system unsolvable; falling back to linear interpolation");
            method = InterpolationMethod::Linear;
        }
        m
    } else {
        None
    };

    let x_min = xs[0];
    let x_max = xs[xs.len() - 1];

    let mut out = Vec::with_capacity(targets.len());
    for &t in targets {
        if !t.is_finite() {
            return Err(AnalysisError::InvalidConfig(format!("interpolation target {t} is not finite")));
        }
        let exact = xs.iter().position(|&x| (x - t).abs() <= ANGLE_EPS);
        let iam = match exact {
            Some(i) => ys[i],
            None => match (method, second_derivs.as_deref()) {
                (InterpolationMethod::Cubic, Some(m)) => eval_spline(&xs, &ys, m, t),
                (InterpolationMethod::Quadratic, _) => eval_quadratic(&xs, &ys, t),
                _ => eval_linear(&xs, &ys, t),
            },
        };
        out.push(InterpolatedPoint {
            angle: t,
            iam,
            method,
            interpolated: exact.is_none(),
            extrapolated: t < x_min - ANGLE_EPS || t > x_max + ANGLE_EPS,
        });
    }

    Ok(out)
}

/// Highest-order method the number of distinct angles supports.
pub fn effective_method(requested: InterpolationMethod, n: usize) -> InterpolationMethod {
    use InterpolationMethod::*;
    match requested {
        Cubic if n >= Cubic.min_points() => Cubic,
        Cubic | Quadratic if n >= Quadratic.min_points() => Quadratic,
        _ => Linear,
    }
}

/// Sorted distinct angles; duplicate angles are averaged.
fn knots(curve: &[IamCurvePoint]) -> (Vec<f64>, Vec<f64>) {
    let mut pts: Vec<(f64, f64)> = curve
        .iter()
        .filter(|p| p.angle.is_finite() && p.iam.is_finite())
        .map(|p| (p.angle, p.iam))
        .collect();
    pts.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut xs: Vec<f64> = Vec::with_capacity(pts.len());
    let mut ys: Vec<f64> = Vec::with_capacity(pts.len());
    let mut counts: Vec<usize> = Vec::with_capacity(pts.len());
    for (x, y) in pts {
        match xs.last() {
            Some(&last) if (x - last).abs() <= ANGLE_EPS => {
                let i = ys.len() - 1;
                ys[i] += y;
                counts[i] += 1;
            }
            _ => {
                xs.push(x);
                ys.push(y);
                counts.push(1);
            }
        }
    }
    for (y, c) in ys.iter_mut().zip(&counts) {
        *y /= *c as f64;
    }
    (xs, ys)
}

/// Index `i` of the segment `[x_i, x_{i+1}]` used for `t` (clamped to the ends).
fn segment(xs: &[f64], t: f64) -> usize {
    let n = xs.len();
    if n < 2 {
        return 0;
    }
    xs.partition_point(|&x| x <= t).saturating_sub(1).min(n - 2)
}

fn eval_linear(xs: &[f64], ys: &[f64], t: f64) -> f64 {
    if xs.len() == 1 {
        return ys[0];
    }
    let i = segment(xs, t);
    let (x0, x1, y0, y1) = (xs[i], xs[i + 1], ys[i], ys[i + 1]);
    y0 + (y1 - y0) * (t - x0) / (x1 - x0)
}

fn eval_quadratic(xs: &[f64], ys: &[f64], t: f64) -> f64 {
    let n = xs.len();
    let i = segment(xs, t);
    // Candidate triples: (i-1, i, i+1) and (i, i+1, i+2); take the one whose
    // extra knot is nearer the target.
    let left = i.checked_sub(1);
    let right = if i + 2 < n { Some(i) } else { None };
    let start = match (left, right) {
        (Some(l), Some(r)) => {
            if (t - xs[l]).abs() <= (xs[r + 2] - t).abs() { l } else { r }
        }
        (Some(l), None) => l,
        (None, Some(r)) => r,
        (None, None) => return eval_linear(xs, ys, t),
    };

    let (x0, x1, x2) = (xs[start], xs[start + 1], xs[start + 2]);
    let (y0, y1, y2) = (ys[start], ys[start + 1], ys[start + 2]);
    let l0 = (t - x1) * (t - x2) / ((x0 - x1) * (x0 - x2));
    let l1 = (t - x0) * (t - x2) / ((x1 - x0) * (x1 - x2));
    let l2 = (t - x0) * (t - x1) / ((x2 - x0) * (x2 - x1));
    y0 * l0 + y1 * l1 + y2 * l2
}

/// Second derivatives `M_i` of the natural cubic spline (`M_0 = M_{n-1} = 0`).
fn natural_spline_second_derivatives(xs: &[f64], ys: &[f64]) -> Option<Vec<f64>> {
    let n = xs.len();
    if n < 3 {
        return Some(vec![0.0; n]);
    }

    let mut a = DMatrix::<f64>::zeros(n, n);
    let mut b = DVector::<f64>::zeros(n);
    a[(0, 0)] = 1.0;
    a[(n - 1, n - 1)] = 1.0;
    for i in 1..n - 1 {
        let h0 = xs[i] - xs[i - 1];
        let h1 = xs[i + 1] - xs[i];
        a[(i, i - 1)] = h0;
        a[(i, i)] = 2.0 * (h0 + h1);
        a[(i, i + 1)] = h1;
        b[i] = 6.0 * ((ys[i + 1] - ys[i]) / h1 - (ys[i] - ys[i - 1]) / h0);
    }

    solve_least_squares(&a, &b).map(|m| m.iter().copied().collect())
}

fn eval_spline(xs: &[f64], ys: &[f64], m: &[f64], t: f64) -> f64 {
    let i = segment(xs, t);
    let h = xs[i + 1] - xs[i];
    let a = (xs[i + 1] - t) / h;
    let b = (t - xs[i]) / h;
    a * ys[i] + b * ys[i + 1] + ((a * a * a - a) * m[i] + (b * b * b - b) * m[i + 1]) * h * h / 6.0
}
