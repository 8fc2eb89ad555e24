//! Model selection across per-model fits.
//!
//! Only successful fits with a finite score compete. Ties keep the model that
//! comes first in name order, so selection is deterministic.

use std::collections::BTreeMap;

use crate::domain::{FitResult, QualityTier, FitQualityThresholds, SelectionCriterion};
use crate::error::AnalysisError;

/// Score of a fit under `criterion`, oriented so that larger is better.
fn score(fit: &FitResult, criterion: SelectionCriterion) -> f64 {
    match criterion {
        SelectionCriterion::RSquared => fit.r_squared,
        SelectionCriterion::Rmse => -fit.rmse,
        SelectionCriterion::Mae => -fit.mae,
    }
}

/// Pick the best successful fit.
///
/// Fails with `NoValidFit` (without partial results) when no fit succeeded.
pub fn select_best(
    fits: &BTreeMap<String, FitResult>,
    criterion: SelectionCriterion,
) -> Result<&FitResult, AnalysisError> {
    let mut best: Option<(&FitResult, f64)> = None;
    for fit in fits.values().filter(|f| f.success) {
        let s = score(fit, criterion);
        if !s.is_finite() {
            continue;
        }
        match best {
            Some((_, best_score)) if s <= best_score => {}
            _ => best = Some((fit, s)),
        }
    }

    best.map(|(fit, _)| fit)
        .ok_or(AnalysisError::NoValidFit { partial: None })
}

/// Qualitative tier for an R² value.
pub fn classify_quality(r_squared: f64, thresholds: &FitQualityThresholds) -> QualityTier {
    if r_squared >= thresholds.excellent {
        QualityTier::Excellent
    } else if r_squared >= thresholds.good {
        QualityTier::Good
    } else if r_squared >= thresholds.acceptable {
        QualityTier::Acceptable
    } else {
        QualityTier::Poor
    }
}
