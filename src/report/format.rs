//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the fitting code stays free of presentation concerns
//! - output changes are localized

use std::collections::BTreeMap;

use crate::domain::{AnalysisResult, CurveStatistics, FitResult, IamCurvePoint, ValidationReport};
use crate::error::PartialAnalysis;

/// Format the full run summary (curve + fit diagnostics + chosen model).
pub fn format_summary(result: &AnalysisResult) -> String {
    let mut out = String::new();

    out.push_str("=== iam - Incidence Angle Modifier Analysis ===\n");
    out.push_str(&format!(
        "Metric: {} [{}] | normalized at {:.1}°\n",
        result.metric,
        result.metric.unit(),
        result.normalization_angle
    ));
    out.push_str(&format!("Data completeness: {:.1}%\n", result.completeness_pct));

    out.push_str("\nIAM curve:\n");
    out.push_str(&format_curve_table(&result.curve, Some(&result.best_fit)));

    out.push_str("\nModel diagnostics:\n");
    out.push_str(&format_diagnostics(&result.fits, Some(&result.best_fit.model)));

    out.push_str("\nChosen model:\n");
    out.push_str(&format!(
        "- {} | quality: {} (R²={:.4})\n",
        result.best_fit.model,
        result.quality_tier.display_name(),
        result.best_fit.r_squared
    ));
    for (name, p) in &result.best_fit.parameters {
        out.push_str(&format!("- {name} = {:.6} ± {}\n", p.value, fmt_std_error(p.std_error)));
    }

    out.push('\n');
    out.push_str(&format_statistics(&result.statistics));
    out.push_str(&format_validation(&result.validation));
    out
}

/// Summary for a run in which no model could be fitted.
pub fn format_inconclusive(partial: &PartialAnalysis) -> String {
    let mut out = String::new();
    out.push_str("=== iam - analysis inconclusive ===\n");
    out.push_str("No model produced a valid fit; manual review required.\n");
    out.push_str(&format!("Data completeness: {:.1}%\n", partial.completeness_pct));

    out.push_str("\nIAM curve:\n");
    out.push_str(&format_curve_table(&partial.curve, None));

    out.push_str("\nModel diagnostics:\n");
    out.push_str(&format_diagnostics(&partial.fits, None));

    out.push('\n');
    out.push_str(&format_statistics(&partial.statistics));
    out.push_str(&format_validation(&partial.validation));
    out
}

fn format_curve_table(curve: &[IamCurvePoint], best: Option<&FitResult>) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:>8} {:>10} {:>12} {:>10} {:>10}\n",
        "angle", "iam", "raw", "irr", "fitted"
    ));
    out.push_str(&format!("{:->8} {:->10} {:->12} {:->10} {:->10}\n", "", "", "", "", ""));

    let fitted = best.filter(|b| b.success && b.fitted.len() == curve.len());
    for (i, p) in curve.iter().enumerate() {
        let corrected = if p.irradiance_corrected { "*" } else { " " };
        let fit = fitted.map(|b| format!("{:.4}", b.fitted[i])).unwrap_or_default();
        out.push_str(&format!(
            "{:>8.2} {:>10.4} {:>12.4} {:>9.1}{corrected} {:>10}\n",
            p.angle, p.iam, p.raw_value, p.irradiance, fit
        ));
    }
    if curve.iter().any(|p| p.irradiance_corrected) {
        out.push_str("(* irradiance-corrected)\n");
    }
    out
}

fn format_diagnostics(fits: &BTreeMap<String, FitResult>, chosen: Option<&str>) -> String {
    let mut out = String::new();
    for fit in fits.values() {
        let mark = if chosen == Some(fit.model.as_str()) { "*" } else { " " };
        if fit.success {
            out.push_str(&format!(
                "{mark} {:<14} R²={:.4} RMSE={:.4} MAE={:.4} evals={}\n",
                fit.model, fit.r_squared, fit.rmse, fit.mae, fit.evaluations
            ));
        } else {
            out.push_str(&format!(
                "  {:<14} failed: {}\n",
                fit.model,
                fit.error.as_deref().unwrap_or("unknown error")
            ));
        }
    }
    out
}

fn format_statistics(stats: &CurveStatistics) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Statistics: n={} | mean={:.4} | sd={:.4} | range=[{:.4}, {:.4}]\n",
        stats.count, stats.mean, stats.std_dev, stats.min, stats.max
    ));
    for r in &stats.reference {
        let how = if r.interpolated { " (interpolated)" } else { "" };
        out.push_str(&format!("- IAM({:.0}°) = {:.4}{how}\n", r.angle, r.iam));
    }
    out
}

fn format_validation(report: &ValidationReport) -> String {
    if report.warnings.is_empty() {
        return "Validation: ok\n".to_string();
    }
    let mut out = format!("Validation: {} warning(s)\n", report.warnings.len());
    for w in &report.warnings {
        out.push_str(&format!("! {w}\n"));
    }
    out
}

fn fmt_std_error(se: f64) -> String {
    if se.is_finite() { format!("{se:.6}") } else { "n/a".to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze;
    use crate::domain::{AnalysisConfig, Measurement, Metric};

    fn result() -> AnalysisResult {
        let ms: Vec<Measurement> = [(0.0, 300.0), (30.0, 290.0), (50.0, 265.0), (60.0, 240.0), (70.0, 190.0), (80.0, 110.0)]
            .iter()
            .map(|&(a, v)| Measurement::new(a, Metric::Pmax, v, 1000.0))
            .collect();
        analyze(&ms, &AnalysisConfig::default()).unwrap()
    }

    #[test]
    fn summary_marks_the_chosen_model() {
        let r = result();
        let txt = format_summary(&r);
        let marked = format!("* {:<14}", r.best_fit.model);
        assert!(txt.contains(&marked), "{txt}");
        assert!(txt.contains("Chosen model:"));
        assert!(txt.contains("IAM(60°)"));
    }

    #[test]
    fn infinite_std_error_prints_as_na() {
        assert_eq!(fmt_std_error(f64::INFINITY), "n/a");
        assert_eq!(fmt_std_error(0.5), "0.500000");
    }

    #[test]
    fn validation_lists_warnings() {
        let report = ValidationReport {
            is_valid: false,
            warnings: vec!["IAM exceeds 1.05 at 10.0°".into()],
        };
        let txt = format_validation(&report);
        assert!(txt.starts_with("Validation: 1 warning(s)"));
        assert!(txt.contains("! IAM exceeds"));
    }
}
