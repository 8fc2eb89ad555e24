//! Export analysis results.
//!
//! - JSON: the full `AnalysisResult` plus run metadata and an optional smooth
//!   curve of the chosen model (the portable handoff for plotting/reporting)
//! - CSV: one row per curve point with the best-fit prediction, easy to open in
//!   a spreadsheet
//!
//! Non-finite numbers (e.g. the `+inf` standard error of an exactly determined
//! fit) are written as JSON `null`.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{AnalysisConfig, AnalysisResult, CurveGrid};
use crate::error::AppError;
use crate::fit::generate_smooth_curve;
use crate::models::ModelLibrary;

/// On-disk schema of `--export` files.
#[derive(Debug, Serialize)]
pub struct ResultFile<'a> {
    pub tool: &'static str,
    pub generated_at: DateTime<Utc>,
    pub config: &'a AnalysisConfig,
    pub result: &'a AnalysisResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smooth_curve: Option<CurveGrid>,
}

/// Evenly spaced curve of the best fit, if its model and parameters are known.
pub fn best_fit_grid(library: &ModelLibrary, result: &AnalysisResult, num_points: usize) -> Option<CurveGrid> {
    if !result.best_fit.success {
        return None;
    }
    let model = library.get(&result.best_fit.model)?;
    let params = result.best_fit.values_for(&model.parameter_names())?;
    generate_smooth_curve(model, &params, num_points).ok()
}

pub fn write_result_json(
    path: &Path,
    config: &AnalysisConfig,
    result: &AnalysisResult,
    smooth_curve: Option<CurveGrid>,
) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create result JSON '{}': {e}", path.display())))?;
    write_result_json_to(file, config, result, smooth_curve)
}

pub fn write_result_json_to<W: Write>(
    writer: W,
    config: &AnalysisConfig,
    result: &AnalysisResult,
    smooth_curve: Option<CurveGrid>,
) -> Result<(), AppError> {
    let out = ResultFile {
        tool: "iam",
        generated_at: Utc::now(),
        config,
        result,
        smooth_curve,
    };
    serde_json::to_writer_pretty(writer, &out)
        .map_err(|e| AppError::new(2, format!("Failed to write result JSON: {e}")))
}

/// Write the normalized curve with best-fit predictions to a CSV file.
pub fn write_curve_csv(path: &Path, result: &AnalysisResult) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create curve CSV '{}': {e}", path.display())))?;
    write_curve_csv_to(file, result)
}

pub fn write_curve_csv_to<W: Write>(mut w: W, result: &AnalysisResult) -> Result<(), AppError> {
    let row_err = |e: std::io::Error| AppError::new(2, format!("Failed to write curve CSV: {e}"));

    writeln!(w, "angle,iam,raw_value,irradiance,irradiance_corrected,fitted,residual").map_err(row_err)?;

    let best = &result.best_fit;
    let has_fit = best.success && best.fitted.len() == result.curve.len();
    for (i, p) in result.curve.iter().enumerate() {
        let (fitted, residual) = if has_fit {
            (format!("{:.6}", best.fitted[i]), format!("{:.6}", best.residuals[i]))
        } else {
            (String::new(), String::new())
        };
        writeln!(
            w,
            "{:.4},{:.6},{:.6},{:.2},{},{},{}",
            p.angle, p.iam, p.raw_value, p.irradiance, p.irradiance_corrected, fitted, residual
        )
        .map_err(row_err)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::IamAnalyzer;
    use crate::data::{SyntheticOptions, default_angles, generate_measurements};
    use crate::models::Ashrae;

    fn analyzed() -> (IamAnalyzer, AnalysisResult) {
        let ms = generate_measurements(&Ashrae, &[0.05], &default_angles(), &SyntheticOptions::default()).unwrap();
        let analyzer = IamAnalyzer::new(AnalysisConfig::default()).unwrap();
        let result = analyzer.analyze(&ms).unwrap();
        (analyzer, result)
    }

    #[test]
    fn json_export_carries_metadata_and_grid() {
        let (analyzer, result) = analyzed();
        let grid = best_fit_grid(analyzer.library(), &result, 91);
        assert_eq!(grid.as_ref().map(|g| g.angles.len()), Some(91));

        let mut buf = Vec::new();
        write_result_json_to(&mut buf, analyzer.config(), &result, grid).unwrap();
        let v: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(v["tool"], "iam");
        assert!(v["generated_at"].is_string());
        assert_eq!(v["result"]["curve"].as_array().map(|a| a.len()), Some(18));
        assert_eq!(v["smooth_curve"]["model"], result.best_fit.model.as_str());
    }

    #[test]
    fn curve_csv_has_one_row_per_point() {
        let (_, result) = analyzed();
        let mut buf = Vec::new();
        write_curve_csv_to(&mut buf, &result).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 1 + result.curve.len());
        assert!(lines[0].starts_with("angle,iam"));
        assert!(lines[1].starts_with("0.0000,1.000000"));
    }
}
