//! Shared analysis pipeline used by both `iam analyze` and `iam demo`.
//!
//! config resolution -> analysis -> smooth best-fit curve
//!
//! The commands differ only in where measurements come from.

use crate::analysis::IamAnalyzer;
use crate::cli::AnalysisArgs;
use crate::domain::{AnalysisConfig, AnalysisResult, CurveGrid, Measurement};
use crate::error::{AnalysisError, AppError};
use crate::io::{best_fit_grid, read_config_json};

/// All computed outputs of one run.
#[derive(Debug)]
pub struct RunOutput {
    pub analyzer: IamAnalyzer,
    pub result: AnalysisResult,
    pub smooth_curve: Option<CurveGrid>,
}

/// Defaults, then the `--config` file, then individual flags.
pub fn resolve_config(args: &AnalysisArgs) -> Result<AnalysisConfig, AppError> {
    let base = match &args.config {
        Some(path) => read_config_json(path)?,
        None => AnalysisConfig::default(),
    };
    let config = args.apply(base);
    config.validate()?;
    Ok(config)
}

/// Run the analysis and sample the chosen model on a smooth grid.
pub fn run_analysis(
    config: AnalysisConfig,
    measurements: &[Measurement],
    smooth_points: usize,
) -> Result<RunOutput, AnalysisError> {
    let analyzer = IamAnalyzer::new(config)?;
    let result = analyzer.analyze(measurements)?;
    let smooth_curve = best_fit_grid(analyzer.library(), &result, smooth_points);
    Ok(RunOutput {
        analyzer,
        result,
        smooth_curve,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{SyntheticOptions, default_angles, generate_measurements};
    use crate::domain::Metric;
    use crate::models::Physical;

    #[test]
    fn flags_override_defaults() {
        let args = AnalysisArgs {
            metric: Some(Metric::Voc),
            normalization_angle: Some(5.0),
            ..AnalysisArgs::default()
        };
        let config = resolve_config(&args).unwrap();
        assert_eq!(config.metric, Metric::Voc);
        assert_eq!(config.normalization_angle, 5.0);
    }

    #[test]
    fn invalid_override_is_an_input_error() {
        let args = AnalysisArgs {
            default_model: Some("nope".into()),
            ..AnalysisArgs::default()
        };
        assert_eq!(resolve_config(&args).unwrap_err().exit_code(), 2);
    }

    #[test]
    fn run_produces_smooth_curve() {
        let ms = generate_measurements(&Physical, &[0.2], &default_angles(), &SyntheticOptions::default()).unwrap();
        let run = run_analysis(AnalysisConfig::default(), &ms, 46).unwrap();
        let grid = run.smooth_curve.unwrap();
        assert_eq!(grid.angles.len(), 46);
        assert_eq!(grid.model, run.result.best_fit.model);
    }
}
