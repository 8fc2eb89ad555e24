//! Command-line parsing for the IAM analysis tool.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the analysis code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{AnalysisConfig, Metric, ModelSpec, SelectionCriterion};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "iam", version, about = "Incidence Angle Modifier (IAM) curve analysis")]
pub struct Cli {
    /// Enable debug logging (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Analyze measurements from a CSV file.
    Analyze(AnalyzeArgs),
    /// Analyze a synthetic measurement set generated from a known model.
    Demo(DemoArgs),
}

#[derive(Debug, Args, Clone)]
pub struct AnalyzeArgs {
    /// Measurement CSV (columns: angle, irradiance, pmax/isc/voc).
    #[arg(short, long, value_name = "CSV")]
    pub input: PathBuf,

    #[command(flatten)]
    pub analysis: AnalysisArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args, Clone)]
pub struct DemoArgs {
    /// Model that generates the synthetic data.
    #[arg(long, default_value = "physical")]
    pub model: ModelSpec,

    /// Parameters of the generating model (comma separated). Defaults to the model's initial guess.
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub params: Vec<f64>,

    /// Standard deviation of the Gaussian noise added to the IAM.
    #[arg(long, default_value_t = 0.01)]
    pub noise: f64,

    /// Random seed (same seed, same data).
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Metric value at normal incidence.
    #[arg(long, default_value_t = 300.0)]
    pub reference_value: f64,

    #[command(flatten)]
    pub analysis: AnalysisArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Analysis settings. Flags override the `--config` file, which overrides defaults.
#[derive(Debug, Args, Clone, Default)]
pub struct AnalysisArgs {
    /// JSON analysis configuration.
    #[arg(long, value_name = "JSON")]
    pub config: Option<PathBuf>,

    /// Metric to analyze.
    #[arg(short, long, value_enum)]
    pub metric: Option<Metric>,

    /// Reference angle (degrees) for normalization.
    #[arg(long)]
    pub normalization_angle: Option<f64>,

    /// Disable irradiance correction.
    #[arg(long)]
    pub no_irradiance_correction: bool,

    /// Models to fit (comma separated: ashrae, physical, polynomial_<2..4>).
    #[arg(long, value_delimiter = ',')]
    pub models: Vec<ModelSpec>,

    /// Model used when no fit can be selected.
    #[arg(long)]
    pub default_model: Option<String>,

    /// Model selection criterion.
    #[arg(long, value_enum)]
    pub criterion: Option<SelectionCriterion>,
}

impl AnalysisArgs {
    /// Apply flag overrides on top of `config`.
    pub fn apply(&self, mut config: AnalysisConfig) -> AnalysisConfig {
        if let Some(metric) = self.metric {
            config.metric = metric;
        }
        if let Some(angle) = self.normalization_angle {
            config.normalization_angle = angle;
        }
        if self.no_irradiance_correction {
            config.correct_irradiance = false;
        }
        if !self.models.is_empty() {
            config.models = self.models.clone();
            // Keep the default model valid when only the model list is overridden.
            if self.default_model.is_none() && !self.models.iter().any(|m| m.name() == config.default_model) {
                config.default_model = self.models[0].name();
            }
        }
        if let Some(model) = &self.default_model {
            config.default_model = model.clone();
        }
        if let Some(criterion) = self.criterion {
            config.criterion = criterion;
        }
        config
    }
}

#[derive(Debug, Args, Clone)]
pub struct OutputArgs {
    /// Export the full result (with smooth best-fit curve) to JSON.
    #[arg(long, value_name = "JSON")]
    pub export: Option<PathBuf>,

    /// Export curve points with fitted values and residuals to CSV.
    #[arg(long = "export-curve", value_name = "CSV")]
    pub export_curve: Option<PathBuf>,

    /// Number of points in the exported smooth curve.
    #[arg(long, default_value_t = 91)]
    pub smooth_points: usize,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 72)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analyze_flags_parse() {
        let cli = Cli::parse_from([
            "iam", "analyze", "-i", "data.csv", "--metric", "isc", "--models", "ashrae,polynomial_3",
            "--criterion", "rmse", "-v",
        ]);
        assert!(cli.verbose);
        let Command::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        assert_eq!(args.input, PathBuf::from("data.csv"));
        assert_eq!(args.analysis.metric, Some(Metric::Isc));
        assert_eq!(args.analysis.models, vec![ModelSpec::Ashrae, ModelSpec::Polynomial { degree: 3 }]);
        assert_eq!(args.analysis.criterion, Some(SelectionCriterion::Rmse));
        assert_eq!(args.output.smooth_points, 91);
    }

    #[test]
    fn overrides_keep_default_model_consistent() {
        let args = AnalysisArgs {
            models: vec![ModelSpec::Ashrae],
            no_irradiance_correction: true,
            ..AnalysisArgs::default()
        };
        let config = args.apply(AnalysisConfig::default());
        assert_eq!(config.default_model, "ashrae");
        assert!(!config.correct_irradiance);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn demo_accepts_parameter_list() {
        let cli = Cli::parse_from(["iam", "demo", "--model", "polynomial_2", "--params", "-0.1,-0.2", "--noise", "0"]);
        let Command::Demo(args) = cli.command else {
            panic!("expected demo");
        };
        assert_eq!(args.model, ModelSpec::Polynomial { degree: 2 });
        assert_eq!(args.params, vec![-0.1, -0.2]);
    }
}
