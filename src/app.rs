//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and installs logging
//! - loads or generates measurements
//! - runs the analysis pipeline
//! - prints the report/plot and writes optional exports

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{AnalyzeArgs, Command, DemoArgs, OutputArgs};
use crate::data::{SyntheticOptions, default_angles, generate_measurements};
use crate::domain::Measurement;
use crate::error::{AnalysisError, AppError};
use crate::models::build_model;

pub mod pipeline;

/// Entry point for the `iam` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Analyze(args) => handle_analyze(args),
        Command::Demo(args) => handle_demo(args),
    }
}

/// Logs go to stderr so stdout carries only the report.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // A subscriber may already be installed (e.g. when embedded); keep it.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn handle_analyze(args: AnalyzeArgs) -> Result<(), AppError> {
    let config = pipeline::resolve_config(&args.analysis)?;
    let ingest = crate::io::load_measurements(&args.input, config.metric)?;
    if !ingest.row_errors.is_empty() {
        tracing::warn!(
            skipped = ingest.row_errors.len(),
            rows = ingest.rows_read,
            "some CSV rows were skipped"
        );
    }
    analyze_and_report(config, &ingest.measurements, &args.output)
}

fn handle_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = pipeline::resolve_config(&args.analysis)?;
    let model = build_model(args.model)?;
    let params = if args.params.is_empty() {
        model.initial_guess()
    } else {
        args.params.clone()
    };
    tracing::info!(model = %model.name(), ?params, noise = args.noise, seed = args.seed, "generating synthetic data");

    let opts = SyntheticOptions {
        metric: config.metric,
        reference_value: args.reference_value,
        noise_sd: args.noise,
        seed: args.seed,
        ..SyntheticOptions::default()
    };
    let measurements = generate_measurements(model.as_ref(), &params, &default_angles(), &opts)?;
    analyze_and_report(config, &measurements, &args.output)
}

fn analyze_and_report(
    config: crate::domain::AnalysisConfig,
    measurements: &[Measurement],
    output: &OutputArgs,
) -> Result<(), AppError> {
    let run = match pipeline::run_analysis(config, measurements, output.smooth_points) {
        Ok(run) => run,
        Err(AnalysisError::NoValidFit { partial: Some(partial) }) => {
            println!("{}", crate::report::format_inconclusive(&partial));
            if !output.no_plot {
                println!(
                    "{}",
                    crate::report::render_iam_plot(&partial.curve, None, output.width, output.height)
                );
            }
            return Err(AnalysisError::NoValidFit { partial: None }.into());
        }
        Err(err) => return Err(err.into()),
    };

    println!("{}", crate::report::format_summary(&run.result));
    if !output.no_plot {
        println!(
            "{}",
            crate::report::render_iam_plot(
                &run.result.curve,
                run.smooth_curve.as_ref(),
                output.width,
                output.height
            )
        );
    }

    if let Some(path) = &output.export {
        crate::io::write_result_json(path, run.analyzer.config(), &run.result, run.smooth_curve.clone())?;
        tracing::info!(path = %path.display(), "result exported");
    }
    if let Some(path) = &output.export_curve {
        crate::io::write_curve_csv(path, &run.result)?;
        tracing::info!(path = %path.display(), "curve exported");
    }

    Ok(())
}
