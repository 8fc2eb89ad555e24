//! Error types.
//!
//! - `AnalysisError`: structural/input failures raised by the engine.
//! - `AppError`: what the `iam` binary reports (message + process exit code).
//!
//! Numerical failures inside a single model fit are *not* errors here; they are
//! captured in `FitResult::error` so one uncooperative model cannot sink the run.

use crate::domain::{CurveStatistics, FitResult, IamCurvePoint, Metric, ValidationReport};

/// Whatever the pipeline managed to compute before every model fit failed.
#[derive(Debug, Clone)]
pub struct PartialAnalysis {
    pub curve: Vec<IamCurvePoint>,
    pub validation: ValidationReport,
    pub statistics: CurveStatistics,
    pub completeness_pct: f64,
    /// Every attempted fit, keyed by model name (all with `success = false`).
    pub fits: std::collections::BTreeMap<String, FitResult>,
    /// The failed fit of the configured default model.
    pub fallback: Option<FitResult>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum AnalysisError {
    #[error("no measurements supplied")]
    NoMeasurements,

    #[error("measurement #{index} is invalid: {reason}")]
    InvalidMeasurement { index: usize, reason: String },

    #[error("measurement #{index} has no {metric} value")]
    MissingMetric { metric: Metric, index: usize },

    /// The metric at the normalization anchor is zero.
    #[error("normalization value at {angle}° is zero")]
    DivisionByZero { angle: f64 },

    /// Every model failed to fit. Partial results are attached when the
    /// failure happened inside a full analysis.
    #[error("no model produced a valid fit; manual review required")]
    NoValidFit { partial: Option<Box<PartialAnalysis>> },

    #[error("unknown model '{0}'")]
    UnknownModel(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<AnalysisError> for AppError {
    fn from(err: AnalysisError) -> Self {
        let exit_code = match &err {
            AnalysisError::NoValidFit { .. } => 3,
            _ => 2,
        };
        AppError::new(exit_code, err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
