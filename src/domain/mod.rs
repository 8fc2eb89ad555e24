//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - raw inputs (`Measurement`, `Metric`)
//! - derived curve data (`IamCurvePoint`, `InterpolatedPoint`, `CurveStatistics`)
//! - fit outputs (`FitResult`, `AnalysisResult`, etc.)
//! - the caller-built `AnalysisConfig`

pub mod config;
pub mod types;

pub use config::*;
pub use types::*;
