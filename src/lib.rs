//! `iam-curves` library crate.
//!
//! Incidence Angle Modifier (IAM) analysis for PV modules: normalize
//! angle-resolved measurements into an IAM curve, fit parametric models,
//! pick the best one and report on data quality.
//!
//! The binary (`iam`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the analysis engine is reusable from other front ends

pub mod analysis;
pub mod app;
pub mod cli;
pub mod curve;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod report;
