//! Curve fitting and model selection.
//!
//! Responsibilities:
//!
//! - fit each library model to the curve (bounded LM, parallel across models)
//! - compute R² / RMSE / MAE and parameter standard errors
//! - select the best model by a configurable criterion

pub mod fitter;
pub mod selection;

pub use fitter::*;
pub use selection::*;
