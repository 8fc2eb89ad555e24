//! Input/output helpers.
//!
//! - CSV measurement ingest (`ingest`)
//! - JSON analysis configuration (`config`)
//! - result exports (JSON/CSV) (`export`)

pub mod config;
pub mod export;
pub mod ingest;

pub use config::*;
pub use export::*;
pub use ingest::*;
