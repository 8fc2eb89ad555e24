//! IAM curve construction and inspection.
//!
//! - `builder`: measurements → normalized, irradiance-corrected curve
//! - `interpolate`: estimates at arbitrary angles
//! - `stats`: summary statistics and reference-angle IAMs
//! - `validate`: physical-plausibility warnings

pub mod builder;
pub mod interpolate;
pub mod stats;
pub mod validate;

pub use builder::*;
pub use interpolate::*;
pub use stats::*;
pub use validate::*;
