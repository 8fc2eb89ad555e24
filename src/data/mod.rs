//! Data sources other than lab files.

pub mod synthetic;

pub use synthetic::*;
