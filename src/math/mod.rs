//! Numerical utilities: small linear solves and bounded nonlinear least squares.

pub mod lm;
pub mod lstsq;

pub use lm::*;
pub use lstsq::*;
