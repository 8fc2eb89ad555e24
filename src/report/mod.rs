//! Reporting: plain-text summaries and the terminal plot.

pub mod format;
pub mod plot;

pub use format::*;
pub use plot::*;
