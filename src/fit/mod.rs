//! Calibration line fitting.
//!
//! Responsibilities:
//!
//! - fit the response-ratio-vs-concentration-ratio line (OLS)
//! - predict a response ratio from a concentration ratio
//! - invert the line to recover a concentration ratio from a response
//!   (the direction quantification actually uses)

pub mod model;

pub use model::*;
