//! `calquant` library crate.
//!
//! Adaptive two-segment calibration and quantification for LC-MS/MS batches
//! that use an internal standard (IS) to normalize target compound (TC)
//! response. The crate is a library on purpose so that:
//!
//! - core logic is testable without spawning processes
//! - modules are reusable from report generators, notebooks, etc.
//! - downstream wrappers (spreadsheet import, HTML rendering) stay thin
//!
//! The full workflow lives in [`app::pipeline::run_quantification`]:
//! fit a single response-ratio-vs-concentration-ratio line, back-calculate
//! every calibration standard, and when the standards show uneven accuracy,
//! split them into two accuracy-homogeneous sets, refit each set, route each
//! unknown sample to the matching segment, and reconcile the corrected
//! results against the uncorrected and instrument-reported ones.

pub mod app;
pub mod cal;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod report;
