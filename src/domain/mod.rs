//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - raw input rows (`CalibrationRow`, `SampleRow`, `ExternalReference`)
//! - batch configuration (`QuantConfig`, `SplitPredicate`)
//! - per-stage result records (`AccuracyRecord`, `QuantifiedSample`,
//!   `ComparisonRecord`)

pub mod types;

pub use types::*;
