//! Application-level orchestration.
//!
//! The spreadsheet/report wrappers around this crate stay thin; this module
//! is the "real main" they call into:
//! - `pipeline::run_quantification` for callers that already hold row tables
//! - [`run_batch_file`] for callers starting from a batch CSV on disk

use std::path::Path;

use crate::domain::QuantConfig;
use crate::error::QuantError;

pub mod pipeline;

/// Load a batch CSV and run the full quantification pipeline on it.
pub fn run_batch_file(path: &Path, config: &QuantConfig) -> Result<pipeline::RunOutput, QuantError> {
    let batch = crate::io::load_batch_csv(path)?;
    pipeline::run_quantification(&batch.calibration, &batch.samples, &batch.external, config)
}
