//! Result-table exports.
//!
//! CSV exports are meant to be easy to consume in spreadsheets or downstream
//! report scripts; the JSON run file is the "portable" representation of a
//! whole batch (models + every record table) for later comparison.
//!
//! The dilution factor is applied here and only here: it is a reporting
//! transform (vial concentration -> specimen concentration), never part of
//! the quantification math.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::app::pipeline::RunOutput;
use crate::domain::{ComparisonRecord, QuantConfig};
use crate::error::QuantError;

/// A saved batch run (JSON).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunFile {
    pub tool: String,
    pub batch_name: String,
    pub analyte_label: String,
    pub is_conc: f64,
    pub dilution_factor: f64,
    pub output: RunOutput,
}

/// Write the primary sample export.
///
/// Columns mirror the worksheet the lab submits: batch, sample id, IS
/// recovery, vial concentration, and the dilution-scaled concentration
/// under the analyte label.
pub fn write_samples_csv(
    path: &Path,
    output: &RunOutput,
    config: &QuantConfig,
) -> Result<(), QuantError> {
    let mut file = create(path)?;

    writeln!(
        file,
        "Batch,SampleID,IS_Recovery,Measured_TC_Conc,{}",
        config.analyte_label
    )
    .map_err(|e| write_error(path, e))?;

    for s in output.reported_samples() {
        writeln!(
            file,
            "{},{},{:.0},{:.6},{:.6}",
            config.batch_name,
            s.sample_id,
            s.is_recovery_percent,
            s.measured_conc,
            s.measured_conc * config.dilution_factor,
        )
        .map_err(|e| write_error(path, e))?;
    }

    Ok(())
}

/// Write the reconciliation table (rows already sorted worst-first).
pub fn write_comparison_csv(path: &Path, records: &[ComparisonRecord]) -> Result<(), QuantError> {
    let mut file = create(path)?;

    writeln!(
        file,
        "SampleID,IS_Recovery,Measured_TC_Conc_Uncorrected,Measured_TC_Conc_Instrument,Measured_TC_Conc_Corrected,Percent_Difference"
    )
    .map_err(|e| write_error(path, e))?;

    for r in records {
        writeln!(
            file,
            "{},{},{},{},{},{}",
            r.sample_id,
            fmt_opt(r.is_recovery_percent, 0),
            fmt_opt(r.uncorrected_conc, 6),
            fmt_opt(r.external_conc, 6),
            fmt_opt(r.corrected_conc, 6),
            fmt_opt(r.percent_difference, 4),
        )
        .map_err(|e| write_error(path, e))?;
    }

    Ok(())
}

/// Write the full run as JSON.
pub fn write_run_json(path: &Path, output: &RunOutput, config: &QuantConfig) -> Result<(), QuantError> {
    let file = create(path)?;
    let run = RunFile {
        tool: "calquant".to_string(),
        batch_name: config.batch_name.clone(),
        analyte_label: config.analyte_label.clone(),
        is_conc: config.is_conc,
        dilution_factor: config.dilution_factor,
        output: output.clone(),
    };
    serde_json::to_writer_pretty(file, &run).map_err(|e| QuantError::Io {
        message: format!("Failed to write run JSON '{}': {e}", path.display()),
    })
}

/// Read a previously saved run JSON.
pub fn read_run_json(path: &Path) -> Result<RunFile, QuantError> {
    let file = File::open(path).map_err(|e| QuantError::Io {
        message: format!("Failed to open run JSON '{}': {e}", path.display()),
    })?;
    serde_json::from_reader(file).map_err(|e| QuantError::Io {
        message: format!("Invalid run JSON '{}': {e}", path.display()),
    })
}

fn create(path: &Path) -> Result<File, QuantError> {
    File::create(path).map_err(|e| QuantError::Io {
        message: format!("Failed to create export '{}': {e}", path.display()),
    })
}

fn write_error(path: &Path, e: std::io::Error) -> QuantError {
    QuantError::Io {
        message: format!("Failed to write export '{}': {e}", path.display()),
    }
}

fn fmt_opt(v: Option<f64>, decimals: usize) -> String {
    match v {
        Some(v) => format!("{v:.decimals$}"),
        None => String::new(),
    }
}
