//! Batch CSV ingest and validation.
//!
//! Turns a mixed calibration/sample worksheet export into typed row tables.
//! Expected columns (header match is case-insensitive, BOM-tolerant):
//!
//! - `SampleID`
//! - `Type` — `Cal` or `Sample`
//! - `TC_Response`, `IS_Response` — peak responses
//! - `TC_Conc` — nominal concentration, calibration rows only
//! - `Analyte_CalcConc` — optional vendor-software concentration on sample
//!   rows, used as the third reconciliation reference
//!
//! Unlike a screening tool that can skip bad rows and move on, a
//! quantification batch with a malformed row is not trustworthy: every
//! validation failure here is fatal for the batch.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use csv::StringRecord;

use crate::domain::{CalibrationRow, ExternalReference, SampleRow};
use crate::error::QuantError;

/// Ingest output: typed row tables in acquisition order.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestedBatch {
    pub calibration: Vec<CalibrationRow>,
    pub samples: Vec<SampleRow>,
    pub external: Vec<ExternalReference>,
    pub rows_read: usize,
}

/// Load a batch CSV from disk.
pub fn load_batch_csv(path: &Path) -> Result<IngestedBatch, QuantError> {
    let file = File::open(path).map_err(|e| QuantError::Io {
        message: format!("Failed to open batch CSV '{}': {e}", path.display()),
    })?;
    read_batch(file)
}

/// Read a batch from any CSV source.
pub fn read_batch<R: std::io::Read>(reader: R) -> Result<IngestedBatch, QuantError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| QuantError::Io {
            message: format!("Failed to read CSV headers: {e}"),
        })?
        .clone();
    let header_map = build_header_map(&headers);

    for required in ["sampleid", "type", "tc_response", "is_response"] {
        if !header_map.contains_key(required) {
            return Err(QuantError::Io {
                message: format!("Missing required column: `{required}`"),
            });
        }
    }

    let mut batch = IngestedBatch {
        calibration: Vec::new(),
        samples: Vec::new(),
        external: Vec::new(),
        rows_read: 0,
    };

    for (idx, result) in reader.records().enumerate() {
        // +2: records() starts after the header row, lines are 1-based.
        let line = idx + 2;
        batch.rows_read += 1;

        let record = result.map_err(|e| QuantError::InvalidRow {
            line,
            message: format!("CSV parse error: {e}"),
        })?;
        parse_row(&record, &header_map, line, &mut batch)?;
    }

    Ok(batch)
}

fn parse_row(
    record: &StringRecord,
    header_map: &HashMap<String, usize>,
    line: usize,
    batch: &mut IngestedBatch,
) -> Result<(), QuantError> {
    let sample_id = get_required(record, header_map, "sampleid", line)?.to_string();
    let row_type = get_required(record, header_map, "type", line)?;

    let tc_response = parse_f64(record, header_map, "tc_response", line)?;
    if tc_response < 0.0 {
        return Err(QuantError::InvalidRow {
            line,
            message: format!("TC response must be >= 0, got {tc_response}."),
        });
    }
    let is_response = parse_f64(record, header_map, "is_response", line)?;
    if is_response <= 0.0 {
        return Err(QuantError::InvalidRow {
            line,
            message: format!(
                "IS response must be > 0 (response ratios are undefined otherwise), got {is_response}."
            ),
        });
    }

    if row_type.eq_ignore_ascii_case("cal") {
        // A standard without its nominal concentration cannot calibrate
        // anything.
        let Some(raw) = get_optional(record, header_map, "tc_conc") else {
            return Err(QuantError::MissingReference { sample_id });
        };
        let tc_conc = parse_f64_value(raw, "tc_conc", line)?;
        if tc_conc <= 0.0 {
            return Err(QuantError::InvalidRow {
                line,
                message: format!("Nominal concentration must be > 0, got {tc_conc}."),
            });
        }
        batch.calibration.push(CalibrationRow {
            sample_id,
            tc_response,
            is_response,
            tc_conc,
        });
    } else if row_type.eq_ignore_ascii_case("sample") {
        if let Some(raw) = get_optional(record, header_map, "analyte_calcconc") {
            batch.external.push(ExternalReference {
                sample_id: sample_id.clone(),
                conc: parse_f64_value(raw, "analyte_calcconc", line)?,
            });
        }
        batch.samples.push(SampleRow {
            sample_id,
            tc_response,
            is_response,
        });
    } else {
        return Err(QuantError::InvalidRow {
            line,
            message: format!("Unknown row type '{row_type}' (expected Cal or Sample)."),
        });
    }

    Ok(())
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Excel exports sometimes carry a UTF-8 BOM on the first header; strip
    // it or schema validation incorrectly reports a missing column.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn get_required<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
    line: usize,
) -> Result<&'a str, QuantError> {
    get_optional(record, header_map, name).ok_or_else(|| QuantError::InvalidRow {
        line,
        message: format!("Missing required value: `{name}`"),
    })
}

fn get_optional<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Option<&'a str> {
    let idx = header_map.get(name)?;
    record.get(*idx).map(str::trim).filter(|s| !s.is_empty())
}

fn parse_f64(
    record: &StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
    line: usize,
) -> Result<f64, QuantError> {
    let raw = get_required(record, header_map, name, line)?;
    parse_f64_value(raw, name, line)
}

fn parse_f64_value(raw: &str, name: &str, line: usize) -> Result<f64, QuantError> {
    let v: f64 = raw.parse().map_err(|_| QuantError::InvalidRow {
        line,
        message: format!("Invalid number '{raw}' in `{name}`."),
    })?;
    if !v.is_finite() {
        return Err(QuantError::InvalidRow {
            line,
            message: format!("Non-finite value '{raw}' in `{name}`."),
        });
    }
    Ok(v)
}
