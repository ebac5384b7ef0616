//! Calibration curve accuracy.
//!
//! Each standard is pushed back through the fitted line: invert its response
//! ratio to a measured concentration and compare against the nominal one.
//! Pure function of its inputs; the input table is never mutated.

use crate::domain::{AccuracyRecord, CalibrationRow, FittedModel};
use crate::error::QuantError;
use crate::fit::invert;

/// Back-calculate every calibration row through `model`.
///
/// `accuracy_percent` is the 100-centered metric the QC reports have always
/// used: a perfect back-calculation scores 100, and the 90/110 band reads as
/// a +/-10% tolerance (see [`AccuracyRecord::accuracy_percent`]).
pub fn evaluate(
    model: &FittedModel,
    rows: &[CalibrationRow],
    is_conc: f64,
) -> Result<Vec<AccuracyRecord>, QuantError> {
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let response_ratio = row.response_ratio();
        let measured_conc = invert(model, response_ratio)? * is_conc;
        let accuracy_percent =
            (((measured_conc - row.tc_conc) / row.tc_conc) * 100.0 - 100.0).abs();

        out.push(AccuracyRecord {
            sample_id: row.sample_id.clone(),
            tc_response: row.tc_response,
            is_response: row.is_response,
            tc_conc: row.tc_conc,
            response_ratio,
            conc_ratio: row.conc_ratio(is_conc),
            measured_conc,
            accuracy_percent,
        });
    }
    Ok(out)
}
