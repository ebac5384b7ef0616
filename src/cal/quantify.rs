//! Sample quantification.
//!
//! Turns sample response ratios into concentrations through a fitted
//! calibration line, and computes IS recovery against the mean IS response
//! of the calibration rows that line was fitted on. In two-segment mode
//! this runs once per segment with that segment's model, rows, and routed
//! samples.

use crate::domain::{CalSet, CalibrationRow, FittedModel, QuantifiedSample, SampleRow};
use crate::error::QuantError;
use crate::fit::invert;

/// Quantify `samples` through `model`.
///
/// `cal_rows` must be the calibration rows the model was fitted on; their
/// mean IS response is the recovery reference. `set` labels the output rows
/// (`None` for the single full-range model).
///
/// Zero-response override: a sample whose TC response is exactly 0 was not
/// detected, and its measured concentration and concentration ratio are
/// forced to 0 no matter what the line would report. This is policy, not
/// error recovery — the line's intercept would otherwise turn "no peak"
/// into a small spurious (possibly negative) concentration.
pub fn quantify(
    model: &FittedModel,
    samples: &[SampleRow],
    cal_rows: &[CalibrationRow],
    is_conc: f64,
    set: Option<CalSet>,
) -> Result<Vec<QuantifiedSample>, QuantError> {
    let cal_is_mean = mean_is_response(cal_rows).ok_or(QuantError::InsufficientData {
        distinct_points: 0,
    })?;

    let mut out = Vec::with_capacity(samples.len());
    for sample in samples {
        let response_ratio = sample.response_ratio();

        let (measured_conc, measured_conc_ratio) = if sample.is_not_detected() {
            (0.0, 0.0)
        } else {
            let conc = invert(model, response_ratio)? * is_conc;
            (conc, conc / is_conc)
        };

        out.push(QuantifiedSample {
            sample_id: sample.sample_id.clone(),
            tc_response: sample.tc_response,
            is_response: sample.is_response,
            response_ratio,
            measured_conc,
            measured_conc_ratio,
            is_recovery_percent: (sample.is_response / cal_is_mean) * 100.0,
            set,
        });
    }
    Ok(out)
}

/// Mean IS response over the calibration table; `None` when it is empty.
pub fn mean_is_response(cal_rows: &[CalibrationRow]) -> Option<f64> {
    if cal_rows.is_empty() {
        return None;
    }
    Some(cal_rows.iter().map(|r| r.is_response).sum::<f64>() / cal_rows.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cal_row(id: &str, is: f64) -> CalibrationRow {
        CalibrationRow {
            sample_id: id.to_string(),
            tc_response: 10.0,
            is_response: is,
            tc_conc: 1.0,
        }
    }

    fn sample(id: &str, tc: f64, is: f64) -> SampleRow {
        SampleRow {
            sample_id: id.to_string(),
            tc_response: tc,
            is_response: is,
        }
    }

    #[test]
    fn quantifies_through_the_inverse_mapping() {
        // Identity line, IS conc 5: response ratio 0.4 -> concentration 2.0.
        let model = FittedModel {
            slope: 1.0,
            intercept: 0.0,
            r_squared: 1.0,
        };
        let cal = [cal_row("CAL1", 100.0), cal_row("CAL2", 100.0)];
        let samples = [sample("S1", 40.0, 100.0)];

        let out = quantify(&model, &samples, &cal, 5.0, None).unwrap();
        assert!((out[0].measured_conc - 2.0).abs() < 1e-12);
        assert!((out[0].measured_conc_ratio - 0.4).abs() < 1e-12);
        assert!((out[0].is_recovery_percent - 100.0).abs() < 1e-12);
        assert_eq!(out[0].set, None);
    }

    #[test]
    fn zero_response_overrides_any_model_output() {
        // A steep intercept would report a negative concentration for a
        // zero response; the override must win.
        let model = FittedModel {
            slope: 2.0,
            intercept: 3.0,
            r_squared: 1.0,
        };
        let cal = [cal_row("CAL1", 100.0)];
        let samples = [sample("ND", 0.0, 80.0)];

        let out = quantify(&model, &samples, &cal, 5.0, Some(CalSet::Set1)).unwrap();
        assert_eq!(out[0].measured_conc, 0.0);
        assert_eq!(out[0].measured_conc_ratio, 0.0);
        // Recovery is still real: the IS peak was observed.
        assert!((out[0].is_recovery_percent - 80.0).abs() < 1e-12);
        assert_eq!(out[0].set, Some(CalSet::Set1));
    }

    #[test]
    fn zero_response_never_touches_a_degenerate_model() {
        let model = FittedModel {
            slope: 0.0,
            intercept: 0.0,
            r_squared: 0.0,
        };
        let cal = [cal_row("CAL1", 100.0)];
        let samples = [sample("ND", 0.0, 100.0)];

        // Not-detected rows skip inversion entirely, so this succeeds...
        assert!(quantify(&model, &samples, &cal, 5.0, None).is_ok());

        // ...while any detected row still fails fast.
        let detected = [sample("S1", 10.0, 100.0)];
        assert!(matches!(
            quantify(&model, &detected, &cal, 5.0, None),
            Err(QuantError::DegenerateModel { .. })
        ));
    }

    #[test]
    fn recovery_uses_the_fitting_rows_mean() {
        let model = FittedModel {
            slope: 1.0,
            intercept: 0.0,
            r_squared: 1.0,
        };
        let cal = [cal_row("CAL1", 90.0), cal_row("CAL2", 110.0)]; // mean 100
        let samples = [sample("S1", 10.0, 50.0)];

        let out = quantify(&model, &samples, &cal, 5.0, None).unwrap();
        assert!((out[0].is_recovery_percent - 50.0).abs() < 1e-12);
    }
}
