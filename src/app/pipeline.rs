//! The full quantification pipeline.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! full-range fit -> accuracy -> split decision -> per-segment refit ->
//! routed quantification -> reconciliation
//!
//! Callers (exports, report renderers) can then focus on presentation.
//!
//! Every stage is fail-fast: the computation is deterministic, so an error
//! aborts the batch rather than emitting a partially-correct report.

use serde::{Deserialize, Serialize};

use crate::cal::{evaluate, mean_is_response, partition, quantify, route_samples};
use crate::cal::{CalibrationSplit, SplitOutcome};
use crate::domain::{
    AccuracyRecord, CalSet, CalibrationRow, ExternalReference, FittedModel, QuantConfig,
    QuantifiedSample, RunStats, SampleRow,
};
use crate::error::QuantError;
use crate::fit::fit_line;
use crate::report::reconcile;

/// Everything the two-segment correction produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectedRun {
    pub split: CalibrationSplit,
    pub model_set1: FittedModel,
    pub model_set2: FittedModel,
    pub accuracy_set1: Vec<AccuracyRecord>,
    pub accuracy_set2: Vec<AccuracyRecord>,
    /// All samples, quantified through their routed segment model, restored
    /// to original acquisition order and labeled with their set.
    pub samples: Vec<QuantifiedSample>,
    /// Corrected vs uncorrected vs instrument-reported concentrations.
    pub comparison: Vec<crate::domain::ComparisonRecord>,
}

/// All computed outputs of a single batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunOutput {
    /// Single full-range model.
    pub model: FittedModel,
    /// Full-range accuracy table.
    pub accuracy: Vec<AccuracyRecord>,
    /// Uncorrected sample quantification (full-range model).
    pub samples: Vec<QuantifiedSample>,
    pub stats: RunStats,
    /// `None` when every standard back-calculated inside the tolerance band
    /// and the single model was kept.
    pub correction: Option<CorrectedRun>,
}

impl RunOutput {
    /// The sample table a report should publish: corrected when a split
    /// happened, uncorrected otherwise.
    pub fn reported_samples(&self) -> &[QuantifiedSample] {
        match &self.correction {
            Some(corrected) => &corrected.samples,
            None => &self.samples,
        }
    }
}

/// Run the full pipeline on one batch.
pub fn run_quantification(
    cal_rows: &[CalibrationRow],
    sample_rows: &[SampleRow],
    external: &[ExternalReference],
    config: &QuantConfig,
) -> Result<RunOutput, QuantError> {
    config.validate()?;

    // 1) Single full-range model over every standard.
    let pairs: Vec<(f64, f64)> = cal_rows
        .iter()
        .map(|r| (r.conc_ratio(config.is_conc), r.response_ratio()))
        .collect();
    let model = fit_line(&pairs)?;

    // 2) Back-calculate the standards and quantify every sample through the
    //    uncorrected model.
    let accuracy = evaluate(&model, cal_rows, config.is_conc)?;
    let samples = quantify(&model, sample_rows, cal_rows, config.is_conc, None)?;
    let stats = run_stats(cal_rows, &samples);

    // 3) Split decision. A fully in-band calibration keeps the single model.
    let split = match partition(&accuracy, config) {
        SplitOutcome::NoSplitNeeded => {
            return Ok(RunOutput {
                model,
                accuracy,
                samples,
                stats,
                correction: None,
            });
        }
        SplitOutcome::Split(split) => split,
    };

    // 4) Independent refit per segment. Each segment must still be a real
    //    calibration (two distinct levels) or the batch fails.
    let correction = correct(&split, sample_rows, &samples, external, config)?;

    Ok(RunOutput {
        model,
        accuracy,
        samples,
        stats,
        correction: Some(correction),
    })
}

fn correct(
    split: &CalibrationSplit,
    sample_rows: &[SampleRow],
    uncorrected: &[QuantifiedSample],
    external: &[ExternalReference],
    config: &QuantConfig,
) -> Result<CorrectedRun, QuantError> {
    let model_set1 = fit_segment(&split.set1, config)?;
    let model_set2 = fit_segment(&split.set2, config)?;

    let accuracy_set1 = evaluate(&model_set1, &split.set1, config.is_conc)?;
    let accuracy_set2 = evaluate(&model_set2, &split.set2, config.is_conc)?;

    let (routed1, routed2) = route_samples(sample_rows, split.cutoff);
    let quantified1 = quantify(
        &model_set1,
        &routed1,
        &split.set1,
        config.is_conc,
        Some(CalSet::Set1),
    )?;
    let quantified2 = quantify(
        &model_set2,
        &routed2,
        &split.set2,
        config.is_conc,
        Some(CalSet::Set2),
    )?;

    let samples = merge_in_input_order(sample_rows, split.cutoff, quantified1, quantified2);
    let comparison = reconcile(&samples, uncorrected, external);

    Ok(CorrectedRun {
        split: split.clone(),
        model_set1,
        model_set2,
        accuracy_set1,
        accuracy_set2,
        samples,
        comparison,
    })
}

fn fit_segment(rows: &[CalibrationRow], config: &QuantConfig) -> Result<FittedModel, QuantError> {
    let pairs: Vec<(f64, f64)> = rows
        .iter()
        .map(|r| (r.conc_ratio(config.is_conc), r.response_ratio()))
        .collect();
    fit_line(&pairs)
}

/// Interleave the two per-segment result tables back into the original
/// sample order.
///
/// Routing preserves relative order inside each segment, so walking the
/// original rows and re-testing the routing predicate reads the two tables
/// back in exactly the order they were produced.
fn merge_in_input_order(
    sample_rows: &[SampleRow],
    cutoff: f64,
    quantified1: Vec<QuantifiedSample>,
    quantified2: Vec<QuantifiedSample>,
) -> Vec<QuantifiedSample> {
    let mut iter1 = quantified1.into_iter();
    let mut iter2 = quantified2.into_iter();
    let mut out = Vec::with_capacity(sample_rows.len());
    for row in sample_rows {
        let next = if row.response_ratio() <= cutoff {
            iter1.next()
        } else {
            iter2.next()
        };
        // Each routed subset was quantified in full, so the matching entry
        // always exists.
        if let Some(sample) = next {
            out.push(sample);
        }
    }
    out
}

fn run_stats(cal_rows: &[CalibrationRow], samples: &[QuantifiedSample]) -> RunStats {
    let n_samples = samples.len();
    let mean = |f: &dyn Fn(&QuantifiedSample) -> f64| -> f64 {
        if n_samples == 0 {
            0.0
        } else {
            samples.iter().map(|s| f(s)).sum::<f64>() / n_samples as f64
        }
    };

    RunStats {
        n_calibration: cal_rows.len(),
        n_samples,
        cal_is_response_mean: mean_is_response(cal_rows).unwrap_or(0.0),
        mean_is_recovery: mean(&|s| s.is_recovery_percent),
        mean_measured_conc: mean(&|s| s.measured_conc),
    }
}
