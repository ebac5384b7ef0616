//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they
//! can be:
//!
//! - used in-memory while quantifying a batch
//! - exported to CSV/JSON for the downstream report layer
//! - reloaded later for comparisons across batches
//!
//! Every record is an immutable snapshot: a pipeline stage never mutates its
//! input table, it produces a new derived table.

use serde::{Deserialize, Serialize};

use crate::error::QuantError;

/// Default lower edge of the accuracy tolerance band.
pub const DEFAULT_ACCURACY_LOW: f64 = 90.0;
/// Default upper edge of the accuracy tolerance band.
pub const DEFAULT_ACCURACY_HIGH: f64 = 110.0;

/// A calibration standard as acquired: TC and IS peak responses plus the
/// known (nominal) TC concentration spiked into the standard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationRow {
    pub sample_id: String,
    pub tc_response: f64,
    pub is_response: f64,
    /// Nominal TC concentration of the standard (same unit as the IS
    /// concentration, typically ng/mL or ug/mL).
    pub tc_conc: f64,
}

impl CalibrationRow {
    /// TC signal normalized by the IS signal.
    pub fn response_ratio(&self) -> f64 {
        self.tc_response / self.is_response
    }

    /// Nominal TC concentration normalized by the fixed IS concentration.
    pub fn conc_ratio(&self, is_conc: f64) -> f64 {
        self.tc_conc / is_conc
    }
}

/// An unknown sample: responses only, concentration is what we solve for.
///
/// A `tc_response` of exactly `0.0` is the instrument's "not detected"
/// sentinel; quantification forces the measured concentration of such rows
/// to zero instead of reporting a spurious near-intercept value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleRow {
    pub sample_id: String,
    pub tc_response: f64,
    pub is_response: f64,
}

impl SampleRow {
    pub fn response_ratio(&self) -> f64 {
        self.tc_response / self.is_response
    }

    /// True when the instrument reported no TC peak at all.
    pub fn is_not_detected(&self) -> bool {
        self.tc_response == 0.0
    }
}

/// A concentration reported by the instrument vendor software for the same
/// sample, used as a third reference in reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalReference {
    pub sample_id: String,
    pub conc: f64,
}

/// Which calibration segment a row belongs to after a split.
///
/// Set 1 collects the standards whose back-calculated accuracy fell outside
/// the tolerance band; Set 2 is the well-behaved remainder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalSet {
    #[serde(rename = "Set 1")]
    Set1,
    #[serde(rename = "Set 2")]
    Set2,
}

impl CalSet {
    /// Human-readable label for tables and exports.
    pub fn display_name(self) -> &'static str {
        match self {
            CalSet::Set1 => "Set 1",
            CalSet::Set2 => "Set 2",
        }
    }
}

/// Which standards are moved into Set 1 when splitting a calibration.
///
/// The quantification scripts this crate replaces used both rules at
/// different times, so the choice stays a configuration knob rather than
/// being unified silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SplitPredicate {
    /// Only standards at or above the high accuracy edge go to Set 1.
    HighOnly,
    /// Standards outside the band on either side go to Set 1.
    TwoSided,
}

/// An ordinary-least-squares line through (concentration ratio, response
/// ratio) pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedModel {
    pub slope: f64,
    pub intercept: f64,
    /// Coefficient of determination over the fit set, rounded to 4 decimals.
    pub r_squared: f64,
}

/// A calibration standard back-calculated through a fitted model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccuracyRecord {
    pub sample_id: String,
    pub tc_response: f64,
    pub is_response: f64,
    pub tc_conc: f64,
    pub response_ratio: f64,
    pub conc_ratio: f64,
    /// Concentration recovered by inverting the model at this standard's
    /// response ratio.
    pub measured_conc: f64,
    /// 100-centered accuracy: `|((measured - nominal)/nominal * 100) - 100|`.
    ///
    /// A perfect back-calculation scores **100**, not 0, and the default
    /// 90/110 band is a +/-10% tolerance around that center. The centering is
    /// easy to mis-read as a 0-centered error percentage; it is preserved
    /// here because every historical report used it.
    pub accuracy_percent: f64,
}

impl AccuracyRecord {
    /// The underlying calibration row (used when re-fitting a subset).
    pub fn calibration_row(&self) -> CalibrationRow {
        CalibrationRow {
            sample_id: self.sample_id.clone(),
            tc_response: self.tc_response,
            is_response: self.is_response,
            tc_conc: self.tc_conc,
        }
    }
}

/// An unknown sample with its measured concentration and QC companions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantifiedSample {
    pub sample_id: String,
    pub tc_response: f64,
    pub is_response: f64,
    pub response_ratio: f64,
    pub measured_conc: f64,
    /// `measured_conc / is_conc`, kept for range plots downstream.
    pub measured_conc_ratio: f64,
    /// IS response relative to the mean IS response of the calibration rows
    /// the model was fitted on, as a percent.
    pub is_recovery_percent: f64,
    /// Segment this sample was routed to; `None` for the single full-range
    /// model.
    pub set: Option<CalSet>,
}

/// One line of the reconciliation table.
///
/// All concentration fields are optional because reconciliation is an outer
/// join: a sample dropped by the instrument software or by a set-assignment
/// bug must stay visible with empty fields, not silently disappear.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRecord {
    pub sample_id: String,
    pub is_recovery_percent: Option<f64>,
    pub corrected_conc: Option<f64>,
    pub uncorrected_conc: Option<f64>,
    /// Vendor-software concentration, when the instrument reported one.
    pub external_conc: Option<f64>,
    /// `|corrected - uncorrected| / uncorrected * 100`; undefined (`None`)
    /// when the uncorrected concentration is zero or either side is absent.
    pub percent_difference: Option<f64>,
}

/// Batch configuration.
///
/// `dilution_factor` is a pure reporting transform (e.g. x20 for a diluted
/// urine aliquot); it scales the exported concentration column and never
/// enters the quantification math.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantConfig {
    /// Batch / sequence name carried into exports.
    pub batch_name: String,
    /// Export column title, e.g. "Nicotine (ng/mL)".
    pub analyte_label: String,
    /// Fixed internal standard concentration for the whole batch.
    pub is_conc: f64,
    pub accuracy_low: f64,
    pub accuracy_high: f64,
    pub split_predicate: SplitPredicate,
    pub dilution_factor: f64,
}

impl QuantConfig {
    /// Config with the standard 90/110 band, two-sided splitting and no
    /// dilution scaling.
    pub fn new(
        batch_name: impl Into<String>,
        analyte_label: impl Into<String>,
        is_conc: f64,
    ) -> Self {
        Self {
            batch_name: batch_name.into(),
            analyte_label: analyte_label.into(),
            is_conc,
            accuracy_low: DEFAULT_ACCURACY_LOW,
            accuracy_high: DEFAULT_ACCURACY_HIGH,
            split_predicate: SplitPredicate::TwoSided,
            dilution_factor: 1.0,
        }
    }

    /// Validate the numeric knobs before a run.
    pub fn validate(&self) -> Result<(), QuantError> {
        if !(self.is_conc.is_finite() && self.is_conc > 0.0) {
            return Err(QuantError::InvalidConfig {
                message: format!("IS concentration must be finite and > 0, got {}.", self.is_conc),
            });
        }
        if !(self.accuracy_low.is_finite() && self.accuracy_high.is_finite()) {
            return Err(QuantError::InvalidConfig {
                message: "Accuracy band edges must be finite.".to_string(),
            });
        }
        if self.accuracy_low >= self.accuracy_high {
            return Err(QuantError::InvalidConfig {
                message: format!(
                    "Accuracy band is inverted: low {} >= high {}.",
                    self.accuracy_low, self.accuracy_high
                ),
            });
        }
        if !(self.dilution_factor.is_finite() && self.dilution_factor > 0.0) {
            return Err(QuantError::InvalidConfig {
                message: format!(
                    "Dilution factor must be finite and > 0, got {}.",
                    self.dilution_factor
                ),
            });
        }
        Ok(())
    }
}

/// Batch-level means reported alongside the tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    pub n_calibration: usize,
    pub n_samples: usize,
    /// Mean IS response over the full calibration table.
    pub cal_is_response_mean: f64,
    /// Mean sample IS recovery (uncorrected pass), percent.
    pub mean_is_recovery: f64,
    /// Mean measured sample concentration (uncorrected pass).
    pub mean_measured_conc: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratios_divide_as_expected() {
        let row = CalibrationRow {
            sample_id: "CAL1".to_string(),
            tc_response: 30.0,
            is_response: 100.0,
            tc_conc: 1.0,
        };
        assert!((row.response_ratio() - 0.3).abs() < 1e-15);
        assert!((row.conc_ratio(5.0) - 0.2).abs() < 1e-15);
    }

    #[test]
    fn zero_response_is_the_not_detected_sentinel() {
        let row = SampleRow {
            sample_id: "S1".to_string(),
            tc_response: 0.0,
            is_response: 50.0,
        };
        assert!(row.is_not_detected());
    }

    #[test]
    fn config_validation_rejects_bad_knobs() {
        let mut config = QuantConfig::new("Batch", "Nicotine (ng/mL)", 5.0);
        assert!(config.validate().is_ok());

        config.is_conc = 0.0;
        assert!(config.validate().is_err());

        config.is_conc = 5.0;
        config.accuracy_low = 120.0;
        assert!(config.validate().is_err());

        config.accuracy_low = 90.0;
        config.dilution_factor = -1.0;
        assert!(config.validate().is_err());
    }
}
