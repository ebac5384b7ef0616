//! Calibration splitting and sample routing.
//!
//! When the single full-range line back-calculates some standards poorly,
//! the calibration is split into two accuracy-homogeneous sets:
//!
//! - Set 1: standards whose accuracy fell outside the tolerance band
//! - Set 2: the well-behaved remainder
//!
//! The split is total and disjoint — every standard lands in exactly one
//! set. The response ratio of the *last* Set 1 row (in original table
//! order) becomes the cutoff that routes unknown samples between the two
//! refitted segment models.

use crate::domain::{AccuracyRecord, CalibrationRow, QuantConfig, SampleRow, SplitPredicate};

/// Result of the split decision.
///
/// `NoSplitNeeded` is a control signal, not an error: the single full-range
/// model already back-calculates every standard inside the tolerance band,
/// so two-segment correction is unnecessary and must not proceed.
#[derive(Debug, Clone, PartialEq)]
pub enum SplitOutcome {
    NoSplitNeeded,
    Split(CalibrationSplit),
}

/// A two-way partition of the calibration table plus the routing cutoff.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CalibrationSplit {
    pub set1: Vec<CalibrationRow>,
    pub set2: Vec<CalibrationRow>,
    /// Response ratio of the last Set 1 row in original table order.
    ///
    /// Precondition (documented, not enforced): the calibration table keeps
    /// its acquisition order, with Set 1 rows contiguous and responses
    /// increasing near the set boundary. A table that violates this still
    /// partitions cleanly, but samples near the boundary may be routed to
    /// the less appropriate segment.
    pub cutoff: f64,
}

/// Split the calibration by back-calculated accuracy.
///
/// `records` must be the accuracy table of the full-range model, in the
/// original calibration row order.
pub fn partition(records: &[AccuracyRecord], config: &QuantConfig) -> SplitOutcome {
    let mut set1 = Vec::new();
    let mut set2 = Vec::new();
    let mut cutoff = f64::NAN;

    for record in records {
        if routes_to_set1(record.accuracy_percent, config) {
            cutoff = record.response_ratio;
            set1.push(record.calibration_row());
        } else {
            set2.push(record.calibration_row());
        }
    }

    if set1.is_empty() {
        return SplitOutcome::NoSplitNeeded;
    }

    SplitOutcome::Split(CalibrationSplit { set1, set2, cutoff })
}

fn routes_to_set1(accuracy_percent: f64, config: &QuantConfig) -> bool {
    match config.split_predicate {
        SplitPredicate::HighOnly => accuracy_percent >= config.accuracy_high,
        SplitPredicate::TwoSided => {
            accuracy_percent >= config.accuracy_high || accuracy_percent <= config.accuracy_low
        }
    }
}

/// Route unknown samples to the segment models by response ratio.
///
/// Hard partition: `response_ratio <= cutoff` goes to Set 1 (the boundary
/// value itself included), everything above goes to Set 2. No sample is
/// evaluated by both models.
pub fn route_samples(samples: &[SampleRow], cutoff: f64) -> (Vec<SampleRow>, Vec<SampleRow>) {
    let mut set1 = Vec::new();
    let mut set2 = Vec::new();
    for sample in samples {
        if sample.response_ratio() <= cutoff {
            set1.push(sample.clone());
        } else {
            set2.push(sample.clone());
        }
    }
    (set1, set2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, response_ratio: f64, accuracy: f64) -> AccuracyRecord {
        AccuracyRecord {
            sample_id: id.to_string(),
            tc_response: response_ratio * 100.0,
            is_response: 100.0,
            tc_conc: 1.0,
            response_ratio,
            conc_ratio: response_ratio,
            measured_conc: 1.0,
            accuracy_percent: accuracy,
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
    fn partition_is_total_and_disjoint() {
        let config = QuantConfig::new("B", "A", 5.0);
        let records = vec![
            record("CAL1", 0.1, 150.0),
            record("CAL2", 0.2, 120.0),
            record("CAL3", 0.5, 100.0),
            record("CAL4", 1.0, 99.0),
        ];

        let SplitOutcome::Split(split) = partition(&records, &config) else {
            panic!("expected a split");
        };

        assert_eq!(split.set1.len() + split.set2.len(), records.len());
        let ids1: Vec<&str> = split.set1.iter().map(|r| r.sample_id.as_str()).collect();
        let ids2: Vec<&str> = split.set2.iter().map(|r| r.sample_id.as_str()).collect();
        assert_eq!(ids1, ["CAL1", "CAL2"]);
        assert_eq!(ids2, ["CAL3", "CAL4"]);
        for id in &ids1 {
            assert!(!ids2.contains(id));
        }
    }

    #[test]
    fn cutoff_is_last_set1_row_in_table_order() {
        let config = QuantConfig::new("B", "A", 5.0);
        let records = vec![
            record("CAL1", 0.1, 180.0),
            record("CAL2", 0.3, 115.0),
            record("CAL3", 1.0, 100.0),
        ];
        let SplitOutcome::Split(split) = partition(&records, &config) else {
            panic!("expected a split");
        };
        assert_eq!(split.cutoff, 0.3);
    }

    #[test]
    fn all_in_band_signals_no_split_needed() {
        let config = QuantConfig::new("B", "A", 5.0);
        let records = vec![
            record("CAL1", 0.1, 100.0),
            record("CAL2", 0.2, 95.0),
            record("CAL3", 0.5, 105.0),
        ];
        assert_eq!(partition(&records, &config), SplitOutcome::NoSplitNeeded);
    }

    #[test]
    fn two_sided_also_catches_the_low_edge() {
        let mut config = QuantConfig::new("B", "A", 5.0);
        let records = vec![record("CAL1", 0.1, 85.0), record("CAL2", 0.2, 100.0)];

        // accuracy 85 is below the band: Set 1 under the two-sided rule...
        let SplitOutcome::Split(split) = partition(&records, &config) else {
            panic!("expected a split");
        };
        assert_eq!(split.set1.len(), 1);

        // ...but not under the high-only rule.
        config.split_predicate = SplitPredicate::HighOnly;
        assert_eq!(partition(&records, &config), SplitOutcome::NoSplitNeeded);
    }

    #[test]
    fn routing_boundary_belongs_to_set_one() {
        let samples = vec![
            sample("S1", 10.0, 100.0), // ratio 0.1
            sample("S2", 30.0, 100.0), // ratio 0.3 == cutoff
            sample("S3", 31.0, 100.0), // ratio 0.31
        ];
        let (set1, set2) = route_samples(&samples, 0.3);
        let ids1: Vec<&str> = set1.iter().map(|s| s.sample_id.as_str()).collect();
        let ids2: Vec<&str> = set2.iter().map(|s| s.sample_id.as_str()).collect();
        assert_eq!(ids1, ["S1", "S2"]);
        assert_eq!(ids2, ["S3"]);
    }
}
