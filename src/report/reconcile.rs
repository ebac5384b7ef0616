//! Reconciliation of corrected, uncorrected, and instrument results.
//!
//! The comparison table is an outer join on sample id across three sources:
//!
//! - corrected concentrations (two-segment quantification)
//! - uncorrected concentrations (single full-range model)
//! - the instrument vendor software's own calculated concentrations
//!
//! A sample missing from any source still appears with empty fields; a row
//! that silently vanished here would hide exactly the bugs this table
//! exists to surface.

use std::collections::HashMap;

use crate::domain::{ComparisonRecord, ExternalReference, QuantifiedSample};

/// Build the comparison table, sorted by percent difference descending so
/// the worst-reconciling samples surface first. Undefined differences sort
/// last (ordered by sample id among themselves for determinism).
pub fn reconcile(
    corrected: &[QuantifiedSample],
    uncorrected: &[QuantifiedSample],
    external: &[ExternalReference],
) -> Vec<ComparisonRecord> {
    // Union of sample ids, preserving first-seen order before sorting.
    let mut ids: Vec<&str> = Vec::new();
    let mut seen: HashMap<&str, ()> = HashMap::new();
    for id in corrected
        .iter()
        .map(|s| s.sample_id.as_str())
        .chain(uncorrected.iter().map(|s| s.sample_id.as_str()))
        .chain(external.iter().map(|e| e.sample_id.as_str()))
    {
        if seen.insert(id, ()).is_none() {
            ids.push(id);
        }
    }

    let corrected_by_id: HashMap<&str, &QuantifiedSample> = corrected
        .iter()
        .map(|s| (s.sample_id.as_str(), s))
        .collect();
    let uncorrected_by_id: HashMap<&str, f64> = uncorrected
        .iter()
        .map(|s| (s.sample_id.as_str(), s.measured_conc))
        .collect();
    let external_by_id: HashMap<&str, f64> = external
        .iter()
        .map(|e| (e.sample_id.as_str(), e.conc))
        .collect();

    let mut out: Vec<ComparisonRecord> = ids
        .into_iter()
        .map(|id| {
            let corr = corrected_by_id.get(id);
            let uncorrected_conc = uncorrected_by_id.get(id).copied();
            ComparisonRecord {
                sample_id: id.to_string(),
                is_recovery_percent: corr.map(|s| s.is_recovery_percent),
                corrected_conc: corr.map(|s| s.measured_conc),
                uncorrected_conc,
                external_conc: external_by_id.get(id).copied(),
                percent_difference: percent_difference(
                    corr.map(|s| s.measured_conc),
                    uncorrected_conc,
                ),
            }
        })
        .collect();

    out.sort_by(|a, b| match (a.percent_difference, b.percent_difference) {
        (Some(pa), Some(pb)) => pb.partial_cmp(&pa).unwrap_or(std::cmp::Ordering::Equal),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.sample_id.cmp(&b.sample_id),
    });

    out
}

/// `|corrected - uncorrected| / uncorrected * 100`.
///
/// Undefined — reported as `None`, never as inf or 0 — when the uncorrected
/// concentration is zero or either side is missing.
fn percent_difference(corrected: Option<f64>, uncorrected: Option<f64>) -> Option<f64> {
    let corrected = corrected?;
    let uncorrected = uncorrected?;
    if uncorrected == 0.0 {
        return None;
    }
    Some((corrected - uncorrected).abs() / uncorrected * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CalSet;

    fn quantified(id: &str, conc: f64) -> QuantifiedSample {
        QuantifiedSample {
            sample_id: id.to_string(),
            tc_response: 1.0,
            is_response: 100.0,
            response_ratio: 0.01,
            measured_conc: conc,
            measured_conc_ratio: conc / 5.0,
            is_recovery_percent: 100.0,
            set: Some(CalSet::Set1),
        }
    }

    #[test]
    fn sorts_worst_reconciling_first_with_undefined_last() {
        let corrected = vec![
            quantified("A", 1.0),
            quantified("B", 3.0),
            quantified("C", 0.0),
        ];
        let uncorrected = vec![
            quantified("A", 0.9), // ~11.1%
            quantified("B", 2.0), // 50%
            quantified("C", 0.0), // undefined
        ];

        let table = reconcile(&corrected, &uncorrected, &[]);
        let ids: Vec<&str> = table.iter().map(|r| r.sample_id.as_str()).collect();
        assert_eq!(ids, ["B", "A", "C"]);
        assert!(table[0].percent_difference.unwrap() > table[1].percent_difference.unwrap());
        assert_eq!(table[2].percent_difference, None);
    }

    #[test]
    fn zero_uncorrected_is_undefined_not_zero() {
        let corrected = vec![quantified("ND", 0.5)];
        let uncorrected = vec![quantified("ND", 0.0)];
        let table = reconcile(&corrected, &uncorrected, &[]);
        assert_eq!(table[0].percent_difference, None);
        assert_eq!(table[0].corrected_conc, Some(0.5));
        assert_eq!(table[0].uncorrected_conc, Some(0.0));
    }

    #[test]
    fn outer_join_keeps_samples_missing_from_a_source() {
        let corrected = vec![quantified("A", 1.0)];
        let uncorrected = vec![quantified("A", 1.0), quantified("B", 2.0)];
        let external = vec![ExternalReference {
            sample_id: "Z".to_string(),
            conc: 3.3,
        }];

        let table = reconcile(&corrected, &uncorrected, &external);
        assert_eq!(table.len(), 3);

        let b = table.iter().find(|r| r.sample_id == "B").unwrap();
        assert_eq!(b.corrected_conc, None);
        assert_eq!(b.uncorrected_conc, Some(2.0));
        assert_eq!(b.percent_difference, None);

        let z = table.iter().find(|r| r.sample_id == "Z").unwrap();
        assert_eq!(z.external_conc, Some(3.3));
        assert_eq!(z.corrected_conc, None);

        // Undefined rows are ordered by id in the tail.
        let ids: Vec<&str> = table.iter().map(|r| r.sample_id.as_str()).collect();
        assert_eq!(ids, ["A", "B", "Z"]);
    }
}
