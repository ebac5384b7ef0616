//! Formatted terminal output for a batch run.
//!
//! Pure string builders: the quantification code never prints, and the
//! downstream HTML/Excel renderers are free to ignore these and consume the
//! record tables directly.

use crate::app::pipeline::RunOutput;
use crate::domain::{AccuracyRecord, ComparisonRecord, QuantConfig, QuantifiedSample};

/// Format the run summary: batch metadata, model diagnostics, split state.
pub fn format_run_summary(output: &RunOutput, config: &QuantConfig) -> String {
    let mut out = String::new();

    out.push_str("=== calquant - Calibration QC ===\n");
    out.push_str(&format!("Batch: {}\n", config.batch_name));
    out.push_str(&format!("Analyte: {}\n", config.analyte_label));
    out.push_str(&format!("IS concentration: {}\n", config.is_conc));
    out.push_str(&format!(
        "Standards: n={} | samples: n={}\n",
        output.stats.n_calibration, output.stats.n_samples
    ));

    out.push_str("\nFull-range model:\n");
    out.push_str(&format!(
        "- slope={:.6} intercept={:.6} R^2={:.4}\n",
        output.model.slope, output.model.intercept, output.model.r_squared
    ));
    let flagged = output
        .accuracy
        .iter()
        .filter(|r| out_of_band(r, config))
        .count();
    out.push_str(&format!(
        "- standards outside {:.0}-{:.0} accuracy band: {flagged}\n",
        config.accuracy_low, config.accuracy_high
    ));

    match &output.correction {
        None => out.push_str("\nSplit: not needed (single model kept)\n"),
        Some(corr) => {
            out.push_str(&format!(
                "\nSplit: Set 1 n={} | Set 2 n={} | routing cutoff={:.4}\n",
                corr.split.set1.len(),
                corr.split.set2.len(),
                corr.split.cutoff
            ));
            out.push_str(&format!(
                "- Set 1: slope={:.6} intercept={:.6} R^2={:.4}\n",
                corr.model_set1.slope, corr.model_set1.intercept, corr.model_set1.r_squared
            ));
            out.push_str(&format!(
                "- Set 2: slope={:.6} intercept={:.6} R^2={:.4}\n",
                corr.model_set2.slope, corr.model_set2.intercept, corr.model_set2.r_squared
            ));
        }
    }

    out.push_str(&format!(
        "\nMean sample IS recovery: {:.0}%\n",
        output.stats.mean_is_recovery
    ));

    out
}

/// Format an accuracy table; out-of-band rows are marked with `!`.
pub fn format_accuracy_table(records: &[AccuracyRecord], config: &QuantConfig) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<2} {:<16} {:>12} {:>12} {:>10} {:>12} {:>12}\n",
        "", "id", "resp_ratio", "conc_ratio", "nominal", "measured", "accuracy%"
    ));
    for r in records {
        let flag = if out_of_band(r, config) { "!" } else { " " };
        out.push_str(&format!(
            "{flag:<2} {:<16} {:>12.3} {:>12.2} {:>10.1} {:>12.3} {:>12.0}\n",
            truncate(&r.sample_id, 16),
            r.response_ratio,
            r.conc_ratio,
            r.tc_conc,
            r.measured_conc,
            r.accuracy_percent,
        ));
    }
    out
}

/// Format the quantified sample table (set label included when routed).
pub fn format_sample_table(samples: &[QuantifiedSample]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<16} {:>12} {:>12} {:>10} {:<6}\n",
        "id", "resp_ratio", "conc", "IS rec%", "set"
    ));
    for s in samples {
        out.push_str(&format!(
            "{:<16} {:>12.3} {:>12.3} {:>10.0} {:<6}\n",
            truncate(&s.sample_id, 16),
            s.response_ratio,
            s.measured_conc,
            s.is_recovery_percent,
            s.set.map(|c| c.display_name()).unwrap_or("-"),
        ));
    }
    out
}

/// Format the reconciliation table (already sorted worst-first).
pub fn format_comparison_table(records: &[ComparisonRecord]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<16} {:>10} {:>12} {:>12} {:>12} {:>10}\n",
        "id", "IS rec%", "uncorrected", "instrument", "corrected", "diff%"
    ));
    for r in records {
        out.push_str(&format!(
            "{:<16} {:>10} {:>12} {:>12} {:>12} {:>10}\n",
            truncate(&r.sample_id, 16),
            fmt_opt(r.is_recovery_percent, 0),
            fmt_opt(r.uncorrected_conc, 3),
            fmt_opt(r.external_conc, 3),
            fmt_opt(r.corrected_conc, 3),
            fmt_opt(r.percent_difference, 2),
        ));
    }
    out
}

fn out_of_band(record: &AccuracyRecord, config: &QuantConfig) -> bool {
    record.accuracy_percent >= config.accuracy_high || record.accuracy_percent <= config.accuracy_low
}

fn fmt_opt(v: Option<f64>, decimals: usize) -> String {
    match v {
        Some(v) => format!("{v:.decimals$}"),
        None => "-".to_string(),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accuracy_table_flags_out_of_band_rows() {
        let config = QuantConfig::new("B", "A", 5.0);
        let records = vec![
            AccuracyRecord {
                sample_id: "CAL1".to_string(),
                tc_response: 10.0,
                is_response: 100.0,
                tc_conc: 0.5,
                response_ratio: 0.1,
                conc_ratio: 0.1,
                measured_conc: 0.9,
                accuracy_percent: 120.0,
            },
            AccuracyRecord {
                sample_id: "CAL2".to_string(),
                tc_response: 20.0,
                is_response: 100.0,
                tc_conc: 1.0,
                response_ratio: 0.2,
                conc_ratio: 0.2,
                measured_conc: 1.0,
                accuracy_percent: 100.0,
            },
        ];

        let table = format_accuracy_table(&records, &config);
        let lines: Vec<&str> = table.lines().collect();
        assert!(lines[1].starts_with('!'));
        assert!(lines[2].starts_with(' '));
    }

    #[test]
    fn comparison_table_renders_missing_fields_as_dashes() {
        let records = vec![ComparisonRecord {
            sample_id: "S1".to_string(),
            is_recovery_percent: None,
            corrected_conc: None,
            uncorrected_conc: Some(1.0),
            external_conc: None,
            percent_difference: None,
        }];
        let table = format_comparison_table(&records);
        assert!(table.lines().nth(1).unwrap().contains('-'));
    }

    #[test]
    fn truncate_preserves_short_ids() {
        assert_eq!(truncate("S1", 16), "S1");
        assert_eq!(truncate("a-very-long-sample-id", 8), "a-very-.");
    }
}
