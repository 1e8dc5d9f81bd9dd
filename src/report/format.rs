//! Formatted terminal output.
//!
//! Formatting lives in one place so the scan and statistics code stays free of
//! presentation concerns and output changes stay localized.

use crate::domain::{Dataset, Evaluation, ScanReport, ScanResult};
use crate::report::{ONE_SIGMA_DELTA, TWO_SIGMA_DELTA, profile_interval};
use crate::scan::Comparison;
use crate::stats::SigmaLevel;

/// Single-point evaluation summary.
pub fn format_evaluation(eval: &Evaluation, dataset: Dataset) -> String {
    let mut out = String::new();
    out.push_str(&format!("=== hscan - evaluation ({}) ===\n", dataset.as_str()));
    out.push_str(&format!("-2log(L): {:.4}\n", eval.likelihood));
    match eval.ndof {
        Some(ndof) => out.push_str(&format!("Ndof: {ndof}\n")),
        None => out.push_str("Ndof: (not reported)\n"),
    }
    if let Some(p) = eval.p_value {
        out.push_str(&format!(
            "p-value: {} ({})\n",
            fmt_p(p),
            SigmaLevel::from_p_value(p).label()
        ));
    }
    out
}

/// Hypothesis vs Standard-Model summary.
pub fn format_comparison(cmp: &Comparison, dataset: Dataset) -> String {
    let mut out = String::new();
    out.push_str(&format!("=== hscan - comparison with SM ({}) ===\n", dataset.as_str()));
    out.push_str(&format!("-2log(L) hypothesis: {:.4}\n", cmp.hypothesis.likelihood));
    out.push_str(&format!("-2log(L) SM        : {:.4}\n", cmp.reference.likelihood));
    out.push_str(&format!("Delta -2log(L)     : {:+.4} (ndf={})\n", cmp.delta, cmp.ndf));
    out.push_str(&format!(
        "p-value            : {} ({})\n",
        fmt_p(cmp.p_value),
        cmp.sigma.label()
    ));
    out
}

/// Header block for a finished scan.
pub fn format_scan_summary(report: &ScanReport) -> String {
    let mut out = String::new();
    out.push_str("=== hscan - likelihood scan ===\n");
    out.push_str(&format!("Dataset: {}\n", report.dataset.as_str()));
    for axis in &report.axes {
        out.push_str(&format!(
            "Axis: {} in [{}, {}] x {} steps\n",
            axis.name, axis.min, axis.max, axis.steps
        ));
    }
    out.push_str(&format!(
        "Points: {} ({} failed)\n",
        report.results.len(),
        report.failed
    ));
    out.push_str(&format!("Minimum -2log(L): {:.4}\n", report.minimum));
    out.push_str(&format!("Best fit: {}\n", fmt_vec(&report.best)));

    for (label, threshold) in [("68.27%", ONE_SIGMA_DELTA), ("95.45%", TWO_SIGMA_DELTA)] {
        if let Some(interval) = profile_interval(report, threshold) {
            out.push_str(&format!(
                "{label} CL: {}{:.4}, {:.4}{}\n",
                if interval.lower_open { "(" } else { "[" },
                interval.lower,
                interval.upper,
                if interval.upper_open { ")" } else { "]" },
            ));
        }
    }
    out
}

/// Per-point table in grid order.
pub fn format_scan_table(report: &ScanReport) -> String {
    let coord_header = report
        .axes
        .iter()
        .map(|a| format!("{:>10}", truncate(a.name.as_str(), 10)))
        .collect::<Vec<_>>()
        .join(" ");

    let mut out = String::new();
    out.push_str(
        format!(
            "{:<8} {coord_header} {:>12} {:>10} {:>10} {:<6}",
            "index", "-2logL", "delta", "p-value", "sigma"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!(
            "{:-<8} {} {:-<12} {:-<10} {:-<10} {:-<6}",
            "",
            vec!["-".repeat(10); report.axes.len()].join(" "),
            "",
            "",
            "",
            ""
        )
        .trim_end(),
    );
    out.push('\n');
    for r in &report.results {
        out.push_str(format_row(r).trim_end());
        out.push('\n');
    }
    out
}

fn format_row(r: &ScanResult) -> String {
    let index = r
        .index
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(",");
    let coords = r
        .coordinates
        .iter()
        .map(|c| format!("{c:>10.4}"))
        .collect::<Vec<_>>()
        .join(" ");
    match (r.likelihood, r.delta) {
        (Some(l), Some(d)) => format!(
            "{index:<8} {coords} {l:>12.4} {d:>10.4} {:>10} {:<6}",
            r.p_value.map(fmt_p).unwrap_or_default(),
            r.p_value
                .map(|p| SigmaLevel::from_p_value(p).label())
                .unwrap_or(""),
        ),
        _ => format!("{index:<8} {coords} {:>12}", "failed"),
    }
}

fn fmt_p(p: f64) -> String {
    if p >= 1e-3 {
        format!("{p:.4}")
    } else {
        format!("{p:.2e}")
    }
}

fn fmt_vec(v: &[f64]) -> String {
    let parts: Vec<String> = v.iter().map(|x| format!("{x:.6}")).collect();
    format!("[{}]", parts.join(", "))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ParameterName, ScanAxis};
    use chrono::Utc;

    fn report() -> ScanReport {
        let point = |i: usize, x: f64, l: Option<f64>| ScanResult {
            index: vec![i],
            coordinates: vec![x],
            likelihood: l,
            delta: l.map(|l| l - 50.0),
            p_value: l.map(|l| crate::stats::chi_square_p_value(l - 50.0, 1.0)),
        };
        ScanReport {
            generated_at: Utc::now(),
            dataset: Dataset::Run2,
            axes: vec![ScanAxis {
                name: ParameterName::Cv,
                min: 0.9,
                max: 1.1,
                steps: 3,
            }],
            ndf: 1,
            minimum: 50.0,
            best: vec![1.0],
            failed: 1,
            results: vec![point(0, 0.9, Some(54.0)), point(1, 1.0, Some(50.0)), point(2, 1.1, None)],
        }
    }

    #[test]
    fn summary_lists_axes_and_intervals() {
        let text = format_scan_summary(&report());
        assert!(text.contains("Dataset: run2\n"));
        assert!(text.contains("Axis: CV in [0.9, 1.1] x 3 steps\n"));
        assert!(text.contains("Points: 3 (1 failed)\n"));
        assert!(text.contains("Best fit: [1.000000]\n"));
        assert!(text.contains("68.27% CL: [0.9750, 1.0000]\n"), "{text}");
    }

    #[test]
    fn table_marks_failed_points() {
        let text = format_scan_table(&report());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("index"));
        assert!(lines[2].contains('σ'));
        assert!(lines[3].contains("<1σ"));
        assert!(lines[4].ends_with("failed"));
    }

    #[test]
    fn small_p_values_use_scientific_notation() {
        assert_eq!(fmt_p(0.5), "0.5000");
        assert_eq!(fmt_p(2.5e-5), "2.50e-5");
    }

    #[test]
    fn truncate_marks_cut_labels() {
        assert_eq!(truncate("CZgamma", 10), "CZgamma");
        assert_eq!(truncate("abcdefghijkl", 5), "abcd.");
    }
}
