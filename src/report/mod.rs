//! Reporting utilities: profile intervals and formatted terminal output.

pub mod format;

pub use format::*;

use serde::Serialize;

use crate::domain::ScanReport;

/// `Δ(-2 log L)` at 68.27% CL for one parameter.
pub const ONE_SIGMA_DELTA: f64 = 1.0;
/// `Δ(-2 log L)` at 95.45% CL for one parameter.
pub const TWO_SIGMA_DELTA: f64 = 4.0;

/// Region of a 1-D profile where `delta <= threshold`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Interval {
    pub lower: f64,
    pub upper: f64,
    /// The region reaches the lower scan edge, so the true bound may lie
    /// outside the scanned range.
    pub lower_open: bool,
    pub upper_open: bool,
}

/// Interval around the best point of a 1-D scan where `delta <= threshold`.
///
/// Edges are linearly interpolated between the last point inside and the
/// first point outside. Failed points end the region. Returns `None` for
/// 2-D reports or when no point has a delta.
pub fn profile_interval(report: &ScanReport, threshold: f64) -> Option<Interval> {
    if report.axes.len() != 1 {
        return None;
    }
    let results = &report.results;
    if results.iter().any(|r| r.coordinates.is_empty()) {
        return None;
    }
    let best = results.iter().position(|r| r.delta == Some(0.0))?;
    let inside = |i: usize| results[i].delta.is_some_and(|d| d <= threshold);
    let x = |i: usize| results[i].coordinates[0];

    let mut lo = best;
    while lo > 0 && inside(lo - 1) {
        lo -= 1;
    }
    let mut hi = best;
    while hi + 1 < results.len() && inside(hi + 1) {
        hi += 1;
    }

    // `outer` is the neighbour just past the region, if the scan has one.
    let edge = |inner: usize, outer: Option<usize>| {
        match outer.and_then(|o| results[o].delta.map(|d| (o, d))) {
            Some((o, d_out)) => {
                let d_in = results[inner].delta.unwrap_or(0.0);
                let t = ((threshold - d_in) / (d_out - d_in)).clamp(0.0, 1.0);
                (x(inner) + t * (x(o) - x(inner)), false)
            }
            None => (x(inner), outer.is_none()),
        }
    };

    let (lower, lower_open) = edge(lo, lo.checked_sub(1));
    let (upper, upper_open) = edge(hi, (hi + 1 < results.len()).then_some(hi + 1));
    Some(Interval {
        lower,
        upper,
        lower_open,
        upper_open,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Dataset, ParameterName, ScanAxis, ScanResult};
    use chrono::Utc;

    fn report_1d(deltas: &[Option<f64>]) -> ScanReport {
        let n = deltas.len();
        let results = deltas
            .iter()
            .enumerate()
            .map(|(i, &delta)| ScanResult {
                index: vec![i],
                coordinates: vec![i as f64],
                likelihood: delta.map(|d| 10.0 + d),
                delta,
                p_value: None,
            })
            .collect();
        ScanReport {
            generated_at: Utc::now(),
            dataset: Dataset::Latest,
            axes: vec![ScanAxis {
                name: ParameterName::Cv,
                min: 0.0,
                max: (n - 1) as f64,
                steps: n,
            }],
            ndf: 1,
            minimum: 10.0,
            best: vec![],
            failed: deltas.iter().filter(|d| d.is_none()).count(),
            results,
        }
    }

    #[test]
    fn interval_edges_are_interpolated() {
        let report = report_1d(&[Some(9.0), Some(3.0), Some(0.0), Some(0.5), Some(2.0)]);
        let one = profile_interval(&report, ONE_SIGMA_DELTA).unwrap();
        // Between x=1 (3.0) and x=2 (0.0): delta 1 at x = 2 - 1/3.
        assert!((one.lower - (2.0 - 1.0 / 3.0)).abs() < 1e-12);
        // Between x=3 (0.5) and x=4 (2.0): delta 1 at x = 3 + 1/3.
        assert!((one.upper - (3.0 + 1.0 / 3.0)).abs() < 1e-12);
        assert!(!one.lower_open && !one.upper_open);
    }

    #[test]
    fn interval_reaching_scan_edge_is_open() {
        let report = report_1d(&[Some(0.5), Some(0.0), Some(3.0)]);
        let two = profile_interval(&report, TWO_SIGMA_DELTA).unwrap();
        assert_eq!((two.lower, two.upper), (0.0, 2.0));
        assert!(two.lower_open && two.upper_open);
    }

    #[test]
    fn rows_without_coordinates_have_no_interval() {
        let mut report = report_1d(&[Some(0.0), Some(2.0)]);
        report.results[1].coordinates.clear();
        assert_eq!(profile_interval(&report, ONE_SIGMA_DELTA), None);
    }

    #[test]
    fn failed_neighbour_stops_the_interval() {
        let report = report_1d(&[Some(0.2), None, Some(0.0), Some(0.3)]);
        let one = profile_interval(&report, ONE_SIGMA_DELTA).unwrap();
        assert_eq!(one.lower, 2.0);
        assert!(!one.lower_open);
        assert!(one.upper_open);
    }
}
