//! Scan report exports.
//!
//! - JSON: the full [`ScanReport`], readable back by `hscan render`.
//! - CSV: one row per grid point, for spreadsheets and downstream scripts.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::domain::ScanReport;
use crate::error::AppError;
use crate::validate::{self, MAX_STEPS_1D, MAX_STEPS_2D};

/// Write a scan report as pretty JSON.
pub fn write_report_json(path: &Path, report: &ScanReport) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create report JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(BufWriter::new(file), report)
        .map_err(|e| AppError::new(2, format!("Failed to write report JSON: {e}")))?;
    Ok(())
}

/// Read a scan report written by [`write_report_json`].
///
/// The file is user-supplied, so its shape is checked before anything indexes
/// into it.
pub fn read_report_json(path: &Path) -> Result<ScanReport, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open report JSON '{}': {e}", path.display())))?;
    let report: ScanReport = serde_json::from_reader(file)
        .map_err(|e| AppError::new(2, format!("Invalid report JSON: {e}")))?;
    check_shape(&report).map_err(|e| AppError::new(2, format!("Invalid report JSON: {e}")))?;
    Ok(report)
}

fn check_shape(report: &ScanReport) -> Result<(), String> {
    let dims = report.axes.len();
    let max_steps = match dims {
        1 => MAX_STEPS_1D,
        2 => MAX_STEPS_2D,
        n => return Err(format!("expected 1 or 2 axes, found {n}")),
    };
    for axis in &report.axes {
        validate::validate_steps(axis.steps, axis.name.as_str(), max_steps).map_err(|e| e.to_string())?;
    }
    if report.best.len() > dims {
        return Err(format!("best point has {} coordinates for {dims} axes", report.best.len()));
    }
    for (k, r) in report.results.iter().enumerate() {
        if r.index.len() != dims || r.coordinates.len() != dims {
            return Err(format!("result {k} does not have one index and coordinate per axis"));
        }
        if r.index.iter().zip(&report.axes).any(|(&i, axis)| i >= axis.steps) {
            return Err(format!("result {k} has an index outside its axis"));
        }
    }
    Ok(())
}

/// Write per-point results as CSV. Failed points have empty numeric cells.
pub fn write_report_csv(path: &Path, report: &ScanReport) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    let mut out = BufWriter::new(file);
    write_csv(&mut out, report)
        .and_then(|()| out.flush())
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV: {e}")))
}

fn write_csv(out: &mut impl Write, report: &ScanReport) -> std::io::Result<()> {
    let mut header: Vec<String> = Vec::new();
    for (k, axis) in report.axes.iter().enumerate() {
        header.push(format!("index_{k}"));
        header.push(axis.name.as_str().to_string());
    }
    header.extend(["neg2logl", "delta", "p_value"].map(str::to_string));
    writeln!(out, "{}", header.join(","))?;

    let cell = |v: Option<f64>| v.map(|x| format!("{x:.10}")).unwrap_or_default();
    for r in &report.results {
        let mut row: Vec<String> = Vec::new();
        for (i, x) in r.index.iter().zip(&r.coordinates) {
            row.push(i.to_string());
            row.push(format!("{x:.10}"));
        }
        row.push(cell(r.likelihood));
        row.push(cell(r.delta));
        row.push(cell(r.p_value));
        writeln!(out, "{}", row.join(","))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Dataset, ParameterName, ScanAxis, ScanResult};
    use chrono::Utc;

    fn report() -> ScanReport {
        ScanReport {
            generated_at: Utc::now(),
            dataset: Dataset::Run1,
            axes: vec![ScanAxis {
                name: ParameterName::Ctau,
                min: 0.5,
                max: 1.5,
                steps: 2,
            }],
            ndf: 1,
            minimum: 12.0,
            best: vec![0.5],
            failed: 1,
            results: vec![
                ScanResult {
                    index: vec![0],
                    coordinates: vec![0.5],
                    likelihood: Some(12.0),
                    delta: Some(0.0),
                    p_value: Some(1.0),
                },
                ScanResult {
                    index: vec![1],
                    coordinates: vec![1.5],
                    likelihood: None,
                    delta: None,
                    p_value: None,
                },
            ],
        }
    }

    #[test]
    fn csv_has_one_row_per_point() {
        let mut buf = Vec::new();
        write_csv(&mut buf, &report()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "index_0,Ctau,neg2logl,delta,p_value");
        assert_eq!(lines[1], "0,0.5000000000,12.0000000000,0.0000000000,1.0000000000");
        assert_eq!(lines[2], "1,1.5000000000,,,");
    }

    #[test]
    fn json_export_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.json");
        let original = report();
        write_report_json(&path, &original).unwrap();

        let loaded = read_report_json(&path).unwrap();
        assert_eq!(loaded.dataset, Dataset::Run1);
        assert_eq!(loaded.results, original.results);
        assert_eq!(loaded.axes, original.axes);
    }

    fn load(json: &serde_json::Value) -> Result<ScanReport, AppError> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.json");
        std::fs::write(&path, json.to_string()).unwrap();
        read_report_json(&path)
    }

    #[test]
    fn malformed_reports_are_rejected_on_load() {
        let good = serde_json::to_value(report()).unwrap();

        let mut empty_coordinates = good.clone();
        empty_coordinates["results"][0]["coordinates"] = serde_json::json!([]);
        let mut no_axes = good.clone();
        no_axes["axes"] = serde_json::json!([]);
        let mut huge_axis = good.clone();
        huge_axis["axes"][0]["steps"] = serde_json::json!(1_000_000_000u64);
        let mut index_past_axis = good.clone();
        index_past_axis["results"][1]["index"] = serde_json::json!([7]);

        for bad in [empty_coordinates, no_axes, huge_axis, index_past_axis] {
            let err = load(&bad).unwrap_err();
            assert_eq!(err.exit_code(), 2);
            assert!(err.to_string().starts_with("Invalid report JSON"), "{err}");
        }
        assert!(load(&good).is_ok());
    }

    #[test]
    fn missing_file_is_a_usage_error() {
        let err = read_report_json(Path::new("/nonexistent/scan.json")).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
