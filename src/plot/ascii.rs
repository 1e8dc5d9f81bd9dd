//! ASCII plotting for terminal output.
//!
//! Fixed-size character grids, deterministic for a given report:
//!
//! - 1-D: `Δ(-2 log L)` profile. Scan points `o`, interpolated curve `-`,
//!   the 1σ and 2σ levels as `.` rows, failed points `x` on the bottom row.
//! - 2-D: one cell per grid point, shaded by significance of its p-value.

use crate::domain::ScanReport;
use crate::report::{ONE_SIGMA_DELTA, TWO_SIGMA_DELTA};
use crate::stats::SigmaLevel;

/// Plot a 1-D scan's delta profile.
pub fn render_profile(report: &ScanReport, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);
    let Some(axis) = report.axes.first() else {
        return String::new();
    };
    let (x_min, x_max) = (axis.min, axis.max);

    let points: Vec<(f64, f64)> = report
        .results
        .iter()
        .filter_map(|r| Some((*r.coordinates.first()?, r.delta?)))
        .collect();
    let d_max = points
        .iter()
        .map(|&(_, d)| d)
        .fold(TWO_SIGMA_DELTA, f64::max);
    let (y_min, y_max) = pad_range(0.0, d_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    for level in [ONE_SIGMA_DELTA, TWO_SIGMA_DELTA] {
        let row = map_y(level, y_min, y_max, height);
        for cell in grid[row].iter_mut() {
            *cell = '.';
        }
    }

    let mut prev: Option<(usize, usize)> = None;
    for &(x, d) in &points {
        let col = map_x(x, x_min, x_max, width);
        let row = map_y(d, y_min, y_max, height);
        if let Some((c0, r0)) = prev {
            draw_line(&mut grid, c0, r0, col, row, '-');
        }
        prev = Some((col, row));
    }
    for &(x, d) in &points {
        grid[map_y(d, y_min, y_max, height)][map_x(x, x_min, x_max, width)] = 'o';
    }
    for r in report.results.iter().filter(|r| r.delta.is_none()) {
        if let Some(&x) = r.coordinates.first() {
            grid[height - 1][map_x(x, x_min, x_max, width)] = 'x';
        }
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Profile: {}=[{x_min}, {x_max}] | delta=[0, {y_max:.2}] | dots at 1σ, 2σ\n",
        axis.name
    ));
    for row in grid {
        out.push_str(row.into_iter().collect::<String>().trim_end());
        out.push('\n');
    }
    out
}

/// Shade for one cell of the 2-D map.
fn shade(level: SigmaLevel) -> char {
    match level {
        SigmaLevel::BelowOne => '#',
        SigmaLevel::OneToTwo => '+',
        SigmaLevel::TwoToThree => '.',
        _ => ' ',
    }
}

/// Plot a 2-D scan as a significance map: first axis across, second axis up.
///
/// `*` marks the best point, `x` failed points, `#` within 1σ, `+` 1-2σ,
/// `.` 2-3σ, blank beyond.
pub fn render_sigma_map(report: &ScanReport) -> String {
    let [x_axis, y_axis] = report.axes.as_slice() else {
        return String::new();
    };
    let (nx, ny) = (x_axis.steps, y_axis.steps);
    let mut grid = vec![vec![' '; nx]; ny];

    for r in &report.results {
        let [i, j] = r.index.as_slice() else { continue };
        let (i, j) = (*i, *j);
        if i >= nx || j >= ny {
            continue;
        }
        let row = ny - 1 - j;
        grid[row][i] = match (r.delta, r.p_value) {
            (Some(d), _) if d == 0.0 => '*',
            (Some(_), Some(p)) => shade(SigmaLevel::from_p_value(p)),
            _ => 'x',
        };
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Map: {}=[{}, {}] across | {}=[{}, {}] up | * best, # <1σ, + 1-2σ, . 2-3σ, x failed\n",
        x_axis.name, x_axis.min, x_axis.max, y_axis.name, y_axis.min, y_axis.max
    ));
    for row in grid {
        out.push('|');
        out.push_str(&row.into_iter().collect::<String>());
        out.push_str("|\n");
    }
    out
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min, max + pad)
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y_max is row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

/// Integer line drawing (Bresenham). Only blank or level cells are painted.
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0 && (y0 as usize) < grid.len() && x0 >= 0 && (x0 as usize) < grid[0].len() {
            let cell = &mut grid[y0 as usize][x0 as usize];
            if *cell == ' ' || *cell == '.' {
                *cell = ch;
            }
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}
