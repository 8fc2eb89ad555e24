//! ASCII plot of an IAM curve for terminal output.
//!
//! Fixed-size character grid over 0–90° on the x axis. Deterministic output.
//!
//! Plot elements:
//! - measured curve points: `o`
//! - fitted model curve: `-` line

use crate::domain::{CurveGrid, IamCurvePoint};

/// Render measured points and an optional fitted grid.
pub fn render_iam_plot(curve: &[IamCurvePoint], fitted: Option<&CurveGrid>, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let line: Vec<(f64, f64)> = fitted
        .map(|g| g.angles.iter().copied().zip(g.iam.iter().copied()).collect())
        .unwrap_or_default();

    let (y_min, y_max) = iam_range(curve, &line);
    let mut grid = vec![vec![' '; width]; height];

    draw_line_series(&mut grid, &line, y_min, y_max);
    for p in curve {
        let x = map_x(p.angle, width);
        let y = map_y(p.iam, y_min, y_max, height);
        grid[y][x] = 'o';
    }

    let mut out = format!("Plot: angle=[0, 90]° | IAM=[{y_min:.2}, {y_max:.2}]\n");
    for row in grid {
        out.push_str(row.into_iter().collect::<String>().trim_end());
        out.push('\n');
    }
    out
}

/// IAM axis range: always covers [0, 1], widened for overshoot or negatives.
fn iam_range(curve: &[IamCurvePoint], line: &[(f64, f64)]) -> (f64, f64) {
    let values = curve.iter().map(|p| p.iam).chain(line.iter().map(|&(_, y)| y));
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((0.0_f64, 1.0_f64), |(lo, hi), v| (lo.min(v), hi.max(v)));
    (lo, hi)
}

fn map_x(angle: f64, width: usize) -> usize {
    let u = (angle / 90.0).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // top row is y_max
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_line_series(grid: &mut [Vec<char>], series: &[(f64, f64)], y_min: f64, y_max: f64) {
    let height = grid.len();
    let Some(width) = grid.first().map(Vec::len) else {
        return;
    };

    let mut prev = None;
    for &(a, y) in series {
        let x = map_x(a, width);
        let yy = map_y(y, y_min, y_max, height);
        match prev {
            Some((x0, y0)) => draw_segment(grid, x0, y0, x, yy, '-'),
            None => grid[yy][x] = '-',
        }
        prev = Some((x, yy));
    }
}

/// Integer line drawing (Bresenham).
fn draw_segment(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let (mut x0, mut y0) = (x0 as isize, y0 as isize);
    let (x1, y1) = (x1 as isize, y1 as isize);

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if let Some(cell) = grid.get_mut(y0 as usize).and_then(|row| row.get_mut(x0 as usize)) {
            if *cell == ' ' {
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
