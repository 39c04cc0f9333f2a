//! Escape-time grid computation for `z -> z^p + c`.
//!
//! Every pixel is independent, so rows are filled in parallel. Bounded
//! points always report exactly `iterations_max`; escaped points report the
//! iteration (1-based) at which `|z|²` reached `r_sq_limit`.

use crate::cancellation::{CancellationChecker, NeverCancel};
use mandart_core::{Grid, MandArtError, Result, ShapeParameters};
use rayon::prelude::*;
use std::time::Instant;

/// Per-grid constants shared by every pixel.
#[derive(Clone, Copy, Debug)]
pub struct PlaneMapping {
    half_width: f64,
    half_height: f64,
    scale: f64,
    x_center: f64,
    y_center: f64,
    cos_theta: f64,
    sin_theta: f64,
}

impl PlaneMapping {
    pub fn new(shape: &ShapeParameters) -> Self {
        let theta = shape.rotation_radians();
        Self {
            half_width: shape.image_width as f64 / 2.0,
            half_height: shape.image_height as f64 / 2.0,
            scale: shape.scale,
            x_center: shape.x_center,
            y_center: shape.y_center,
            cos_theta: theta.cos(),
            sin_theta: theta.sin(),
        }
    }

    /// Complex-plane point for pixel `(u, v)`.
    #[inline]
    pub fn point(&self, u: u32, v: u32) -> (f64, f64) {
        let d_x = (u as f64 - self.half_width) / self.scale;
        let d_y = (v as f64 - self.half_height) / self.scale;
        (
            self.x_center + d_x * self.cos_theta - d_y * self.sin_theta,
            self.y_center + d_x * self.sin_theta + d_y * self.cos_theta,
        )
    }
}

/// `(x + iy)^power`. Powers 2 and 3 are expanded exactly; anything else goes
/// through polar form, which loses precision near the origin.
#[inline]
pub fn complex_pow(x: f64, y: f64, power: u32) -> (f64, f64) {
    match power {
        2 => (x * x - y * y, 2.0 * x * y),
        3 => ((x * x - 3.0 * y * y) * x, (3.0 * x * x - y * y) * y),
        _ => polar_pow(x, y, power as f64),
    }
}

#[inline]
fn polar_pow(x: f64, y: f64, power: f64) -> (f64, f64) {
    let r = x.hypot(y).powf(power);
    let theta = y.atan2(x) * power;
    (r * theta.cos(), r * theta.sin())
}

/// Closed-form membership test for the main cardioid and the period-2 bulb
/// of the degree-2 set.
#[inline]
pub fn in_main_cardioid_or_bulb(x: f64, y: f64) -> bool {
    let p = ((x - 0.25) * (x - 0.25) + y * y).sqrt();
    if x < p - 2.0 * p * p + 0.25 {
        return true;
    }
    (x + 1.0) * (x + 1.0) + y * y < 0.0625
}

/// Escape time for one point, with the degree-2 interior shortcut.
#[inline]
pub fn escape_time(x0: f64, y0: f64, shape: &ShapeParameters) -> u32 {
    if shape.mand_power_real == 2 && in_main_cardioid_or_bulb(x0, y0) {
        return shape.iterations_max;
    }
    iterate_point(
        x0,
        y0,
        shape.mand_power_real,
        shape.r_sq_limit,
        shape.iterations_max,
    )
}

/// Run the orbit of `c = (x0, y0)` starting from `z = c`.
#[inline]
fn iterate_point(x0: f64, y0: f64, power: u32, r_sq_limit: f64, iterations_max: u32) -> u32 {
    let mut xx = x0;
    let mut yy = y0;

    for iter in 1..iterations_max {
        let (px, py) = complex_pow(xx, yy, power);
        xx = px + x0;
        yy = py + y0;
        if xx * xx + yy * yy >= r_sq_limit {
            return iter;
        }
    }

    iterations_max
}

/// Fill one grid row (`v` is the row index).
fn fill_row(shape: &ShapeParameters, mapping: &PlaneMapping, v: u32, row: &mut [u32]) {
    for (u, cell) in row.iter_mut().enumerate() {
        let (x0, y0) = mapping.point(u as u32, v);
        *cell = escape_time(x0, y0, shape);
    }
}

/// Compute on the calling thread. Cancellation is checked once per row.
pub fn compute_grid_serial(
    shape: &ShapeParameters,
    cancel: &dyn CancellationChecker,
) -> Result<Grid> {
    shape.validate()?;
    let start = Instant::now();
    let mapping = PlaneMapping::new(shape);
    let width = shape.image_width as usize;
    let mut cells = vec![0u32; shape.pixel_count()];

    for (v, row) in cells.chunks_mut(width).enumerate() {
        if cancel.is_cancelled() {
            return Err(MandArtError::Cancelled);
        }
        fill_row(shape, &mapping, v as u32, row);
    }

    log::debug!(
        "Serial grid {}x{} ({} iterations max) in {:?}",
        shape.image_width,
        shape.image_height,
        shape.iterations_max,
        start.elapsed()
    );
    Grid::from_cells(shape.image_width, shape.image_height, shape.iterations_max, cells)
}

/// Compute with rows spread over the current rayon pool.
///
/// Rows not yet started when cancellation is observed are skipped and no
/// partial grid is returned.
pub fn compute_grid_parallel(
    shape: &ShapeParameters,
    cancel: &dyn CancellationChecker,
) -> Result<Grid> {
    shape.validate()?;
    let start = Instant::now();
    let mapping = PlaneMapping::new(shape);
    let width = shape.image_width as usize;
    let mut cells = vec![0u32; shape.pixel_count()];

    cells
        .par_chunks_mut(width)
        .enumerate()
        .try_for_each(|(v, row)| {
            if cancel.is_cancelled() {
                return Err(MandArtError::Cancelled);
            }
            fill_row(shape, &mapping, v as u32, row);
            Ok(())
        })?;

    log::debug!(
        "Parallel grid {}x{} ({} iterations max) in {:?} on {} threads",
        shape.image_width,
        shape.image_height,
        shape.iterations_max,
        start.elapsed(),
        rayon::current_num_threads()
    );
    Grid::from_cells(shape.image_width, shape.image_height, shape.iterations_max, cells)
}

/// Compute the full iteration grid for `shape`.
pub fn compute_grid(shape: &ShapeParameters) -> Result<Grid> {
    compute_grid_parallel(shape, &NeverCancel)
}
