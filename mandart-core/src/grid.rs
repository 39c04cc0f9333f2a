//! Iteration grids and their colored counterparts, stored row-major by y.

use crate::error::{MandArtError, Result};
use crate::palette::Rgb;
use std::fmt::Write as _;

/// Escape-time counts for every pixel.
///
/// Bounded points hold exactly `iterations_max`; escaped points hold the
/// iteration at which `|z|²` reached the escape limit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    width: u32,
    height: u32,
    iterations_max: u32,
    cells: Vec<u32>,
}

impl Grid {
    pub fn from_cells(
        width: u32,
        height: u32,
        iterations_max: u32,
        cells: Vec<u32>,
    ) -> Result<Self> {
        let expected = width as usize * height as usize;
        if cells.len() != expected {
            return Err(MandArtError::invalid(
                "grid",
                format!("{} cells supplied for a {width}x{height} grid", cells.len()),
            ));
        }
        if let Some(over) = cells.iter().find(|&&c| c > iterations_max) {
            return Err(MandArtError::invalid(
                "grid",
                format!("cell value {over} exceeds iterationsMax {iterations_max}"),
            ));
        }
        Ok(Self {
            width,
            height,
            iterations_max,
            cells,
        })
    }

    /// Build from nested rows (`rows[y][x]`). All rows must share a length.
    pub fn from_rows(rows: &[Vec<u32>], iterations_max: u32) -> Result<Self> {
        let width = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|row| row.len() != width) {
            return Err(MandArtError::invalid("grid", "rows have differing lengths"));
        }
        let cells = rows.concat();
        let height = if width == 0 { 0 } else { rows.len() };
        Self::from_cells(width as u32, height as u32, iterations_max, cells)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn iterations_max(&self) -> u32 {
        self.iterations_max
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[u32] {
        &self.cells
    }

    pub fn get(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.cells
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    /// True when `value` marks a point that never escaped.
    pub fn is_bounded(&self, value: u32) -> bool {
        value >= self.iterations_max
    }

    pub fn rows(&self) -> impl Iterator<Item = &[u32]> {
        self.cells.chunks(self.width.max(1) as usize)
    }

    pub fn to_rows(&self) -> Vec<Vec<u32>> {
        self.rows().map(<[u32]>::to_vec).collect()
    }

    /// One line per row, comma-separated counts, each line newline-terminated.
    pub fn to_csv(&self) -> String {
        let mut out = String::with_capacity(self.cells.len() * 4);
        for row in self.rows() {
            for (i, value) in row.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                // Writing into a String cannot fail.
                let _ = write!(out, "{value}");
            }
            out.push('\n');
        }
        out
    }
}

/// One RGB triple per grid cell, same dimensions as the source grid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColoredGrid {
    width: u32,
    height: u32,
    pixels: Vec<Rgb>,
}

impl ColoredGrid {
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<Rgb>) -> Result<Self> {
        if pixels.len() != width as usize * height as usize {
            return Err(MandArtError::invalid(
                "coloredGrid",
                format!("{} pixels supplied for a {width}x{height} grid", pixels.len()),
            ));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Every pixel set to `color`.
    pub fn filled(width: u32, height: u32, color: Rgb) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Write access while a colored grid is being built.
    pub fn pixels_mut(&mut self) -> &mut [Rgb] {
        &mut self.pixels
    }

    pub fn pixels(&self) -> &[Rgb] {
        &self.pixels
    }

    pub fn get(&self, x: u32, y: u32) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Rgb]> {
        self.pixels.chunks(self.width.max(1) as usize)
    }

    pub fn to_rows(&self) -> Vec<Vec<Rgb>> {
        self.rows().map(<[Rgb]>::to_vec).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rows_is_row_major_by_y() {
        let grid = Grid::from_rows(&[vec![0, 1, 2], vec![3, 4, 5]], 10).unwrap();
        assert_eq!(grid.width(), 3);
        assert_eq!(grid.height(), 2);
        assert_eq!(grid.get(2, 0), Some(2));
        assert_eq!(grid.get(0, 1), Some(3));
        assert_eq!(grid.get(3, 0), None);
        assert_eq!(grid.get(0, 2), None);
    }

    #[test]
    fn ragged_rows_rejected() {
        assert!(Grid::from_rows(&[vec![0, 1], vec![2]], 10).is_err());
    }

    #[test]
    fn cells_above_iterations_max_rejected() {
        assert!(Grid::from_cells(2, 1, 5, vec![5, 6]).is_err());
        assert!(Grid::from_cells(2, 1, 5, vec![5, 5]).is_ok());
    }

    #[test]
    fn cell_count_must_match_dimensions() {
        assert!(Grid::from_cells(2, 2, 5, vec![1, 2, 3]).is_err());
    }

    #[test]
    fn empty_grid_has_no_rows() {
        let grid = Grid::from_rows(&[], 10).unwrap();
        assert!(grid.is_empty());
        assert_eq!(grid.rows().count(), 0);
        assert_eq!(grid.to_csv(), "");
    }

    #[test]
    fn csv_has_one_line_per_row() {
        let grid = Grid::from_rows(&[vec![1, 22, 3], vec![40, 5, 100]], 100).unwrap();
        assert_eq!(grid.to_csv(), "1,22,3\n40,5,100\n");
    }

    #[test]
    fn bounded_check_uses_iterations_max() {
        let grid = Grid::from_rows(&[vec![0]], 50).unwrap();
        assert!(grid.is_bounded(50));
        assert!(!grid.is_bounded(49));
    }

    #[test]
    fn colored_grid_rows_round_trip() {
        let pixels = vec![[1, 2, 3], [4, 5, 6], [7, 8, 9], [10, 11, 12]];
        let colored = ColoredGrid::from_pixels(2, 2, pixels).unwrap();
        assert_eq!(
            colored.to_rows(),
            vec![vec![[1, 2, 3], [4, 5, 6]], vec![[7, 8, 9], [10, 11, 12]]]
        );
        assert_eq!(colored.get(1, 1), Some([10, 11, 12]));
    }
}
