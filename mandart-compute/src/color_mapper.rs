//! Maps an iteration grid to colors by cycling through the palette hues.

use mandart_core::{default_config, ColorPalette, ColoredGrid, Grid, Rgb};
use rayon::prelude::*;

/// Color every cell of `grid`.
///
/// Bounded cells get the palette's mand color; escaped cells get
/// `hues[iter % N]`. An empty palette yields a uniform grid in the
/// configured fallback color.
pub fn apply_colors(grid: &Grid, palette: &ColorPalette) -> ColoredGrid {
    apply_colors_with_fallback(grid, palette, default_config().fallback_color)
}

pub fn apply_colors_with_fallback(
    grid: &Grid,
    palette: &ColorPalette,
    fallback: Rgb,
) -> ColoredGrid {
    let mut colored = ColoredGrid::filled(grid.width(), grid.height(), fallback);
    if palette.is_empty() {
        log::debug!("Empty palette, filling grid with {fallback:?}");
        return colored;
    }

    let hues = palette.colors();
    let mand_color = palette.mand_color();
    let iterations_max = grid.iterations_max();

    colored
        .pixels_mut()
        .par_iter_mut()
        .zip(grid.cells().par_iter())
        .for_each(|(pixel, &iter)| {
            *pixel = color_for(iter, iterations_max, &hues, mand_color);
        });

    colored
}

/// Color for a single iteration count. `hues` must not be empty.
#[inline]
pub fn color_for(iter: u32, iterations_max: u32, hues: &[Rgb], mand_color: Rgb) -> Rgb {
    if iter >= iterations_max {
        mand_color
    } else {
        hues[iter as usize % hues.len()]
    }
}
