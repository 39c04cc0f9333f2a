//! Shape + palette in, display-ready RGBA out.

use crate::cache::GridCache;
use crate::color_mapper::apply_colors;
use crate::image::{to_rgba, RgbaImage};
use mandart_core::{ColorPalette, Grid, PictureDefinition, Result, ShapeParameters};

/// Color an already computed grid and pack it for display.
pub fn colorize(grid: &Grid, palette: &ColorPalette) -> RgbaImage {
    to_rgba(&apply_colors(grid, palette))
}

/// Fetch the grid for `shape` from the cache (computing it on a miss) and
/// color it. Recoloring with a new palette reuses the cached grid.
pub async fn render_rgba(
    cache: &GridCache,
    shape: &ShapeParameters,
    palette: &ColorPalette,
) -> Result<RgbaImage> {
    let grid = cache.get_or_compute(shape).await?;
    Ok(colorize(&grid, palette))
}

pub fn render_rgba_blocking(
    cache: &GridCache,
    shape: &ShapeParameters,
    palette: &ColorPalette,
) -> Result<RgbaImage> {
    pollster::block_on(render_rgba(cache, shape, palette))
}

/// Render a parsed picture definition.
pub fn render_picture_blocking(
    cache: &GridCache,
    picture: &PictureDefinition,
) -> Result<RgbaImage> {
    let shape = picture.shape()?;
    render_rgba_blocking(cache, &shape, &picture.palette())
}
