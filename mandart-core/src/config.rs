//! Engine configuration registry.
//!
//! Holds the default grid backend, worker sizing, cache bounds and the
//! factory picture a new document starts from.

use crate::palette::{ColorPalette, Rgb};
use crate::shape::ShapeParameters;

/// Configuration for a grid engine profile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EngineConfig {
    /// Unique identifier
    pub id: &'static str,
    /// Human-readable name
    pub display_name: &'static str,
    /// Grid backend id passed to the computer factory.
    pub default_backend: &'static str,
    /// Worker threads for parallel row computation.
    /// Positive: use that exact number of threads.
    /// Zero or negative: use available parallelism + this value (e.g., -1 leaves one core free).
    pub worker_count: i32,
    /// Number of grids kept by the cache before the oldest is evicted.
    pub cache_capacity: usize,
    /// Uniform color used when a palette has no hues.
    pub fallback_color: Rgb,
}

impl EngineConfig {
    /// Resolve `worker_count` against the machine's parallelism. Never below 1.
    pub fn resolved_worker_count(&self, available: usize) -> usize {
        if self.worker_count > 0 {
            self.worker_count as usize
        } else {
            let adjusted = available as i64 + self.worker_count as i64;
            adjusted.max(1) as usize
        }
    }
}

pub static ENGINE_CONFIGS: &[EngineConfig] = &[
    EngineConfig {
        id: "default",
        display_name: "Parallel",
        default_backend: "parallel",
        worker_count: 0, // all available cores
        cache_capacity: 10,
        fallback_color: [128, 128, 128],
    },
    EngineConfig {
        id: "single_threaded",
        display_name: "Single threaded",
        default_backend: "serial",
        worker_count: 1,
        cache_capacity: 10,
        fallback_color: [128, 128, 128],
    },
];

/// Look up an engine configuration by ID.
pub fn get_config(id: &str) -> Option<&'static EngineConfig> {
    ENGINE_CONFIGS.iter().find(|c| c.id == id)
}

/// Get the default engine configuration.
pub fn default_config() -> &'static EngineConfig {
    &ENGINE_CONFIGS[0]
}

// =============================================================================
// Factory picture
// =============================================================================

pub const DEFAULT_IMAGE_WIDTH: u32 = 1100;
pub const DEFAULT_IMAGE_HEIGHT: u32 = 1000;
pub const DEFAULT_ITERATIONS_MAX: u32 = 10_000;
pub const DEFAULT_SCALE: f64 = 430.0;
pub const DEFAULT_X_CENTER: f64 = -0.75;
pub const DEFAULT_Y_CENTER: f64 = 0.0;
pub const DEFAULT_THETA: f64 = 0.0;
pub const DEFAULT_R_SQ_LIMIT: f64 = 400.0;
pub const DEFAULT_MAND_POWER_REAL: u32 = 2;
pub const DEFAULT_D_F_ITER_MIN: f64 = 0.0;
pub const DEFAULT_N_BLOCKS: u32 = 60;
pub const DEFAULT_SPACING_COLOR_FAR: f64 = 5.0;
pub const DEFAULT_SPACING_COLOR_NEAR: f64 = 15.0;
pub const DEFAULT_Y_Y: f64 = 0.0;
pub const DEFAULT_MAND_COLOR: Rgb = [0, 0, 0];

pub const DEFAULT_HUES: [Rgb; 6] = [
    [0, 255, 0],
    [255, 255, 0],
    [255, 0, 0],
    [255, 0, 255],
    [0, 0, 255],
    [0, 255, 255],
];

pub fn default_shape() -> ShapeParameters {
    ShapeParameters {
        image_width: DEFAULT_IMAGE_WIDTH,
        image_height: DEFAULT_IMAGE_HEIGHT,
        iterations_max: DEFAULT_ITERATIONS_MAX,
        scale: DEFAULT_SCALE,
        x_center: DEFAULT_X_CENTER,
        y_center: DEFAULT_Y_CENTER,
        theta: DEFAULT_THETA,
        r_sq_limit: DEFAULT_R_SQ_LIMIT,
        mand_power_real: DEFAULT_MAND_POWER_REAL,
        d_f_iter_min: DEFAULT_D_F_ITER_MIN,
    }
}

pub fn default_palette() -> ColorPalette {
    ColorPalette::from_colors(&DEFAULT_HUES, DEFAULT_MAND_COLOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_config_finds_default() {
        let config = get_config("default");
        assert!(config.is_some());
        assert_eq!(config.unwrap().default_backend, "parallel");
    }

    #[test]
    fn get_config_returns_none_for_unknown() {
        assert!(get_config("gpu").is_none());
    }

    #[test]
    fn worker_count_resolution() {
        let mut config = *default_config();
        assert_eq!(config.resolved_worker_count(8), 8);

        config.worker_count = -1;
        assert_eq!(config.resolved_worker_count(8), 7);

        config.worker_count = -16;
        assert_eq!(config.resolved_worker_count(8), 1);

        config.worker_count = 3;
        assert_eq!(config.resolved_worker_count(8), 3);
    }

    #[test]
    fn default_shape_is_valid() {
        assert!(default_shape().validate().is_ok());
    }

    #[test]
    fn default_palette_has_six_hues() {
        let palette = default_palette();
        assert_eq!(palette.len(), 6);
        assert_eq!(palette.mand_color(), [0, 0, 0]);
    }
}
