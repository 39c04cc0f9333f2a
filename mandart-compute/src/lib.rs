pub mod cache;
pub mod cancellation;
pub mod color_mapper;
pub mod computer;
pub mod engine;
pub mod image;
pub mod pipeline;

pub use cache::GridCache;
pub use cancellation::{AtomicBoolChecker, CancelHandle, CancellationChecker, NeverCancel};
pub use color_mapper::{apply_colors, apply_colors_with_fallback};
pub use computer::{create_grid_computer, GridComputer, ParallelGridComputer, SerialGridComputer};
pub use engine::{
    compute_grid, compute_grid_parallel, compute_grid_serial, escape_time,
    in_main_cardioid_or_bulb, PlaneMapping,
};
pub use image::{to_rgba, RgbaImage};
pub use pipeline::{colorize, render_picture_blocking, render_rgba, render_rgba_blocking};

// Re-export core types for convenience
pub use mandart_core::*;
