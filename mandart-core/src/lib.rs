pub mod config;
pub mod error;
pub mod grid;
pub mod palette;
pub mod picture;
pub mod shape;

pub use config::{default_config, default_palette, default_shape, get_config, EngineConfig};
pub use error::{MandArtError, Result};
pub use grid::{ColoredGrid, Grid};
pub use palette::{ColorPalette, Hue, NormalizedColor, Rgb};
pub use picture::{Banding, PictureDefinition};
pub use shape::{GridKey, ShapeParameters};
