//! The persisted `.mandart` picture definition.
//!
//! A picture definition bundles shape parameters, the hue palette and the
//! banding fields into one JSON document with camelCase keys. Missing
//! numeric fields fall back to the factory picture in [`crate::config`].

use crate::config;
use crate::error::Result;
use crate::palette::{ColorPalette, Hue, NormalizedColor, Rgb};
use crate::shape::ShapeParameters;
use serde::{Deserialize, Deserializer, Serialize};

/// Banding fields. Saved and restored, but coloring does not read them yet.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Banding {
    pub n_blocks: u32,
    pub spacing_color_far: f64,
    pub spacing_color_near: f64,
    pub y_y: f64,
}

impl Default for Banding {
    fn default() -> Self {
        Self {
            n_blocks: config::DEFAULT_N_BLOCKS,
            spacing_color_far: config::DEFAULT_SPACING_COLOR_FAR,
            spacing_color_near: config::DEFAULT_SPACING_COLOR_NEAR,
            y_y: config::DEFAULT_Y_Y,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PictureDefinition {
    #[serde(default = "default_image_width")]
    pub image_width: u32,
    #[serde(default = "default_image_height")]
    pub image_height: u32,
    #[serde(default = "default_iterations_max")]
    pub iterations_max: u32,
    #[serde(default = "default_scale")]
    pub scale: f64,
    #[serde(default = "default_x_center")]
    pub x_center: f64,
    #[serde(default)]
    pub y_center: f64,
    #[serde(default)]
    pub theta: f64,
    #[serde(default = "default_r_sq_limit")]
    pub r_sq_limit: f64,
    #[serde(default = "default_mand_power_real")]
    pub mand_power_real: u32,
    #[serde(default, rename = "dFIterMin")]
    pub d_f_iter_min: f64,
    #[serde(default = "default_n_blocks")]
    pub n_blocks: u32,
    #[serde(default = "default_spacing_color_far")]
    pub spacing_color_far: f64,
    #[serde(default = "default_spacing_color_near")]
    pub spacing_color_near: f64,
    #[serde(default)]
    pub y_y: f64,
    #[serde(
        default = "default_mand_color",
        deserialize_with = "deserialize_mand_color"
    )]
    pub mand_color: Rgb,
    #[serde(default)]
    pub hues: Vec<Hue>,
}

impl Default for PictureDefinition {
    fn default() -> Self {
        Self::from_parts(
            &config::default_shape(),
            &config::default_palette(),
            &Banding::default(),
        )
    }
}

impl PictureDefinition {
    pub fn from_json(json: &str) -> Result<Self> {
        let picture: Self = serde_json::from_str(json)?;
        log::debug!(
            "Parsed picture definition: {}x{}, {} hues",
            picture.image_width,
            picture.image_height,
            picture.hues.len()
        );
        Ok(picture)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_parts(shape: &ShapeParameters, palette: &ColorPalette, banding: &Banding) -> Self {
        Self {
            image_width: shape.image_width,
            image_height: shape.image_height,
            iterations_max: shape.iterations_max,
            scale: shape.scale,
            x_center: shape.x_center,
            y_center: shape.y_center,
            theta: shape.theta,
            r_sq_limit: shape.r_sq_limit,
            mand_power_real: shape.mand_power_real,
            d_f_iter_min: shape.d_f_iter_min,
            n_blocks: banding.n_blocks,
            spacing_color_far: banding.spacing_color_far,
            spacing_color_near: banding.spacing_color_near,
            y_y: banding.y_y,
            mand_color: palette.mand_color(),
            hues: palette.hues().to_vec(),
        }
    }

    /// Extract validated shape parameters.
    pub fn shape(&self) -> Result<ShapeParameters> {
        ShapeParameters {
            image_width: self.image_width,
            image_height: self.image_height,
            iterations_max: self.iterations_max,
            scale: self.scale,
            x_center: self.x_center,
            y_center: self.y_center,
            theta: self.theta,
            r_sq_limit: self.r_sq_limit,
            mand_power_real: self.mand_power_real,
            d_f_iter_min: self.d_f_iter_min,
        }
        .validated()
    }

    /// Palette in `num` order, renumbered `1..=N`.
    pub fn palette(&self) -> ColorPalette {
        ColorPalette::new(self.hues.clone(), self.mand_color).sorted_by_num()
    }

    pub fn banding(&self) -> Banding {
        Banding {
            n_blocks: self.n_blocks,
            spacing_color_far: self.spacing_color_far,
            spacing_color_near: self.spacing_color_near,
            y_y: self.y_y,
        }
    }
}

/// `mandColor` is either an `[r, g, b]` array or a normalized color object.
#[derive(Deserialize)]
#[serde(untagged)]
enum MandColorRecord {
    Rgb(Rgb),
    Normalized(NormalizedColor),
}

fn deserialize_mand_color<'de, D>(deserializer: D) -> std::result::Result<Rgb, D::Error>
where
    D: Deserializer<'de>,
{
    match MandColorRecord::deserialize(deserializer)? {
        MandColorRecord::Rgb(rgb) => Ok(rgb),
        MandColorRecord::Normalized(color) => color.to_rgb().map_err(serde::de::Error::custom),
    }
}

fn default_image_width() -> u32 {
    config::DEFAULT_IMAGE_WIDTH
}

fn default_image_height() -> u32 {
    config::DEFAULT_IMAGE_HEIGHT
}

fn default_iterations_max() -> u32 {
    config::DEFAULT_ITERATIONS_MAX
}

fn default_scale() -> f64 {
    config::DEFAULT_SCALE
}

fn default_x_center() -> f64 {
    config::DEFAULT_X_CENTER
}

fn default_r_sq_limit() -> f64 {
    config::DEFAULT_R_SQ_LIMIT
}

fn default_mand_power_real() -> u32 {
    config::DEFAULT_MAND_POWER_REAL
}

fn default_n_blocks() -> u32 {
    config::DEFAULT_N_BLOCKS
}

fn default_spacing_color_far() -> f64 {
    config::DEFAULT_SPACING_COLOR_FAR
}

fn default_spacing_color_near() -> f64 {
    config::DEFAULT_SPACING_COLOR_NEAR
}

fn default_mand_color() -> Rgb {
    config::DEFAULT_MAND_COLOR
}
