//! Shape parameters: the viewport and iteration limits of a MandArt picture.

use crate::error::{MandArtError, Result};
use serde::{Deserialize, Serialize};

/// Immutable description of the grid to compute.
///
/// Edits produce a new value through the `with_*` helpers; nothing in the
/// engine mutates a shape in place.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeParameters {
    pub image_width: u32,
    pub image_height: u32,
    pub iterations_max: u32,
    /// Pixels per unit in the complex plane.
    pub scale: f64,
    pub x_center: f64,
    pub y_center: f64,
    /// Rotation in degrees. Negated before use.
    pub theta: f64,
    /// Squared escape radius.
    pub r_sq_limit: f64,
    pub mand_power_real: u32,
    /// Carried for file compatibility; the escape-time loop ignores it.
    #[serde(rename = "dFIterMin")]
    pub d_f_iter_min: f64,
}

impl ShapeParameters {
    /// Check every invariant the grid engine relies on.
    pub fn validate(&self) -> Result<()> {
        if self.image_width == 0 {
            return Err(MandArtError::invalid("imageWidth", "must be positive"));
        }
        if self.image_height == 0 {
            return Err(MandArtError::invalid("imageHeight", "must be positive"));
        }
        if self.iterations_max == 0 {
            return Err(MandArtError::invalid("iterationsMax", "must be positive"));
        }
        if !self.scale.is_finite() || self.scale == 0.0 {
            return Err(MandArtError::invalid(
                "scale",
                format!("must be finite and non-zero, got {}", self.scale),
            ));
        }
        if !(self.r_sq_limit.is_finite() && self.r_sq_limit > 0.0) {
            return Err(MandArtError::invalid(
                "rSqLimit",
                format!("must be finite and positive, got {}", self.r_sq_limit),
            ));
        }
        if !self.x_center.is_finite() {
            return Err(MandArtError::invalid("xCenter", "must be finite"));
        }
        if !self.y_center.is_finite() {
            return Err(MandArtError::invalid("yCenter", "must be finite"));
        }
        if !self.theta.is_finite() {
            return Err(MandArtError::invalid("theta", "must be finite"));
        }
        if self.mand_power_real < 2 {
            return Err(MandArtError::invalid(
                "mandPowerReal",
                format!("must be at least 2, got {}", self.mand_power_real),
            ));
        }
        Ok(())
    }

    /// Validated copy, for callers that want a checked value in one step.
    pub fn validated(self) -> Result<Self> {
        self.validate()?;
        Ok(self)
    }

    pub fn pixel_count(&self) -> usize {
        self.image_width as usize * self.image_height as usize
    }

    /// Rotation actually applied to pixel offsets, in radians.
    ///
    /// Saved pictures depend on the negated sign; keep it.
    pub fn rotation_radians(&self) -> f64 {
        -std::f64::consts::PI * self.theta / 180.0
    }

    /// Cache key over the fields that change grid geometry.
    pub fn grid_key(&self) -> GridKey {
        GridKey {
            image_width: self.image_width,
            image_height: self.image_height,
            iterations_max: self.iterations_max,
            scale: canonical_bits(self.scale),
            x_center: canonical_bits(self.x_center),
            y_center: canonical_bits(self.y_center),
            theta: canonical_bits(self.theta),
            r_sq_limit: canonical_bits(self.r_sq_limit),
            mand_power_real: self.mand_power_real,
        }
    }

    pub fn with_center(&self, x_center: f64, y_center: f64) -> Self {
        Self {
            x_center,
            y_center,
            ..self.clone()
        }
    }

    pub fn with_scale(&self, scale: f64) -> Self {
        Self {
            scale,
            ..self.clone()
        }
    }

    pub fn with_theta(&self, theta: f64) -> Self {
        Self {
            theta,
            ..self.clone()
        }
    }

    pub fn with_size(&self, image_width: u32, image_height: u32) -> Self {
        Self {
            image_width,
            image_height,
            ..self.clone()
        }
    }

    pub fn with_iterations_max(&self, iterations_max: u32) -> Self {
        Self {
            iterations_max,
            ..self.clone()
        }
    }
}

/// Signed zero must not split otherwise equal keys.
fn canonical_bits(value: f64) -> u64 {
    (value + 0.0).to_bits()
}

/// Hashable identity of a grid. `dFIterMin` is excluded since it never
/// influences iteration counts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GridKey {
    image_width: u32,
    image_height: u32,
    iterations_max: u32,
    scale: u64,
    x_center: u64,
    y_center: u64,
    theta: u64,
    r_sq_limit: u64,
    mand_power_real: u32,
}
