//! Hue palette with the "mand" color for points that never escape.

use crate::error::{MandArtError, Result};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// 8-bit RGB triple.
pub type Rgb = [u8; 3];

static NEXT_HUE_ID: AtomicU64 = AtomicU64::new(1);

/// Id for a hue created in this process. Decoded hues without an id use
/// [`positional_hue_id`] instead, so those two id spaces never overlap.
fn fresh_hue_id() -> String {
    format!("hue-new-{}", NEXT_HUE_ID.fetch_add(1, Ordering::Relaxed))
}

fn positional_hue_id(num: u32) -> String {
    format!("hue-{num}")
}

/// A single palette entry.
///
/// `num` is the 1-based display position. It may be sparse right after
/// decoding, but every palette edit renumbers to `1..=N`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "HueRecord", into = "HueRecord")]
pub struct Hue {
    pub id: String,
    pub num: u32,
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Hue {
    pub fn new(num: u32, rgb: Rgb) -> Self {
        Self {
            id: fresh_hue_id(),
            num,
            r: rgb[0],
            g: rgb[1],
            b: rgb[2],
        }
    }

    pub fn rgb(&self) -> Rgb {
        [self.r, self.g, self.b]
    }

    /// Channels normalized to [0, 1].
    pub fn normalized(&self) -> NormalizedColor {
        NormalizedColor::from_rgb(self.rgb())
    }
}

/// Color as stored in the `color` object of a saved hue.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NormalizedColor {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
}

impl NormalizedColor {
    pub fn from_rgb(rgb: Rgb) -> Self {
        Self {
            red: rgb[0] as f64 / 255.0,
            green: rgb[1] as f64 / 255.0,
            blue: rgb[2] as f64 / 255.0,
        }
    }

    /// `round(x * 255)` per channel. Channels outside [0, 1] are rejected.
    pub fn to_rgb(&self) -> Result<Rgb> {
        Ok([
            channel_to_u8("red", self.red)?,
            channel_to_u8("green", self.green)?,
            channel_to_u8("blue", self.blue)?,
        ])
    }
}

fn channel_to_u8(name: &str, value: f64) -> Result<u8> {
    if !(0.0..=1.0).contains(&value) {
        return Err(MandArtError::palette(format!(
            "{name} channel {value} is outside [0, 1]"
        )));
    }
    Ok((value * 255.0).round() as u8)
}

/// On-disk hue shape. Either representation of the color may be missing.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct HueRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    num: u32,
    #[serde(default)]
    r: Option<u8>,
    #[serde(default)]
    g: Option<u8>,
    #[serde(default)]
    b: Option<u8>,
    #[serde(default)]
    color: Option<NormalizedColor>,
}

impl TryFrom<HueRecord> for Hue {
    type Error = MandArtError;

    fn try_from(record: HueRecord) -> Result<Self> {
        let rgb = match (record.r, record.g, record.b, record.color) {
            (Some(r), Some(g), Some(b), _) => [r, g, b],
            (_, _, _, Some(color)) => color.to_rgb()?,
            _ => {
                return Err(MandArtError::palette(format!(
                    "hue {} has neither r/g/b nor color",
                    record.num
                )))
            }
        };
        Ok(Self {
            id: record.id.unwrap_or_else(|| positional_hue_id(record.num)),
            num: record.num,
            r: rgb[0],
            g: rgb[1],
            b: rgb[2],
        })
    }
}

impl From<Hue> for HueRecord {
    fn from(hue: Hue) -> Self {
        let color = hue.normalized();
        Self {
            id: Some(hue.id),
            num: hue.num,
            r: Some(hue.r),
            g: Some(hue.g),
            b: Some(hue.b),
            color: Some(color),
        }
    }
}

/// Ordered hues plus the color for bounded points.
///
/// Immutable: every edit returns a new palette with hues renumbered.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorPalette {
    hues: Vec<Hue>,
    mand_color: Rgb,
}

impl ColorPalette {
    /// Keeps the hues in the given order and with their given `num`s.
    pub fn new(hues: Vec<Hue>, mand_color: Rgb) -> Self {
        Self { hues, mand_color }
    }

    /// Build from bare colors, numbered `1..=N` in order.
    pub fn from_colors(colors: &[Rgb], mand_color: Rgb) -> Self {
        let hues = colors
            .iter()
            .enumerate()
            .map(|(i, rgb)| Hue::new(i as u32 + 1, *rgb))
            .collect();
        Self { hues, mand_color }
    }

    pub fn hues(&self) -> &[Hue] {
        &self.hues
    }

    pub fn mand_color(&self) -> Rgb {
        self.mand_color
    }

    pub fn len(&self) -> usize {
        self.hues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hues.is_empty()
    }

    /// Hue colors in display order, for tight lookup loops.
    pub fn colors(&self) -> Vec<Rgb> {
        self.hues.iter().map(Hue::rgb).collect()
    }

    /// Order hues by their current `num` (stable), then renumber.
    pub fn sorted_by_num(&self) -> Self {
        let mut hues = self.hues.clone();
        hues.sort_by_key(|h| h.num);
        Self::renumbered(hues, self.mand_color)
    }

    pub fn with_hue_added(&self, rgb: Rgb) -> Self {
        let mut hues = self.hues.clone();
        hues.push(Hue::new(0, rgb));
        Self::renumbered(hues, self.mand_color)
    }

    /// Remove the hue at display position `index` (0-based).
    pub fn with_hue_removed(&self, index: usize) -> Result<Self> {
        self.check_index(index)?;
        let mut hues = self.hues.clone();
        hues.remove(index);
        Ok(Self::renumbered(hues, self.mand_color))
    }

    /// Move the hue at `from` so that it ends up at position `to`.
    pub fn with_hue_moved(&self, from: usize, to: usize) -> Result<Self> {
        self.check_index(from)?;
        self.check_index(to)?;
        let mut hues = self.hues.clone();
        let hue = hues.remove(from);
        hues.insert(to, hue);
        Ok(Self::renumbered(hues, self.mand_color))
    }

    /// Change the color at `index`, keeping its id.
    pub fn with_hue_replaced(&self, index: usize, rgb: Rgb) -> Result<Self> {
        self.check_index(index)?;
        let mut hues = self.hues.clone();
        let hue = &mut hues[index];
        hue.r = rgb[0];
        hue.g = rgb[1];
        hue.b = rgb[2];
        Ok(Self::renumbered(hues, self.mand_color))
    }

    pub fn with_mand_color(&self, mand_color: Rgb) -> Self {
        Self {
            hues: self.hues.clone(),
            mand_color,
        }
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.hues.len() {
            return Err(MandArtError::palette(format!(
                "hue index {index} out of range for {} hues",
                self.hues.len()
            )));
        }
        Ok(())
    }

    fn renumbered(mut hues: Vec<Hue>, mand_color: Rgb) -> Self {
        for (i, hue) in hues.iter_mut().enumerate() {
            hue.num = i as u32 + 1;
        }
        Self { hues, mand_color }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgb = [255, 0, 0];
    const GREEN: Rgb = [0, 255, 0];
    const BLUE: Rgb = [0, 0, 255];

    fn nums(palette: &ColorPalette) -> Vec<u32> {
        palette.hues().iter().map(|h| h.num).collect()
    }

    #[test]
    fn from_colors_numbers_from_one() {
        let palette = ColorPalette::from_colors(&[RED, GREEN, BLUE], [0, 0, 0]);
        assert_eq!(nums(&palette), vec![1, 2, 3]);
        assert_eq!(palette.colors(), vec![RED, GREEN, BLUE]);
    }

    #[test]
    fn edits_renumber_and_leave_original_untouched() {
        let palette = ColorPalette::from_colors(&[RED, GREEN, BLUE], [0, 0, 0]);

        let removed = palette.with_hue_removed(0).unwrap();
        assert_eq!(removed.colors(), vec![GREEN, BLUE]);
        assert_eq!(nums(&removed), vec![1, 2]);

        let added = removed.with_hue_added(RED);
        assert_eq!(added.colors(), vec![GREEN, BLUE, RED]);
        assert_eq!(nums(&added), vec![1, 2, 3]);

        assert_eq!(palette.colors(), vec![RED, GREEN, BLUE]);
    }

    #[test]
    fn move_reorders() {
        let palette = ColorPalette::from_colors(&[RED, GREEN, BLUE], [0, 0, 0]);
        let moved = palette.with_hue_moved(2, 0).unwrap();
        assert_eq!(moved.colors(), vec![BLUE, RED, GREEN]);
        assert_eq!(nums(&moved), vec![1, 2, 3]);
        assert_eq!(moved.hues()[0].id, palette.hues()[2].id);
    }

    #[test]
    fn replace_keeps_id() {
        let palette = ColorPalette::from_colors(&[RED, GREEN], [0, 0, 0]);
        let replaced = palette.with_hue_replaced(1, BLUE).unwrap();
        assert_eq!(replaced.colors(), vec![RED, BLUE]);
        assert_eq!(replaced.hues()[1].id, palette.hues()[1].id);
    }

    #[test]
    fn out_of_range_edits_fail() {
        let palette = ColorPalette::from_colors(&[RED], [0, 0, 0]);
        assert!(palette.with_hue_removed(1).is_err());
        assert!(palette.with_hue_moved(0, 3).is_err());
        assert!(palette.with_hue_replaced(5, RED).is_err());
    }

    #[test]
    fn sorted_by_num_compacts_sparse_numbers() {
        let hues = vec![Hue::new(7, BLUE), Hue::new(2, RED), Hue::new(4, GREEN)];
        let palette = ColorPalette::new(hues, [0, 0, 0]).sorted_by_num();
        assert_eq!(palette.colors(), vec![RED, GREEN, BLUE]);
        assert_eq!(nums(&palette), vec![1, 2, 3]);
    }

    #[test]
    fn hue_decodes_from_normalized_color_only() {
        let json = r#"{"num":1,"color":{"red":1.0,"green":0.5,"blue":0.0}}"#;
        let hue: Hue = serde_json::from_str(json).unwrap();
        assert_eq!(hue.rgb(), [255, 128, 0]);
        assert_eq!(hue.id, "hue-1");
    }

    #[test]
    fn id_less_palette_decodes_the_same_every_time() {
        let json = r#"{"hues":[{"num":1,"r":255,"g":0,"b":0},{"num":2,"r":0,"g":0,"b":255}],
                       "mandColor":[0,0,0]}"#;
        let first: ColorPalette = serde_json::from_str(json).unwrap();
        let second: ColorPalette = serde_json::from_str(json).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.hues()[1].id, "hue-2");
    }

    #[test]
    fn added_hue_id_differs_from_decoded_ids() {
        let json = r#"{"hues":[{"num":1,"r":255,"g":0,"b":0}],"mandColor":[0,0,0]}"#;
        let palette: ColorPalette = serde_json::from_str(json).unwrap();
        let grown = palette.with_hue_added(BLUE);
        assert_ne!(grown.hues()[0].id, grown.hues()[1].id);
    }

    #[test]
    fn hue_prefers_integer_channels() {
        let json = r#"{"id":"a","num":2,"r":10,"g":20,"b":30,
            "color":{"red":1.0,"green":1.0,"blue":1.0}}"#;
        let hue: Hue = serde_json::from_str(json).unwrap();
        assert_eq!(hue.rgb(), [10, 20, 30]);
        assert_eq!(hue.id, "a");
    }

    #[test]
    fn hue_encodes_both_representations() {
        let hue = Hue::new(1, [255, 0, 51]);
        let json = serde_json::to_value(&hue).unwrap();
        assert_eq!(json["r"], 255);
        assert_eq!(json["b"], 51);
        assert_eq!(json["color"]["red"], 1.0);
        assert!((json["color"]["blue"].as_f64().unwrap() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn hue_without_any_color_is_rejected() {
        let result: std::result::Result<Hue, _> = serde_json::from_str(r#"{"num":1}"#);
        assert!(result.is_err());
    }

    #[test]
    fn normalized_channel_out_of_range_is_rejected() {
        let color = NormalizedColor {
            red: 1.5,
            green: 0.0,
            blue: 0.0,
        };
        assert!(color.to_rgb().is_err());
    }
}
