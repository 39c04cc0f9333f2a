//! Packs colored grids into RGBA byte buffers for bitmap display or PNG export.

use mandart_core::ColoredGrid;
use rayon::prelude::*;

const BYTES_PER_PIXEL: usize = 4;

/// Row-major RGBA8 image. Alpha is always 255.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RgbaImage {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl RgbaImage {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
        let bytes = self.data.get(offset..offset + BYTES_PER_PIXEL)?;
        Some([bytes[0], bytes[1], bytes[2], bytes[3]])
    }
}

pub fn to_rgba(colored: &ColoredGrid) -> RgbaImage {
    let mut data = vec![255u8; colored.pixels().len() * BYTES_PER_PIXEL];
    data.par_chunks_mut(BYTES_PER_PIXEL)
        .zip(colored.pixels().par_iter())
        .for_each(|(out, rgb)| out[..3].copy_from_slice(rgb));

    RgbaImage {
        width: colored.width(),
        height: colored.height(),
        data,
    }
}
