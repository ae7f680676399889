//! Poster normalization: crop to the 1:1.5 display ratio, bound to 360x540,
//! force RGB so JPEG encoding cannot fail on an alpha channel.

use crate::utils::error::Result;
use image::{imageops::FilterType, GenericImageView, ImageFormat, RgbImage};
use std::io::Cursor;

pub const MAX_WIDTH: u32 = 360;
pub const MAX_HEIGHT: u32 = 540;

/// Height-to-width ratio of the poster slot.
const ASPECT: f64 = 1.5;

/// Normalize a downloaded cover. Crops only horizontally (symmetric), never
/// upsamples, and fits the result inside [`MAX_WIDTH`] x [`MAX_HEIGHT`].
pub fn normalize(bytes: &[u8]) -> Result<RgbImage> {
    let decoded = image::load_from_memory(bytes)?;
    let (width, height) = decoded.dimensions();

    let target_width = height as f64 / ASPECT;
    let cropped = if (width as f64) > target_width {
        let left = ((width as f64 - target_width) / 2.0) as u32;
        decoded.crop_imm(left, 0, target_width as u32, height)
    } else {
        decoded
    };

    let (w, h) = cropped.dimensions();
    let bounded = if w > MAX_WIDTH || h > MAX_HEIGHT {
        cropped.resize(MAX_WIDTH, MAX_HEIGHT, FilterType::Lanczos3)
    } else {
        cropped
    };

    Ok(bounded.to_rgb8())
}

pub fn encode_jpeg(image: &RgbImage) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, ImageFormat::Jpeg)?;
    Ok(buf.into_inner())
}

pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, ImageFormat::Png)?;
    Ok(buf.into_inner())
}
