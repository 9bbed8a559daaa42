//! # Raster Pipeline
//!
//! Turns a decoded image into the 1-bit bitmap thermal printers print:
//!
//! ```text
//! decode → fit to paper width → flatten alpha on white → grayscale
//!        → contrast boost → threshold at 50% → pack MSB-first rows
//! ```
//!
//! Rows are byte-aligned: a 100-dot wide image occupies 13 bytes per row,
//! the trailing 4 bits left white.

use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, Luma};

use crate::error::{ComandaError, Result};

/// Contrast boost applied before thresholding, in `imageops::contrast` units.
const CONTRAST_BOOST: f32 = 30.0;

/// Luma below this prints black.
const THRESHOLD: u8 = 128;

/// A packed monochrome bitmap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    /// Width in dots.
    pub width: usize,
    /// Height in rows.
    pub height: usize,
    /// `height` rows of `width_bytes()` bytes each, 1 = black.
    pub data: Vec<u8>,
}

impl Raster {
    #[inline]
    pub fn width_bytes(&self) -> usize {
        self.width.div_ceil(8)
    }
}

/// Run the full pipeline, never growing the image past `max_width` dots.
///
/// Images narrower than `max_width` keep their size; wider ones are scaled
/// down with their aspect ratio preserved.
pub fn prepare(image: &DynamicImage, max_width: usize) -> Result<Raster> {
    if image.width() == 0 || image.height() == 0 {
        return Err(ComandaError::Image("image has no pixels".into()));
    }
    if max_width == 0 {
        return Err(ComandaError::Image("no room for an image".into()));
    }

    let (width, height) = fit_width(image.width(), image.height(), max_width as u32);
    let resized = if width == image.width() {
        image.clone()
    } else {
        image.resize_exact(width, height, FilterType::Triangle)
    };

    let gray = flatten_on_white(&resized);
    let boosted = imageops::contrast(&gray, CONTRAST_BOOST);
    Ok(threshold(&boosted))
}

/// Target size for an image limited to `max_width`, aspect ratio kept.
pub fn fit_width(width: u32, height: u32, max_width: u32) -> (u32, u32) {
    if width <= max_width {
        return (width, height);
    }
    let scaled = (height as f64 * max_width as f64 / width as f64).round() as u32;
    (max_width, scaled.max(1))
}

/// Grayscale with transparent areas treated as paper.
pub fn flatten_on_white(image: &DynamicImage) -> GrayImage {
    if !image.color().has_alpha() {
        return image.to_luma8();
    }
    let rgba = image.to_rgba8();
    GrayImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let luma = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
        let alpha = a as f32 / 255.0;
        Luma([(luma * alpha + 255.0 * (1.0 - alpha)).round() as u8])
    })
}

/// Two-level posterize and pack.
pub fn threshold(gray: &GrayImage) -> Raster {
    let width = gray.width() as usize;
    let height = gray.height() as usize;
    let mut data = Vec::with_capacity(width.div_ceil(8) * height);

    let mut row = Vec::with_capacity(width);
    for y in 0..gray.height() {
        row.clear();
        row.extend((0..gray.width()).map(|x| gray.get_pixel(x, y).0[0] < THRESHOLD));
        data.extend(pack_row(&row));
    }

    Raster {
        width,
        height,
        data,
    }
}

/// Pack one row of pixels (true = black) into bytes, MSB first.
///
/// ```
/// use comanda::render::raster::pack_row;
///
/// assert_eq!(pack_row(&[true, false, true, false, true, false, true, false]), vec![0xAA]);
/// assert_eq!(pack_row(&[true; 10]), vec![0xFF, 0xC0]);
/// ```
pub fn pack_row(pixels: &[bool]) -> Vec<u8> {
    let mut bytes = vec![0u8; pixels.len().div_ceil(8)];
    for (i, &pixel) in pixels.iter().enumerate() {
        if pixel {
            bytes[i / 8] |= 1 << (7 - (i % 8));
        }
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn half_black(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_fn(width, height, |x, _| {
            if x < width / 2 { Luma([0]) } else { Luma([255]) }
        }))
    }

    #[test]
    fn test_pack_row_msb_first() {
        assert_eq!(pack_row(&[true, false, false, false, false, false, false, false]), vec![0x80]);
        assert_eq!(pack_row(&[false, false, false, false, false, false, false, true]), vec![0x01]);
        assert_eq!(pack_row(&[]), Vec::<u8>::new());
    }

    #[test]
    fn test_fit_width_only_shrinks() {
        assert_eq!(fit_width(100, 50, 384), (100, 50));
        assert_eq!(fit_width(768, 100, 384), (384, 50));
        assert_eq!(fit_width(4000, 1, 384), (384, 1));
    }

    #[test]
    fn test_prepare_packs_rows() {
        let raster = prepare(&half_black(16, 3), 384).unwrap();
        assert_eq!((raster.width, raster.height), (16, 3));
        assert_eq!(raster.width_bytes(), 2);
        assert_eq!(raster.data, vec![0xFF, 0x00, 0xFF, 0x00, 0xFF, 0x00]);
    }

    #[test]
    fn test_prepare_scales_to_paper() {
        let raster = prepare(&half_black(800, 200), 400).unwrap();
        assert_eq!((raster.width, raster.height), (400, 100));
        assert_eq!(raster.data.len(), 50 * 100);
    }

    #[test]
    fn test_odd_width_is_byte_aligned() {
        let raster = prepare(&half_black(10, 1), 384).unwrap();
        assert_eq!(raster.data, vec![0xF8, 0x00]);
    }

    #[test]
    fn test_transparent_pixels_are_white() {
        let img = RgbaImage::from_pixel(8, 1, Rgba([0, 0, 0, 0]));
        let raster = prepare(&DynamicImage::ImageRgba8(img), 384).unwrap();
        assert_eq!(raster.data, vec![0x00]);
    }

    #[test]
    fn test_empty_image_is_an_error() {
        assert!(prepare(&DynamicImage::new_luma8(0, 0), 384).is_err());
    }
}
