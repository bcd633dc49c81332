use image::{DynamicImage, Pixel, Rgb, RgbImage};
use imageproc::map::map_colors;

use crate::{error::Result, traits::ImageFilter};

/// Luminance conversion, re-expanded to three channels
#[derive(Debug, Clone, Copy, Default)]
pub struct GrayscaleFilter;

impl ImageFilter for GrayscaleFilter {
    fn apply(&self, image: &RgbImage) -> Result<RgbImage> {
        let luma = image::imageops::grayscale(image);
        Ok(DynamicImage::ImageLuma8(luma).into_rgb8())
    }
}

/// Vintage sepia tone using the classic colour matrix
#[derive(Debug, Clone, Copy, Default)]
pub struct SepiaFilter;

impl SepiaFilter {
    fn tone(Rgb([r, g, b]): Rgb<u8>) -> Rgb<u8> {
        let (r, g, b) = (f64::from(r), f64::from(g), f64::from(b));
        let tr = 0.393 * r + 0.769 * g + 0.189 * b;
        let tg = 0.349 * r + 0.686 * g + 0.168 * b;
        let tb = 0.272 * r + 0.534 * g + 0.131 * b;
        Rgb([
            (tr as u32).min(255) as u8,
            (tg as u32).min(255) as u8,
            (tb as u32).min(255) as u8,
        ])
    }
}

impl ImageFilter for SepiaFilter {
    fn apply(&self, image: &RgbImage) -> Result<RgbImage> {
        Ok(map_colors(image, Self::tone))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InvertFilter;

impl ImageFilter for InvertFilter {
    fn apply(&self, image: &RgbImage) -> Result<RgbImage> {
        let mut inverted = image.clone();
        image::imageops::invert(&mut inverted);
        Ok(inverted)
    }
}

/// Inverts every channel value at or above the threshold
#[derive(Debug, Clone, Copy)]
pub struct SolarizeFilter {
    pub threshold: i64,
}

impl Default for SolarizeFilter {
    fn default() -> Self {
        Self { threshold: 128 }
    }
}

impl ImageFilter for SolarizeFilter {
    fn apply(&self, image: &RgbImage) -> Result<RgbImage> {
        let threshold = self.threshold;
        Ok(map_colors(image, |pixel: Rgb<u8>| {
            pixel.map(|c| if i64::from(c) >= threshold { 255 - c } else { c })
        }))
    }
}
