use image::RgbImage;
use imageproc::filter::Kernel;

use crate::{
    error::{FilterError, Result},
    traits::ImageFilter,
};

/// Upper bound on the blur radius; the kernel grows linearly with it
pub const MAX_BLUR_RADIUS: f32 = 250.0;

/// Gaussian blur, radius used as the standard deviation
#[derive(Debug, Clone, Copy)]
pub struct GaussianBlurFilter {
    pub radius: f32,
}

impl Default for GaussianBlurFilter {
    fn default() -> Self {
        Self { radius: 2.0 }
    }
}

impl ImageFilter for GaussianBlurFilter {
    fn apply(&self, image: &RgbImage) -> Result<RgbImage> {
        if !self.radius.is_finite() || self.radius < 0.0 {
            return Err(FilterError::InvalidParameter {
                name: "radius",
                reason: format!("must be a finite, non-negative number (got {})", self.radius),
            });
        }
        if self.radius > MAX_BLUR_RADIUS {
            return Err(FilterError::InvalidParameter {
                name: "radius",
                reason: format!("must not exceed {MAX_BLUR_RADIUS} (got {})", self.radius),
            });
        }
        if self.radius == 0.0 {
            return Ok(image.clone());
        }
        Ok(imageproc::filter::gaussian_blur_f32(image, self.radius))
    }
}

/// Fixed 3x3 convolution kernel: `sum(weight * pixel) / scale + offset`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kernel3x3 {
    pub weights: [f32; 9],
    pub scale: f32,
    pub offset: f32,
}

impl Kernel3x3 {
    pub const SHARPEN: Self = Self {
        weights: [-2.0, -2.0, -2.0, -2.0, 32.0, -2.0, -2.0, -2.0, -2.0],
        scale: 16.0,
        offset: 0.0,
    };

    pub const FIND_EDGES: Self = Self {
        weights: [-1.0, -1.0, -1.0, -1.0, 8.0, -1.0, -1.0, -1.0, -1.0],
        scale: 1.0,
        offset: 0.0,
    };

    pub const EMBOSS: Self = Self {
        weights: [-1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0],
        scale: 1.0,
        offset: 128.0,
    };

    pub const CONTOUR: Self = Self {
        weights: [-1.0, -1.0, -1.0, -1.0, 8.0, -1.0, -1.0, -1.0, -1.0],
        scale: 1.0,
        offset: 255.0,
    };

    pub const SMOOTH: Self = Self {
        weights: [1.0, 1.0, 1.0, 1.0, 5.0, 1.0, 1.0, 1.0, 1.0],
        scale: 13.0,
        offset: 0.0,
    };

    /// Correlate the interior; the outermost ring of pixels is copied unchanged
    pub fn convolve(&self, image: &RgbImage) -> RgbImage {
        let (scale, offset) = (self.scale, self.offset);
        let mut filtered: RgbImage =
            Kernel::new(&self.weights, 3, 3).filter(image, |channel: &mut u8, acc: f32| {
                *channel = (acc / scale + offset).round().clamp(0.0, 255.0) as u8;
            });

        let (width, height) = image.dimensions();
        for (x, y, pixel) in filtered.enumerate_pixels_mut() {
            if x == 0 || y == 0 || x + 1 == width || y + 1 == height {
                *pixel = *image.get_pixel(x, y);
            }
        }
        filtered
    }
}

impl ImageFilter for Kernel3x3 {
    fn apply(&self, image: &RgbImage) -> Result<RgbImage> {
        if self.scale == 0.0 || !self.scale.is_finite() {
            return Err(FilterError::InvalidParameter {
                name: "scale",
                reason: format!("kernel scale must be non-zero (got {})", self.scale),
            });
        }
        Ok(self.convolve(image))
    }
}
