use std::{
    fs::OpenOptions,
    io::{BufWriter, ErrorKind, Write},
    path::{Path, PathBuf},
};

use image::{ImageFormat, Rgb, RgbImage};
use tracing::{debug, info};

use crate::error::{FilterError, Result};

pub const TEST_IMAGE_WIDTH: u32 = 300;
pub const TEST_IMAGE_HEIGHT: u32 = 200;
pub const DEFAULT_TEST_IMAGE_NAME: &str = "test_gradient.jpg";

/// Deterministic RGB gradient: red along x, green along y, blue along the diagonal
pub fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let r = 255 * x / width;
        let g = 255 * y / height;
        let b = 255 * (x + y) / (width + height);
        Rgb([r as u8, g as u8, b as u8])
    })
}

/// The in-memory fallback bitmap used when nothing on disk can be decoded
pub fn default_gradient() -> RgbImage {
    gradient(TEST_IMAGE_WIDTH, TEST_IMAGE_HEIGHT)
}

/// Ensure the canonical test image exists at `path`, never overwriting an existing file
pub fn ensure_test_image(path: &Path) -> Result<PathBuf> {
    if path.exists() {
        debug!("Test image already present at {}", path.display());
        return Ok(path.to_path_buf());
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(path.to_path_buf()),
        Err(e) => return Err(e.into()),
    };

    let format = ImageFormat::from_path(path).unwrap_or(ImageFormat::Jpeg);
    let mut writer = BufWriter::new(file);
    let written = default_gradient()
        .write_to(&mut writer, format)
        .map_err(FilterError::from)
        .and_then(|()| writer.flush().map_err(FilterError::from));
    if let Err(e) = written {
        drop(writer);
        let _ = std::fs::remove_file(path);
        return Err(e);
    }

    info!("Created test image at {}", path.display());
    Ok(path.to_path_buf())
}
