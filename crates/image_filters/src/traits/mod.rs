use std::path::PathBuf;

use image::RgbImage;
use crate::error::Result;

/// Trait for image filter algorithms
pub trait ImageFilter: Send + Sync {
    /// Apply the filter, producing a new image
    fn apply(&self, image: &RgbImage) -> Result<RgbImage>;
}

/// Trait for one step of input path resolution
pub trait ResolveStep: Send + Sync {
    /// Short name used in diagnostics
    fn name(&self) -> &'static str;

    /// Transform the candidate path, or reject it with a reason
    fn resolve(&self, candidate: PathBuf) -> std::result::Result<PathBuf, String>;
}
