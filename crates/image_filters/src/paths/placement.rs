use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbImage};
use tracing::{info, warn};

use crate::{
    catalog::FilterKind,
    config::Strictness,
    environment::FilterEnvironment,
    error::{FilterError, Result},
    paths::{expand_home, is_writable_dir},
};

/// Extensions kept when deriving an output name from the input
pub const RECOGNIZED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp"];
pub const FALLBACK_EXTENSION: &str = "jpg";

/// Decides where filtered images are written
#[derive(Debug, Clone)]
pub struct OutputPlacement {
    environment: FilterEnvironment,
}

impl OutputPlacement {
    pub fn new(environment: FilterEnvironment) -> Self {
        Self { environment }
    }

    /// `{stem}_{filter}.{ext}`, with `.jpg` for missing or unrecognized extensions
    pub fn default_file_name(input: &Path, filter: FilterKind) -> String {
        let stem = input
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .filter(|stem| !stem.is_empty())
            .unwrap_or_else(|| "image".to_string());
        let extension = input
            .extension()
            .and_then(|ext| ext.to_str())
            .filter(|ext| RECOGNIZED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(FALLBACK_EXTENSION);
        format!("{stem}_{filter}.{extension}")
    }

    pub fn place(&self, requested: Option<&str>, input: &Path, filter: FilterKind) -> PathBuf {
        let writable_dir = self.environment.writable_dir();
        let default_name = Self::default_file_name(input, filter);

        let Some(raw) = requested.map(str::trim).filter(|raw| !raw.is_empty()) else {
            let target = writable_dir.join(default_name);
            info!("No output path given, using {}", target.display());
            return target;
        };

        let expanded = match expand_home(Path::new(raw), self.environment.home()) {
            Ok(path) => path,
            Err(reason) => {
                warn!("Output path '{}' could not be expanded: {}", raw, reason);
                let file_name = Path::new(raw)
                    .file_name()
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(&default_name));
                return writable_dir.join(file_name);
            }
        };

        let mut target = if expanded.is_absolute() {
            expanded
        } else {
            writable_dir.join(expanded)
        };
        if raw.ends_with('/') || target.is_dir() || target.file_name().is_none() {
            target = target.join(&default_name);
        }

        let parent = target.parent().unwrap_or(writable_dir);
        if !is_writable_dir(parent) {
            let file_name = target
                .file_name()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(&default_name));
            let rerouted = writable_dir.join(file_name);
            warn!(
                "Directory {} is not writable, saving to {} instead",
                parent.display(),
                rerouted.display()
            );
            return rerouted;
        }

        info!("Output will be saved to {}", target.display());
        target
    }

    /// Save to `target`, retrying once in a fresh temporary `.jpg` file
    pub fn save(&self, image: &RgbImage, target: &Path) -> Result<PathBuf> {
        let primary = match image.save(target) {
            Ok(()) => {
                info!("Saved image to {}", target.display());
                return Ok(target.to_path_buf());
            }
            Err(e) => e,
        };

        if self.environment.strictness() == Strictness::Strict {
            return Err(primary.into());
        }

        warn!("Failed to save image to {}: {}", target.display(), primary);
        match save_to_temp_file(image, self.environment.temp_dir()) {
            Ok(path) => {
                warn!("Saved image to fallback location {}", path.display());
                Ok(path)
            }
            Err(fallback) => Err(FilterError::Save {
                path: target.to_path_buf(),
                primary: primary.to_string(),
                fallback: fallback.to_string(),
            }),
        }
    }
}

fn save_to_temp_file(image: &RgbImage, dir: &Path) -> Result<PathBuf> {
    let path = tempfile::Builder::new()
        .prefix("image_filter_")
        .suffix(".jpg")
        .tempfile_in(dir)?
        .into_temp_path()
        .keep()
        .map_err(std::io::Error::from)?;

    if let Err(e) = image.save_with_format(&path, ImageFormat::Jpeg) {
        let _ = std::fs::remove_file(&path);
        return Err(e.into());
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;

    fn placement_with_temp(dir: &Path, strictness: Strictness, temp: PathBuf) -> OutputPlacement {
        let config = ServerConfig {
            output_dir: Some(dir.join("writable")),
            strictness,
            ..Default::default()
        };
        OutputPlacement::new(FilterEnvironment::initialize_with_dirs(
            &config,
            Some(dir.join("home")),
            temp,
        ))
    }

    fn placement(dir: &Path, strictness: Strictness) -> OutputPlacement {
        std::fs::create_dir_all(dir.join("tmp")).unwrap();
        placement_with_temp(dir, strictness, dir.join("tmp"))
    }

    #[test]
    fn test_default_file_name() {
        let name = |input: &str, kind| OutputPlacement::default_file_name(Path::new(input), kind);
        assert_eq!(name("/a/photo.png", FilterKind::Blur), "photo_blur.png");
        assert_eq!(name("/a/photo.PNG", FilterKind::Sepia), "photo_sepia.PNG");
        assert_eq!(name("/a/photo", FilterKind::Invert), "photo_invert.jpg");
        assert_eq!(name("/a/scan.tiff", FilterKind::EdgeDetection), "scan_edge_detection.jpg");
        assert_eq!(name("/", FilterKind::Smooth), "image_smooth.jpg");
    }

    #[test]
    fn test_no_output_path_lands_in_writable_dir() {
        let dir = tempfile::tempdir().unwrap();
        let placement = placement(dir.path(), Strictness::Lenient);
        let target = placement.place(None, Path::new("/x/cat.jpeg"), FilterKind::Contour);
        assert_eq!(target, dir.path().join("writable/cat_contour.jpeg"));

        let blank = placement.place(Some("  "), Path::new("/x/cat.jpeg"), FilterKind::Contour);
        assert_eq!(blank, target);
    }

    #[test]
    fn test_relative_output_anchored_to_writable_dir() {
        let dir = tempfile::tempdir().unwrap();
        let placement = placement(dir.path(), Strictness::Lenient);
        let target = placement.place(Some("results/out.png"), Path::new("/x/in.png"), FilterKind::Emboss);
        assert_eq!(target, dir.path().join("writable/results/out.png"));
        assert!(dir.path().join("writable/results").is_dir());
    }

    #[test]
    fn test_home_output_is_expanded() {
        let dir = tempfile::tempdir().unwrap();
        let placement = placement(dir.path(), Strictness::Lenient);
        let target = placement.place(Some("~/out.png"), Path::new("/x/in.png"), FilterKind::Emboss);
        assert_eq!(target, dir.path().join("home/out.png"));
    }

    #[test]
    fn test_directory_output_gets_default_name() {
        let dir = tempfile::tempdir().unwrap();
        let placement = placement(dir.path(), Strictness::Lenient);
        let out_dir = dir.path().join("exports");
        std::fs::create_dir_all(&out_dir).unwrap();

        let target = placement.place(out_dir.to_str(), Path::new("/x/in.png"), FilterKind::Sharpen);
        assert_eq!(target, out_dir.join("in_sharpen.png"));
    }

    #[test]
    fn test_unwritable_directory_is_rerouted() {
        let dir = tempfile::tempdir().unwrap();
        let placement = placement(dir.path(), Strictness::Lenient);
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"a file").unwrap();

        let requested = blocker.join("sub/result.png");
        let target = placement.place(requested.to_str(), Path::new("/x/in.png"), FilterKind::Blur);
        assert_eq!(target, dir.path().join("writable/result.png"));
    }

    #[test]
    fn test_save_writes_requested_path() {
        let dir = tempfile::tempdir().unwrap();
        let placement = placement(dir.path(), Strictness::Lenient);
        let target = dir.path().join("writable/saved.png");

        let saved = placement.save(&crate::test_image::gradient(8, 8), &target).unwrap();
        assert_eq!(saved, target);
        assert!(image::open(&saved).is_ok());
    }

    #[test]
    fn test_save_falls_back_to_temp_jpg() {
        let dir = tempfile::tempdir().unwrap();
        let placement = placement(dir.path(), Strictness::Lenient);
        let target = dir.path().join("writable/result.unknownext");

        let saved = placement.save(&crate::test_image::gradient(8, 8), &target).unwrap();
        assert_ne!(saved, target);
        assert_eq!(saved.extension().and_then(|e| e.to_str()), Some("jpg"));
        assert!(saved.starts_with(dir.path().join("tmp")));
        assert!(image::open(&saved).is_ok());
    }

    #[test]
    fn test_double_save_failure_reports_both_causes() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"a file").unwrap();
        let placement = placement_with_temp(dir.path(), Strictness::Lenient, blocker.join("tmp"));
        let target = dir.path().join("writable/result.unknownext");

        let err = placement.save(&crate::test_image::gradient(8, 8), &target).unwrap_err();
        let message = err.to_string();
        match err {
            FilterError::Save { path, primary, fallback } => {
                assert_eq!(path, target);
                assert!(!primary.is_empty() && !fallback.is_empty());
                assert!(message.contains(&primary), "{message}");
                assert!(message.contains(&fallback), "{message}");
                assert!(message.contains("fallback save to a temporary file also failed"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_strict_save_has_no_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let placement = placement(dir.path(), Strictness::Strict);
        let target = dir.path().join("writable/result.unknownext");

        let err = placement.save(&crate::test_image::gradient(8, 8), &target).unwrap_err();
        assert!(matches!(err, FilterError::Image(_)));
    }
}
