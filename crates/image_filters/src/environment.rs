use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::{
    config::{ServerConfig, Strictness},
    error::Result,
    paths::{home_dir, is_writable_dir},
    test_image,
};

/// Process-wide runtime values derived once from a [`ServerConfig`]
#[derive(Debug, Clone)]
pub struct FilterEnvironment {
    writable_dir: PathBuf,
    test_image_path: PathBuf,
    strictness: Strictness,
    sandbox_prefixes: Vec<String>,
    home: Option<PathBuf>,
    temp_dir: PathBuf,
}

impl FilterEnvironment {
    pub fn initialize(config: &ServerConfig) -> Self {
        Self::initialize_with_home(config, home_dir())
    }

    pub fn initialize_with_home(config: &ServerConfig, home: Option<PathBuf>) -> Self {
        Self::initialize_with_dirs(config, home, std::env::temp_dir())
    }

    /// Like [`Self::initialize`], with explicit home and temporary directories
    pub fn initialize_with_dirs(
        config: &ServerConfig,
        home: Option<PathBuf>,
        temp_dir: PathBuf,
    ) -> Self {
        let temp_dir = absolute(temp_dir.clone()).unwrap_or(temp_dir);
        let writable_dir = Self::choose_writable_dir(config, home.as_deref(), &temp_dir);
        let test_image_path = writable_dir.join(&config.test_image_name);
        info!("Writable directory: {}", writable_dir.display());

        let environment = Self {
            writable_dir,
            test_image_path,
            strictness: config.strictness,
            sandbox_prefixes: config.sandbox_prefixes.clone(),
            home,
            temp_dir,
        };
        if let Err(e) = environment.ensure_test_image() {
            warn!(
                "Could not create test image at {}: {}",
                environment.test_image_path.display(),
                e
            );
        }
        environment
    }

    fn choose_writable_dir(config: &ServerConfig, home: Option<&Path>, temp_dir: &Path) -> PathBuf {
        let candidates = config
            .output_dir
            .iter()
            .cloned()
            .chain(home.map(|home| home.join(&config.output_subdir)))
            .filter_map(absolute);

        for candidate in candidates {
            if is_writable_dir(&candidate) {
                return candidate;
            }
            warn!("Directory {} is not writable, trying next candidate", candidate.display());
        }
        temp_dir.to_path_buf()
    }

    pub fn writable_dir(&self) -> &Path {
        &self.writable_dir
    }

    pub fn test_image_path(&self) -> &Path {
        &self.test_image_path
    }

    pub fn strictness(&self) -> Strictness {
        self.strictness
    }

    pub fn sandbox_prefixes(&self) -> &[String] {
        &self.sandbox_prefixes
    }

    pub fn home(&self) -> Option<&Path> {
        self.home.as_deref()
    }

    /// Where the last-resort save fallback writes
    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    /// Create the gradient test image if it is missing
    pub fn ensure_test_image(&self) -> Result<PathBuf> {
        test_image::ensure_test_image(&self.test_image_path)
    }
}

/// Anchor a relative path to the current directory
fn absolute(path: PathBuf) -> Option<PathBuf> {
    if path.is_absolute() {
        return Some(path);
    }
    match std::env::current_dir() {
        Ok(cwd) => Some(cwd.join(path)),
        Err(e) => {
            warn!("Cannot anchor {}: current directory unavailable: {}", path.display(), e);
            None
        }
    }
}
