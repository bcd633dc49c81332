use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{
    error::{FilterError, Result},
    test_image::DEFAULT_TEST_IMAGE_NAME,
};

pub const CONFIG_PATH_ENV: &str = "IMAGE_FILTERS_CONFIG";
pub const OUTPUT_DIR_ENV: &str = "IMAGE_FILTERS_OUTPUT_DIR";
pub const STRICTNESS_ENV: &str = "IMAGE_FILTERS_STRICTNESS";

/// How aggressively bad inputs are papered over
#[derive(
    Debug, Clone, Copy, Default,
    Serialize, Deserialize,
    Display, EnumString,
    PartialEq, Eq
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Strictness {
    /// Substitute the test image / a synthetic bitmap / a temp file when something goes wrong
    #[default]
    Lenient,
    /// Surface input, decode and save failures to the caller
    Strict,
}

impl Strictness {
    pub fn is_strict(self) -> bool {
        matches!(self, Self::Strict)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Preferred output directory; the home sub-directory is used when unset
    pub output_dir: Option<PathBuf>,
    /// Sub-directory of `$HOME` used as the writable directory
    pub output_subdir: String,
    pub strictness: Strictness,
    /// Path prefixes from sandboxed callers that never exist locally
    pub sandbox_prefixes: Vec<String>,
    pub test_image_name: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            output_subdir: "image_filter_outputs".to_string(),
            strictness: Strictness::Lenient,
            sandbox_prefixes: vec![
                "/mnt/data/".to_string(),
                "/mnt/user-data/".to_string(),
                "sandbox:".to_string(),
            ],
            test_image_name: DEFAULT_TEST_IMAGE_NAME.to_string(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from JSON string
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Auto-detect file format and load configuration
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml(&fs::read_to_string(path_ref)?),
            Some("json") => Self::from_json(&fs::read_to_string(path_ref)?),
            _ => Err(FilterError::UnsupportedConfigFormat),
        }
    }

    /// Build configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    pub fn from_env_with<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup(CONFIG_PATH_ENV) {
            Some(path) if !path.is_empty() => Self::from_file(path)?,
            _ => Self::default(),
        };

        if let Some(dir) = lookup(OUTPUT_DIR_ENV).filter(|dir| !dir.is_empty()) {
            config.output_dir = Some(PathBuf::from(dir));
        }
        if let Some(value) = lookup(STRICTNESS_ENV).filter(|value| !value.is_empty()) {
            config.strictness = value.parse().map_err(|_| {
                FilterError::Config(format!(
                    "{STRICTNESS_ENV} must be 'lenient' or 'strict' (got '{value}')"
                ))
            })?;
        }

        Ok(config)
    }
}
