use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Unknown filter: {0}")]
    UnknownFilter(String),

    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("Error processing image with '{filter}' filter: {source}")]
    Apply {
        filter: String,
        #[source]
        source: Box<FilterError>,
    },

    #[error("Could not resolve input image '{path}': {reason}")]
    InputResolution { path: String, reason: String },

    #[error(
        "Failed to save image to {}: {primary}; fallback save to a temporary file also failed: {fallback}",
        path.display()
    )]
    Save {
        path: PathBuf,
        primary: String,
        fallback: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Unsupported config file format. Please use .toml or .json files")]
    UnsupportedConfigFormat,
}

pub type Result<T> = std::result::Result<T, FilterError>;
