//! TOML configuration for the monitor.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable that suppresses the preview window when set to a
/// truthy value ("1", "true", "yes", "on", case-insensitive).
pub const HEADLESS_ENV: &str = "FACEWATCH_HEADLESS";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// A person enrolled from a single reference image.
#[derive(Debug, Clone, Deserialize)]
pub struct ReferenceImage {
    pub name: String,
    pub image: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Video source: an `http(s)://` MJPEG stream URL or a V4L2 device path.
    pub source: String,

    /// People to recognize.
    #[serde(default)]
    pub references: Vec<ReferenceImage>,

    /// Downsampling factor applied to frames before detection.
    #[serde(default = "default_scale_factor")]
    pub scale_factor: f32,

    /// Maximum embedding distance that still counts as a match.
    #[serde(default = "default_tolerance")]
    pub tolerance: f32,

    /// Directory snapshots of new appearances are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Directory holding the ONNX model files.
    #[serde(default = "default_model_dir")]
    pub model_dir: PathBuf,

    /// Seconds to wait after a failed frame read before shutting down.
    #[serde(default = "default_reconnect_delay_secs")]
    pub reconnect_delay_secs: u64,
}

fn default_scale_factor() -> f32 {
    0.5
}

fn default_tolerance() -> f32 {
    0.6
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("detected_faces_output")
}

fn default_model_dir() -> PathBuf {
    PathBuf::from("models")
}

fn default_reconnect_delay_secs() -> u64 {
    5
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source.is_empty() {
            return Err(ConfigError::Invalid("source must not be empty".into()));
        }
        if !(self.scale_factor > 0.0 && self.scale_factor <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "scale_factor must be in (0, 1], got {}",
                self.scale_factor
            )));
        }
        if self.tolerance < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "tolerance must be non-negative, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }

    pub fn reference_entries(&self) -> Vec<(String, PathBuf)> {
        self.references
            .iter()
            .map(|r| (r.name.clone(), r.image.clone()))
            .collect()
    }
}

/// True when [`HEADLESS_ENV`] is set to a truthy value.
pub fn headless_from_env() -> bool {
    std::env::var(HEADLESS_ENV)
        .map(|v| is_truthy(&v))
        .unwrap_or(false)
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
