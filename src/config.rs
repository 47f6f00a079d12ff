//! Configuration file support
//!
//! Looks for `./centerframe.toml`, then
//! `<config dir>/centerframe/config.toml`. Missing files mean defaults;
//! CLI flags override whatever the file says.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::codec::{OutputFormat, DEFAULT_JPEG_QUALITY};
use crate::detect::DetectOptions;
use crate::pipeline::{PipelineConfig, DEFAULT_MAX_INPUT_PIXELS, DEFAULT_MAX_OUTPUT_PIXELS};
use crate::settings::JsonFileStore;

/// Config file name looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "centerframe.toml";

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file not found: {0}")]
    NotFound(PathBuf),
}

/// `[output]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub jpeg_quality: u8,
    pub max_input_pixels: u64,
    pub max_output_pixels: u64,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Jpeg,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            max_input_pixels: DEFAULT_MAX_INPUT_PIXELS,
            max_output_pixels: DEFAULT_MAX_OUTPUT_PIXELS,
        }
    }
}

/// `[settings]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsStoreConfig {
    /// Where persisted composition settings live
    pub store_path: Option<PathBuf>,
}

/// Whole config file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub detection: DetectOptions,
    pub output: OutputConfig,
    pub settings: SettingsStoreConfig,
}

/// Values given explicitly on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub white_threshold: Option<u8>,
    pub alpha_threshold: Option<u8>,
    pub output_format: Option<OutputFormat>,
    pub jpeg_quality: Option<u8>,
    pub settings_file: Option<PathBuf>,
}

impl CliOverrides {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Config {
    /// Load from the first config file found, or defaults
    pub fn load() -> Result<Self, ConfigError> {
        for path in Self::search_paths() {
            if path.exists() {
                debug!("Loading config from {}", path.display());
                return Self::load_from_path(&path);
            }
        }
        Ok(Self::default())
    }

    /// Load from an explicit path
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Candidate config locations, in priority order
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("centerframe").join("config.toml"));
        }
        paths
    }

    /// Settings store location: CLI, then config file, then the default
    pub fn settings_store_path(&self, cli: &CliOverrides) -> PathBuf {
        cli.settings_file
            .clone()
            .or_else(|| self.settings.store_path.clone())
            .unwrap_or_else(JsonFileStore::default_path)
    }

    /// Merge with CLI values; CLI wins
    pub fn merge_with_cli(&self, cli: &CliOverrides) -> PipelineConfig {
        PipelineConfig {
            detect: DetectOptions {
                white_threshold: cli
                    .white_threshold
                    .unwrap_or(self.detection.white_threshold),
                alpha_threshold: cli
                    .alpha_threshold
                    .unwrap_or(self.detection.alpha_threshold),
            },
            output_format: cli.output_format.unwrap_or(self.output.format),
            jpeg_quality: cli
                .jpeg_quality
                .unwrap_or(self.output.jpeg_quality)
                .clamp(1, 100),
            max_input_pixels: self.output.max_input_pixels,
            max_output_pixels: self.output.max_output_pixels,
        }
    }
}
