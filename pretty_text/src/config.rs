// Copyright 2025 the Pretty Text Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cache configuration.
//!
//! Configuration is read once and handed to [`RenderCache::new`]; it is not
//! consulted through any global state afterwards. A config file is optional,
//! every field has a default.
//!
//! ```toml
//! storage_root = "public"
//! font_root = "fonts"
//! image_path = "system/pretty_text"
//! scale_threshold = 12
//! scale_filter = "gaussian"
//! scale_support = 0.5
//! ```
//!
//! [`RenderCache::new`]: crate::RenderCache::new

use core::fmt;
use core::str::FromStr;
use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors while loading a configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid TOML or has values of the wrong type.
    #[error("failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),

    /// A value is out of range.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

/// Resampling kernel used when scaling supersampled text down.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleFilter {
    /// Nearest neighbour.
    Nearest,
    /// Linear.
    Triangle,
    /// Cubic.
    CatmullRom,
    /// Gaussian.
    #[default]
    Gaussian,
    /// Lanczos with a window of 3.
    Lanczos3,
}

impl ScaleFilter {
    pub(crate) fn filter_type(self) -> FilterType {
        match self {
            Self::Nearest => FilterType::Nearest,
            Self::Triangle => FilterType::Triangle,
            Self::CatmullRom => FilterType::CatmullRom,
            Self::Gaussian => FilterType::Gaussian,
            Self::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

impl fmt::Display for ScaleFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Nearest => "nearest",
            Self::Triangle => "triangle",
            Self::CatmullRom => "catmull_rom",
            Self::Gaussian => "gaussian",
            Self::Lanczos3 => "lanczos3",
        })
    }
}

impl FromStr for ScaleFilter {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nearest" | "point" => Ok(Self::Nearest),
            "triangle" | "linear" => Ok(Self::Triangle),
            "catmull_rom" | "catmullrom" | "cubic" => Ok(Self::CatmullRom),
            "gaussian" => Ok(Self::Gaussian),
            "lanczos3" | "lanczos" => Ok(Self::Lanczos3),
            _ => Err(ConfigError::Validation(format!("unknown scale filter `{s}`"))),
        }
    }
}

/// Process-wide settings for a [`RenderCache`](crate::RenderCache).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Directory that is served publicly; images live below it.
    pub storage_root: PathBuf,
    /// Directory that style font references are resolved against.
    pub font_root: PathBuf,
    /// Image directory relative to `storage_root`, also the URL prefix.
    pub image_path: String,
    /// Largest point size, inclusive, that the upscale hack applies to.
    pub scale_threshold: f32,
    /// Kernel for scaling supersampled text down.
    pub scale_filter: ScaleFilter,
    /// Blur applied before scaling down, in output pixels. `0` disables it.
    pub scale_support: f32,
    /// Sigma of the unsharp mask applied after scaling down.
    pub sharpen_sigma: f32,
    /// Minimum brightness difference the unsharp mask acts on.
    pub sharpen_threshold: i32,
    /// Serialize concurrent first renders of the same key within this process.
    pub single_flight: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_root: PathBuf::from("public"),
            font_root: PathBuf::from("fonts"),
            image_path: String::from("system/pretty_text"),
            scale_threshold: 12.0,
            scale_filter: ScaleFilter::Gaussian,
            scale_support: 0.5,
            sharpen_sigma: 1.0,
            sharpen_threshold: 12,
            single_flight: true,
        }
    }
}

impl Config {
    /// Creates the default configuration rooted at `storage_root`.
    pub fn with_storage_root(storage_root: impl Into<PathBuf>) -> Self {
        Self {
            storage_root: storage_root.into(),
            ..Self::default()
        }
    }

    /// Load configuration from `path`.
    ///
    /// Returns the default configuration if the file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::info!(
                "No config file found at {}, using defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        log::info!("Loading config from {}", path.display());
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.scale_threshold.is_finite() || self.scale_threshold <= 0.0 {
            return Err(ConfigError::Validation(format!(
                "scale_threshold must be a positive number, got {}",
                self.scale_threshold
            )));
        }

        if !self.scale_support.is_finite() || self.scale_support < 0.0 {
            return Err(ConfigError::Validation(format!(
                "scale_support must not be negative, got {}",
                self.scale_support
            )));
        }

        if !self.sharpen_sigma.is_finite() || self.sharpen_sigma < 0.0 {
            return Err(ConfigError::Validation(format!(
                "sharpen_sigma must not be negative, got {}",
                self.sharpen_sigma
            )));
        }

        if self.image_path.trim_matches('/').is_empty() {
            return Err(ConfigError::Validation(
                "image_path must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// The image directory with surrounding slashes removed.
    pub(crate) fn image_dir(&self) -> &str {
        self.image_path.trim_matches('/')
    }

    /// Absolute directory holding the cached images.
    pub fn image_root(&self) -> PathBuf {
        let mut root = self.storage_root.clone();
        root.extend(self.image_dir().split('/').filter(|s| !s.is_empty()));
        root
    }
}
