//! Detector assets for the model strategy.
//!
//! Three files are loaded once at startup: network weights, a TOML network
//! configuration, and a newline-delimited class list. A missing or unreadable
//! asset is a startup failure (`PlaybackError::AssetMissing`), never a
//! per-frame one.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use serde::Deserialize;

use crate::error::PlaybackError;

const DEFAULT_INPUT_SIZE: u32 = 416;
const DEFAULT_PIXEL_SCALE: f32 = 1.0 / 255.0;

/// Class index -> label lookup.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClassNames {
    names: Vec<String>,
}

impl ClassNames {
    /// One label per line; surrounding whitespace is trimmed. Blank lines keep
    /// their slot so indices stay aligned with the network's class ids.
    pub fn from_lines(contents: &str) -> Self {
        let mut names: Vec<String> = contents.lines().map(|l| l.trim().to_string()).collect();
        while names.last().is_some_and(|n| n.is_empty()) {
            names.pop();
        }
        Self { names }
    }

    pub fn load(path: &Path) -> Result<Self, PlaybackError> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("read class list {}", path.display()))
            .map_err(|e| PlaybackError::asset_missing(path, e))?;
        let classes = Self::from_lines(&contents);
        if classes.is_empty() {
            return Err(PlaybackError::asset_missing(
                path,
                anyhow!("class list is empty"),
            ));
        }
        Ok(classes)
    }

    pub fn get(&self, class_id: usize) -> Option<&str> {
        self.names.get(class_id).map(String::as_str)
    }

    pub fn position(&self, label: &str) -> Option<usize> {
        self.names.iter().position(|n| n == label)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Network configuration file.
///
/// ```toml
/// input_width = 416
/// input_height = 416
/// pixel_scale = 0.00392
/// swap_rb = false
/// ```
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct NetworkConfig {
    #[serde(default = "default_input_size")]
    pub input_width: u32,
    #[serde(default = "default_input_size")]
    pub input_height: u32,
    /// Multiplier applied to 0..=255 channel values.
    #[serde(default = "default_pixel_scale")]
    pub pixel_scale: f32,
    /// Feed channels as BGR instead of RGB.
    #[serde(default)]
    pub swap_rb: bool,
}

fn default_input_size() -> u32 {
    DEFAULT_INPUT_SIZE
}

fn default_pixel_scale() -> f32 {
    DEFAULT_PIXEL_SCALE
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            input_width: DEFAULT_INPUT_SIZE,
            input_height: DEFAULT_INPUT_SIZE,
            pixel_scale: DEFAULT_PIXEL_SCALE,
            swap_rb: false,
        }
    }
}

impl NetworkConfig {
    pub fn load(path: &Path) -> Result<Self, PlaybackError> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read network config {}", path.display()))
            .map_err(|e| PlaybackError::asset_missing(path, e))?;
        let config: NetworkConfig = toml::from_str(&raw)
            .with_context(|| format!("invalid network config {}", path.display()))
            .map_err(|e| PlaybackError::asset_missing(path, e))?;
        if config.input_width == 0 || config.input_height == 0 {
            return Err(PlaybackError::asset_missing(
                path,
                anyhow!("network input size must be non-zero"),
            ));
        }
        Ok(config)
    }
}

/// Paths to the model strategy's assets.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelAssets {
    pub weights: PathBuf,
    pub config: PathBuf,
    pub class_names: PathBuf,
}

/// Assets after validation and parsing.
#[derive(Clone, Debug)]
pub struct LoadedAssets {
    pub weights: PathBuf,
    pub network: NetworkConfig,
    pub classes: ClassNames,
}

impl ModelAssets {
    /// Check every asset exists and parse the config and class list.
    ///
    /// The weights file is only checked for presence here; the network backend
    /// reads it.
    pub fn load(&self) -> Result<LoadedAssets, PlaybackError> {
        if !self.weights.is_file() {
            return Err(PlaybackError::asset_missing(
                &self.weights,
                anyhow!("weights file not found"),
            ));
        }
        let network = NetworkConfig::load(&self.config)?;
        let classes = ClassNames::load(&self.class_names)?;
        log::info!(
            "model assets loaded: weights={} input={}x{} classes={}",
            self.weights.display(),
            network.input_width,
            network.input_height,
            classes.len()
        );
        Ok(LoadedAssets {
            weights: self.weights.clone(),
            network,
            classes,
        })
    }
}
