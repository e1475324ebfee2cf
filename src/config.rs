use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::detect::{ModelAssets, ModelConfig, Strategy};
use crate::detect::backends::model::{
    DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_NMS_THRESHOLD, DEFAULT_TARGET_CLASS,
};
use crate::playback::{PlaybackConfig, DEFAULT_IDLE_INTERVAL, DEFAULT_TICK_DELAY};

const DEFAULT_STRATEGY: Strategy = Strategy::Motion;
const DEFAULT_WEIGHTS_PATH: &str = "yolov3.onnx";
const DEFAULT_NETWORK_CONFIG_PATH: &str = "yolov3.toml";
const DEFAULT_CLASS_NAMES_PATH: &str = "coco.names";

#[derive(Debug, Deserialize, Default)]
struct PlayerConfigFile {
    strategy: Option<String>,
    snapshot_dir: Option<PathBuf>,
    playback: Option<PlaybackConfigFile>,
    model: Option<ModelConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct PlaybackConfigFile {
    tick_delay_ms: Option<u64>,
    idle_interval_ms: Option<u64>,
    autoplay: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
struct ModelConfigFile {
    weights: Option<PathBuf>,
    config: Option<PathBuf>,
    class_names: Option<PathBuf>,
    target_class: Option<String>,
    confidence_threshold: Option<f32>,
    nms_threshold: Option<f32>,
}

#[derive(Debug, Clone)]
pub struct PlayerSettings {
    pub strategy: Strategy,
    pub playback: PlaybackConfig,
    pub model: ModelSettings,
    /// Write each annotated frame as PNG here when set.
    pub snapshot_dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ModelSettings {
    pub weights: PathBuf,
    pub config: PathBuf,
    pub class_names: PathBuf,
    pub target_class: String,
    pub confidence_threshold: f32,
    pub nms_threshold: f32,
}

impl ModelSettings {
    pub fn assets(&self) -> ModelAssets {
        ModelAssets {
            weights: self.weights.clone(),
            config: self.config.clone(),
            class_names: self.class_names.clone(),
        }
    }

    pub fn filter_config(&self) -> ModelConfig {
        ModelConfig {
            confidence_threshold: self.confidence_threshold,
            nms_threshold: self.nms_threshold,
            target_class: self.target_class.clone(),
        }
    }
}

impl PlayerSettings {
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("PITCH_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default())?;
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: PlayerConfigFile) -> Result<Self> {
        let strategy = match file.strategy.as_deref() {
            Some(value) => value.parse()?,
            None => DEFAULT_STRATEGY,
        };
        let playback = file.playback.unwrap_or_default();
        let playback = PlaybackConfig {
            tick_delay: playback
                .tick_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_TICK_DELAY),
            idle_interval: playback
                .idle_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_IDLE_INTERVAL),
            autoplay: playback.autoplay.unwrap_or(true),
        };
        let model = file.model.unwrap_or_default();
        let model = ModelSettings {
            weights: model
                .weights
                .unwrap_or_else(|| PathBuf::from(DEFAULT_WEIGHTS_PATH)),
            config: model
                .config
                .unwrap_or_else(|| PathBuf::from(DEFAULT_NETWORK_CONFIG_PATH)),
            class_names: model
                .class_names
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CLASS_NAMES_PATH)),
            target_class: model
                .target_class
                .unwrap_or_else(|| DEFAULT_TARGET_CLASS.to_string()),
            confidence_threshold: model
                .confidence_threshold
                .unwrap_or(DEFAULT_CONFIDENCE_THRESHOLD),
            nms_threshold: model.nms_threshold.unwrap_or(DEFAULT_NMS_THRESHOLD),
        };
        Ok(Self {
            strategy,
            playback,
            model,
            snapshot_dir: file.snapshot_dir,
        })
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(strategy) = std::env::var("PITCH_STRATEGY") {
            if !strategy.trim().is_empty() {
                self.strategy = strategy.parse()?;
            }
        }
        if let Ok(delay) = std::env::var("PITCH_TICK_DELAY_MS") {
            let millis: u64 = delay.parse().map_err(|_| {
                anyhow!("PITCH_TICK_DELAY_MS must be an integer number of milliseconds")
            })?;
            self.playback.tick_delay = Duration::from_millis(millis);
        }
        if let Ok(interval) = std::env::var("PITCH_IDLE_INTERVAL_MS") {
            let millis: u64 = interval.parse().map_err(|_| {
                anyhow!("PITCH_IDLE_INTERVAL_MS must be an integer number of milliseconds")
            })?;
            self.playback.idle_interval = Duration::from_millis(millis);
        }
        if let Ok(autoplay) = std::env::var("PITCH_AUTOPLAY") {
            self.playback.autoplay = parse_bool("PITCH_AUTOPLAY", &autoplay)?;
        }
        if let Ok(target) = std::env::var("PITCH_TARGET_CLASS") {
            if !target.trim().is_empty() {
                self.model.target_class = target;
            }
        }
        if let Ok(dir) = std::env::var("PITCH_SNAPSHOT_DIR") {
            if !dir.trim().is_empty() {
                self.snapshot_dir = Some(PathBuf::from(dir));
            }
        }
        if let Ok(path) = std::env::var("PITCH_MODEL_WEIGHTS") {
            if !path.trim().is_empty() {
                self.model.weights = PathBuf::from(path);
            }
        }
        if let Ok(path) = std::env::var("PITCH_MODEL_CONFIG") {
            if !path.trim().is_empty() {
                self.model.config = PathBuf::from(path);
            }
        }
        if let Ok(path) = std::env::var("PITCH_CLASS_NAMES") {
            if !path.trim().is_empty() {
                self.model.class_names = PathBuf::from(path);
            }
        }
        Ok(())
    }

    pub fn validate(&mut self) -> Result<()> {
        if self.playback.idle_interval.is_zero() {
            return Err(anyhow!("idle interval must be greater than zero"));
        }
        self.model.target_class = self.model.target_class.trim().to_string();
        if self.model.target_class.is_empty() {
            return Err(anyhow!("target class must not be empty"));
        }
        for (name, value) in [
            ("confidence threshold", self.model.confidence_threshold),
            ("nms threshold", self.model.nms_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(anyhow!("{} must be within 0.0..=1.0, got {}", name, value));
            }
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<PlayerConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(anyhow!("{} must be a boolean (true/false)", name)),
    }
}
