use anyhow::Result;

use crate::detect::result::DetectionResult;
use crate::frame::Frame;

/// Detection strategies the player can run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    /// Frame differencing against the previous frame plus a shape filter.
    Motion,
    /// Pretrained multi-class network, confidence filter, NMS and class match.
    Model,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Motion => "motion",
            Strategy::Model => "model",
        }
    }
}

impl std::str::FromStr for Strategy {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "motion" => Ok(Strategy::Motion),
            "model" => Ok(Strategy::Model),
            other => Err(anyhow::anyhow!(
                "unknown detection strategy '{}'; expected motion or model",
                other
            )),
        }
    }
}

/// Detector backend trait.
///
/// A backend turns one frame into zero or more candidate regions. Backends may
/// keep per-source state (the motion baseline); the player calls `reset` on
/// load and rewind so that state never leaks across sources or passes.
pub trait DetectorBackend {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// The strategy this backend implements.
    fn strategy(&self) -> Strategy;

    /// Run detection on a frame.
    ///
    /// An error means the frame could not be interpreted. The player ends
    /// playback of the current source rather than publishing a partial result.
    fn detect(&mut self, frame: &Frame) -> Result<DetectionResult>;

    /// Drop any state carried between frames.
    fn reset(&mut self) {}
}
