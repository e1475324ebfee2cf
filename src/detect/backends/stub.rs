use anyhow::Result;

use crate::detect::backends::model::{ObjectNetwork, RawDetection};
use crate::frame::Frame;

/// Stub network for testing. Replays canned raw detections by frame index.
///
/// Frames past the end of the script produce no detections.
pub struct ScriptedNetwork {
    script: Vec<Vec<RawDetection>>,
}

impl ScriptedNetwork {
    pub fn new(script: Vec<Vec<RawDetection>>) -> Self {
        Self { script }
    }
}

impl ObjectNetwork for ScriptedNetwork {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn infer(&mut self, frame: &Frame) -> Result<Vec<RawDetection>> {
        Ok(usize::try_from(frame.index())
            .ok()
            .and_then(|i| self.script.get(i))
            .cloned()
            .unwrap_or_default())
    }
}
