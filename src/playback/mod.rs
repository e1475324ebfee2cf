//! Frame playback and detection loop.
//!
//! `Player` owns the loaded source, the detector and the playback state. Control
//! actions (`load`, `play`, `pause`, `rewind`) are synchronous state transitions.
//! `tick` does one unit of work and tells the caller when to call it again; the
//! caller keeps at most one pending tick (`scheduler::PeriodicTask`).
//!
//! State machine:
//!
//! ```text
//! NotLoaded --load--> Playing | Paused
//! Playing  <--play/pause--> Paused
//! Playing  --end of stream / read error--> Finished
//! any      --load--> Playing | Paused   (old source released first)
//! ```

pub mod display;
pub mod scheduler;

use std::time::Duration;

use image::RgbImage;

use crate::detect::{BoundingRect, DetectorBackend};
use crate::error::PlaybackError;
use crate::frame::{annotate, Frame};
use crate::ingest::{FrameSource, SourceOpener};

pub use display::{DisplaySurface, LogDisplay, SnapshotDisplay};
pub use scheduler::PeriodicTask;

pub const IDLE_MESSAGE: &str = "Upload a video to start analysis";
pub const ANALYZING_MESSAGE: &str = "Analyzing video...";

pub const DEFAULT_TICK_DELAY: Duration = Duration::from_millis(1);
pub const DEFAULT_IDLE_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackState {
    NotLoaded,
    Playing,
    Paused,
    Finished,
}

impl PlaybackState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaybackState::NotLoaded => "not_loaded",
            PlaybackState::Playing => "playing",
            PlaybackState::Paused => "paused",
            PlaybackState::Finished => "finished",
        }
    }
}

/// Outcome of the most recent tick, as shown on the status line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Detected,
    NotDetected,
    Finished,
}

impl Status {
    pub fn message(&self) -> &'static str {
        match self {
            Status::Detected => "Baseball detected!",
            Status::NotDetected => "No baseball detected.",
            Status::Finished => "Finished analyzing the video.",
        }
    }
}

/// What the caller should do after a tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    Reschedule(Duration),
    Stop,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlaybackConfig {
    /// Delay between advancing ticks.
    pub tick_delay: Duration,
    /// Delay between ticks while paused.
    pub idle_interval: Duration,
    /// Start playing immediately after `load` and `rewind`.
    pub autoplay: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            tick_delay: DEFAULT_TICK_DELAY,
            idle_interval: DEFAULT_IDLE_INTERVAL,
            autoplay: true,
        }
    }
}

/// Read-only view of the player handed to display surfaces.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    pub state: PlaybackState,
    /// Index of the frame being shown, or the frame count once finished.
    pub frame_index: u64,
    pub source: Option<String>,
    pub status: Option<Status>,
    /// Regions annotated on the frame being shown.
    pub detections: Vec<BoundingRect>,
}

impl Snapshot {
    pub fn message(&self) -> &'static str {
        match (self.status, self.state) {
            (Some(status), _) => status.message(),
            (None, PlaybackState::NotLoaded) => IDLE_MESSAGE,
            (None, PlaybackState::Finished) => Status::Finished.message(),
            (None, _) => ANALYZING_MESSAGE,
        }
    }
}

pub struct Player {
    opener: Box<dyn SourceOpener>,
    detector: Box<dyn DetectorBackend>,
    source: Option<Box<dyn FrameSource>>,
    config: PlaybackConfig,
    state: PlaybackState,
    frame_index: u64,
    status: Option<Status>,
    detections: Vec<BoundingRect>,
}

impl Player {
    pub fn new(
        opener: Box<dyn SourceOpener>,
        detector: Box<dyn DetectorBackend>,
        config: PlaybackConfig,
    ) -> Self {
        log::info!(
            "player ready: detector={} strategy={} autoplay={}",
            detector.name(),
            detector.strategy().as_str(),
            config.autoplay
        );
        Self {
            opener,
            detector,
            source: None,
            config,
            state: PlaybackState::NotLoaded,
            frame_index: 0,
            status: None,
            detections: Vec::new(),
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    pub fn has_source(&self) -> bool {
        self.source.is_some()
    }

    /// Whether ticks still have work to do (playing, or paused and waiting).
    pub fn is_active(&self) -> bool {
        matches!(self.state, PlaybackState::Playing | PlaybackState::Paused)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            state: self.state,
            frame_index: self.frame_index,
            source: self.source.as_ref().map(|s| s.describe().to_string()),
            status: self.status,
            detections: self.detections.clone(),
        }
    }

    /// Replace the current source with `path`.
    ///
    /// The previous source is released before the new one is opened. On
    /// failure the player is left `NotLoaded`.
    pub fn load(&mut self, path: &str) -> Result<(), PlaybackError> {
        self.release_source();
        self.state = PlaybackState::NotLoaded;
        self.reset_pass();

        let source = self.opener.open(path).map_err(|e| {
            log::warn!("failed to open {}: {:#}", path, e);
            PlaybackError::source_unavailable(path, e)
        })?;

        if let Some(count) = source.frame_count() {
            log::info!("loaded {} ({} frames)", path, count);
        } else {
            log::info!("loaded {}", path);
        }
        self.source = Some(source);
        self.state = self.resume_state();
        Ok(())
    }

    pub fn play(&mut self) {
        if self.state == PlaybackState::Paused && self.source.is_some() {
            log::info!("playing from frame {}", self.frame_index);
            self.state = PlaybackState::Playing;
        }
    }

    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            log::info!("paused at frame {}", self.frame_index);
            self.state = PlaybackState::Paused;
        }
    }

    /// Seek back to the first frame and start a fresh pass.
    ///
    /// No-op when no source is held, including after playback finished.
    pub fn rewind(&mut self) -> Result<(), PlaybackError> {
        let Some(source) = self.source.as_mut() else {
            return Ok(());
        };
        if let Err(e) = source.seek(0) {
            self.finish_quietly();
            return Err(PlaybackError::FrameReadFailure {
                index: 0,
                source: e,
            });
        }
        self.reset_pass();
        self.state = self.resume_state();
        log::info!("rewound to frame 0");
        Ok(())
    }

    /// Run one scheduling step.
    pub fn tick(&mut self, display: &mut dyn DisplaySurface) -> TickOutcome {
        match self.state {
            PlaybackState::Paused => TickOutcome::Reschedule(self.config.idle_interval),
            PlaybackState::NotLoaded | PlaybackState::Finished => TickOutcome::Stop,
            PlaybackState::Playing => self.advance(display),
        }
    }

    fn advance(&mut self, display: &mut dyn DisplaySurface) -> TickOutcome {
        let index = self.frame_index;
        let frame = match self.read_frame(index) {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                log::info!("end of stream after {} frames", index);
                return self.finish(display);
            }
            Err(e) => {
                log::warn!("{:#}; ending playback", anyhow::Error::new(e));
                return self.finish(display);
            }
        };

        let result = match self.detector.detect(&frame) {
            Ok(result) => result,
            Err(e) => {
                log::warn!("detector rejected frame {}: {:#}; ending playback", index, e);
                return self.finish(display);
            }
        };

        let status = if result.is_detected() {
            Status::Detected
        } else {
            Status::NotDetected
        };
        log::debug!("frame {}: {:?}", index, status);

        let mut image: RgbImage = frame.into_image();
        self.detections = result.rects();
        annotate(&mut image, &self.detections);
        self.status = Some(status);
        self.publish(display, Some(&image));

        self.frame_index += 1;
        TickOutcome::Reschedule(self.config.tick_delay)
    }

    fn read_frame(&mut self, index: u64) -> Result<Option<Frame>, PlaybackError> {
        let Some(source) = self.source.as_mut() else {
            return Ok(None);
        };
        if let Err(e) = source.seek(index) {
            return Err(PlaybackError::FrameReadFailure { index, source: e });
        }
        source
            .read()
            .map_err(|e| PlaybackError::FrameReadFailure { index, source: e })
    }

    fn finish(&mut self, display: &mut dyn DisplaySurface) -> TickOutcome {
        self.finish_quietly();
        self.publish(display, None);
        TickOutcome::Stop
    }

    fn finish_quietly(&mut self) {
        self.release_source();
        self.state = PlaybackState::Finished;
        self.status = Some(Status::Finished);
        self.detections.clear();
    }

    fn publish(&self, display: &mut dyn DisplaySurface, image: Option<&RgbImage>) {
        if let Err(e) = display.present(image, &self.snapshot()) {
            log::warn!("display update failed: {:#}", e);
        }
    }

    fn release_source(&mut self) {
        if let Some(source) = self.source.take() {
            log::info!("releasing source {}", source.describe());
        }
    }

    fn reset_pass(&mut self) {
        self.frame_index = 0;
        self.status = None;
        self.detections.clear();
        self.detector.reset();
    }

    fn resume_state(&self) -> PlaybackState {
        if self.config.autoplay {
            PlaybackState::Playing
        } else {
            PlaybackState::Paused
        }
    }
}
