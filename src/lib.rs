//! Pitch Detector
//!
//! Plays a baseball video frame by frame, runs a ball detector on each frame,
//! draws a box around any hit and reports one status per frame.
//!
//! # Architecture
//!
//! A `playback::Player` owns everything: the loaded `FrameSource`, the
//! `DetectorBackend` and the playback state. Callers drive it with synchronous
//! control actions and a single recurring tick:
//!
//! 1. **Load** releases the previous source before opening the next one.
//! 2. **Tick** reads one frame, detects, annotates and publishes, then asks to
//!    be rescheduled or stopped.
//! 3. **End of stream** (or an unreadable frame) releases the source and
//!    reports "Finished analyzing the video."
//!
//! Two interchangeable detection strategies are provided: frame differencing
//! with a ball-shaped region filter, and a pretrained multi-class network with
//! confidence thresholding, non-maximum suppression and a target-class match.
//!
//! # Module Structure
//!
//! - `frame`: decoded frames and box annotation
//! - `ingest`: frame sources (video files, image directories, `stub://`)
//! - `detect`: detector backends, assets and results
//! - `playback`: player state machine, tick scheduler, display surfaces
//! - `config`: player settings from file and environment
//! - `chat`: one-shot chat-completion call
//! - `error`: typed failures at the public seams

pub mod chat;
pub mod config;
pub mod detect;
pub mod error;
pub mod frame;
pub mod ingest;
pub mod playback;

pub use detect::{
    BoundingRect, Detection, DetectionResult, DetectorBackend, ModelBackend, MotionBackend,
    Strategy,
};
pub use error::PlaybackError;
pub use frame::{annotate, Frame};
pub use ingest::{FileOpener, FileSource, FrameSource, SourceOpener};
pub use playback::{
    DisplaySurface, PeriodicTask, PlaybackConfig, PlaybackState, Player, Snapshot, Status,
    TickOutcome,
};
