//! Frame sources.
//!
//! This module provides the sources the player can load:
//! - Local video files (feature: ingest-file-ffmpeg)
//! - Directories of still images, played in file-name order
//! - Synthetic `stub://` sources (testing and demos)
//!
//! Every source is seekable by frame index and hands out one `Frame` per read.
//! A source is owned by exactly one player and released (dropped) when it is
//! exhausted or replaced by a new load.

use anyhow::Result;

use crate::frame::Frame;

pub mod file;
#[cfg(feature = "ingest-file-ffmpeg")]
pub(crate) mod file_ffmpeg;
pub mod sequence;
pub mod synthetic;

pub use file::{FileOpener, FileSource};
pub use sequence::ImageSequenceSource;
pub use synthetic::{SyntheticConfig, SyntheticSource};

/// Seekable sequence of decoded frames.
pub trait FrameSource {
    /// Path or URI this source was opened from.
    fn describe(&self) -> &str;

    /// Position the source so the next `read` returns frame `index`.
    fn seek(&mut self, index: u64) -> Result<()>;

    /// Read the next frame. `Ok(None)` marks end of stream.
    fn read(&mut self) -> Result<Option<Frame>>;

    /// Total decodable frames, when the container reports it.
    fn frame_count(&self) -> Option<u64> {
        None
    }
}

/// Opens a path as a frame source.
///
/// The player goes through this seam so tests and alternative decoders can
/// stand in for the file opener.
pub trait SourceOpener {
    fn open(&mut self, path: &str) -> Result<Box<dyn FrameSource>>;
}
