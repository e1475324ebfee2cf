//! Local file frame source.
//!
//! `FileSource` dispatches a path to the decoder that can read it:
//! - `stub://...` URIs to the synthetic generator
//! - directories to the image-sequence reader
//! - `.mp4` / `.avi` / `.mov` files to FFmpeg (feature: ingest-file-ffmpeg)
//!
//! Only local paths are accepted; URL schemes other than `stub://` are refused.

use std::path::Path;

use anyhow::{anyhow, Result};

#[cfg(feature = "ingest-file-ffmpeg")]
use super::file_ffmpeg::FfmpegFileSource;
use super::sequence::ImageSequenceSource;
use super::synthetic::{SyntheticSource, STUB_SCHEME};
use super::{FrameSource, SourceOpener};
use crate::frame::Frame;

/// Video container extensions offered for loading, compared case-insensitively.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov"];

/// Local file frame source.
pub struct FileSource {
    backend: FileBackend,
}

enum FileBackend {
    Synthetic(SyntheticSource),
    Sequence(ImageSequenceSource),
    #[cfg(feature = "ingest-file-ffmpeg")]
    Ffmpeg(FfmpegFileSource),
}

impl FileSource {
    pub fn open(path: &str) -> Result<Self> {
        if !is_local_file_path(path) {
            return Err(anyhow!(
                "file ingestion only supports local paths (no URL schemes)"
            ));
        }
        if path.starts_with(STUB_SCHEME) {
            return Ok(Self {
                backend: FileBackend::Synthetic(SyntheticSource::open(path)?),
            });
        }

        let local = Path::new(path);
        if local.is_dir() {
            return Ok(Self {
                backend: FileBackend::Sequence(ImageSequenceSource::open(local)?),
            });
        }
        if !local.exists() {
            return Err(anyhow!("{} does not exist", path));
        }
        if !has_video_extension(local) {
            return Err(anyhow!(
                "{} is not a supported video file (expected one of {})",
                path,
                VIDEO_EXTENSIONS.join(", ")
            ));
        }

        #[cfg(feature = "ingest-file-ffmpeg")]
        {
            Ok(Self {
                backend: FileBackend::Ffmpeg(FfmpegFileSource::open(path)?),
            })
        }
        #[cfg(not(feature = "ingest-file-ffmpeg"))]
        {
            Err(anyhow!(
                "video file decoding requires the ingest-file-ffmpeg feature"
            ))
        }
    }

    fn inner(&self) -> &dyn FrameSource {
        match &self.backend {
            FileBackend::Synthetic(source) => source,
            FileBackend::Sequence(source) => source,
            #[cfg(feature = "ingest-file-ffmpeg")]
            FileBackend::Ffmpeg(source) => source,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn FrameSource {
        match &mut self.backend {
            FileBackend::Synthetic(source) => source,
            FileBackend::Sequence(source) => source,
            #[cfg(feature = "ingest-file-ffmpeg")]
            FileBackend::Ffmpeg(source) => source,
        }
    }
}

impl FrameSource for FileSource {
    fn describe(&self) -> &str {
        self.inner().describe()
    }

    fn seek(&mut self, index: u64) -> Result<()> {
        self.inner_mut().seek(index)
    }

    fn read(&mut self) -> Result<Option<Frame>> {
        self.inner_mut().read()
    }

    fn frame_count(&self) -> Option<u64> {
        self.inner().frame_count()
    }
}

/// Default opener used by the player binary.
#[derive(Clone, Copy, Debug, Default)]
pub struct FileOpener;

impl SourceOpener for FileOpener {
    fn open(&mut self, path: &str) -> Result<Box<dyn FrameSource>> {
        Ok(Box::new(FileSource::open(path)?))
    }
}

pub fn has_video_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            VIDEO_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

fn is_local_file_path(path: &str) -> bool {
    if path.trim().is_empty() {
        return false;
    }
    if path.starts_with(STUB_SCHEME) {
        return true;
    }
    !path.contains("://")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_remote_and_empty_paths() {
        assert!(FileSource::open("rtsp://camera/stream").is_err());
        assert!(FileSource::open("https://example.com/pitch.mp4").is_err());
        assert!(FileSource::open("   ").is_err());
    }

    #[test]
    fn video_extensions_are_case_insensitive() {
        assert!(has_video_extension(Path::new("/videos/pitch.MP4")));
        assert!(has_video_extension(Path::new("clip.mov")));
        assert!(has_video_extension(Path::new("clip.Avi")));
        assert!(!has_video_extension(Path::new("clip.mkv")));
        assert!(!has_video_extension(Path::new("clip")));
    }

    #[test]
    fn missing_file_fails_to_open() {
        assert!(FileSource::open("/nonexistent/pitch.mp4").is_err());
    }

    #[test]
    fn unsupported_extension_fails_to_open() {
        let file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        let path = file.path().to_string_lossy().into_owned();
        assert!(FileSource::open(&path).is_err());
    }

    #[test]
    fn opener_dispatches_stub_uris() {
        let mut source = FileOpener.open("stub://pitch?frames=3").unwrap();
        assert_eq!(source.describe(), "stub://pitch?frames=3");
        assert_eq!(source.frame_count(), Some(3));
        assert_eq!(source.read().unwrap().unwrap().index(), 0);
    }

    #[test]
    fn opener_dispatches_directories() {
        let dir = tempfile::tempdir().unwrap();
        image::RgbImage::new(4, 4)
            .save(dir.path().join("0.png"))
            .unwrap();
        let path = dir.path().to_string_lossy().into_owned();
        let source = FileOpener.open(&path).unwrap();
        assert_eq!(source.frame_count(), Some(1));
    }
}
