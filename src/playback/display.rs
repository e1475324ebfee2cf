//! Display surfaces.
//!
//! A surface has one image region and one status line. The player pushes the
//! annotated frame and a `Snapshot` after every advancing tick, and a snapshot
//! alone when playback finishes.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::RgbImage;

use super::Snapshot;

pub trait DisplaySurface {
    fn present(&mut self, image: Option<&RgbImage>, snapshot: &Snapshot) -> Result<()>;
}

/// Logs the status line whenever it changes.
#[derive(Debug, Default)]
pub struct LogDisplay {
    last_message: Option<&'static str>,
}

impl LogDisplay {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DisplaySurface for LogDisplay {
    fn present(&mut self, image: Option<&RgbImage>, snapshot: &Snapshot) -> Result<()> {
        let message = snapshot.message();
        if self.last_message != Some(message) {
            log::info!(
                "[{} frame {}] {}",
                snapshot.state.as_str(),
                snapshot.frame_index,
                message
            );
            self.last_message = Some(message);
        }
        if let Some(image) = image {
            log::debug!(
                "frame {}: {}x{}, {} detection(s)",
                snapshot.frame_index,
                image.width(),
                image.height(),
                snapshot.detections.len()
            );
        }
        Ok(())
    }
}

/// Writes every presented frame as a PNG and logs the status line.
pub struct SnapshotDisplay {
    dir: PathBuf,
    log: LogDisplay,
    written: u64,
}

impl SnapshotDisplay {
    pub fn new(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("create snapshot directory {}", dir.display()))?;
        Ok(Self {
            dir: dir.to_path_buf(),
            log: LogDisplay::new(),
            written: 0,
        })
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn frame_path(&self, frame_index: u64) -> PathBuf {
        self.dir.join(format!("frame_{:06}.png", frame_index))
    }
}

impl DisplaySurface for SnapshotDisplay {
    fn present(&mut self, image: Option<&RgbImage>, snapshot: &Snapshot) -> Result<()> {
        if let Some(image) = image {
            let path = self.frame_path(snapshot.frame_index);
            image
                .save(&path)
                .with_context(|| format!("write snapshot {}", path.display()))?;
            self.written += 1;
        }
        self.log.present(image, snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::{PlaybackState, Status};

    fn snapshot(frame_index: u64, status: Option<Status>) -> Snapshot {
        Snapshot {
            state: PlaybackState::Playing,
            frame_index,
            source: Some("stub://t".to_string()),
            status,
            detections: Vec::new(),
        }
    }

    #[test]
    fn snapshot_display_writes_numbered_pngs() {
        let dir = tempfile::tempdir().unwrap();
        let mut display = SnapshotDisplay::new(&dir.path().join("out")).unwrap();
        let image = RgbImage::new(4, 4);

        display
            .present(Some(&image), &snapshot(3, Some(Status::NotDetected)))
            .unwrap();
        display
            .present(None, &snapshot(4, Some(Status::Finished)))
            .unwrap();

        assert_eq!(display.written(), 1);
        assert!(dir.path().join("out/frame_000003.png").is_file());
    }

    #[test]
    fn log_display_accepts_status_only_updates() {
        let mut display = LogDisplay::new();
        display.present(None, &snapshot(0, None)).unwrap();
        display
            .present(None, &snapshot(0, Some(Status::Finished)))
            .unwrap();
        assert_eq!(display.last_message, Some(Status::Finished.message()));
    }
}
