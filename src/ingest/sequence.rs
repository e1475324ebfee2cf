//! Directory-of-stills source.
//!
//! Every file with an image extension in the directory is one frame, played in
//! lexical file-name order. Frames are decoded lazily on `read`.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};

use super::FrameSource;
use crate::frame::Frame;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

pub struct ImageSequenceSource {
    path: String,
    frames: Vec<PathBuf>,
    position: usize,
}

impl ImageSequenceSource {
    pub fn open(dir: &Path) -> Result<Self> {
        let entries = std::fs::read_dir(dir)
            .with_context(|| format!("read image directory {}", dir.display()))?;

        let mut frames = Vec::new();
        for entry in entries {
            let path = entry
                .with_context(|| format!("list image directory {}", dir.display()))?
                .path();
            if path.is_file() && is_image_path(&path) {
                frames.push(path);
            }
        }
        if frames.is_empty() {
            return Err(anyhow!("{} contains no images", dir.display()));
        }
        frames.sort();

        log::info!(
            "image sequence {}: {} frames",
            dir.display(),
            frames.len()
        );
        Ok(Self {
            path: dir.display().to_string(),
            frames,
            position: 0,
        })
    }
}

impl FrameSource for ImageSequenceSource {
    fn describe(&self) -> &str {
        &self.path
    }

    fn seek(&mut self, index: u64) -> Result<()> {
        self.position = usize::try_from(index).unwrap_or(usize::MAX);
        Ok(())
    }

    fn read(&mut self) -> Result<Option<Frame>> {
        let Some(path) = self.frames.get(self.position) else {
            return Ok(None);
        };
        let image = image::open(path)
            .with_context(|| format!("decode {}", path.display()))?
            .to_rgb8();
        let frame = Frame::new(self.position as u64, image);
        self.position += 1;
        Ok(Some(frame))
    }

    fn frame_count(&self) -> Option<u64> {
        Some(self.frames.len() as u64)
    }
}

fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn write_png(dir: &Path, name: &str, level: u8) {
        RgbImage::from_pixel(8, 6, Rgb([level, level, level]))
            .save(dir.join(name))
            .expect("write png");
    }

    #[test]
    fn plays_images_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        write_png(dir.path(), "002.png", 20);
        write_png(dir.path(), "001.png", 10);
        std::fs::write(dir.path().join("notes.txt"), "skip me").unwrap();

        let mut source = ImageSequenceSource::open(dir.path()).unwrap();
        assert_eq!(source.frame_count(), Some(2));
        let first = source.read().unwrap().unwrap();
        assert_eq!(first.index(), 0);
        assert_eq!(first.image().get_pixel(0, 0).0, [10, 10, 10]);
        assert_eq!(source.read().unwrap().unwrap().index(), 1);
        assert!(source.read().unwrap().is_none());
    }

    #[test]
    fn empty_directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ImageSequenceSource::open(dir.path()).is_err());
    }

    #[test]
    fn corrupt_image_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        write_png(dir.path(), "000.png", 10);
        std::fs::write(dir.path().join("001.png"), b"not a png").unwrap();

        let mut source = ImageSequenceSource::open(dir.path()).unwrap();
        assert!(source.read().unwrap().is_some());
        assert!(source.read().is_err());
    }
}
