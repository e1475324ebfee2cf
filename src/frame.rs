//! Decoded video frames.
//!
//! - `Frame`: one decoded RGB still, tagged with its position in the source.
//! - `annotate`: draws detection rectangles onto an image before it is published.
//!
//! Frames are transient. A source hands one to the player per tick, the detector
//! reads it, and the annotated copy goes to the display surface.

use anyhow::{anyhow, Result};
use image::{GrayImage, Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::detect::BoundingRect;

/// Box colour for positive detections.
pub const ANNOTATION_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

/// Box outline thickness in pixels.
pub const ANNOTATION_THICKNESS: u32 = 2;

/// One decoded still image from a video source.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    index: u64,
    image: RgbImage,
}

impl Frame {
    pub fn new(index: u64, image: RgbImage) -> Self {
        Self { index, image }
    }

    /// Wrap a packed RGB24 buffer. Fails when the length does not match the dimensions.
    pub fn from_rgb_bytes(index: u64, pixels: Vec<u8>, width: u32, height: u32) -> Result<Self> {
        let expected_len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(3))
            .ok_or_else(|| anyhow!("frame dimensions overflow"))?;

        if pixels.len() != expected_len {
            return Err(anyhow!(
                "expected {} RGB bytes for {}x{}, received {}",
                expected_len,
                width,
                height,
                pixels.len()
            ));
        }

        let image = RgbImage::from_raw(width, height, pixels)
            .ok_or_else(|| anyhow!("frame buffer rejected for {}x{}", width, height))?;
        Ok(Self { index, image })
    }

    /// Position of this frame in its source (0-based).
    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn into_image(self) -> RgbImage {
        self.image
    }

    /// Luma conversion used by the motion heuristic.
    pub fn to_luma(&self) -> GrayImage {
        image::imageops::grayscale(&self.image)
    }
}

/// Draw a hollow rectangle for each region. Degenerate rectangles are skipped.
pub fn annotate(image: &mut RgbImage, rects: &[BoundingRect]) {
    for rect in rects {
        for inset in 0..ANNOTATION_THICKNESS {
            let width = rect.width.saturating_sub(2 * inset);
            let height = rect.height.saturating_sub(2 * inset);
            if width == 0 || height == 0 {
                break;
            }
            let outline = Rect::at(rect.x + inset as i32, rect.y + inset as i32).of_size(width, height);
            draw_hollow_rect_mut(image, outline, ANNOTATION_COLOR);
        }
    }
}
