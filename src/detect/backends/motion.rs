use anyhow::{anyhow, Result};
use image::imageops::replace;
use image::{GrayImage, Luma};
use imageproc::contours::{find_contours, BorderType};
use imageproc::distance_transform::Norm;
use imageproc::filter::box_filter;
use imageproc::morphology::dilate;
use imageproc::point::Point;

use crate::detect::backend::{DetectorBackend, Strategy};
use crate::detect::result::{BoundingRect, Detection, DetectionResult};
use crate::frame::Frame;

/// Label attached to regions found by frame differencing.
pub const MOTION_LABEL: &str = "moving object";

/// Tunables for the frame-differencing heuristic.
#[derive(Clone, Debug, PartialEq)]
pub struct MotionConfig {
    /// Box blur radius applied to the grayscale frame (0 disables).
    pub blur_radius: u32,
    /// A pixel is "moving" when its blurred difference is strictly above this.
    pub diff_threshold: u8,
    /// Dilation passes with a 3x3 kernel.
    pub dilate_iterations: u8,
    /// Contours with a smaller polygon area are discarded before the shape filter.
    pub min_contour_area: f64,
    pub min_aspect_ratio: f32,
    pub max_aspect_ratio: f32,
    pub min_rect_area: u64,
    pub max_rect_area: u64,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            blur_radius: 1,
            diff_threshold: 30,
            dilate_iterations: 2,
            min_contour_area: 100.0,
            min_aspect_ratio: 0.8,
            max_aspect_ratio: 1.2,
            min_rect_area: 200,
            max_rect_area: 1500,
        }
    }
}

impl MotionConfig {
    /// Ball-shaped: roughly square and within the size band.
    pub fn accepts(&self, rect: &BoundingRect) -> bool {
        let ratio = rect.aspect_ratio();
        let area = rect.area();
        ratio >= self.min_aspect_ratio
            && ratio <= self.max_aspect_ratio
            && area >= self.min_rect_area
            && area <= self.max_rect_area
    }
}

/// Motion heuristic backend.
///
/// Keeps the previous blurred grayscale frame as its baseline. The first frame
/// after construction or `reset` only primes the baseline and never reports a
/// detection.
#[derive(Default)]
pub struct MotionBackend {
    config: MotionConfig,
    baseline: Option<GrayImage>,
}

impl MotionBackend {
    pub fn new(config: MotionConfig) -> Self {
        Self {
            config,
            baseline: None,
        }
    }

    pub fn config(&self) -> &MotionConfig {
        &self.config
    }

    pub fn has_baseline(&self) -> bool {
        self.baseline.is_some()
    }

    fn prepare(&self, frame: &Frame) -> GrayImage {
        let gray = frame.to_luma();
        if self.config.blur_radius == 0 {
            return gray;
        }
        box_filter(&gray, self.config.blur_radius, self.config.blur_radius)
    }

    fn compare(&self, previous: &GrayImage, current: &GrayImage) -> Vec<Detection> {
        let mut mask = motion_mask(previous, current, self.config.diff_threshold);
        if self.config.dilate_iterations > 0 {
            mask = dilate(&mask, Norm::LInf, self.config.dilate_iterations);
        }

        // Contours are traced on a zero-bordered copy so blobs touching the
        // frame edge still come back as outer contours.
        find_contours::<i32>(&pad_mask(&mask))
            .into_iter()
            .filter(|contour| contour.border_type == BorderType::Outer && contour.parent.is_none())
            .filter(|contour| contour_area(&contour.points) >= self.config.min_contour_area)
            .filter_map(|contour| bounding_rect(&contour.points))
            .map(|rect| {
                BoundingRect::new(
                    rect.x - MASK_PADDING,
                    rect.y - MASK_PADDING,
                    rect.width,
                    rect.height,
                )
            })
            .filter(|rect| self.config.accepts(rect))
            .map(|rect| Detection {
                rect,
                label: MOTION_LABEL.to_string(),
                score: None,
            })
            .collect()
    }
}

impl DetectorBackend for MotionBackend {
    fn name(&self) -> &'static str {
        "motion"
    }

    fn strategy(&self) -> Strategy {
        Strategy::Motion
    }

    fn detect(&mut self, frame: &Frame) -> Result<DetectionResult> {
        let current = self.prepare(frame);

        let detections = match self.baseline.as_ref() {
            None => Vec::new(),
            Some(previous) if previous.dimensions() != current.dimensions() => {
                return Err(anyhow!(
                    "frame {} is {}x{} but the baseline is {}x{}",
                    frame.index(),
                    current.width(),
                    current.height(),
                    previous.width(),
                    previous.height()
                ));
            }
            Some(previous) => self.compare(previous, &current),
        };

        self.baseline = Some(current);
        Ok(DetectionResult { detections })
    }

    fn reset(&mut self) {
        self.baseline = None;
    }
}

/// Binary mask of pixels whose absolute difference exceeds `threshold`.
fn motion_mask(previous: &GrayImage, current: &GrayImage, threshold: u8) -> GrayImage {
    GrayImage::from_fn(current.width(), current.height(), |x, y| {
        let diff = previous.get_pixel(x, y).0[0].abs_diff(current.get_pixel(x, y).0[0]);
        if diff > threshold {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

const MASK_PADDING: i32 = 1;

/// Copy `mask` into a frame one pixel larger on every side, filled with background.
fn pad_mask(mask: &GrayImage) -> GrayImage {
    let pad = MASK_PADDING as u32;
    let mut padded = GrayImage::new(mask.width() + 2 * pad, mask.height() + 2 * pad);
    replace(&mut padded, mask, i64::from(MASK_PADDING), i64::from(MASK_PADDING));
    padded
}

/// Shoelace area of a closed contour polygon.
fn contour_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice_area = 0i64;
    for (i, p) in points.iter().enumerate() {
        let q = &points[(i + 1) % points.len()];
        twice_area += p.x as i64 * q.y as i64 - q.x as i64 * p.y as i64;
    }
    (twice_area.abs() as f64) / 2.0
}

/// Inclusive pixel bounds of a contour.
fn bounding_rect(points: &[Point<i32>]) -> Option<BoundingRect> {
    let first = points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    Some(BoundingRect::new(
        min_x,
        min_y,
        (max_x - min_x + 1) as u32,
        (max_y - min_y + 1) as u32,
    ))
}
