use std::cmp::Ordering;

use anyhow::Result;

use crate::detect::assets::ClassNames;
use crate::detect::backend::{DetectorBackend, Strategy};
use crate::detect::result::{BoundingRect, Detection, DetectionResult};
use crate::frame::Frame;

pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.5;
pub const DEFAULT_NMS_THRESHOLD: f32 = 0.4;
pub const DEFAULT_TARGET_CLASS: &str = "sports ball";

/// Unfiltered network output for one object.
#[derive(Clone, Debug, PartialEq)]
pub struct RawDetection {
    pub class_id: usize,
    pub confidence: f32,
    pub rect: BoundingRect,
}

/// Opaque pretrained multi-class detector.
///
/// Implementations return every candidate the network produces, in network
/// order. Thresholding, suppression and class matching happen in `ModelBackend`.
pub trait ObjectNetwork {
    fn name(&self) -> &'static str;

    fn infer(&mut self, frame: &Frame) -> Result<Vec<RawDetection>>;
}

/// Post-processing parameters for the model strategy.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelConfig {
    /// Detections must score strictly above this to be kept.
    pub confidence_threshold: f32,
    /// Overlap above which the lower-scoring box is suppressed.
    pub nms_threshold: f32,
    /// Exact class label to report.
    pub target_class: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            nms_threshold: DEFAULT_NMS_THRESHOLD,
            target_class: DEFAULT_TARGET_CLASS.to_string(),
        }
    }
}

/// Model-based strategy: confidence filter, class-agnostic NMS, then the first
/// surviving detection of the target class in network order.
pub struct ModelBackend {
    network: Box<dyn ObjectNetwork>,
    classes: ClassNames,
    config: ModelConfig,
}

impl ModelBackend {
    pub fn new(network: Box<dyn ObjectNetwork>, classes: ClassNames, config: ModelConfig) -> Self {
        if classes.position(&config.target_class).is_none() {
            log::warn!(
                "target class '{}' is not in the class list; nothing will be reported",
                config.target_class
            );
        }
        Self {
            network,
            classes,
            config,
        }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Apply thresholding, suppression and class matching to raw network output.
    pub fn filter(&self, raw: Vec<RawDetection>) -> DetectionResult {
        let kept: Vec<RawDetection> = raw
            .into_iter()
            .filter(|d| d.confidence > self.config.confidence_threshold)
            .collect();

        let survivors = non_max_suppression(&kept, self.config.nms_threshold);

        let first_match = survivors
            .into_iter()
            .map(|i| &kept[i])
            .find(|d| self.classes.get(d.class_id) == Some(self.config.target_class.as_str()));

        DetectionResult {
            detections: first_match
                .map(|d| Detection {
                    rect: d.rect,
                    label: self.config.target_class.clone(),
                    score: Some(d.confidence),
                })
                .into_iter()
                .collect(),
        }
    }
}

impl DetectorBackend for ModelBackend {
    fn name(&self) -> &'static str {
        self.network.name()
    }

    fn strategy(&self) -> Strategy {
        Strategy::Model
    }

    fn detect(&mut self, frame: &Frame) -> Result<DetectionResult> {
        let raw = self.network.infer(frame)?;
        log::debug!("frame {}: {} raw detections", frame.index(), raw.len());
        Ok(self.filter(raw))
    }
}

/// Greedy non-maximum suppression.
///
/// Boxes are visited by descending confidence; a box is dropped when its IoU
/// with an already-kept box exceeds `iou_threshold`. Returns the indices of the
/// kept boxes in ascending (input) order.
pub fn non_max_suppression(detections: &[RawDetection], iou_threshold: f32) -> Vec<usize> {
    let mut order: Vec<usize> = (0..detections.len()).collect();
    order.sort_by(|&a, &b| {
        detections[b]
            .confidence
            .partial_cmp(&detections[a].confidence)
            .unwrap_or(Ordering::Equal)
    });

    let mut kept: Vec<usize> = Vec::new();
    for index in order {
        let rect = &detections[index].rect;
        if kept
            .iter()
            .all(|&k| detections[k].rect.iou(rect) <= iou_threshold)
        {
            kept.push(index);
        }
    }
    kept.sort_unstable();
    kept
}

/// Decode YOLO-style rows `[cx, cy, w, h, objectness, class scores...]`.
///
/// Coordinates are normalised to the frame. The class is the argmax of the
/// class scores and its score is the confidence. Rows too short to carry a
/// class score are skipped.
pub fn decode_rows<'a>(
    rows: impl IntoIterator<Item = &'a [f32]>,
    frame_width: u32,
    frame_height: u32,
) -> Vec<RawDetection> {
    let fw = frame_width as f32;
    let fh = frame_height as f32;

    rows.into_iter()
        .filter(|row| row.len() > 5)
        .filter_map(|row| {
            let (class_id, confidence) = row[5..]
                .iter()
                .copied()
                .enumerate()
                .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal))?;

            let center_x = (row[0] * fw) as i32;
            let center_y = (row[1] * fh) as i32;
            let width = (row[2] * fw) as i32;
            let height = (row[3] * fh) as i32;
            let x = (center_x as f32 - width as f32 / 2.0) as i32;
            let y = (center_y as f32 - height as f32 / 2.0) as i32;

            Some(RawDetection {
                class_id,
                confidence,
                rect: BoundingRect::new(x, y, width.max(0) as u32, height.max(0) as u32),
            })
        })
        .collect()
}
