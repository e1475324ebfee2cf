/// Axis-aligned box in frame pixel coordinates (top-left origin).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoundingRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl BoundingRect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// width / height. Zero-height rectangles report `f32::INFINITY`.
    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0 {
            return f32::INFINITY;
        }
        self.width as f32 / self.height as f32
    }

    /// Intersection over union with another rectangle.
    pub fn iou(&self, other: &BoundingRect) -> f32 {
        let left = self.x.max(other.x) as i64;
        let top = self.y.max(other.y) as i64;
        let right = (self.x as i64 + self.width as i64).min(other.x as i64 + other.width as i64);
        let bottom =
            (self.y as i64 + self.height as i64).min(other.y as i64 + other.height as i64);

        let inter = (right - left).max(0) * (bottom - top).max(0);
        if inter == 0 {
            return 0.0;
        }
        let union = self.area() as i64 + other.area() as i64 - inter;
        if union <= 0 {
            return 0.0;
        }
        inter as f32 / union as f32
    }
}

/// One candidate region found in a frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    pub rect: BoundingRect,
    /// Class name (model strategy) or heuristic classification (motion strategy).
    pub label: String,
    /// Detector confidence, when the strategy produces one.
    pub score: Option<f32>,
}

/// Result of running detection on a single frame. Recomputed every tick.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DetectionResult {
    /// Regions that passed every filter of the active strategy.
    pub detections: Vec<Detection>,
}

impl DetectionResult {
    pub fn is_detected(&self) -> bool {
        !self.detections.is_empty()
    }

    pub fn rects(&self) -> Vec<BoundingRect> {
        self.detections.iter().map(|d| d.rect).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iou_of_identical_rects_is_one() {
        let a = BoundingRect::new(10, 10, 20, 20);
        assert!((a.iou(&a) - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn iou_of_disjoint_rects_is_zero() {
        let a = BoundingRect::new(0, 0, 10, 10);
        let b = BoundingRect::new(20, 20, 10, 10);
        assert_eq!(a.iou(&b), 0.0);
    }

    #[test]
    fn iou_of_half_overlap() {
        let a = BoundingRect::new(0, 0, 10, 10);
        let b = BoundingRect::new(5, 0, 10, 10);
        // 50 / (100 + 100 - 50)
        assert!((a.iou(&b) - 1.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn aspect_ratio_handles_zero_height() {
        assert_eq!(BoundingRect::new(0, 0, 4, 0).aspect_ratio(), f32::INFINITY);
        assert_eq!(BoundingRect::new(0, 0, 4, 2).aspect_ratio(), 2.0);
    }
}
