use image::{Rgb, RgbImage};

use pitch_detector::detect::{DetectorBackend, MotionBackend, MotionConfig};
use pitch_detector::Frame;

const WIDTH: u32 = 160;
const HEIGHT: u32 = 120;

fn frame_with_rect(index: u64, x: u32, y: u32, w: u32, h: u32) -> Frame {
    let mut image = RgbImage::new(WIDTH, HEIGHT);
    for py in y..y + h {
        for px in x..x + w {
            image.put_pixel(px, py, Rgb([255, 255, 255]));
        }
    }
    Frame::new(index, image)
}

/// Run two frames where a `w`x`h` block jumps between far-apart positions.
fn detect_jump(w: u32, h: u32) -> pitch_detector::DetectionResult {
    let mut backend = MotionBackend::new(MotionConfig::default());
    let first = backend
        .detect(&frame_with_rect(0, 20, 20, w, h))
        .expect("first frame");
    assert!(!first.is_detected());
    backend
        .detect(&frame_with_rect(1, 100, 70, w, h))
        .expect("second frame")
}

#[test]
fn ball_sized_square_is_detected() {
    let result = detect_jump(20, 20);
    assert!(result.is_detected());
    for detection in &result.detections {
        let ratio = detection.rect.aspect_ratio();
        assert!((0.8..=1.2).contains(&ratio));
        assert!((200..=1500).contains(&detection.rect.area()));
        assert_eq!(detection.score, None);
    }
}

#[test]
fn detected_region_covers_new_position() {
    let result = detect_jump(20, 20);
    assert!(result
        .rects()
        .iter()
        .any(|r| r.x <= 100 && r.y <= 70 && r.x + r.width as i32 >= 120 && r.y + r.height as i32 >= 90));
}

#[test]
fn tiny_blob_is_ignored() {
    assert!(!detect_jump(7, 7).is_detected());
}

#[test]
fn elongated_blob_is_ignored() {
    assert!(!detect_jump(28, 14).is_detected());
}

#[test]
fn oversized_blob_is_ignored() {
    assert!(!detect_jump(40, 40).is_detected());
}

#[test]
fn baseline_follows_every_frame() {
    let mut backend = MotionBackend::default();
    backend.detect(&frame_with_rect(0, 20, 20, 20, 20)).unwrap();
    assert!(backend
        .detect(&frame_with_rect(1, 100, 70, 20, 20))
        .unwrap()
        .is_detected());
    // Same position as the previous frame: nothing moved.
    assert!(!backend
        .detect(&frame_with_rect(2, 100, 70, 20, 20))
        .unwrap()
        .is_detected());
}

fn detect_move(from: (u32, u32), to: (u32, u32)) -> pitch_detector::DetectionResult {
    let mut backend = MotionBackend::default();
    backend
        .detect(&frame_with_rect(0, from.0, from.1, 20, 20))
        .unwrap();
    backend
        .detect(&frame_with_rect(1, to.0, to.1, 20, 20))
        .unwrap()
}

#[test]
fn square_leaving_left_edge_is_detected() {
    let result = detect_move((0, 50), (70, 50));
    assert_eq!(result.detections.len(), 2);
    let rects = result.rects();
    assert!(rects.iter().any(|r| r.x == 0));
    assert!(rects.iter().any(|r| r.x > 60 && r.x < 70));
}

#[test]
fn squares_on_every_edge_are_detected() {
    for from in [(0, 50), (70, 0), (WIDTH - 20, 50), (70, HEIGHT - 20)] {
        let result = detect_move(from, (60, 45));
        assert!(
            result.is_detected(),
            "square starting at {:?} was missed",
            from
        );
        for rect in result.rects() {
            assert!(rect.x >= 0 && rect.y >= 0);
            assert!(rect.x + rect.width as i32 <= WIDTH as i32);
            assert!(rect.y + rect.height as i32 <= HEIGHT as i32);
        }
    }
}
