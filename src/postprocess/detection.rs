//! Detection coordinate transformation (inverse letterbox).

use crate::detector::{BoundingBox, RawDetection};
use crate::preprocess::yolo::LetterboxResult;

/// Transform End2End YOLO outputs from letterbox space to integer pixel
/// boxes on the original image.
///
/// Boxes may come back normalized to the letterboxed input [0,1] or already
/// in letterbox pixels; both are handled. Results are clipped to the image
/// and detections under `min_confidence` are dropped. Detector order is kept.
pub fn transform_detections(
    num_dets: i32,
    boxes: &[f32],   // [max_dets, 4] flattened
    scores: &[f32],  // [max_dets]
    classes: &[i32], // [max_dets]
    letterbox: &LetterboxResult,
    min_confidence: f32,
) -> Vec<RawDetection> {
    let count = (num_dets.max(0) as usize)
        .min(boxes.len() / 4)
        .min(scores.len())
        .min(classes.len());

    if count == 0 {
        return Vec::new();
    }

    // If max value > 1.0, boxes are already in pixel coords
    let max_coord = boxes
        .iter()
        .take(count * 4)
        .copied()
        .fold(f32::NEG_INFINITY, f32::max);
    let is_pixel_coords = max_coord > 1.0;
    let input_size = letterbox.input_size as f64;
    let (orig_w, orig_h) = (letterbox.orig_w as f64, letterbox.orig_h as f64);

    let to_pixel = |v: f32, pad: f64, limit: f64| -> i32 {
        let mut v = v as f64;
        if !is_pixel_coords {
            v *= input_size;
        }
        ((v - pad) / letterbox.scale).clamp(0.0, limit) as i32
    };

    let mut detections = Vec::with_capacity(count);
    for i in 0..count {
        let score = scores[i];
        if score < min_confidence {
            continue;
        }

        let b = &boxes[i * 4..i * 4 + 4];
        let x1 = to_pixel(b[0], letterbox.pad_w, orig_w);
        let y1 = to_pixel(b[1], letterbox.pad_h, orig_h);
        let x2 = to_pixel(b[2], letterbox.pad_w, orig_w);
        let y2 = to_pixel(b[3], letterbox.pad_h, orig_h);

        detections.push(RawDetection {
            class_id: classes[i],
            confidence: score,
            bbox: BoundingBox::from_corners(x1, y1, x2, y2),
        });
    }

    detections
}
