//! Detector boundary: raw detections and the trait backends implement.

use crate::error::AppError;
use async_trait::async_trait;
use image::RgbImage;
use serde::Serialize;

/// Pixel box, `x1 <= x2` and `y1 <= y2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoundingBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl BoundingBox {
    /// Build a box from two corners in any order.
    pub fn from_corners(xa: i32, ya: i32, xb: i32, yb: i32) -> Self {
        Self {
            x1: xa.min(xb),
            y1: ya.min(yb),
            x2: xa.max(xb),
            y2: ya.max(yb),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawDetection {
    pub class_id: i32,
    pub confidence: f32,
    pub bbox: BoundingBox,
}

/// Maps a detector class index to its label.
pub trait ClassNames {
    fn class_name(&self, class_id: i32) -> &str;
}

impl<T: AsRef<str>> ClassNames for [T] {
    fn class_name(&self, class_id: i32) -> &str {
        usize::try_from(class_id)
            .ok()
            .and_then(|idx| self.get(idx))
            .map(|name| name.as_ref())
            .unwrap_or("unknown")
    }
}

/// Black-box object detector.
#[async_trait]
pub trait Detector: ClassNames + Send + Sync {
    async fn detect(&self, image: &RgbImage) -> Result<Vec<RawDetection>, AppError>;
}
