use super::client::TritonClient;
use crate::detector::{ClassNames, Detector, RawDetection};
use crate::error::AppError;
use crate::postprocess::coco_classes::COCO_CLASSES;
use crate::postprocess::detection::transform_detections;
use crate::preprocess::yolo::letterbox;
use async_trait::async_trait;
use image::RgbImage;
use std::time::Instant;
use tracing::debug;

/// COCO-trained YOLO served by Triton.
pub struct TritonDetector {
    client: TritonClient,
    input_size: u32,
    min_confidence: f32,
}

impl TritonDetector {
    pub fn new(client: TritonClient, input_size: u32, min_confidence: f32) -> Self {
        Self {
            client,
            input_size,
            min_confidence,
        }
    }
}

impl ClassNames for TritonDetector {
    fn class_name(&self, class_id: i32) -> &str {
        COCO_CLASSES[..].class_name(class_id)
    }
}

#[async_trait]
impl Detector for TritonDetector {
    async fn detect(&self, image: &RgbImage) -> Result<Vec<RawDetection>, AppError> {
        let start = Instant::now();

        let owned = image.clone();
        let input_size = self.input_size;
        let lb = tokio::task::spawn_blocking(move || letterbox(&owned, input_size)).await??;

        let yolo = self.client.infer_yolo(&lb.tensor, 1, self.input_size).await?;

        let num_dets = yolo.num_dets.first().copied().unwrap_or(0);
        let detections = transform_detections(
            num_dets,
            &yolo.boxes,
            &yolo.scores,
            &yolo.classes,
            &lb,
            self.min_confidence,
        );

        debug!(
            model = self.client.model_name(),
            num_dets,
            kept = detections.len(),
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Triton detection finished"
        );

        Ok(detections)
    }
}
