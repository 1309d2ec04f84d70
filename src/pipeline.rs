//! One upload, end to end: store, decode, detect, aggregate, store result.

use crate::calorie::{AnnotatedDetection, FoodAnalyzer};
use crate::detector::Detector;
use crate::error::AppError;
use crate::preprocess::decode::decode_image;
use crate::storage::ImageStore;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

/// An uploaded file as received from the form.
pub struct Upload {
    pub filename: String,
    pub data: Vec<u8>,
}

/// Everything the result view needs for one image.
#[derive(Debug, Clone, Serialize)]
pub struct RequestResult {
    pub detections: Vec<AnnotatedDetection>,
    pub total_calories: u64,
    pub original_image_url: String,
    pub result_image_url: String,
}

pub struct Pipeline {
    detector: Arc<dyn Detector>,
    analyzer: Arc<FoodAnalyzer>,
    store: ImageStore,
    detect_timeout: Duration,
}

impl Pipeline {
    pub fn new(
        detector: Arc<dyn Detector>,
        analyzer: FoodAnalyzer,
        store: ImageStore,
        detect_timeout: Duration,
    ) -> Self {
        Self {
            detector,
            analyzer: Arc::new(analyzer),
            store,
            detect_timeout,
        }
    }

    pub async fn analyze(&self, upload: Upload) -> Result<RequestResult, AppError> {
        let start = Instant::now();

        let original = self.store.save_upload(&upload.filename, &upload.data).await?;

        let data = upload.data;
        let mut image = tokio::task::spawn_blocking(move || decode_image(&data))
            .await?
            .map_err(AppError::ImageDecode)?;

        let raw = tokio::time::timeout(self.detect_timeout, self.detector.detect(&image))
            .await
            .map_err(|_| {
                AppError::Detector(format!(
                    "Detection timed out after {}s",
                    self.detect_timeout.as_secs_f64()
                ))
            })??;
        let raw_count = raw.len();

        let analyzer = Arc::clone(&self.analyzer);
        let detector = Arc::clone(&self.detector);
        let store = self.store.clone();
        let stored = original.clone();
        let (aggregation, result) = tokio::task::spawn_blocking(move || {
            let aggregation = analyzer.aggregate(&raw, &*detector, &mut image);
            let result = store.save_result(&stored, &image)?;
            Ok::<_, AppError>((aggregation, result))
        })
        .await??;

        info!(
            file = %original.filename,
            raw = raw_count,
            food = aggregation.detections.len(),
            total_calories = aggregation.total_calories,
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Analyzed upload"
        );

        Ok(RequestResult {
            detections: aggregation.detections,
            total_calories: aggregation.total_calories,
            original_image_url: original.url,
            result_image_url: result.url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::{BoundingBox, ClassNames, RawDetection};
    use crate::postprocess::coco_classes::COCO_CLASSES;
    use async_trait::async_trait;
    use image::{ImageFormat, RgbImage};
    use std::io::Cursor;
    use std::path::PathBuf;

    enum Behavior {
        Return(Vec<RawDetection>),
        Fail,
        Hang,
    }

    struct StubDetector(Behavior);

    impl ClassNames for StubDetector {
        fn class_name(&self, class_id: i32) -> &str {
            COCO_CLASSES[..].class_name(class_id)
        }
    }

    #[async_trait]
    impl Detector for StubDetector {
        async fn detect(&self, _image: &RgbImage) -> Result<Vec<RawDetection>, AppError> {
            match &self.0 {
                Behavior::Return(dets) => Ok(dets.clone()),
                Behavior::Fail => Err(AppError::Detector("model exploded".to_string())),
                Behavior::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(Vec::new())
                }
            }
        }
    }

    fn pipeline(behavior: Behavior) -> (Pipeline, PathBuf) {
        let dir = std::env::temp_dir().join(format!("calorie-lens-pipeline-{}", uuid::Uuid::new_v4()));
        let store = ImageStore::open(&dir, "/static").unwrap();
        let pipeline = Pipeline::new(
            Arc::new(StubDetector(behavior)),
            FoodAnalyzer::default(),
            store,
            Duration::from_millis(200),
        );
        (pipeline, dir)
    }

    fn png_upload() -> Upload {
        let mut data = Vec::new();
        RgbImage::new(64, 48)
            .write_to(&mut Cursor::new(&mut data), ImageFormat::Png)
            .unwrap();
        Upload {
            filename: "dinner.png".to_string(),
            data,
        }
    }

    #[tokio::test]
    async fn produces_totals_and_both_images() {
        let dets = vec![
            RawDetection {
                class_id: 55, // cake
                confidence: 0.7,
                bbox: BoundingBox { x1: 2, y1: 2, x2: 30, y2: 30 },
            },
            RawDetection {
                class_id: 41, // cup, ignored
                confidence: 0.9,
                bbox: BoundingBox { x1: 32, y1: 2, x2: 60, y2: 40 },
            },
        ];
        let (pipeline, dir) = pipeline(Behavior::Return(dets));

        let result = pipeline.analyze(png_upload()).await.unwrap();

        assert_eq!(result.total_calories, 350);
        assert_eq!(result.detections.len(), 1);
        assert!(result.original_image_url.starts_with("/static/uploads/"));
        assert!(result.original_image_url.ends_with(".png"));
        let stored = result.original_image_url.trim_start_matches("/static/uploads/");
        assert_eq!(result.result_image_url, format!("/static/results/result_{stored}"));
        assert!(dir.join("results").join(format!("result_{stored}")).exists());

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[tokio::test]
    async fn undecodable_upload_is_a_decode_error() {
        let (pipeline, dir) = pipeline(Behavior::Return(Vec::new()));
        let upload = Upload {
            filename: "notes.jpg".to_string(),
            data: b"plain text".to_vec(),
        };

        let err = pipeline.analyze(upload).await.unwrap_err();

        assert!(matches!(err, AppError::ImageDecode(_)));
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[tokio::test]
    async fn detector_failure_and_timeout_end_the_request() {
        let (failing, dir_a) = pipeline(Behavior::Fail);
        assert!(matches!(
            failing.analyze(png_upload()).await,
            Err(AppError::Detector(_))
        ));

        let (hanging, dir_b) = pipeline(Behavior::Hang);
        let err = hanging.analyze(png_upload()).await.unwrap_err();
        assert!(err.to_string().contains("timed out"));

        std::fs::remove_dir_all(dir_a).unwrap();
        std::fs::remove_dir_all(dir_b).unwrap();
    }
}
