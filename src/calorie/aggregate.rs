//! Detection filtering, calorie totals and result-image annotation.

use super::classifier::LabelClassifier;
use super::estimator::CalorieEstimator;
use crate::detector::{BoundingBox, ClassNames, RawDetection};
use crate::postprocess::annotate::Annotator;
use image::RgbImage;
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotatedDetection {
    pub label: String,
    pub confidence: f32,
    #[serde(rename = "box")]
    pub bbox: BoundingBox,
    pub calories: u32,
}

/// Surviving detections of one image, in detector order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Aggregation {
    pub detections: Vec<AnnotatedDetection>,
    /// Widened so large per-item table values cannot overflow the sum.
    pub total_calories: u64,
}

impl Aggregation {
    fn push(&mut self, detection: AnnotatedDetection) {
        self.total_calories += u64::from(detection.calories);
        self.detections.push(detection);
    }
}

pub struct FoodAnalyzer {
    classifier: LabelClassifier,
    estimator: CalorieEstimator,
    annotator: Annotator,
}

impl FoodAnalyzer {
    pub fn new(classifier: LabelClassifier, estimator: CalorieEstimator, annotator: Annotator) -> Self {
        Self {
            classifier,
            estimator,
            annotator,
        }
    }

    /// Filter raw detections to food, estimate calories and draw every
    /// survivor onto `image`. With no survivors the image is left untouched.
    pub fn aggregate<N>(
        &self,
        detections: &[RawDetection],
        class_names: &N,
        image: &mut RgbImage,
    ) -> Aggregation
    where
        N: ClassNames + ?Sized,
    {
        let mut result = Aggregation::default();

        for raw in detections {
            let label = class_names.class_name(raw.class_id);

            if self.classifier.is_ignored(label) {
                debug!(label, "ignored class");
                continue;
            }
            if !self.classifier.is_food(label) {
                debug!(label, "not food");
                continue;
            }

            let calories = self.estimator.estimate(label);
            let text = format!("{label} {:.2}", raw.confidence);
            self.annotator.draw_detection(image, &raw.bbox, &text);

            result.push(AnnotatedDetection {
                label: label.to_string(),
                confidence: raw.confidence,
                bbox: raw.bbox,
                calories,
            });
        }

        result
    }
}

impl Default for FoodAnalyzer {
    fn default() -> Self {
        Self::new(
            LabelClassifier::default(),
            CalorieEstimator::default(),
            Annotator::new(None),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calorie::NutritionTables;
    use crate::postprocess::coco_classes::COCO_CLASSES;

    const PERSON: i32 = 0;
    const BOTTLE: i32 = 39;
    const BANANA: i32 = 46;
    const BROCCOLI: i32 = 50;
    const PIZZA: i32 = 53;
    const CHAIR: i32 = 56;

    fn raw(class_id: i32, confidence: f32, x1: i32, y1: i32, x2: i32, y2: i32) -> RawDetection {
        RawDetection {
            class_id,
            confidence,
            bbox: BoundingBox { x1, y1, x2, y2 },
        }
    }

    #[test]
    fn keeps_food_in_detector_order() {
        let analyzer = FoodAnalyzer::default();
        let mut image = RgbImage::new(200, 200);
        let detections = vec![
            raw(PERSON, 0.95, 0, 0, 100, 190),
            raw(PIZZA, 0.9, 20, 20, 80, 80),
            raw(CHAIR, 0.7, 100, 100, 190, 190),
            raw(BANANA, 0.8, 120, 10, 180, 60),
        ];

        let result = analyzer.aggregate(&detections, &COCO_CLASSES[..], &mut image);

        let labels: Vec<&str> = result.detections.iter().map(|d| d.label.as_str()).collect();
        assert_eq!(labels, vec!["pizza", "banana"]);
        assert_eq!(result.total_calories, 285 + 96);
        assert_eq!(result.detections[0].calories, 285);
        assert_eq!(result.detections[1].bbox, BoundingBox { x1: 120, y1: 10, x2: 180, y2: 60 });
        assert_eq!(
            result.total_calories,
            result.detections.iter().map(|d| u64::from(d.calories)).sum::<u64>()
        );
        assert_eq!(*image.get_pixel(20, 20), image::Rgb([255, 0, 0]));
    }

    #[test]
    fn empty_input_gives_empty_result() {
        let analyzer = FoodAnalyzer::default();
        let mut image = RgbImage::new(10, 10);

        let result = analyzer.aggregate(&[], &COCO_CLASSES[..], &mut image);

        assert!(result.detections.is_empty());
        assert_eq!(result.total_calories, 0);
    }

    #[test]
    fn nothing_surviving_leaves_image_untouched() {
        let analyzer = FoodAnalyzer::default();
        let original = RgbImage::from_fn(64, 64, |x, y| image::Rgb([x as u8, y as u8, 7]));
        let mut image = original.clone();
        let detections = vec![
            raw(PERSON, 0.9, 0, 0, 30, 30),
            // in the calorie table, but ignored first
            raw(BOTTLE, 0.9, 10, 10, 20, 40),
            // not ignored, not in the food set
            raw(BROCCOLI, 0.6, 5, 5, 60, 60),
        ];

        let result = analyzer.aggregate(&detections, &COCO_CLASSES[..], &mut image);

        assert_eq!(result, Aggregation::default());
        assert_eq!(image, original);
    }

    #[test]
    fn food_substring_labels_use_heuristics() {
        let analyzer = FoodAnalyzer::default();
        let names = ["person", "seafood platter", "Food Truck"];
        let mut image = RgbImage::new(50, 50);
        let detections = vec![raw(1, 0.5, 1, 1, 10, 10), raw(2, 0.4, 20, 20, 30, 30)];

        let result = analyzer.aggregate(&detections, &names[..], &mut image);

        // neither label hits the table or a category word
        assert_eq!(result.detections.len(), 2);
        assert_eq!(result.total_calories, 400);
    }

    #[test]
    fn ignore_check_uses_raw_label_case() {
        let analyzer = FoodAnalyzer::default();
        let names = ["Bottle"];
        let mut image = RgbImage::new(50, 50);

        let result = analyzer.aggregate(&[raw(0, 0.9, 1, 1, 10, 10)], &names[..], &mut image);

        // "Bottle" escapes the ignore list but is not food either
        assert!(result.detections.is_empty());
    }

    #[test]
    fn large_table_values_sum_without_overflow() {
        let tables =
            NutritionTables::from_json(r#"{ "calories": [["pizza", 3000000000]] }"#).unwrap();
        let analyzer = FoodAnalyzer::new(
            LabelClassifier::new(&tables),
            CalorieEstimator::new(&tables),
            Annotator::new(None),
        );
        let mut image = RgbImage::new(100, 100);
        let detections = vec![raw(PIZZA, 0.9, 1, 1, 40, 40), raw(PIZZA, 0.8, 50, 50, 90, 90)];

        let result = analyzer.aggregate(&detections, &COCO_CLASSES[..], &mut image);

        assert_eq!(result.detections[0].calories, 3_000_000_000);
        assert_eq!(result.total_calories, 6_000_000_000);
    }
}
