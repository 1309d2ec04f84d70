//! Food classification and calorie estimation for detector labels.

pub mod aggregate;
pub mod classifier;
pub mod estimator;
pub mod tables;

pub use aggregate::{AnnotatedDetection, Aggregation, FoodAnalyzer};
pub use classifier::LabelClassifier;
pub use estimator::CalorieEstimator;
pub use tables::NutritionTables;
