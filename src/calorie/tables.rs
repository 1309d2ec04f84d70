//! Static vocabulary and calorie tables.
//!
//! Built once at startup, optionally overridden from a JSON file, then shared
//! read-only by the classifier and estimator.

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Exact table, checked in declaration order. Earlier keys win.
pub const CALORIE_TABLE: &[(&str, u32)] = &[
    ("pizza", 285),
    ("burger", 295),
    ("sandwich", 250),
    ("hot dog", 290),
    ("cake", 350),
    ("donut", 250),
    ("banana", 96),
    ("apple", 52),
    ("orange", 47),
    ("bottle", 0),
    ("egg", 78),
];

/// Category fallback rules, checked in order after the exact table.
pub const CATEGORY_RULES: &[(&[&str], u32)] = &[
    (&["bread", "bun", "toast", "bakery"], 260),
    (&["noodle", "ramen", "soup"], 480),
    (&["chicken", "beef", "meat", "pork"], 230),
    (&["fish", "salmon", "tuna"], 150),
    (&["fruit", "melon", "grape", "berry"], 60),
    (&["vegetable", "salad", "lettuce"], 25),
    (&["cookie", "dessert", "chocolate", "snack"], 300),
];

pub const DEFAULT_CALORIES: u32 = 200;

pub const FOOD_CLASSES: &[&str] = &[
    "pizza", "burger", "sandwich", "hot dog", "cake", "donut", "banana", "apple", "orange",
];

pub const IGNORE_CLASSES: &[&str] = &[
    "person",
    "cell phone",
    "scissors",
    "tie",
    "book",
    "chair",
    "tv",
    "keyboard",
    "mouse",
    "couch",
    "cat",
    "dog",
    "bottle",
    "cup",
    "remote",
    "umbrella",
    "handbag",
    "sports ball",
    "backpack",
    "car",
    "bus",
    "truck",
    "boat",
    "train",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub words: Vec<String>,
    pub calories: u32,
}

/// All process-wide tables. Every field is optional in the JSON form; a
/// missing field keeps the built-in value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NutritionTables {
    /// Ordered `[key, kcal]` pairs. A list, never a map: order is the tie-break.
    pub calories: Vec<(String, u32)>,
    pub categories: Vec<CategoryRule>,
    pub default_calories: u32,
    pub food_classes: Vec<String>,
    pub ignore_classes: Vec<String>,
}

impl Default for NutritionTables {
    fn default() -> Self {
        Self {
            calories: CALORIE_TABLE
                .iter()
                .map(|(key, kcal)| (key.to_string(), *kcal))
                .collect(),
            categories: CATEGORY_RULES
                .iter()
                .map(|(words, calories)| CategoryRule {
                    words: words.iter().map(|w| w.to_string()).collect(),
                    calories: *calories,
                })
                .collect(),
            default_calories: DEFAULT_CALORIES,
            food_classes: FOOD_CLASSES.iter().map(|s| s.to_string()).collect(),
            ignore_classes: IGNORE_CLASSES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl NutritionTables {
    pub fn from_json(text: &str) -> Result<Self, AppError> {
        serde_json::from_str(text)
            .map_err(|e| AppError::Config(format!("Invalid nutrition tables: {e}")))
    }

    pub fn load(path: &Path) -> Result<Self, AppError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::from_json(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_mirror_builtin_constants() {
        let tables = NutritionTables::default();
        assert_eq!(tables.calories.len(), CALORIE_TABLE.len());
        assert_eq!(tables.calories[0], ("pizza".to_string(), 285));
        assert_eq!(tables.calories.last(), Some(&("egg".to_string(), 78)));
        assert_eq!(tables.categories.len(), 7);
        assert_eq!(tables.categories[1].calories, 480);
        assert_eq!(tables.default_calories, 200);
        assert!(tables.ignore_classes.iter().any(|c| c == "bottle"));
    }

    #[test]
    fn partial_json_keeps_remaining_defaults() {
        let tables = NutritionTables::from_json(
            r#"{ "calories": [["kimchi", 15], ["rice", 130]], "default_calories": 150 }"#,
        )
        .unwrap();

        assert_eq!(
            tables.calories,
            vec![("kimchi".to_string(), 15), ("rice".to_string(), 130)]
        );
        assert_eq!(tables.default_calories, 150);
        assert_eq!(tables.categories, NutritionTables::default().categories);
        assert_eq!(tables.food_classes, NutritionTables::default().food_classes);
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let err = NutritionTables::from_json(r#"{ "calories": {"pizza": 285} }"#).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
