//! Label to calorie estimate.
//!
//! Three ordered stages: substring lookup in the calorie table, then category
//! word rules, then a flat default. The first stage that matches decides.

use super::tables::{CategoryRule, NutritionTables};

pub struct CalorieEstimator {
    table: Vec<(String, u32)>,
    categories: Vec<CategoryRule>,
    default_calories: u32,
}

impl CalorieEstimator {
    pub fn new(tables: &NutritionTables) -> Self {
        Self {
            table: tables
                .calories
                .iter()
                .map(|(key, kcal)| (key.to_lowercase(), *kcal))
                .collect(),
            categories: tables
                .categories
                .iter()
                .map(|rule| CategoryRule {
                    words: rule.words.iter().map(|w| w.to_lowercase()).collect(),
                    calories: rule.calories,
                })
                .collect(),
            default_calories: tables.default_calories,
        }
    }

    pub fn estimate(&self, label: &str) -> u32 {
        let label = label.to_lowercase();

        if let Some((_, kcal)) = self.table.iter().find(|(key, _)| label.contains(key.as_str())) {
            return *kcal;
        }

        self.categories
            .iter()
            .find(|rule| rule.words.iter().any(|word| label.contains(word.as_str())))
            .map(|rule| rule.calories)
            .unwrap_or(self.default_calories)
    }
}

impl Default for CalorieEstimator {
    fn default() -> Self {
        Self::new(&NutritionTables::default())
    }
}
