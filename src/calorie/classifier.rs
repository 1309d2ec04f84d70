//! Food / non-food decision for detector labels.

use super::tables::NutritionTables;

pub struct LabelClassifier {
    food_classes: Vec<String>,
    ignore_classes: Vec<String>,
}

impl LabelClassifier {
    pub fn new(tables: &NutritionTables) -> Self {
        Self {
            food_classes: tables.food_classes.iter().map(|c| c.to_lowercase()).collect(),
            ignore_classes: tables.ignore_classes.clone(),
        }
    }

    /// Exact, case-sensitive match against the ignore list. The label is
    /// compared as the detector returned it.
    pub fn is_ignored(&self, label: &str) -> bool {
        self.ignore_classes.iter().any(|c| c == label)
    }

    /// True for known food classes and for any label mentioning "food".
    pub fn is_food(&self, label: &str) -> bool {
        let label = label.to_lowercase();
        self.food_classes.iter().any(|c| *c == label) || label.contains("food")
    }
}

impl Default for LabelClassifier {
    fn default() -> Self {
        Self::new(&NutritionTables::default())
    }
}
