use async_trait::async_trait;
use tracing::info;

use super::aggregate::{total_macros, total_weight};
use super::error::ScanError;
use super::service::{FoodScanner, ScanContext};
use super::types::{Ingredient, ScanInput, ScanReport};

/// Offline stand-in for the real pipeline. Always answers with the same salad.
#[derive(Debug, Default, Clone, Copy)]
pub struct MockNutritionService;

fn ingredient(name: &str, weight_grams: u32, calories: u32, macros: [f64; 4]) -> Ingredient {
    let [protein, carbs, fat, fiber] = macros;
    Ingredient {
        name: name.to_string(),
        weight_grams,
        calories,
        protein,
        carbs,
        fat,
        fiber,
    }
}

pub fn example_report() -> ScanReport {
    let ingredients = vec![
        ingredient("Grilled Chicken Breast", 150, 248, [38.0, 0.0, 10.0, 0.0]),
        ingredient("Mixed Greens", 100, 20, [2.0, 3.0, 0.0, 2.0]),
        ingredient("Cherry Tomatoes", 60, 18, [1.0, 4.0, 0.0, 1.0]),
        ingredient("Feta Cheese", 40, 105, [6.0, 2.0, 8.0, 0.0]),
        ingredient("Olive Oil Dressing", 20, 80, [0.0, 1.0, 9.0, 0.0]),
        ingredient("Cucumber", 30, 5, [0.0, 1.0, 0.0, 0.0]),
    ];
    ScanReport {
        is_food: true,
        detected_object: "Grilled Chicken Salad".into(),
        food_name: "Grilled Chicken Salad".into(),
        confidence: 0.95,
        total_weight: total_weight(&ingredients),
        total_macros: total_macros(&ingredients),
        ingredients,
    }
}

#[async_trait]
impl FoodScanner for MockNutritionService {
    async fn scan_food(
        &self,
        ctx: &ScanContext,
        input: ScanInput,
    ) -> Result<ScanReport, ScanError> {
        info!(request_id = %ctx.request_id, input = ?input, "mock food scan");
        Ok(example_report())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nutrition::types::MacroTotals;

    #[tokio::test]
    async fn mock_returns_fixed_salad() {
        let report = MockNutritionService
            .scan_food(
                &ScanContext::new(None),
                ScanInput {
                    image_data: String::new(),
                    description: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(report.food_name, "Grilled Chicken Salad");
        assert_eq!(report.ingredients.len(), 6);
        assert_eq!(report.total_weight, 400);
        assert_eq!(
            report.total_macros,
            MacroTotals {
                calories: 476,
                protein: 47.0,
                carbs: 11.0,
                fat: 27.0,
                fiber: 3.0,
            }
        );
    }
}
