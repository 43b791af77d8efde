use super::types::{Ingredient, MacroTotals};

pub fn total_weight(ingredients: &[Ingredient]) -> u64 {
    ingredients.iter().map(|i| u64::from(i.weight_grams)).sum()
}

/// Sums ingredient macros. Floats are accumulated unrounded and rounded once at the end.
pub fn total_macros(ingredients: &[Ingredient]) -> MacroTotals {
    let sum = ingredients
        .iter()
        .fold(MacroTotals::default(), |mut acc, ing| {
            acc.calories += u64::from(ing.calories);
            acc.protein += ing.protein;
            acc.carbs += ing.carbs;
            acc.fat += ing.fat;
            acc.fiber += ing.fiber;
            acc
        });
    MacroTotals {
        calories: sum.calories,
        protein: round1(sum.protein),
        carbs: round1(sum.carbs),
        fat: round1(sum.fat),
        fiber: round1(sum.fiber),
    }
}

// f64::round is half away from zero.
fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
