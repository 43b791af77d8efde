use super::types::ScanInput;

const SYSTEM_INSTRUCTIONS: &str = r#"You are an expert nutritionist and food recognition AI.
Analyze the provided image and determine if it contains food.

FIRST: Determine if the image contains food
- Set is_food to true if the image contains any food items
- Set is_food to false if the image does NOT contain food (e.g., objects, people, landscapes, text, documents)
- Set detected_object to describe what you see (e.g., "Grilled Chicken Salad" or "Laptop computer")

IF THE IMAGE CONTAINS FOOD (is_food = true):
Identify each visible ingredient and estimate its individual macros.

ANALYSIS STEPS:
1. Identify all visible food items and ingredients
2. For each ingredient, estimate its weight in grams
3. For each ingredient, calculate its individual macros (calories, protein, carbs, fat, fiber)
4. Consider cooking methods (fried, grilled, steamed) and reflect them in the ingredient macros
5. Estimate portion sizes relative to standard references (e.g., a fist is about 1 cup, a palm is about 3oz of protein)

OUTPUT REQUIREMENTS:
- is_food: true if image contains food, false otherwise
- detected_object: What you see in the image
- food_name: Overall meal/dish name (empty string if not food)
- confidence: How clearly the food is identifiable (0.0-1.0, or 0.0 if not food)
- ingredients: Array of each component with:
  - name: Ingredient name (e.g., "Grilled Chicken Breast")
  - weight_grams: Estimated weight in grams (whole number)
  - calories: Calories for this ingredient at the estimated weight (whole number)
  - protein: Protein in grams
  - carbs: Carbohydrates in grams
  - fat: Fat in grams
  - fiber: Fiber in grams

IMPORTANT: Do NOT return total macros or serving size. Only return per-ingredient data.
Total macros will be computed by summing all ingredients.

IF THE IMAGE DOES NOT CONTAIN FOOD (is_food = false):
Return a minimal response with is_food=false, detected_object describing what you see and an empty ingredients array.

GUIDELINES:
- Always break down complex meals into their visible components
- Use reasonable middle-ground estimates when portions are unclear
- Include cooking oils, sauces, and dressings as separate ingredients when visible
- Include fiber in macro calculations when applicable"#;

const INSTRUCTION: &str =
    "First determine if it contains food, then identify each ingredient with its macros.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system_instructions: String,
    pub user_message: String,
}

/// Builds the model instructions for a scan. Pure.
pub fn build_prompt(input: &ScanInput) -> Prompt {
    let user_message = match input.context() {
        Some(description) => format!(
            "Analyze this image. Additional context: {}. {}",
            description, INSTRUCTION
        ),
        None => format!("Analyze this image. {}", INSTRUCTION),
    };
    Prompt {
        system_instructions: SYSTEM_INSTRUCTIONS.to_string(),
        user_message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(description: Option<&str>) -> ScanInput {
        ScanInput {
            image_data: "aGVsbG8=".into(),
            description: description.map(str::to_string),
        }
    }

    #[test]
    fn same_input_same_prompt() {
        let a = build_prompt(&input(Some("extra cheese")));
        let b = build_prompt(&input(Some("extra cheese")));
        assert_eq!(a, b);
    }

    #[test]
    fn no_description_has_no_context_clause() {
        let prompt = build_prompt(&input(None));
        assert!(!prompt.user_message.contains("context"));
        assert_eq!(prompt, build_prompt(&input(Some(""))));
    }

    #[test]
    fn description_is_included_verbatim() {
        let prompt = build_prompt(&input(Some("low sodium")));
        assert!(prompt.user_message.contains("low sodium"));
        assert!(prompt.user_message.contains("Additional context"));
    }

    #[test]
    fn system_instructions_describe_schema() {
        let prompt = build_prompt(&input(None));
        for field in ["is_food", "detected_object", "weight_grams", "protein", "fiber"] {
            assert!(prompt.system_instructions.contains(field), "missing {field}");
        }
        assert!(prompt.system_instructions.contains("cooking methods"));
    }

    #[test]
    fn prompt_never_contains_image() {
        let prompt = build_prompt(&input(None));
        assert!(!prompt.user_message.contains("aGVsbG8="));
        assert!(!prompt.system_instructions.contains("aGVsbG8="));
    }
}
