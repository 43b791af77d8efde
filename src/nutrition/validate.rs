use super::error::ValidationError;
use super::types::RawScanResult;

pub const NOT_FOOD_MESSAGE: &str =
    "that doesn't look like food. Please try again with a different image";

/// Rejects results the model classified as non-food.
pub fn validate_classification(result: RawScanResult) -> Result<RawScanResult, ValidationError> {
    if !result.is_food {
        return Err(ValidationError::body_field("image", NOT_FOOD_MESSAGE));
    }
    Ok(result)
}
