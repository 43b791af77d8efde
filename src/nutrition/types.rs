use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::error::InferenceError;

/// Request body for a scan.
#[derive(Clone, Deserialize)]
pub struct ScanInput {
    #[serde(rename = "image_base64")]
    pub image_data: String,
    #[serde(default)]
    pub description: Option<String>,
}

// Never print the payload, only its size.
impl fmt::Debug for ScanInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanInput")
            .field("image_size_bytes", &self.image_data.len())
            .field("description", &self.description)
            .finish()
    }
}

impl ScanInput {
    /// Description if present and non-empty.
    pub fn context(&self) -> Option<&str> {
        self.description.as_deref().filter(|d| !d.is_empty())
    }
}

/// Opaque handle to the uploaded image as the model should receive it.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageReference {
    media_type: String,
    data: String,
}

impl fmt::Debug for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageReference")
            .field("media_type", &self.media_type)
            .field("image_size_bytes", &self.data.len())
            .finish()
    }
}

const DEFAULT_MEDIA_TYPE: &str = "image/jpeg";

impl ImageReference {
    /// Accepts bare base64 or a `data:<mime>;base64,` URL. The payload itself is not decoded.
    pub fn from_payload(payload: String) -> Self {
        lazy_static! {
            static ref DATA_URL_RE: Regex =
                Regex::new(r"^data:(image/[A-Za-z0-9.+-]+);base64,").unwrap();
        }
        if let Some(caps) = DATA_URL_RE.captures(&payload) {
            let media_type = caps[1].to_string();
            let prefix_len = caps[0].len();
            let data = payload[prefix_len..].to_string();
            return Self { media_type, data };
        }
        Self {
            media_type: DEFAULT_MEDIA_TYPE.to_string(),
            data: payload,
        }
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn is_empty(&self) -> bool {
        self.data.trim().is_empty()
    }

    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type(), self.data)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub weight_grams: u32,
    pub calories: u32,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub fiber: f64,
}

/// Model output before totals are derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawScanResult {
    pub is_food: bool,
    #[serde(default)]
    pub detected_object: String,
    #[serde(default)]
    pub food_name: String,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
}

impl RawScanResult {
    /// Enforces the invariants serde cannot express. Non-food results lose their ingredients.
    pub fn check_schema(mut self) -> Result<Self, InferenceError> {
        // Non-food is decided by the classification gate, whatever else came back.
        if !self.is_food {
            self.ingredients.clear();
            return Ok(self);
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(InferenceError::SchemaInvalid(format!(
                "confidence {} outside [0, 1]",
                self.confidence
            )));
        }
        for (idx, ing) in self.ingredients.iter().enumerate() {
            if ing.name.trim().is_empty() {
                return Err(InferenceError::SchemaInvalid(format!(
                    "ingredient #{idx} has an empty name"
                )));
            }
            for (field, value) in [
                ("protein", ing.protein),
                ("carbs", ing.carbs),
                ("fat", ing.fat),
                ("fiber", ing.fiber),
            ] {
                if !value.is_finite() || value < 0.0 {
                    return Err(InferenceError::SchemaInvalid(format!(
                        "ingredient #{idx} {field} = {value}"
                    )));
                }
            }
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MacroTotals {
    pub calories: u64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub fiber: f64,
}

/// Final per-request output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    pub is_food: bool,
    pub detected_object: String,
    pub food_name: String,
    pub confidence: f64,
    pub ingredients: Vec<Ingredient>,
    pub total_weight: u64,
    pub total_macros: MacroTotals,
}

/// JSON schema handed to the model for structured output.
pub fn scan_output_schema() -> serde_json::Value {
    let number = serde_json::json!({ "type": "number", "minimum": 0 });
    let integer = serde_json::json!({ "type": "integer", "minimum": 0 });
    serde_json::json!({
        "type": "object",
        "additionalProperties": false,
        "required": ["is_food", "detected_object", "food_name", "confidence", "ingredients"],
        "properties": {
            "is_food": { "type": "boolean" },
            "detected_object": { "type": "string" },
            "food_name": { "type": "string" },
            "confidence": { "type": "number", "minimum": 0, "maximum": 1 },
            "ingredients": {
                "type": "array",
                "items": {
                    "type": "object",
                    "additionalProperties": false,
                    "required": ["name", "weight_grams", "calories", "protein", "carbs", "fat", "fiber"],
                    "properties": {
                        "name": { "type": "string" },
                        "weight_grams": integer,
                        "calories": integer,
                        "protein": number,
                        "carbs": number,
                        "fat": number,
                        "fiber": number
                    }
                }
            }
        }
    })
}
