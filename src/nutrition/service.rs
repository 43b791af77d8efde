use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

use super::aggregate::{total_macros, total_weight};
use super::error::{ScanError, ScanErrorKind, ScanStage, ValidationError};
use super::prompt::build_prompt;
use super::registry::{FlowName, FlowRegistry};
use super::types::{ImageReference, ScanInput, ScanReport};
use super::validate::validate_classification;

/// Per-request context. Dropping the scan future cancels the inference call.
#[derive(Debug, Clone)]
pub struct ScanContext {
    pub request_id: Uuid,
    pub deadline: Option<Duration>,
}

impl ScanContext {
    pub fn new(deadline: Option<Duration>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            deadline,
        }
    }
}

/// Anything that can answer a scan request.
#[async_trait]
pub trait FoodScanner: Send + Sync {
    async fn scan_food(&self, ctx: &ScanContext, input: ScanInput)
        -> Result<ScanReport, ScanError>;
}

pub struct NutritionService {
    flows: Arc<FlowRegistry>,
}

impl NutritionService {
    pub fn new(flows: Arc<FlowRegistry>) -> Self {
        Self { flows }
    }

    async fn run(&self, ctx: &ScanContext, input: ScanInput) -> Result<ScanReport, ScanError> {
        // Prompting
        if input.image_data.trim().is_empty() {
            return Err(ScanError::new(
                ScanStage::Prompting,
                ValidationError::body_field("image_base64", "image_base64 must not be empty"),
            ));
        }
        let prompt = build_prompt(&input);
        let image = ImageReference::from_payload(input.image_data);
        if image.is_empty() {
            return Err(ScanError::new(
                ScanStage::Prompting,
                ValidationError::body_field("image_base64", "image_base64 has no image data"),
            ));
        }

        // Inferring
        debug!(stage = %ScanStage::Inferring, "scan stage");
        let flow = self
            .flows
            .get(FlowName::FoodScan)
            .map_err(|e| ScanError::new(ScanStage::Inferring, e))?;
        let call = flow.run(prompt, image);
        let raw = match ctx.deadline {
            Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
                ScanError::new(ScanStage::Inferring, ScanErrorKind::DeadlineExceeded(limit))
            })?,
            None => call.await,
        }
        .map_err(|e| ScanError::new(ScanStage::Inferring, e))?;

        // Validating
        debug!(stage = %ScanStage::Validating, "scan stage");
        let result = validate_classification(raw)
            .map_err(|e| ScanError::new(ScanStage::Validating, e))?;

        // Aggregating
        debug!(stage = %ScanStage::Aggregating, "scan stage");
        let report = ScanReport {
            total_weight: total_weight(&result.ingredients),
            total_macros: total_macros(&result.ingredients),
            is_food: result.is_food,
            detected_object: result.detected_object,
            food_name: result.food_name,
            confidence: result.confidence,
            ingredients: result.ingredients,
        };
        Ok(report)
    }
}

#[async_trait]
impl FoodScanner for NutritionService {
    async fn scan_food(
        &self,
        ctx: &ScanContext,
        input: ScanInput,
    ) -> Result<ScanReport, ScanError> {
        let span = info_span!("scan_food", request_id = %ctx.request_id);
        async move {
            info!(input = ?input, "received food scan request");
            let outcome = self.run(ctx, input).await;
            match &outcome {
                Ok(report) => info!(
                    stage = %ScanStage::Done,
                    food_name = %report.food_name,
                    ingredients = report.ingredients.len(),
                    total_weight = report.total_weight,
                    "food scan finished"
                ),
                Err(e) => info!(stage = %ScanStage::Failed, failed_at = %e.stage, "food scan failed"),
            }
            outcome
        }
        .instrument(span)
        .await
    }
}
