use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Serialize;
use tracing::{error, instrument, warn};

use super::error::{ScanError, ValidationError};
use super::service::ScanContext;
use super::types::{ScanInput, ScanReport};
use crate::state::AppState;

pub fn scan_routes() -> Router<AppState> {
    Router::new()
        .route("/nutrition/scan", post(scan_food))
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024)) // 20MB
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub message: String,
    pub location: String,
    pub value: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ErrorDetail>,
}

#[derive(Debug)]
pub enum ApiError {
    Validation(ValidationError),
    Internal,
}

impl ApiError {
    /// Logs the failure and keeps only what the caller may see.
    pub fn from_scan(e: ScanError) -> Self {
        if !e.is_client_error() {
            error!(stage = %e.stage, error = %e, "scan failed");
            return ApiError::Internal;
        }
        match e.validation() {
            Some(v) => {
                warn!(stage = %e.stage, field = v.field, message = %v.message, "scan rejected");
                ApiError::Validation(v.clone())
            }
            None => ApiError::Internal,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Validation(v) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorResponse {
                    error: "validation failed".into(),
                    errors: vec![ErrorDetail {
                        message: v.message,
                        location: format!("{}.{}", v.location, v.field),
                        value: v.value,
                    }],
                },
            ),
            ApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse {
                    error: "internal server error".into(),
                    errors: Vec::new(),
                },
            ),
        };
        (status, Json(body)).into_response()
    }
}

/// POST /api/nutrition/scan { image_base64, description? }
#[instrument(skip(state, input))]
pub async fn scan_food(
    State(state): State<AppState>,
    Json(input): Json<ScanInput>,
) -> Result<Json<ScanReport>, ApiError> {
    let ctx = ScanContext::new(Some(state.config.scan_timeout));
    let report = state
        .scanner
        .scan_food(&ctx, input)
        .await
        .map_err(ApiError::from_scan)?;
    Ok(Json(report))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::nutrition::error::InferenceError;
    use crate::nutrition::inference::StaticAdapter;
    use crate::nutrition::types::RawScanResult;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn input(image: &str) -> Json<ScanInput> {
        Json(ScanInput {
            image_data: image.into(),
            description: Some("low sodium".into()),
        })
    }

    #[tokio::test]
    async fn mock_state_returns_report() {
        let state = AppState::fake();
        let response = scan_food(State(state), input("abc")).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["is_food"], true);
        assert_eq!(json["total_weight"], 400);
        assert_eq!(json["total_macros"]["calories"], 476);
        assert_eq!(json["ingredients"][0]["weight_grams"], 150);
    }

    #[tokio::test]
    async fn not_food_is_unprocessable() {
        let state = AppState::with_adapter(Arc::new(StaticAdapter::returning(RawScanResult {
            is_food: false,
            detected_object: "Laptop".into(),
            food_name: String::new(),
            confidence: 0.0,
            ingredients: vec![],
        })));
        let response = scan_food(State(state), input("SECRETIMAGE"))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let json = body_json(response).await;
        let text = json.to_string();
        assert_eq!(json["errors"][0]["location"], "request.body.image");
        assert_eq!(json["errors"][0]["value"], "<omitted>");
        assert!(!text.contains("SECRETIMAGE"));
        assert!(!text.contains("Laptop"));
        assert!(json.get("total_macros").is_none());
    }

    #[tokio::test]
    async fn not_food_with_out_of_range_confidence_is_unprocessable() {
        let state = AppState::with_adapter(Arc::new(StaticAdapter::returning(RawScanResult {
            is_food: false,
            detected_object: "Laptop".into(),
            food_name: String::new(),
            confidence: 1.5,
            ingredients: vec![],
        })));
        let response = scan_food(State(state), input("abc")).await.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json = body_json(response).await;
        assert_eq!(json["errors"][0]["location"], "request.body.image");
    }

    #[tokio::test]
    async fn adapter_failure_is_opaque() {
        let state = AppState::with_adapter(Arc::new(StaticAdapter::failing(
            InferenceError::SchemaInvalid("ingredient #0 protein = -1".into()),
        )));
        let response = scan_food(State(state), input("abc")).await.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let json = body_json(response).await;
        assert_eq!(json["error"], "internal server error");
        assert!(!json.to_string().contains("protein"));
        assert!(json.get("errors").is_none());
    }

    #[tokio::test]
    async fn empty_image_is_unprocessable() {
        let state = AppState::with_adapter(Arc::new(StaticAdapter::failing(
            InferenceError::Unknown("must not be called".into()),
        )));
        let response = scan_food(State(state), input("")).await.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json = body_json(response).await;
        assert_eq!(json["errors"][0]["location"], "request.body.image_base64");
    }
}
