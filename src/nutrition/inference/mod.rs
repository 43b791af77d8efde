//! Generative inference capability.
//!
//! The scan pipeline only knows the [`InferenceAdapter`] trait. Which engine
//! answers is decided at startup, when `AppState::init` builds the flow registry.

#[cfg(test)]
mod fake;
mod openai;

#[cfg(test)]
pub use fake::StaticAdapter;
pub use openai::{OpenAiAdapter, OpenAiSettings};

use async_trait::async_trait;
use std::fmt;

use super::error::InferenceError;
use super::types::{ImageReference, RawScanResult};

#[derive(Debug, Clone)]
pub struct UserMessage {
    pub text: String,
    pub image: ImageReference,
}

/// One structured-generation call.
#[derive(Debug, Clone)]
pub struct InferenceRequest {
    pub system_instructions: String,
    pub user_message: UserMessage,
    pub schema_name: &'static str,
    pub output_schema: serde_json::Value,
}

/// Engine capable of schema-constrained generation from text plus an image.
///
/// Implementations own their retry policy; the scan pipeline never retries.
#[async_trait]
pub trait InferenceAdapter: Send + Sync + fmt::Debug {
    async fn generate(&self, request: InferenceRequest) -> Result<RawScanResult, InferenceError>;

    fn adapter_name(&self) -> &'static str;
}
