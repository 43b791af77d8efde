//! OpenAI-compatible chat completions adapter.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{InferenceAdapter, InferenceRequest};
use crate::nutrition::error::InferenceError;
use crate::nutrition::types::RawScanResult;

#[derive(Clone)]
pub struct OpenAiSettings {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub http_timeout: Duration,
}

impl fmt::Debug for OpenAiSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiSettings")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("http_timeout", &self.http_timeout)
            .finish_non_exhaustive()
    }
}

/// Sends one request per scan and classifies the outcome.
///
/// There is no retry policy: a `Transient` error is returned as soon as it
/// happens and the caller decides whether to try again.
#[derive(Debug)]
pub struct OpenAiAdapter {
    settings: OpenAiSettings,
    client: reqwest::Client,
}

impl OpenAiAdapter {
    pub fn new(settings: OpenAiSettings) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.http_timeout)
            .build()?;
        Ok(Self { settings, client })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.settings.base_url.trim_end_matches('/')
        )
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: MessageContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
    json_schema: JsonSchemaFormat,
}

#[derive(Debug, Serialize)]
struct JsonSchemaFormat {
    name: &'static str,
    strict: bool,
    schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

fn chat_request(model: &str, request: InferenceRequest) -> ChatRequest {
    let image_url = request.user_message.image.data_url();
    ChatRequest {
        model: model.to_string(),
        messages: vec![
            ChatMessage {
                role: "system",
                content: MessageContent::Text(request.system_instructions),
            },
            ChatMessage {
                role: "user",
                content: MessageContent::Parts(vec![
                    ContentPart::ImageUrl {
                        image_url: ImageUrl { url: image_url },
                    },
                    ContentPart::Text {
                        text: request.user_message.text,
                    },
                ]),
            },
        ],
        response_format: ResponseFormat {
            format_type: "json_schema",
            json_schema: JsonSchemaFormat {
                name: request.schema_name,
                strict: true,
                schema: request.output_schema,
            },
        },
    }
}

/// Any 2xx is accepted; everything else is classified by status.
fn check_status(status: StatusCode, body: &str) -> Result<(), InferenceError> {
    if status.is_success() {
        return Ok(());
    }
    let message = serde_json::from_str::<ApiErrorResponse>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.chars().take(200).collect());
    let message = format!("HTTP {}: {}", status.as_u16(), message);
    Err(match status.as_u16() {
        408 | 429 | 500..=599 => InferenceError::Transient(message),
        _ => InferenceError::Unknown(message),
    })
}

fn parse_completion(body: &str) -> Result<RawScanResult, InferenceError> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| InferenceError::SchemaInvalid(format!("completion body: {}", e)))?;
    let message = response
        .choices
        .into_iter()
        .next()
        .map(|c| c.message)
        .ok_or_else(|| InferenceError::SchemaInvalid("no choices in completion".into()))?;
    if let Some(refusal) = message.refusal {
        return Err(InferenceError::Unknown(format!("model refused: {}", refusal)));
    }
    let content = message
        .content
        .ok_or_else(|| InferenceError::SchemaInvalid("completion has no content".into()))?;
    serde_json::from_str(&content)
        .map_err(|e| InferenceError::SchemaInvalid(format!("scan output: {}", e)))
}

#[async_trait]
impl InferenceAdapter for OpenAiAdapter {
    async fn generate(&self, request: InferenceRequest) -> Result<RawScanResult, InferenceError> {
        let body = chat_request(&self.settings.model, request);

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.settings.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() || e.is_connect() {
                    InferenceError::Transient(e.to_string())
                } else {
                    InferenceError::Unknown(e.to_string())
                }
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| InferenceError::Transient(e.to_string()))?;

        if let Err(err) = check_status(status, &text) {
            warn!(status = status.as_u16(), kind = err.kind(), "inference request rejected");
            return Err(err);
        }

        debug!(model = %self.settings.model, "inference completed");
        parse_completion(&text)
    }

    fn adapter_name(&self) -> &'static str {
        "openai"
    }
}
