//! Scripted adapter for tests. Never touches the network.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::{InferenceAdapter, InferenceRequest};
use crate::nutrition::error::InferenceError;
use crate::nutrition::types::RawScanResult;

#[derive(Debug, Clone)]
enum Reply {
    Result(RawScanResult),
    Transient(String),
    SchemaInvalid(String),
    Unknown(String),
}

#[derive(Debug)]
pub struct StaticAdapter {
    reply: Reply,
    delay: Option<Duration>,
    last_request: Mutex<Option<InferenceRequest>>,
}

impl StaticAdapter {
    fn with_reply(reply: Reply) -> Self {
        Self {
            reply,
            delay: None,
            last_request: Mutex::new(None),
        }
    }

    pub fn returning(result: RawScanResult) -> Self {
        Self::with_reply(Reply::Result(result))
    }

    pub fn failing(err: InferenceError) -> Self {
        let reply = match err {
            InferenceError::Transient(m) => Reply::Transient(m),
            InferenceError::SchemaInvalid(m) => Reply::SchemaInvalid(m),
            InferenceError::Unknown(m) => Reply::Unknown(m),
        };
        Self::with_reply(reply)
    }

    /// Sleep before answering, to exercise deadlines.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn last_request(&self) -> Option<InferenceRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl InferenceAdapter for StaticAdapter {
    async fn generate(&self, request: InferenceRequest) -> Result<RawScanResult, InferenceError> {
        *self.last_request.lock().unwrap() = Some(request);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.reply {
            Reply::Result(r) => Ok(r.clone()),
            Reply::Transient(m) => Err(InferenceError::Transient(m.clone())),
            Reply::SchemaInvalid(m) => Err(InferenceError::SchemaInvalid(m.clone())),
            Reply::Unknown(m) => Err(InferenceError::Unknown(m.clone())),
        }
    }

    fn adapter_name(&self) -> &'static str {
        "static"
    }
}
