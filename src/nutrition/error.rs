use std::fmt;

use thiserror::Error;

/// Placeholder rendered instead of the image payload in any error context.
pub const OMITTED: &str = "<omitted>";

/// Client-caused failure, safe to show to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
    pub field: &'static str,
    pub location: &'static str,
    pub value: &'static str,
}

impl ValidationError {
    /// Error on a request body field; the offending value is never echoed back.
    pub fn body_field(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            field,
            location: "request.body",
            value: OMITTED,
        }
    }
}

/// Classified failure of the inference adapter.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("transient inference failure: {0}")]
    Transient(String),

    #[error("inference output failed schema: {0}")]
    SchemaInvalid(String),

    #[error("inference failed: {0}")]
    Unknown(String),
}

impl InferenceError {
    pub fn kind(&self) -> &'static str {
        match self {
            InferenceError::Transient(_) => "transient",
            InferenceError::SchemaInvalid(_) => "schema-invalid",
            InferenceError::Unknown(_) => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("flow not found: {0}")]
    NotFound(String),

    #[error("flow registered twice: {0}")]
    Duplicate(String),
}

/// Position of a scan in its linear lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStage {
    Prompting,
    Inferring,
    Validating,
    Aggregating,
    Done,
    Failed,
}

impl fmt::Display for ScanStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScanStage::Prompting => "prompting",
            ScanStage::Inferring => "inferring",
            ScanStage::Validating => "validating",
            ScanStage::Aggregating => "aggregating",
            ScanStage::Done => "done",
            ScanStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum ScanErrorKind {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("deadline of {0:?} exceeded")]
    DeadlineExceeded(std::time::Duration),
}

/// Error returned by a scan, tagged with the stage that failed.
#[derive(Debug, Error)]
#[error("scan failed while {stage}: {kind}")]
pub struct ScanError {
    pub stage: ScanStage,
    #[source]
    pub kind: ScanErrorKind,
}

impl ScanError {
    pub fn new(stage: ScanStage, kind: impl Into<ScanErrorKind>) -> Self {
        Self {
            stage,
            kind: kind.into(),
        }
    }

    /// Only validation failures are the caller's fault.
    pub fn is_client_error(&self) -> bool {
        matches!(self.kind, ScanErrorKind::Validation(_))
    }

    pub fn validation(&self) -> Option<&ValidationError> {
        match &self.kind {
            ScanErrorKind::Validation(v) => Some(v),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_carries_stage() {
        let err = ScanError::new(
            ScanStage::Inferring,
            InferenceError::Transient("503 from upstream".into()),
        );
        let msg = err.to_string();
        assert!(msg.contains("inferring"));
        assert!(msg.contains("503 from upstream"));
        assert!(!err.is_client_error());
        assert!(err.validation().is_none());
    }

    #[test]
    fn validation_is_client_error() {
        let err = ScanError::new(
            ScanStage::Validating,
            ValidationError::body_field("image", "not food"),
        );
        assert!(err.is_client_error());
        assert_eq!(err.validation().unwrap().value, OMITTED);
    }

    #[test]
    fn inference_kinds() {
        assert_eq!(InferenceError::Transient(String::new()).kind(), "transient");
        assert_eq!(
            InferenceError::SchemaInvalid(String::new()).kind(),
            "schema-invalid"
        );
        assert_eq!(InferenceError::Unknown(String::new()).kind(), "unknown");
    }
}
