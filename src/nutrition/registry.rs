use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use super::error::{InferenceError, RegistryError};
use super::inference::{InferenceAdapter, InferenceRequest, UserMessage};
use super::prompt::Prompt;
use super::types::{scan_output_schema, ImageReference, RawScanResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowName {
    FoodScan,
}

impl FlowName {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowName::FoodScan => "food-scan",
        }
    }
}

impl fmt::Display for FlowName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An inference pipeline bound to one output schema.
#[derive(Debug, Clone)]
pub struct Flow {
    name: FlowName,
    schema_name: &'static str,
    output_schema: serde_json::Value,
    adapter: Arc<dyn InferenceAdapter>,
}

impl Flow {
    pub fn food_scan(adapter: Arc<dyn InferenceAdapter>) -> Self {
        Self {
            name: FlowName::FoodScan,
            schema_name: "food_scan",
            output_schema: scan_output_schema(),
            adapter,
        }
    }

    pub fn name(&self) -> FlowName {
        self.name
    }

    /// Runs the model and enforces the output invariants on whatever it returns.
    pub async fn run(
        &self,
        prompt: Prompt,
        image: ImageReference,
    ) -> Result<RawScanResult, InferenceError> {
        let request = InferenceRequest {
            system_instructions: prompt.system_instructions,
            user_message: UserMessage {
                text: prompt.user_message,
                image,
            },
            schema_name: self.schema_name,
            output_schema: self.output_schema.clone(),
        };
        debug!(flow = %self.name, adapter = self.adapter.adapter_name(), "running flow");
        self.adapter.generate(request).await?.check_schema()
    }
}

#[derive(Debug, Default)]
pub struct FlowRegistryBuilder {
    flows: HashMap<FlowName, Flow>,
}

impl FlowRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, flow: Flow) -> Result<Self, RegistryError> {
        let name = flow.name();
        if self.flows.contains_key(&name) {
            return Err(RegistryError::Duplicate(name.to_string()));
        }
        self.flows.insert(name, flow);
        Ok(self)
    }

    pub fn build(self) -> FlowRegistry {
        FlowRegistry { flows: self.flows }
    }
}

/// Name to flow mapping, frozen before requests are served.
#[derive(Debug)]
pub struct FlowRegistry {
    flows: HashMap<FlowName, Flow>,
}

impl FlowRegistry {
    pub fn builder() -> FlowRegistryBuilder {
        FlowRegistryBuilder::new()
    }

    pub fn get(&self, name: FlowName) -> Result<&Flow, RegistryError> {
        self.flows
            .get(&name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }
}
