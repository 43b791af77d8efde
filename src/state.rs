use std::sync::Arc;

use crate::config::AppConfig;
use crate::nutrition::inference::{InferenceAdapter, OpenAiAdapter, OpenAiSettings};
use crate::nutrition::mock::MockNutritionService;
use crate::nutrition::registry::{Flow, FlowRegistry};
use crate::nutrition::service::{FoodScanner, NutritionService};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub scanner: Arc<dyn FoodScanner>,
}

impl AppState {
    pub fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        if config.mock_nutrition {
            tracing::warn!("DEV_MOCK_NUTRITION enabled; scans return a fixed example report");
            let scanner = Arc::new(MockNutritionService) as Arc<dyn FoodScanner>;
            return Ok(Self::from_parts(config, scanner));
        }

        let inference = &config.inference;
        let adapter = Arc::new(OpenAiAdapter::new(OpenAiSettings {
            base_url: inference.base_url.clone(),
            api_key: inference.api_key.clone().unwrap_or_default(),
            model: inference.model.clone(),
            http_timeout: inference.http_timeout,
        })?) as Arc<dyn InferenceAdapter>;
        tracing::info!(model = %inference.model, base_url = %inference.base_url, "inference adapter ready");

        let scanner = Arc::new(NutritionService::new(Arc::new(flow_registry(adapter)?)));
        Ok(Self::from_parts(config, scanner))
    }

    pub fn from_parts(config: Arc<AppConfig>, scanner: Arc<dyn FoodScanner>) -> Self {
        Self { config, scanner }
    }
}

/// Every flow the service knows, registered once.
pub fn flow_registry(adapter: Arc<dyn InferenceAdapter>) -> anyhow::Result<FlowRegistry> {
    Ok(FlowRegistry::builder()
        .register(Flow::food_scan(adapter))?
        .build())
}

#[cfg(test)]
impl AppState {
    fn test_config() -> Arc<AppConfig> {
        use std::time::Duration;

        Arc::new(AppConfig {
            host: "127.0.0.1".into(),
            port: 0,
            cors_origins: vec!["http://localhost:3000".into()],
            shutdown_timeout: Duration::from_secs(1),
            scan_timeout: Duration::from_secs(5),
            mock_nutrition: true,
            inference: crate::config::InferenceConfig {
                base_url: "http://fake.local".into(),
                api_key: None,
                model: "fake".into(),
                http_timeout: Duration::from_secs(1),
            },
        })
    }

    /// State backed by the mock responder.
    pub fn fake() -> Self {
        Self::from_parts(Self::test_config(), Arc::new(MockNutritionService))
    }

    /// State running the real pipeline against the given adapter.
    pub fn with_adapter(adapter: Arc<dyn InferenceAdapter>) -> Self {
        let registry = flow_registry(adapter).expect("registry builds");
        let scanner = Arc::new(NutritionService::new(Arc::new(registry)));
        Self::from_parts(Self::test_config(), scanner)
    }
}
