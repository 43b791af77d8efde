use std::time::Duration;

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct InferenceConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub http_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub shutdown_timeout: Duration,
    pub scan_timeout: Duration,
    pub mock_nutrition: bool,
    pub inference: InferenceConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let secs = |key: &str, default: u64| -> anyhow::Result<Duration> {
            match get(key) {
                Some(v) => Ok(Duration::from_secs(
                    v.trim().parse().with_context(|| format!("{} must be seconds", key))?,
                )),
                None => Ok(Duration::from_secs(default)),
            }
        };

        let port: u16 = match get("APP_PORT") {
            Some(v) => v.trim().parse().context("APP_PORT must be a port number")?,
            None => 8080,
        };
        let cors_origins = get("CORS_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_else(|| vec!["http://localhost:3000".to_string()]);
        let mock_nutrition = get("DEV_MOCK_NUTRITION")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let inference = InferenceConfig {
            base_url: get("INFERENCE_BASE_URL")
                .unwrap_or_else(|| "https://api.openai.com/v1".into()),
            api_key: get("INFERENCE_API_KEY").filter(|k| !k.is_empty()),
            model: get("INFERENCE_MODEL").unwrap_or_else(|| "gpt-4o-mini".into()),
            http_timeout: secs("INFERENCE_HTTP_TIMEOUT_SECS", 90)?,
        };

        if !mock_nutrition && inference.api_key.is_none() {
            anyhow::bail!("INFERENCE_API_KEY is required unless DEV_MOCK_NUTRITION is enabled");
        }

        Ok(Self {
            host: get("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            cors_origins,
            shutdown_timeout: secs("SHUTDOWN_TIMEOUT_SECS", 60)?,
            scan_timeout: secs("SCAN_TIMEOUT_SECS", 60)?,
            mock_nutrition,
            inference,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<AppConfig> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_with_mock() {
        let cfg = load(&[("DEV_MOCK_NUTRITION", "true")]).unwrap();
        assert!(cfg.mock_nutrition);
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.cors_origins, vec!["http://localhost:3000"]);
        assert_eq!(cfg.shutdown_timeout, Duration::from_secs(60));
        assert_eq!(cfg.scan_timeout, Duration::from_secs(60));
        assert_eq!(cfg.inference.model, "gpt-4o-mini");
    }

    #[test]
    fn api_key_required_without_mock() {
        let err = load(&[]).unwrap_err();
        assert!(err.to_string().contains("INFERENCE_API_KEY"));

        let cfg = load(&[("INFERENCE_API_KEY", "sk-test")]).unwrap();
        assert!(!cfg.mock_nutrition);
        assert_eq!(cfg.inference.api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn parses_lists_and_durations() {
        let cfg = load(&[
            ("DEV_MOCK_NUTRITION", "1"),
            ("CORS_ORIGINS", "http://a.test, http://b.test,"),
            ("SCAN_TIMEOUT_SECS", "15"),
            ("APP_PORT", "9000"),
        ])
        .unwrap();
        assert_eq!(cfg.cors_origins, vec!["http://a.test", "http://b.test"]);
        assert_eq!(cfg.scan_timeout, Duration::from_secs(15));
        assert_eq!(cfg.port, 9000);
    }

    #[test]
    fn rejects_bad_numbers() {
        assert!(load(&[("DEV_MOCK_NUTRITION", "true"), ("APP_PORT", "http")]).is_err());
        assert!(load(&[("DEV_MOCK_NUTRITION", "true"), ("SCAN_TIMEOUT_SECS", "-1")]).is_err());
    }
}
