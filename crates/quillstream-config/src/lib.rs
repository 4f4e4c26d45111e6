#![deny(unsafe_code)]

//! Configuration loading and validation for Quillstream.
//!
//! Loads TOML configuration files and validates them against expected schemas.
//! Provides the [`AppConfig`] type as the central configuration structure:
//! the list of AI providers with their models, the selected-model pointer,
//! and request-level tuning (client-side wait timeout, context token budget).

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

/// Top-level application configuration.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Configured AI providers.
    #[serde(default)]
    pub providers: Vec<AiProvider>,

    /// The provider/model pair requests are dispatched to.
    #[serde(default)]
    pub selected: Option<SelectedModel>,

    /// Request-level tuning.
    #[serde(default)]
    pub request: RequestConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// A configured AI provider endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiProvider {
    /// Unique provider identifier (e.g. "deepseek", "anthropic").
    pub id: String,

    /// Display name.
    #[serde(default)]
    pub name: String,

    /// Full chat-completion endpoint URL. The API dialect is detected
    /// from this URL's suffix, never configured directly.
    pub api_url: String,

    /// API key sent with every request.
    pub api_key: String,

    /// Whether this provider may be selected.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Models available on this provider.
    #[serde(default)]
    pub models: Vec<AiModel>,
}

/// A model offered by a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiModel {
    /// Model identifier as sent on the wire (e.g. "deepseek-chat").
    pub id: String,

    /// Display name. Defaults to the id.
    #[serde(default)]
    pub name: String,

    /// Generation parameters for this model.
    #[serde(default)]
    pub config: ModelConfig,
}

/// Generation parameters for a model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Maximum tokens to generate.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature (0.0–2.0).
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Whether streaming responses are requested for completion flows.
    #[serde(default = "default_true")]
    pub stream: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            stream: true,
        }
    }
}

fn default_max_tokens() -> u32 {
    150
}

fn default_temperature() -> f32 {
    1.0
}

fn default_true() -> bool {
    true
}

/// Pointer to the provider/model pair in use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedModel {
    pub provider_id: String,
    pub model_id: String,
}

/// Request-level tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestConfig {
    /// How long a caller waits for a streaming completion before giving up
    /// and keeping whatever partial output has arrived.
    #[serde(default = "default_wait_timeout_secs")]
    pub wait_timeout_secs: u64,

    /// Token budget for flat context assembly.
    #[serde(default = "default_context_budget")]
    pub context_budget_tokens: u32,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            wait_timeout_secs: default_wait_timeout_secs(),
            context_budget_tokens: default_context_budget(),
        }
    }
}

fn default_wait_timeout_secs() -> u64 {
    15
}

fn default_context_budget() -> u32 {
    2000
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g. "info", "debug", "trace").
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Load configuration from a TOML file at the given path using async I/O.
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = tokio::fs::read_to_string(path).await?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        tracing::debug!(
            path = %path.display(),
            providers = config.providers.len(),
            "configuration loaded"
        );
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen_ids = std::collections::HashSet::new();
        for (i, provider) in self.providers.iter().enumerate() {
            if provider.id.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "providers[{i}].id must not be empty"
                )));
            }
            if !seen_ids.insert(provider.id.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate provider id {:?}",
                    provider.id
                )));
            }
            if provider.api_url.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "providers[{i}].api_url must not be empty"
                )));
            }
            if provider.models.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "providers[{i}] must define at least one model"
                )));
            }
            for (j, model) in provider.models.iter().enumerate() {
                if model.id.is_empty() {
                    return Err(ConfigError::Validation(format!(
                        "providers[{i}].models[{j}].id must not be empty"
                    )));
                }
                if model.config.max_tokens == 0 {
                    return Err(ConfigError::Validation(format!(
                        "providers[{i}].models[{j}].config.max_tokens must be non-zero"
                    )));
                }
                if !(0.0..=2.0).contains(&model.config.temperature) {
                    return Err(ConfigError::Validation(format!(
                        "providers[{i}].models[{j}].config.temperature must be in [0.0, 2.0], got {}",
                        model.config.temperature
                    )));
                }
            }
        }

        if let Some(ref selected) = self.selected
            && self.find_model(selected).is_none()
        {
            return Err(ConfigError::Validation(format!(
                "selected model {}/{} does not match any configured provider/model",
                selected.provider_id, selected.model_id
            )));
        }

        if self.request.wait_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "request.wait_timeout_secs must be non-zero".to_string(),
            ));
        }
        if self.request.context_budget_tokens == 0 {
            return Err(ConfigError::Validation(
                "request.context_budget_tokens must be non-zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Resolve a selected-model pointer to its provider and model.
    ///
    /// Disabled providers never resolve.
    pub fn find_model(&self, selected: &SelectedModel) -> Option<(&AiProvider, &AiModel)> {
        let provider = self
            .providers
            .iter()
            .find(|p| p.enabled && p.id == selected.provider_id)?;
        let model = provider.models.iter().find(|m| m.id == selected.model_id)?;
        Some((provider, model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn sample_toml() -> &'static str {
        r#"
            [[providers]]
            id = "deepseek"
            name = "DeepSeek"
            api_url = "https://api.deepseek.com/chat/completions"
            api_key = "sk-test"

            [[providers.models]]
            id = "deepseek-chat"

            [selected]
            provider_id = "deepseek"
            model_id = "deepseek-chat"
        "#
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(config.providers.is_empty());
        assert!(config.selected.is_none());
        assert_eq!(config.request.wait_timeout_secs, 15);
        assert_eq!(config.request.context_budget_tokens, 2000);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_parse_minimal_toml() {
        let config = AppConfig::parse("").unwrap();
        assert!(config.providers.is_empty());
        assert_eq!(config.request.wait_timeout_secs, 15);
    }

    #[test]
    fn test_parse_full_toml() {
        let config = AppConfig::parse(sample_toml()).unwrap();
        assert_eq!(config.providers.len(), 1);
        assert_eq!(config.providers[0].id, "deepseek");
        assert!(config.providers[0].enabled);
        assert_eq!(config.providers[0].models[0].config.max_tokens, 150);
        assert_eq!(
            config.selected,
            Some(SelectedModel {
                provider_id: "deepseek".to_string(),
                model_id: "deepseek-chat".to_string(),
            })
        );
    }

    #[test]
    fn test_find_model() {
        let config = AppConfig::parse(sample_toml()).unwrap();
        let selected = config.selected.clone().unwrap();
        let (provider, model) = config.find_model(&selected).unwrap();
        assert_eq!(provider.id, "deepseek");
        assert_eq!(model.id, "deepseek-chat");
    }

    #[test]
    fn test_find_model_skips_disabled_provider() {
        let mut config = AppConfig::parse(sample_toml()).unwrap();
        config.providers[0].enabled = false;
        let selected = config.selected.clone().unwrap();
        assert!(config.find_model(&selected).is_none());
    }

    #[test]
    fn test_validation_rejects_empty_provider_id() {
        let toml = r#"
            [[providers]]
            id = ""
            api_url = "https://api.example.com/v1/chat/completions"
            api_key = "k"

            [[providers.models]]
            id = "m"
        "#;
        assert!(AppConfig::parse(toml).is_err());
    }

    #[test]
    fn test_validation_rejects_duplicate_provider_ids() {
        let toml = r#"
            [[providers]]
            id = "a"
            api_url = "https://one.example.com/v1/chat/completions"
            api_key = "k"

            [[providers.models]]
            id = "m"

            [[providers]]
            id = "a"
            api_url = "https://two.example.com/v1/chat/completions"
            api_key = "k"

            [[providers.models]]
            id = "m"
        "#;
        assert!(AppConfig::parse(toml).is_err());
    }

    #[test]
    fn test_validation_rejects_provider_without_models() {
        let toml = r#"
            [[providers]]
            id = "a"
            api_url = "https://api.example.com/v1/chat/completions"
            api_key = "k"
        "#;
        assert!(AppConfig::parse(toml).is_err());
    }

    #[test]
    fn test_validation_rejects_out_of_range_temperature() {
        let toml = r#"
            [[providers]]
            id = "a"
            api_url = "https://api.example.com/v1/chat/completions"
            api_key = "k"

            [[providers.models]]
            id = "m"
            config = { temperature = 2.5 }
        "#;
        assert!(AppConfig::parse(toml).is_err());
    }

    #[test]
    fn test_validation_rejects_dangling_selection() {
        let toml = r#"
            [selected]
            provider_id = "ghost"
            model_id = "ghost-1"
        "#;
        assert!(AppConfig::parse(toml).is_err());
    }

    #[test]
    fn test_validation_rejects_zero_timeout() {
        let toml = r#"
            [request]
            wait_timeout_secs = 0
        "#;
        assert!(AppConfig::parse(toml).is_err());
    }

    #[test_log::test(tokio::test)]
    async fn test_load_from_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("quillstream.toml");
        tokio::fs::write(&path, sample_toml()).await.unwrap();

        let config = AppConfig::load(&path).await.unwrap();
        assert_eq!(config.providers.len(), 1);
    }

    #[tokio::test]
    async fn test_load_nonexistent_file() {
        let result = AppConfig::load(Path::new("/nonexistent/file.toml")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_load_invalid_toml_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bad.toml");
        tokio::fs::write(&path, b"not valid toml [[[").await.unwrap();

        assert!(AppConfig::load(&path).await.is_err());
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Validation("bad value".to_string());
        assert_eq!(err.to_string(), "validation error: bad value");
    }
}
