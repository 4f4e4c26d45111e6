//! Configuration builders for tests.
//!
//! Use [`TestConfigBuilder`] to create customised [`AppConfig`] values without
//! repeating boilerplate across crate boundaries.

use std::path::PathBuf;

use quillstream_config::{AiModel, AiProvider, AppConfig, SelectedModel};
use tempfile::TempDir;

/// Fluent builder for [`AppConfig`] in tests.
///
/// # Example
///
/// ```ignore
/// let config = TestConfigBuilder::new()
///     .provider("deepseek", "https://api.deepseek.com/chat/completions", "deepseek-chat")
///     .select("deepseek", "deepseek-chat")
///     .build();
/// ```
pub struct TestConfigBuilder {
    config: AppConfig,
}

impl TestConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
        }
    }

    /// Add a provider with one model and a placeholder API key.
    pub fn provider(mut self, id: &str, api_url: &str, model_id: &str) -> Self {
        self.config.providers.push(AiProvider {
            id: id.to_string(),
            name: id.to_string(),
            api_url: api_url.to_string(),
            api_key: "sk-test".to_string(),
            enabled: true,
            models: vec![AiModel {
                id: model_id.to_string(),
                name: model_id.to_string(),
                config: Default::default(),
            }],
        });
        self
    }

    /// Point the selection at a provider/model pair.
    pub fn select(mut self, provider_id: &str, model_id: &str) -> Self {
        self.config.selected = Some(SelectedModel {
            provider_id: provider_id.to_string(),
            model_id: model_id.to_string(),
        });
        self
    }

    pub fn wait_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request.wait_timeout_secs = secs;
        self
    }

    pub fn context_budget_tokens(mut self, tokens: u32) -> Self {
        self.config.request.context_budget_tokens = tokens;
        self
    }

    pub fn log_level(mut self, level: &str) -> Self {
        self.config.logging.level = level.to_string();
        self
    }

    pub fn build(self) -> AppConfig {
        self.config
    }
}

impl Default for TestConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Write TOML content to a temporary config file.
///
/// Returns the temp directory (keep it alive for the file's lifetime)
/// and the file path.
pub async fn write_config_file(contents: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().join("quillstream.toml");
    tokio::fs::write(&path, contents)
        .await
        .expect("write config file");
    (dir, path)
}
