//! Request orchestration.
//!
//! The orchestrator ties the subsystem together: it resolves the active
//! provider/model from the [`ConfigStore`], gathers context inputs from
//! the [`ContextStore`], builds dialect-specific payloads, and dispatches
//! either a one-shot request or a streaming relay. It is the sole boundary
//! where typed errors become [`ResponseEnvelope`] strings; everything
//! below it returns `Result`.
//!
//! Flow per invocation: resolve config, build context, dispatch, then
//! complete or fail. No retries; a failed invocation reports and stops.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use quillstream_config::{AiModel, AiProvider};

use crate::context::{ContextError, build_completion_messages, build_text_process_messages};
use crate::dialect::ProviderDialect;
use crate::knowledge::{CrossTabSnippet, KnowledgeEntry};
use crate::store::{ConfigStore, ContextStore, StoreError};
use crate::stream::relay::{RelayRequest, truncate_body};
use crate::stream::{CompletionSignal, StreamRelay, collect_with_timeout};
use crate::types::{ChatMessage, RequestId, RequestParams, ResponseEnvelope, TextAction};

/// Capacity of the per-call signal channel.
const SIGNAL_CHANNEL_CAPACITY: usize = 64;

const QUICK_PROMPT_PERSONA: &str = "You are Quill, a helpful and friendly AI writing assistant. Keep responses concise (under 100 words) and friendly. Use the provided reference information when relevant.";

/// Errors raised while orchestrating one request.
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    /// No usable provider/model selection exists.
    #[error("AI model configuration incomplete")]
    ConfigIncomplete,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Context(#[from] ContextError),

    /// Non-2xx response from the provider.
    #[error("API request failed: {status} - {body}")]
    Transport { status: u16, body: String },

    #[error("network error: {0}")]
    Network(String),
}

/// Everything resolved up front for one invocation.
#[derive(Debug)]
struct Resolved {
    provider: AiProvider,
    model: AiModel,
    dialect: ProviderDialect,
    entries: Vec<KnowledgeEntry>,
    snippets: Vec<CrossTabSnippet>,
}

/// Outcome of initiating a streaming completion.
///
/// The envelope covers initiation only. When initiation succeeded,
/// `signals` carries the per-call receiver and every signal on it is
/// stamped with `request_id`.
pub struct StreamedCompletion {
    pub envelope: ResponseEnvelope,
    pub request_id: RequestId,
    pub signals: Option<mpsc::Receiver<CompletionSignal>>,
}

/// Dispatches completion, transformation, and quick-prompt requests.
pub struct Orchestrator {
    config: Arc<dyn ConfigStore>,
    context: Arc<dyn ContextStore>,
    client: reqwest::Client,
    relay: StreamRelay,
    wait_timeout: Duration,
}

impl Orchestrator {
    pub fn new(
        config: Arc<dyn ConfigStore>,
        context: Arc<dyn ContextStore>,
        wait_timeout: Duration,
    ) -> Self {
        let client = reqwest::Client::new();
        let relay = StreamRelay::new(client.clone());
        Self {
            config,
            context,
            client,
            relay,
            wait_timeout,
        }
    }

    /// Resolve the active provider/model and context inputs.
    ///
    /// A missing selection, an unknown or disabled provider, or an unknown
    /// model all collapse into [`OrchestratorError::ConfigIncomplete`].
    async fn resolve(&self) -> Result<Resolved, OrchestratorError> {
        let providers = self.config.providers().await?;
        let selected = self
            .config
            .selected_model()
            .await?
            .ok_or(OrchestratorError::ConfigIncomplete)?;

        let provider = providers
            .iter()
            .find(|p| p.enabled && p.id == selected.provider_id)
            .ok_or(OrchestratorError::ConfigIncomplete)?;
        let model = provider
            .models
            .iter()
            .find(|m| m.id == selected.model_id)
            .ok_or(OrchestratorError::ConfigIncomplete)?;

        let dialect = ProviderDialect::detect(&provider.api_url);
        let entries = self.context.enabled_knowledge_entries().await?;
        let snippets = self.context.enabled_cross_tab_snippets().await?;

        debug!(
            provider = %provider.id,
            model = %model.id,
            %dialect,
            entries = entries.len(),
            snippets = snippets.len(),
            "resolved request configuration"
        );

        Ok(Resolved {
            provider: provider.clone(),
            model: model.clone(),
            dialect,
            entries,
            snippets,
        })
    }

    /// One-shot request/response cycle against the resolved provider.
    async fn dispatch_once(
        &self,
        resolved: &Resolved,
        messages: &[ChatMessage],
    ) -> Result<String, OrchestratorError> {
        let params = RequestParams {
            max_tokens: resolved.model.config.max_tokens,
            temperature: resolved.model.config.temperature,
            stream: false,
        };
        let body = resolved
            .dialect
            .build_request_body(messages, &resolved.model.id, &params);
        let headers = resolved.dialect.build_headers(&resolved.provider.api_key);

        let mut http = self.client.post(&resolved.provider.api_url);
        for (name, value) in &headers {
            http = http.header(*name, value);
        }

        let response = http
            .json(&body)
            .send()
            .await
            .map_err(|e| OrchestratorError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(OrchestratorError::Transport {
                status: status.as_u16(),
                body: truncate_body(&body_text),
            });
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| OrchestratorError::Network(e.to_string()))?;
        Ok(resolved.dialect.extract_message_text(&json).trim().to_string())
    }

    /// Transform a text selection with the given action.
    ///
    /// Non-streaming: one request, first choice extracted and trimmed.
    pub async fn process_text(
        &self,
        action: TextAction,
        selected_text: &str,
        custom_prompt: Option<&str>,
    ) -> ResponseEnvelope {
        let outcome = async {
            let resolved = self.resolve().await?;
            let messages = build_text_process_messages(
                action,
                selected_text,
                &resolved.entries,
                &resolved.snippets,
                custom_prompt,
            )?;
            self.dispatch_once(&resolved, &messages).await
        }
        .await;

        match outcome {
            Ok(result) => {
                info!(%action, length = result.len(), "text processing complete");
                ResponseEnvelope::ok(result)
            }
            Err(e) => {
                warn!(%action, error = %e, "text processing failed");
                ResponseEnvelope::failure(e.to_string())
            }
        }
    }

    /// One-shot assistant reply to a free-form prompt.
    ///
    /// Enabled knowledge entries and snippets are inlined into the user
    /// message as a labeled context suffix rather than riding as separate
    /// turns.
    pub async fn quick_prompt(&self, prompt: &str) -> ResponseEnvelope {
        let outcome = async {
            let resolved = self.resolve().await?;
            let suffix = inline_context_suffix(&resolved.entries, &resolved.snippets);
            let messages = vec![
                ChatMessage::system(QUICK_PROMPT_PERSONA),
                ChatMessage::user(format!("{prompt}{suffix}")),
            ];
            self.dispatch_once(&resolved, &messages).await
        }
        .await;

        match outcome {
            Ok(result) => {
                info!(length = result.len(), "quick prompt complete");
                ResponseEnvelope::ok(result)
            }
            Err(e) => {
                warn!(error = %e, "quick prompt failed");
                ResponseEnvelope::failure(e.to_string())
            }
        }
    }

    /// Start a streaming completion for the user's in-progress input.
    ///
    /// On success the relay runs in a background task; signals arrive on
    /// the returned receiver, each stamped with the returned request id.
    /// On failure the envelope explains and no receiver is returned.
    pub async fn stream_completion(&self, user_input: &str) -> StreamedCompletion {
        let request_id = RequestId::next();

        let resolved = match self.resolve().await {
            Ok(resolved) => resolved,
            Err(e) => {
                warn!(%request_id, error = %e, "completion initiation failed");
                return StreamedCompletion {
                    envelope: ResponseEnvelope::failure(e.to_string()),
                    request_id,
                    signals: None,
                };
            }
        };

        let messages =
            build_completion_messages(user_input, &resolved.entries, &resolved.snippets);
        let params = RequestParams {
            max_tokens: resolved.model.config.max_tokens,
            temperature: resolved.model.config.temperature,
            stream: true,
        };
        let body = resolved
            .dialect
            .build_request_body(&messages, &resolved.model.id, &params);
        let headers = resolved.dialect.build_headers(&resolved.provider.api_key);

        let request = RelayRequest {
            request_id,
            url: resolved.provider.api_url.clone(),
            dialect: resolved.dialect,
            body,
            headers,
        };

        let (tx, rx) = mpsc::channel(SIGNAL_CHANNEL_CAPACITY);
        let relay = self.relay.clone();
        tokio::spawn(async move {
            relay.run(request, tx).await;
        });

        info!(%request_id, provider = %resolved.provider.id, "streaming completion started");
        StreamedCompletion {
            envelope: ResponseEnvelope::accepted(),
            request_id,
            signals: Some(rx),
        }
    }

    /// Streaming completion collapsed to a blocking wait.
    ///
    /// Waits up to the configured timeout and returns whatever text
    /// accumulated; a timed-out wait keeps partial output.
    pub async fn complete_with_timeout(&self, user_input: &str) -> ResponseEnvelope {
        let started = self.stream_completion(user_input).await;
        let Some(rx) = started.signals else {
            return started.envelope;
        };
        let text = collect_with_timeout(rx, self.wait_timeout).await;
        ResponseEnvelope::ok(text.trim().to_string())
    }
}

/// Inline enabled context as a labeled suffix for the quick-prompt path.
fn inline_context_suffix(entries: &[KnowledgeEntry], snippets: &[CrossTabSnippet]) -> String {
    let mut parts: Vec<String> = Vec::new();

    if !entries.is_empty() {
        parts.push("\n[Knowledge Bases]".to_string());
        for (i, entry) in entries.iter().enumerate() {
            parts.push(format!("{}. {}:\n{}", i + 1, entry.title, entry.content));
        }
    }

    if !snippets.is_empty() {
        parts.push("\n[Cross-Tab Context]".to_string());
        for (i, snippet) in snippets.iter().enumerate() {
            parts.push(format!("{}. {}", i + 1, snippet.text));
        }
    }

    parts.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{AppConfigStore, StaticContextStore};
    use pretty_assertions::assert_eq;
    use quillstream_config::AppConfig;

    fn configured_store() -> AppConfigStore {
        let config = AppConfig::parse(
            r#"
            [[providers]]
            id = "anthropic"
            api_url = "https://api.anthropic.com/v1/messages"
            api_key = "sk-ant"

            [[providers.models]]
            id = "claude-3-5-haiku-latest"

            [selected]
            provider_id = "anthropic"
            model_id = "claude-3-5-haiku-latest"
            "#,
        )
        .unwrap();
        AppConfigStore::new(config)
    }

    fn orchestrator_with(config: AppConfigStore) -> Orchestrator {
        Orchestrator::new(
            Arc::new(config),
            Arc::new(StaticContextStore::default()),
            Duration::from_secs(15),
        )
    }

    #[test_log::test(tokio::test)]
    async fn test_resolve_detects_dialect() {
        let orchestrator = orchestrator_with(configured_store());
        let resolved = orchestrator.resolve().await.unwrap();
        assert_eq!(resolved.dialect, ProviderDialect::Claude);
        assert_eq!(resolved.provider.id, "anthropic");
        assert_eq!(resolved.model.id, "claude-3-5-haiku-latest");
    }

    #[tokio::test]
    async fn test_resolve_without_selection_fails() {
        let orchestrator = orchestrator_with(AppConfigStore::default());
        let err = orchestrator.resolve().await.unwrap_err();
        assert!(matches!(err, OrchestratorError::ConfigIncomplete));
        assert_eq!(err.to_string(), "AI model configuration incomplete");
    }

    #[tokio::test]
    async fn test_resolve_skips_disabled_provider() {
        let mut config = AppConfig::parse(
            r#"
            [[providers]]
            id = "deepseek"
            api_url = "https://api.deepseek.com/chat/completions"
            api_key = "k"

            [[providers.models]]
            id = "deepseek-chat"

            [selected]
            provider_id = "deepseek"
            model_id = "deepseek-chat"
            "#,
        )
        .unwrap();
        config.providers[0].enabled = false;

        let orchestrator = orchestrator_with(AppConfigStore::new(config));
        assert!(matches!(
            orchestrator.resolve().await,
            Err(OrchestratorError::ConfigIncomplete)
        ));
    }

    #[tokio::test]
    async fn test_process_text_reports_incomplete_config() {
        let orchestrator = orchestrator_with(AppConfigStore::default());
        let envelope = orchestrator
            .process_text(TextAction::Polish, "draft", None)
            .await;
        assert!(!envelope.success);
        assert_eq!(
            envelope.error.as_deref(),
            Some("AI model configuration incomplete")
        );
    }

    #[tokio::test]
    async fn test_process_text_custom_without_prompt_fails() {
        let orchestrator = orchestrator_with(configured_store());
        let envelope = orchestrator
            .process_text(TextAction::Custom, "selection", None)
            .await;
        assert!(!envelope.success);
        assert_eq!(
            envelope.error.as_deref(),
            Some("custom action requires a prompt")
        );
    }

    #[tokio::test]
    async fn test_quick_prompt_reports_incomplete_config() {
        let orchestrator = orchestrator_with(AppConfigStore::default());
        let envelope = orchestrator.quick_prompt("hello").await;
        assert!(!envelope.success);
    }

    #[tokio::test]
    async fn test_stream_completion_initiation_failure_has_no_receiver() {
        let orchestrator = orchestrator_with(AppConfigStore::default());
        let started = orchestrator.stream_completion("partial inp").await;
        assert!(!started.envelope.success);
        assert!(started.signals.is_none());
    }

    #[tokio::test]
    async fn test_stream_completions_get_distinct_request_ids() {
        let orchestrator = orchestrator_with(AppConfigStore::default());
        let a = orchestrator.stream_completion("one").await;
        let b = orchestrator.stream_completion("two").await;
        assert_ne!(a.request_id, b.request_id);
    }

    #[test]
    fn test_inline_context_suffix_empty() {
        assert_eq!(inline_context_suffix(&[], &[]), "");
    }

    #[test]
    fn test_inline_context_suffix_numbers_sections() {
        let entries = vec![KnowledgeEntry {
            id: "k1".to_string(),
            title: "Glossary".to_string(),
            content: "term".to_string(),
            enabled: true,
            created_at: 0,
            updated_at: 0,
            estimated_tokens: None,
        }];
        let snippets = vec![CrossTabSnippet {
            id: "s1".to_string(),
            text: "quoted".to_string(),
            source_url: String::new(),
            source_title: String::new(),
            timestamp: 0,
            enabled: true,
        }];

        let suffix = inline_context_suffix(&entries, &snippets);
        assert!(suffix.contains("[Knowledge Bases]\n1. Glossary:\nterm"));
        assert!(suffix.contains("[Cross-Tab Context]\n1. quoted"));
    }
}
