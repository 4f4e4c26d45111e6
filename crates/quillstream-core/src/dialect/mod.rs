//! Provider dialect adapters — request formatting and delta extraction
//! across incompatible chat-completion API families.
//!
//! Three wire dialects are supported through a closed [`ProviderDialect`]
//! tag, each backed by a [`DialectAdapter`] implementation:
//!
//! - **Claude** — the Anthropic Messages API (`/v1/messages`)
//! - **OpenAI chat** — DeepSeek-style bare `/chat/completions` endpoints
//! - **OpenAI completions** — `/v1/chat/completions`, also the safe
//!   fallback for unrecognized endpoints
//!
//! The two OpenAI-style tags share one adapter; they differ only in how
//! they are detected. New dialects are added as a variant plus an adapter,
//! never by editing a shared branch.

pub mod claude;
pub mod openai;

pub use claude::ClaudeDialect;
pub use openai::OpenAiDialect;

use serde_json::Value;

use crate::types::{ChatMessage, RequestParams};

/// Formatting and extraction hooks for one wire dialect.
///
/// Implementations are stateless; all methods are pure functions of their
/// inputs. `extract_delta` and `extract_message_text` must never fail —
/// any shape mismatch resolves to an empty string and the caller decides
/// whether to log.
pub trait DialectAdapter: Send + Sync {
    /// Dialect display name for logs.
    fn name(&self) -> &'static str;

    /// Build the JSON request body for this dialect.
    fn build_request_body(
        &self,
        messages: &[ChatMessage],
        model_id: &str,
        params: &RequestParams,
    ) -> Value;

    /// Build the request headers for this dialect.
    ///
    /// Always includes `content-type: application/json`.
    fn build_headers(&self, api_key: &str) -> Vec<(&'static str, String)>;

    /// Extract the text delta from one streamed JSON event.
    fn extract_delta(&self, event: &Value) -> String;

    /// Extract the full text from a one-shot (non-streaming) response.
    fn extract_message_text(&self, response: &Value) -> String;
}

/// The wire dialect of a provider, detected once from its base URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderDialect {
    /// Anthropic Messages API.
    Claude,
    /// Bare `/chat/completions` endpoints (DeepSeek convention).
    OpenAiChat,
    /// `/v1/chat/completions` endpoints; also the fallback.
    OpenAiCompletions,
}

impl ProviderDialect {
    /// Detect the dialect from a provider base URL.
    ///
    /// Case-insensitive suffix match on the trimmed URL. Unrecognized
    /// URLs fall back to [`ProviderDialect::OpenAiCompletions`]. Pure and
    /// idempotent.
    pub fn detect(base_url: &str) -> Self {
        let url = base_url.trim().to_ascii_lowercase();

        if url.ends_with("/v1/messages") {
            ProviderDialect::Claude
        } else if url.ends_with("/v1/chat/completions") {
            ProviderDialect::OpenAiCompletions
        } else if url.ends_with("/chat/completions") {
            ProviderDialect::OpenAiChat
        } else {
            ProviderDialect::OpenAiCompletions
        }
    }

    /// The adapter implementing this dialect.
    pub fn adapter(&self) -> &'static dyn DialectAdapter {
        match self {
            ProviderDialect::Claude => &ClaudeDialect,
            ProviderDialect::OpenAiChat | ProviderDialect::OpenAiCompletions => &OpenAiDialect,
        }
    }

    pub fn build_request_body(
        &self,
        messages: &[ChatMessage],
        model_id: &str,
        params: &RequestParams,
    ) -> Value {
        self.adapter().build_request_body(messages, model_id, params)
    }

    pub fn build_headers(&self, api_key: &str) -> Vec<(&'static str, String)> {
        self.adapter().build_headers(api_key)
    }

    pub fn extract_delta(&self, event: &Value) -> String {
        self.adapter().extract_delta(event)
    }

    pub fn extract_message_text(&self, response: &Value) -> String {
        self.adapter().extract_message_text(response)
    }
}

impl std::fmt::Display for ProviderDialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.adapter().name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_claude() {
        assert_eq!(
            ProviderDialect::detect("https://api.anthropic.com/v1/messages"),
            ProviderDialect::Claude
        );
    }

    #[test]
    fn test_detect_bare_chat_completions() {
        assert_eq!(
            ProviderDialect::detect("https://api.deepseek.com/chat/completions"),
            ProviderDialect::OpenAiChat
        );
    }

    #[test]
    fn test_detect_v1_chat_completions() {
        assert_eq!(
            ProviderDialect::detect("https://api.openai.com/v1/chat/completions"),
            ProviderDialect::OpenAiCompletions
        );
    }

    #[test]
    fn test_detect_falls_back_on_unknown() {
        assert_eq!(
            ProviderDialect::detect(""),
            ProviderDialect::OpenAiCompletions
        );
        assert_eq!(
            ProviderDialect::detect("https://example.com/generate"),
            ProviderDialect::OpenAiCompletions
        );
    }

    #[test]
    fn test_detect_is_case_insensitive_and_trims() {
        assert_eq!(
            ProviderDialect::detect("  https://API.Anthropic.com/V1/Messages  "),
            ProviderDialect::Claude
        );
    }

    #[test]
    fn test_detect_is_idempotent() {
        let url = "https://api.deepseek.com/chat/completions";
        assert_eq!(ProviderDialect::detect(url), ProviderDialect::detect(url));
    }
}
