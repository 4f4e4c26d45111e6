//! OpenAI-style Chat Completions dialect.
//!
//! Covers both the `/v1/chat/completions` form and bare
//! `/chat/completions` endpoints (DeepSeek and other compatible
//! providers). Messages pass through unchanged; streamed deltas arrive
//! under `choices[0].delta.content`.

use serde_json::{Value, json};

use crate::types::{ChatMessage, RequestParams};

use super::DialectAdapter;

/// Adapter for OpenAI-compatible Chat Completions APIs.
pub struct OpenAiDialect;

impl DialectAdapter for OpenAiDialect {
    fn name(&self) -> &'static str {
        "openai-chat"
    }

    fn build_request_body(
        &self,
        messages: &[ChatMessage],
        model_id: &str,
        params: &RequestParams,
    ) -> Value {
        json!({
            "model": model_id,
            "messages": messages,
            "max_tokens": params.max_tokens,
            "temperature": params.temperature,
            "stream": params.stream,
        })
    }

    fn build_headers(&self, api_key: &str) -> Vec<(&'static str, String)> {
        vec![
            ("content-type", "application/json".to_string()),
            ("authorization", format!("Bearer {api_key}")),
        ]
    }

    fn extract_delta(&self, event: &Value) -> String {
        event
            .pointer("/choices/0/delta/content")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }

    fn extract_message_text(&self, response: &Value) -> String {
        response
            .pointer("/choices/0/message/content")
            .or_else(|| response.pointer("/content/0/text"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }
}
