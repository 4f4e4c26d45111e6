//! Anthropic Messages API dialect.
//!
//! The Messages API carries the system prompt in a dedicated top-level
//! `system` field and frames streamed output as typed content-block
//! events rather than `choices` deltas.

use serde_json::{Value, json};

use crate::types::{ChatMessage, RequestParams};

use super::DialectAdapter;

const ANTHROPIC_API_VERSION: &str = "2023-06-01";

/// Adapter for the Anthropic Messages API.
pub struct ClaudeDialect;

impl DialectAdapter for ClaudeDialect {
    fn name(&self) -> &'static str {
        "claude"
    }

    fn build_request_body(
        &self,
        messages: &[ChatMessage],
        model_id: &str,
        params: &RequestParams,
    ) -> Value {
        // The first system message becomes the top-level system field;
        // every system message is excluded from the messages array.
        let system = messages
            .iter()
            .find(|m| m.role == "system")
            .map(|m| m.content.clone())
            .unwrap_or_default();

        let non_system: Vec<&ChatMessage> =
            messages.iter().filter(|m| m.role != "system").collect();

        json!({
            "model": model_id,
            "system": system,
            "messages": non_system,
            "max_tokens": params.max_tokens,
            "temperature": params.temperature,
            "stream": params.stream,
        })
    }

    fn build_headers(&self, api_key: &str) -> Vec<(&'static str, String)> {
        vec![
            ("content-type", "application/json".to_string()),
            ("x-api-key", api_key.to_string()),
            ("anthropic-version", ANTHROPIC_API_VERSION.to_string()),
        ]
    }

    fn extract_delta(&self, event: &Value) -> String {
        match event.get("type").and_then(Value::as_str) {
            Some("content_block_delta") => event
                .pointer("/delta/text")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            Some("content_block_start") => event
                .pointer("/content_block/text")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            // Lifecycle events (message_start, ping, message_stop, ...)
            // carry no text.
            _ => String::new(),
        }
    }

    fn extract_message_text(&self, response: &Value) -> String {
        response
            .pointer("/content/0/text")
            .or_else(|| response.pointer("/choices/0/message/content"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_body_hoists_system_message() {
        let messages = vec![ChatMessage::system("S"), ChatMessage::user("U")];
        let params = RequestParams {
            max_tokens: 10,
            temperature: 0.5,
            stream: false,
        };
        let body = ClaudeDialect.build_request_body(&messages, "m", &params);

        assert_eq!(body["model"], "m");
        assert_eq!(body["system"], "S");
        assert_eq!(body["max_tokens"], 10);
        assert_eq!(body["temperature"], 0.5);
        assert_eq!(body["stream"], false);

        let wire_messages = body["messages"].as_array().unwrap();
        assert_eq!(wire_messages.len(), 1);
        assert_eq!(wire_messages[0]["role"], "user");
        assert_eq!(wire_messages[0]["content"], "U");
    }

    #[test]
    fn test_body_without_system_message() {
        let messages = vec![ChatMessage::user("U"), ChatMessage::assistant("A")];
        let params = RequestParams {
            max_tokens: 100,
            temperature: 1.0,
            stream: true,
        };
        let body = ClaudeDialect.build_request_body(&messages, "m", &params);

        assert_eq!(body["system"], "");
        assert_eq!(body["messages"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_headers() {
        let headers = ClaudeDialect.build_headers("sk-ant-key");
        assert!(headers.contains(&("content-type", "application/json".to_string())));
        assert!(headers.contains(&("x-api-key", "sk-ant-key".to_string())));
        assert!(headers.contains(&("anthropic-version", "2023-06-01".to_string())));
    }

    #[test]
    fn test_extract_delta_from_block_delta() {
        let event = serde_json::json!({
            "type": "content_block_delta",
            "delta": { "text": "Hello" }
        });
        assert_eq!(ClaudeDialect.extract_delta(&event), "Hello");
    }

    #[test]
    fn test_extract_delta_from_block_start() {
        let event = serde_json::json!({
            "type": "content_block_start",
            "content_block": { "text": "Hi" }
        });
        assert_eq!(ClaudeDialect.extract_delta(&event), "Hi");
    }

    #[test]
    fn test_extract_delta_ignores_lifecycle_events() {
        for event_type in ["message_start", "message_delta", "message_stop", "ping"] {
            let event = serde_json::json!({ "type": event_type });
            assert_eq!(ClaudeDialect.extract_delta(&event), "");
        }
    }

    #[test]
    fn test_extract_delta_never_fails_on_malformed_shapes() {
        let shapes = [
            serde_json::json!({}),
            serde_json::json!({"type": "content_block_delta"}),
            serde_json::json!({"type": "content_block_delta", "delta": {}}),
            serde_json::json!({"type": "content_block_delta", "delta": {"text": 42}}),
            serde_json::json!([1, 2, 3]),
        ];
        for event in &shapes {
            assert_eq!(ClaudeDialect.extract_delta(event), "");
        }
    }

    #[test]
    fn test_extract_message_text() {
        let response = serde_json::json!({
            "content": [{ "type": "text", "text": "full reply" }]
        });
        assert_eq!(ClaudeDialect.extract_message_text(&response), "full reply");
    }

    #[test]
    fn test_extract_message_text_falls_back_to_choices() {
        let response = serde_json::json!({
            "choices": [{ "message": { "content": "alt shape" } }]
        });
        assert_eq!(ClaudeDialect.extract_message_text(&response), "alt shape");
    }
}
