//! Common types shared across the Quillstream core.
//!
//! These types define the vocabulary for chat completions, text actions,
//! response envelopes, and per-request correlation ids.

use serde::{Deserialize, Serialize};

/// A chat message in a conversation.
///
/// Order is semantically meaningful: earlier messages are earlier
/// conversational turns or injected context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role: "system", "user", or "assistant".
    pub role: String,
    /// Text content of the message.
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Text transformation actions supported by the processing flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAction {
    Polish,
    Correct,
    Simplify,
    Expand,
    Translate,
    /// Caller supplies the instruction; the selection becomes a labeled
    /// context block rather than the primary subject.
    Custom,
}

impl TextAction {
    /// All non-custom actions, in display order.
    pub const BUILT_IN: [TextAction; 5] = [
        TextAction::Polish,
        TextAction::Correct,
        TextAction::Simplify,
        TextAction::Expand,
        TextAction::Translate,
    ];
}

impl std::str::FromStr for TextAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "polish" => Ok(TextAction::Polish),
            "correct" => Ok(TextAction::Correct),
            "simplify" => Ok(TextAction::Simplify),
            "expand" => Ok(TextAction::Expand),
            "translate" => Ok(TextAction::Translate),
            "custom" => Ok(TextAction::Custom),
            other => Err(format!("unknown text action: {other:?}")),
        }
    }
}

impl std::fmt::Display for TextAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TextAction::Polish => "polish",
            TextAction::Correct => "correct",
            TextAction::Simplify => "simplify",
            TextAction::Expand => "expand",
            TextAction::Translate => "translate",
            TextAction::Custom => "custom",
        };
        f.write_str(name)
    }
}

/// Generation parameters carried on every wire request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RequestParams {
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature (0.0–2.0).
    pub temperature: f32,
    /// Whether a streaming response is requested.
    pub stream: bool,
}

/// The uniform contract every orchestrator entry point returns.
///
/// For streaming flows the envelope covers only the initiation phase;
/// incremental output is delivered via [`crate::stream::CompletionSignal`]s.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResponseEnvelope {
    pub fn ok(result: impl Into<String>) -> Self {
        Self {
            success: true,
            result: Some(result.into()),
            error: None,
        }
    }

    /// An accepted streaming initiation: success with no inline result,
    /// output arrives incrementally.
    pub fn accepted() -> Self {
        Self {
            success: true,
            result: None,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(error.into()),
        }
    }
}

/// Correlation id allocated per orchestrator invocation.
///
/// Every streaming signal carries the id of the request that produced it,
/// so concurrent completions cannot cross-talk at the consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub u64);

impl RequestId {
    /// Allocate the next request id.
    pub fn next() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "req-{}", self.0)
    }
}
