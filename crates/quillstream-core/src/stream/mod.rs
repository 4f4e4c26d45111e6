//! Streaming relay — SSE-style event framing and incremental delivery.
//!
//! The relay issues a streaming chat-completion request, decodes the
//! response body line by line, extracts text deltas through the active
//! dialect adapter, and delivers them to a consumer over a per-call
//! channel. Every signal carries the request id allocated at dispatch, so
//! concurrent completions cannot cross-talk.

pub mod decoder;
pub mod relay;

pub use decoder::LineDecoder;
pub use relay::{RelayRequest, StreamRelay, collect_with_timeout};

use crate::types::RequestId;

/// Signals delivered to the consumer of one streaming completion.
///
/// Contract: zero or more `Chunk`s in source order, then exactly one of
/// `Complete` or `Error`. Nothing follows a terminal signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionSignal {
    /// An incremental text delta.
    Chunk { request_id: RequestId, text: String },
    /// The stream finished normally.
    Complete { request_id: RequestId },
    /// The stream failed; no further signals follow.
    Error {
        request_id: RequestId,
        message: String,
    },
}

impl CompletionSignal {
    /// The request this signal belongs to.
    pub fn request_id(&self) -> RequestId {
        match self {
            CompletionSignal::Chunk { request_id, .. }
            | CompletionSignal::Complete { request_id }
            | CompletionSignal::Error { request_id, .. } => *request_id,
        }
    }

    /// Whether this signal terminates the stream.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, CompletionSignal::Chunk { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_request_id() {
        let id = RequestId(7);
        let chunk = CompletionSignal::Chunk {
            request_id: id,
            text: "x".to_string(),
        };
        assert_eq!(chunk.request_id(), id);
        assert!(!chunk.is_terminal());
        assert!(CompletionSignal::Complete { request_id: id }.is_terminal());
        assert!(
            CompletionSignal::Error {
                request_id: id,
                message: "boom".to_string()
            }
            .is_terminal()
        );
    }
}
