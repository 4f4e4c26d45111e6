//! The streaming relay itself: HTTP dispatch, line handling, and the
//! client-side wait helper.

use std::time::Duration;

use futures_util::{Stream, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::dialect::ProviderDialect;
use crate::types::RequestId;

use super::CompletionSignal;
use super::decoder::LineDecoder;

/// SSE termination sentinel, per the OpenAI/DeepSeek streaming convention.
const DONE_SENTINEL: &str = "[DONE]";

/// Maximum response-body length echoed into error messages.
const ERROR_BODY_LIMIT: usize = 500;

/// Errors from a streaming relay call.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("API request failed: {status} - {body}")]
    Status { status: u16, body: String },

    #[error("network error: {0}")]
    Network(String),
}

/// One streaming request, fully formatted for the wire.
#[derive(Debug, Clone)]
pub struct RelayRequest {
    /// Correlation id stamped on every signal.
    pub request_id: RequestId,
    /// Full endpoint URL.
    pub url: String,
    /// Wire dialect of the endpoint.
    pub dialect: ProviderDialect,
    /// JSON request body (built with `stream: true`).
    pub body: serde_json::Value,
    /// Request headers.
    pub headers: Vec<(&'static str, String)>,
}

/// Outcome of handling one decoded line.
#[derive(Debug, PartialEq, Eq)]
enum LineOutcome {
    /// Non-empty text delta to relay.
    Delta(String),
    /// Termination sentinel seen.
    Done,
    /// Nothing to relay (blank line, non-data line, empty delta, or a
    /// malformed event that was logged and skipped).
    Skip,
}

/// Handle one decoded line of the streaming body.
///
/// Only `data:`-prefixed lines carry events; everything else (SSE
/// comments, `event:` lines, blanks) is skipped. Malformed JSON in an
/// individual event is logged and skipped, never fatal.
fn handle_line(line: &str, dialect: ProviderDialect) -> LineOutcome {
    let line = line.trim();
    let Some(payload) = line.strip_prefix("data:") else {
        return LineOutcome::Skip;
    };
    let payload = payload.trim();

    if payload == DONE_SENTINEL {
        return LineOutcome::Done;
    }
    if payload.is_empty() {
        return LineOutcome::Skip;
    }

    let event: serde_json::Value = match serde_json::from_str(payload) {
        Ok(event) => event,
        Err(e) => {
            let preview: String = payload.chars().take(100).collect();
            warn!(error = %e, payload = %preview, "skipping malformed stream event");
            return LineOutcome::Skip;
        }
    };

    let delta = dialect.extract_delta(&event);
    if delta.is_empty() {
        LineOutcome::Skip
    } else {
        LineOutcome::Delta(delta)
    }
}

/// Issues streaming requests and relays decoded deltas to a consumer.
#[derive(Debug, Clone, Default)]
pub struct StreamRelay {
    client: reqwest::Client,
}

impl StreamRelay {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Run one streaming completion, delivering signals on `tx`.
    ///
    /// Exactly one terminal signal is sent: `Complete` on the `[DONE]`
    /// sentinel or body exhaustion, `Error` on a non-2xx status or a read
    /// failure. If the consumer drops its receiver the relay stops
    /// silently.
    pub async fn run(&self, request: RelayRequest, tx: mpsc::Sender<CompletionSignal>) {
        let request_id = request.request_id;
        if let Err(e) = self.stream_events(request, &tx).await {
            let _ = tx
                .send(CompletionSignal::Error {
                    request_id,
                    message: e.to_string(),
                })
                .await;
        }
    }

    async fn stream_events(
        &self,
        request: RelayRequest,
        tx: &mpsc::Sender<CompletionSignal>,
    ) -> Result<(), RelayError> {
        debug!(request_id = %request.request_id, url = %request.url, dialect = %request.dialect, "starting streaming request");

        let mut http = self.client.post(&request.url);
        for (name, value) in &request.headers {
            http = http.header(*name, value);
        }

        let response = http
            .json(&request.body)
            .send()
            .await
            .map_err(|e| RelayError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RelayError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| RelayError::Network(e.to_string())));
        relay_body(stream, request.dialect, request.request_id, tx).await
    }
}

/// Decode a byte stream into signals. Separated from HTTP dispatch so
/// tests can feed byte chunks directly.
async fn relay_body<S>(
    mut stream: S,
    dialect: ProviderDialect,
    request_id: RequestId,
    tx: &mpsc::Sender<CompletionSignal>,
) -> Result<(), RelayError>
where
    S: Stream<Item = Result<bytes::Bytes, RelayError>> + Unpin,
{
    let mut decoder = LineDecoder::new();

    while let Some(chunk) = stream.next().await {
        decoder.push(&chunk?);

        while let Some(line) = decoder.next_line() {
            match handle_line(&line, dialect) {
                LineOutcome::Skip => {}
                LineOutcome::Delta(text) => {
                    if tx
                        .send(CompletionSignal::Chunk { request_id, text })
                        .await
                        .is_err()
                    {
                        debug!(%request_id, "consumer gone, abandoning relay");
                        return Ok(());
                    }
                }
                LineOutcome::Done => {
                    // Terminate immediately; buffered bytes past the
                    // sentinel are dropped.
                    decoder.mark_done();
                    debug!(%request_id, "received [DONE] sentinel");
                    let _ = tx.send(CompletionSignal::Complete { request_id }).await;
                    return Ok(());
                }
            }
        }
    }

    debug!(%request_id, "stream exhausted without sentinel");
    let _ = tx.send(CompletionSignal::Complete { request_id }).await;
    Ok(())
}

pub(crate) fn truncate_body(body: &str) -> String {
    if body.chars().count() <= ERROR_BODY_LIMIT {
        body.to_string()
    } else {
        body.chars().take(ERROR_BODY_LIMIT).collect()
    }
}

/// Wait for a completion to finish, keeping partial output on timeout.
///
/// Accumulates chunk text until the terminal signal. On `Complete` the
/// accumulated text is returned; on `Error` the partial output is
/// discarded (empty string); on timeout whatever arrived so far is kept
/// and the in-flight relay is abandoned, not aborted.
pub async fn collect_with_timeout(
    mut rx: mpsc::Receiver<CompletionSignal>,
    wait: Duration,
) -> String {
    let deadline = tokio::time::Instant::now() + wait;
    let mut accumulated = String::new();

    loop {
        match tokio::time::timeout_at(deadline, rx.recv()).await {
            Ok(Some(CompletionSignal::Chunk { text, .. })) => accumulated.push_str(&text),
            Ok(Some(CompletionSignal::Complete { request_id })) => {
                debug!(%request_id, length = accumulated.len(), "completion finished");
                return accumulated;
            }
            Ok(Some(CompletionSignal::Error {
                request_id,
                message,
            })) => {
                warn!(%request_id, error = %message, "completion failed");
                return String::new();
            }
            // Channel closed without a terminal signal; treat as complete.
            Ok(None) => return accumulated,
            Err(_) => {
                warn!(
                    partial = accumulated.len(),
                    "completion wait timed out, keeping partial output"
                );
                return accumulated;
            }
        }
    }
}
