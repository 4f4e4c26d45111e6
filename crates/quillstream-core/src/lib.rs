#![deny(unsafe_code)]

//! Quillstream core — context assembly and streaming completion.
//!
//! This crate is the AI subsystem of a writing assistant. It assembles
//! token-budgeted prompt context from curated knowledge entries and
//! cross-tab snippets, normalizes requests across incompatible
//! chat-completion API dialects, and relays SSE-style streaming responses
//! to a consumer as incremental text deltas.

use std::future::Future;
use std::pin::Pin;

/// A type-erased, `Send`-safe, boxed future — the standard return type for async
/// trait methods that require dynamic dispatch (`dyn Trait`).
///
/// Native `async fn` in traits (stable since Rust 1.75) produces opaque return
/// types that are **not** object-safe. Traits consumed via `Box<dyn Trait>` or
/// `&dyn Trait` must return a concrete `Pin<Box<dyn Future>>` instead. This
/// alias keeps those signatures readable.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Context assembly — budgeted flat context and chat message scaffolds.
pub mod context;
/// Provider dialect detection, request formatting, and delta extraction.
pub mod dialect;
/// Knowledge entry and cross-tab snippet input types.
pub mod knowledge;
/// Request orchestration — config resolution, dispatch, and envelopes.
pub mod orchestrator;
/// External store collaborator traits and in-memory implementations.
pub mod store;
/// Streaming relay — line decoding, event framing, and signal delivery.
pub mod stream;
/// Heuristic token estimation and budget truncation.
pub mod token;
/// Shared vocabulary: chat messages, actions, envelopes, request ids.
pub mod types;

pub use orchestrator::{Orchestrator, OrchestratorError, StreamedCompletion};
pub use store::{ConfigStore, ContextStore, StoreError};
pub use stream::{CompletionSignal, StreamRelay};
pub use types::{ChatMessage, RequestId, ResponseEnvelope, TextAction};
