//! Read-only input types for context assembly.
//!
//! Knowledge entries and cross-tab snippets are owned by a persistent store
//! external to this crate; the core never creates or destroys them. The
//! surrounding system caps enabled knowledge entries at three — the
//! assembler re-applies that cap regardless.

use serde::{Deserialize, Serialize};

use crate::token::estimate_tokens;

/// Maximum number of knowledge entries included in any assembled context.
pub const MAX_ACTIVE_ENTRIES: usize = 3;

/// A user-curated knowledge base entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    /// Unique identifier.
    pub id: String,
    /// User-provided title.
    pub title: String,
    /// Entry content; may be long.
    pub content: String,
    /// Toggle state (at most three enabled at a time, enforced upstream).
    pub enabled: bool,
    /// Creation timestamp (epoch millis).
    #[serde(default)]
    pub created_at: u64,
    /// Last-update timestamp (epoch millis).
    #[serde(default)]
    pub updated_at: u64,
    /// Precomputed token estimate, when the store has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_tokens: Option<u32>,
}

impl KnowledgeEntry {
    /// Token cost of this entry: the precomputed estimate when present,
    /// otherwise estimated from the content.
    pub fn token_cost(&self) -> u32 {
        self.estimated_tokens
            .unwrap_or_else(|| estimate_tokens(&self.content))
    }
}

/// A text snippet collected from another browser tab.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossTabSnippet {
    /// Unique identifier.
    pub id: String,
    /// The selected text.
    pub text: String,
    /// URL of the source page.
    #[serde(default)]
    pub source_url: String,
    /// Title of the source page.
    #[serde(default)]
    pub source_title: String,
    /// Collection timestamp (epoch millis).
    #[serde(default)]
    pub timestamp: u64,
    /// Whether the snippet participates in context assembly.
    pub enabled: bool,
}

impl CrossTabSnippet {
    /// Label used when citing this snippet: the page title, falling back
    /// to the URL.
    pub fn source_label(&self) -> &str {
        if self.source_title.is_empty() {
            &self.source_url
        } else {
            &self.source_title
        }
    }
}
