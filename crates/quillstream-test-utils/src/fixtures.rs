//! Context-input fixtures.
//!
//! Quick constructors for knowledge entries and cross-tab snippets, plus a
//! pre-populated in-memory context store.

use quillstream_core::knowledge::{CrossTabSnippet, KnowledgeEntry};
use quillstream_core::store::StaticContextStore;

/// An enabled knowledge entry with the given id, title, and content.
pub fn knowledge_entry(id: &str, title: &str, content: &str) -> KnowledgeEntry {
    KnowledgeEntry {
        id: id.to_string(),
        title: title.to_string(),
        content: content.to_string(),
        enabled: true,
        created_at: 1_700_000_000_000,
        updated_at: 1_700_000_000_000,
        estimated_tokens: None,
    }
}

/// An enabled cross-tab snippet with the given id, text, and page title.
pub fn snippet(id: &str, text: &str, source_title: &str) -> CrossTabSnippet {
    CrossTabSnippet {
        id: id.to_string(),
        text: text.to_string(),
        source_url: format!("https://example.com/{id}"),
        source_title: source_title.to_string(),
        timestamp: 1_700_000_000_000,
        enabled: true,
    }
}

/// A context store holding one entry and one snippet, both enabled.
pub fn sample_context_store() -> StaticContextStore {
    StaticContextStore::new(
        vec![knowledge_entry(
            "kb-style",
            "Style Guide",
            "Prefer short declarative sentences.",
        )],
        vec![snippet("tab-1", "The launch is planned for March.", "Roadmap")],
    )
}
