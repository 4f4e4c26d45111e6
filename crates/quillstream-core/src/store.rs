//! Store collaborator traits.
//!
//! The orchestrator reads provider configuration and context inputs
//! through these traits so the persistence layer stays swappable: the CLI
//! backs them with TOML files, tests with in-memory fixtures. Methods
//! return [`BoxFuture`] so the traits stay object-safe behind `Arc<dyn _>`.

use quillstream_config::{AiProvider, AppConfig, SelectedModel};

use crate::BoxFuture;
use crate::knowledge::{CrossTabSnippet, KnowledgeEntry};

/// Errors surfaced by a store backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Read access to provider configuration.
pub trait ConfigStore: Send + Sync {
    /// All configured providers, enabled or not.
    fn providers(&self) -> BoxFuture<'_, Result<Vec<AiProvider>, StoreError>>;

    /// The provider/model pair requests should be dispatched to, if any
    /// has been selected.
    fn selected_model(&self) -> BoxFuture<'_, Result<Option<SelectedModel>, StoreError>>;
}

/// Read access to context-assembly inputs.
pub trait ContextStore: Send + Sync {
    /// Knowledge entries currently toggled on, in store order.
    fn enabled_knowledge_entries(&self) -> BoxFuture<'_, Result<Vec<KnowledgeEntry>, StoreError>>;

    /// Cross-tab snippets currently toggled on, in collection order.
    fn enabled_cross_tab_snippets(&self)
    -> BoxFuture<'_, Result<Vec<CrossTabSnippet>, StoreError>>;
}

/// [`ConfigStore`] backed by a loaded [`AppConfig`].
#[derive(Debug, Clone, Default)]
pub struct AppConfigStore {
    config: AppConfig,
}

impl AppConfigStore {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }
}

impl ConfigStore for AppConfigStore {
    fn providers(&self) -> BoxFuture<'_, Result<Vec<AiProvider>, StoreError>> {
        Box::pin(async move { Ok(self.config.providers.clone()) })
    }

    fn selected_model(&self) -> BoxFuture<'_, Result<Option<SelectedModel>, StoreError>> {
        Box::pin(async move { Ok(self.config.selected.clone()) })
    }
}

/// [`ContextStore`] over fixed in-memory collections.
///
/// Holds whatever it is given; the enabled filter is applied on read.
#[derive(Debug, Clone, Default)]
pub struct StaticContextStore {
    entries: Vec<KnowledgeEntry>,
    snippets: Vec<CrossTabSnippet>,
}

impl StaticContextStore {
    pub fn new(entries: Vec<KnowledgeEntry>, snippets: Vec<CrossTabSnippet>) -> Self {
        Self { entries, snippets }
    }
}

impl ContextStore for StaticContextStore {
    fn enabled_knowledge_entries(&self) -> BoxFuture<'_, Result<Vec<KnowledgeEntry>, StoreError>> {
        Box::pin(async move {
            Ok(self
                .entries
                .iter()
                .filter(|e| e.enabled)
                .cloned()
                .collect())
        })
    }

    fn enabled_cross_tab_snippets(
        &self,
    ) -> BoxFuture<'_, Result<Vec<CrossTabSnippet>, StoreError>> {
        Box::pin(async move {
            Ok(self
                .snippets
                .iter()
                .filter(|s| s.enabled)
                .cloned()
                .collect())
        })
    }
}
