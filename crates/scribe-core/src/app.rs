use std::path::Path;
use std::sync::Arc;

use tokio::sync::Mutex;

use scribe_index::indexer::{IndexReport, IndexerConfig, NotesIndexer};
use scribe_index::{IndexHandle, Result as IndexResult, Retriever, SearchResult};
use scribe_llm::any::AnyProvider;
use scribe_llm::provider::{ChatOptions, Message};

use crate::agent::{Agent, AgentError, AgentReply};
use crate::config::Config;
use crate::tools::NotesSearchExecutor;

/// Per-request generation overrides; unset fields fall back to config.
#[derive(Debug, Clone, Default)]
pub struct ChatOverrides {
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

/// Everything a request handler needs, built once at startup.
pub struct AppContext {
    pub config: Arc<Config>,
    pub provider: Arc<AnyProvider>,
    pub index: IndexHandle,
    reindex_lock: Mutex<()>,
}

impl AppContext {
    #[must_use]
    pub fn new(config: Config, provider: AnyProvider) -> Self {
        Self {
            config: Arc::new(config),
            provider: Arc::new(provider),
            index: IndexHandle::new(),
            reindex_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn retriever(&self) -> Retriever<AnyProvider> {
        Retriever::from_provider(
            Arc::clone(&self.provider),
            self.config.llm.embed_batch_size,
            self.index.clone(),
        )
    }

    #[must_use]
    pub fn agent(&self) -> Agent<AnyProvider, NotesSearchExecutor<AnyProvider>> {
        let executor = NotesSearchExecutor::new(self.retriever(), self.config.agent.max_results);
        Agent::new(
            Arc::clone(&self.provider),
            executor,
            self.config.agent.max_iterations,
        )
    }

    #[must_use]
    pub fn chat_options(&self, overrides: &ChatOverrides) -> ChatOptions {
        ChatOptions {
            model: Some(
                overrides
                    .model
                    .clone()
                    .unwrap_or_else(|| self.config.llm.chat_model.clone()),
            ),
            temperature: overrides.temperature.unwrap_or(self.config.llm.temperature),
            max_tokens: overrides.max_tokens.or(self.config.llm.max_tokens),
        }
    }

    /// Direct semantic search, no agent involved.
    ///
    /// # Errors
    ///
    /// Propagates retrieval errors, including `IndexNotLoaded`.
    pub async fn query(&self, query: &str, max_results: Option<usize>) -> IndexResult<Vec<SearchResult>> {
        let max_results = max_results.unwrap_or(self.config.agent.max_results);
        self.retriever().retrieve(query, max_results).await
    }

    /// Run the agent loop over `history`.
    ///
    /// # Errors
    ///
    /// Returns `AgentError::Llm` if a chat call fails.
    pub async fn chat(
        &self,
        history: Vec<Message>,
        overrides: &ChatOverrides,
    ) -> Result<AgentReply, AgentError> {
        self.agent()
            .run(history, &self.chat_options(overrides))
            .await
    }

    /// Replace the served pair with the one on disk.
    ///
    /// # Errors
    ///
    /// Propagates artifact load errors; the current pair stays in place.
    pub async fn reload_index(&self) -> IndexResult<()> {
        self.index
            .reload(&self.config.index_path(), &self.config.metadata_path())
            .await
    }

    /// Rebuild from the configured notes folder, persist, and swap the new
    /// pair in. Concurrent rebuilds run one at a time.
    ///
    /// # Errors
    ///
    /// Propagates indexing and persistence errors; the served pair is only
    /// replaced after the new one is on disk.
    pub async fn reindex(&self) -> IndexResult<IndexReport> {
        let folder = Path::new(&self.config.index.notes_dir);
        self.rebuild(folder, self.config.indexer_config()).await
    }

    /// [`reindex`](Self::reindex) over an arbitrary folder with explicit
    /// chunking settings. Only the CLI reaches this.
    ///
    /// # Errors
    ///
    /// See [`reindex`](Self::reindex).
    pub async fn rebuild(&self, folder: &Path, config: IndexerConfig) -> IndexResult<IndexReport> {
        let _guard = self.reindex_lock.lock().await;
        let indexer = NotesIndexer::from_provider(
            Arc::clone(&self.provider),
            self.config.llm.embed_batch_size,
            config,
        );
        let (loaded, report) = indexer
            .build_and_persist(folder, &self.config.index_path(), &self.config.metadata_path())
            .await?;
        if let Some(loaded) = loaded {
            self.index.replace(loaded);
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use scribe_index::IndexError;
    use scribe_llm::mock::MockProvider;

    use super::*;

    fn context(dir: &Path) -> AppContext {
        let mut config = Config::default();
        config.index.index_path = dir.join("n.index").to_string_lossy().into_owned();
        config.index.metadata_path = dir.join("n.json").to_string_lossy().into_owned();
        config.index.notes_dir = dir.join("notes").to_string_lossy().into_owned();
        AppContext::new(config, AnyProvider::Mock(MockProvider::default()))
    }

    #[tokio::test]
    async fn query_before_indexing_is_not_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());
        assert!(matches!(
            ctx.query("x", None).await,
            Err(IndexError::IndexNotLoaded)
        ));
    }

    #[tokio::test]
    async fn reindex_swaps_in_new_pair() {
        let dir = tempfile::tempdir().unwrap();
        let notes = dir.path().join("notes");
        std::fs::create_dir_all(&notes).unwrap();
        std::fs::write(notes.join("a.md"), "tokio runtime notes").unwrap();

        let ctx = context(dir.path());
        let report = ctx.reindex().await.unwrap();
        assert_eq!(report.chunks, 1);
        assert_eq!(ctx.index.counts(), (1, 1));

        let hits = ctx.query("tokio runtime notes", Some(3)).await.unwrap();
        assert_eq!(hits.len(), 1);

        let fresh = context(dir.path());
        fresh.reload_index().await.unwrap();
        assert_eq!(fresh.index.counts(), (1, 1));
    }

    #[tokio::test]
    async fn empty_reindex_keeps_current_pair() {
        let dir = tempfile::tempdir().unwrap();
        let notes = dir.path().join("notes");
        std::fs::create_dir_all(&notes).unwrap();
        std::fs::write(notes.join("a.md"), "something").unwrap();
        let ctx = context(dir.path());
        ctx.reindex().await.unwrap();

        let empty = dir.path().join("empty");
        std::fs::create_dir_all(&empty).unwrap();
        let report = ctx.rebuild(&empty, ctx.config.indexer_config()).await.unwrap();
        assert_eq!(report.files_found, 0);
        assert!(ctx.index.is_loaded());
        assert_eq!(ctx.index.counts(), (1, 1));
    }

    #[test]
    fn chat_options_apply_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());
        let defaults = ctx.chat_options(&ChatOverrides::default());
        assert_eq!(defaults.model.as_deref(), Some("supermind-agent-v1"));
        assert!((defaults.temperature - 0.7).abs() < f32::EPSILON);
        assert!(defaults.max_tokens.is_none());

        let custom = ctx.chat_options(&ChatOverrides {
            model: Some("other".into()),
            temperature: Some(0.1),
            max_tokens: Some(64),
        });
        assert_eq!(custom.model.as_deref(), Some("other"));
        assert_eq!(custom.max_tokens, Some(64));
    }

    #[tokio::test]
    async fn chat_runs_agent() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context(dir.path());
        ctx.provider = Arc::new(AnyProvider::Mock(MockProvider::with_responses(vec![
            MockProvider::text("answer"),
        ])));
        let reply = ctx
            .chat(vec![Message::user("hi")], &ChatOverrides::default())
            .await
            .unwrap();
        assert_eq!(reply.message.content, "answer");
    }
}
