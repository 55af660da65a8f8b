//! Query-time semantic search over the loaded artifact pair.

use std::sync::Arc;

use serde::Serialize;

use crate::artifacts::IndexHandle;
use crate::error::{IndexError, Result};
use crate::store::SENTINEL_ROW;
use scribe_llm::EmbeddingClient;
use scribe_llm::provider::LlmProvider;

pub const DEFAULT_MAX_RESULTS: usize = 5;

/// A matching chunk with its similarity score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub text: String,
    pub file_path: String,
    pub chunk_index: usize,
    pub total_chunks: usize,
    pub score: f32,
}

/// Embeds queries and looks them up in whatever pair the handle currently holds.
pub struct Retriever<P: LlmProvider> {
    embedder: EmbeddingClient<P>,
    handle: IndexHandle,
}

impl<P: LlmProvider> Clone for Retriever<P> {
    fn clone(&self) -> Self {
        Self {
            embedder: self.embedder.clone(),
            handle: self.handle.clone(),
        }
    }
}

impl<P: LlmProvider> Retriever<P> {
    #[must_use]
    pub fn new(embedder: EmbeddingClient<P>, handle: IndexHandle) -> Self {
        Self { embedder, handle }
    }

    #[must_use]
    pub fn from_provider(provider: Arc<P>, batch_size: usize, handle: IndexHandle) -> Self {
        Self::new(EmbeddingClient::new(provider, batch_size), handle)
    }

    #[must_use]
    pub fn handle(&self) -> &IndexHandle {
        &self.handle
    }

    /// Return up to `max_results` chunks most similar to `query`, best first.
    ///
    /// # Errors
    ///
    /// `IndexNotLoaded` when no pair is loaded, `Llm` if embedding the query
    /// fails, `DimensionMismatch` if the query vector does not fit the index.
    pub async fn retrieve(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>> {
        let snapshot = self.handle.snapshot().ok_or(IndexError::IndexNotLoaded)?;
        if max_results == 0 || snapshot.is_empty() {
            return Ok(Vec::new());
        }

        let query_vector = self.embedder.embed_one(query).await?;
        let (scores, ids) = snapshot.index().search(&query_vector, max_results)?;

        let results: Vec<SearchResult> = scores
            .into_iter()
            .zip(ids)
            .filter(|(_, id)| *id != SENTINEL_ROW)
            .filter_map(|(score, id)| {
                let record = snapshot.metadata().get(usize::try_from(id).ok()?)?;
                Some(SearchResult {
                    text: record.text.clone(),
                    file_path: record.file_path.clone(),
                    chunk_index: record.chunk_index,
                    total_chunks: record.total_chunks,
                    score,
                })
            })
            .collect();

        tracing::debug!(query, hits = results.len(), "retrieval complete");
        Ok(results)
    }
}
