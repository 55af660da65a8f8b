//! Batching embedding client.

use std::sync::Arc;

use crate::error::{LlmError, Result};
use crate::provider::LlmProvider;

pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Splits embedding requests into bounded batches while preserving input order.
///
/// A failed batch fails the whole call; nothing is retried here, so callers
/// decide whether a second attempt is worth paying for.
pub struct EmbeddingClient<P: LlmProvider> {
    provider: Arc<P>,
    batch_size: usize,
}

impl<P: LlmProvider> Clone for EmbeddingClient<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            batch_size: self.batch_size,
        }
    }
}

impl<P: LlmProvider> EmbeddingClient<P> {
    #[must_use]
    pub fn new(provider: Arc<P>, batch_size: usize) -> Self {
        Self {
            provider,
            batch_size: batch_size.max(1),
        }
    }

    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Embed `texts`, returning one vector per input in the same order.
    ///
    /// # Errors
    ///
    /// Returns an error if any batch fails, returns the wrong number of vectors,
    /// or returns vectors of inconsistent dimension.
    pub async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let total_batches = texts.len().div_ceil(self.batch_size);
        let mut vectors = Vec::with_capacity(texts.len());
        let mut dimension: Option<usize> = None;

        for (i, batch) in texts.chunks(self.batch_size).enumerate() {
            tracing::info!(
                batch = format_args!("{}/{total_batches}", i + 1),
                size = batch.len(),
                "embedding batch"
            );
            let batch_vectors = self.provider.embed_batch(batch).await?;
            if batch_vectors.len() != batch.len() {
                return Err(LlmError::CountMismatch {
                    expected: batch.len(),
                    actual: batch_vectors.len(),
                });
            }
            for vector in batch_vectors {
                let expected = *dimension.get_or_insert(vector.len());
                if vector.len() != expected {
                    return Err(LlmError::DimensionMismatch {
                        expected,
                        actual: vector.len(),
                    });
                }
                vectors.push(vector);
            }
        }

        Ok(vectors)
    }

    /// Embed a single text as a one-element batch.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider call fails or returns no vector.
    pub async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        self.embed(&[text.to_owned()])
            .await?
            .pop()
            .ok_or_else(|| LlmError::EmptyResponse {
                provider: self.provider.name().to_owned(),
            })
    }
}
