mod env;
mod types;


pub use types::*;

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use scribe_index::ChunkerConfig;
use scribe_index::indexer::IndexerConfig;

impl Config {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str::<Self>(&content).context("failed to parse config file")?
        } else {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns an error for settings that would make indexing or the agent loop
    /// unable to make progress.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.index.chunk_size == 0 {
            bail!("index.chunk_size must be positive");
        }
        if self.index.chunk_overlap >= self.index.chunk_size {
            bail!(
                "index.chunk_overlap ({}) must be smaller than index.chunk_size ({})",
                self.index.chunk_overlap,
                self.index.chunk_size
            );
        }
        if self.llm.embed_batch_size == 0 {
            bail!("llm.embed_batch_size must be positive");
        }
        if self.agent.max_iterations == 0 {
            bail!("agent.max_iterations must be positive");
        }
        if self.index.extensions.is_empty() {
            bail!("index.extensions must list at least one extension");
        }
        Ok(())
    }

    #[must_use]
    pub fn index_path(&self) -> PathBuf {
        PathBuf::from(&self.index.index_path)
    }

    #[must_use]
    pub fn metadata_path(&self) -> PathBuf {
        PathBuf::from(&self.index.metadata_path)
    }

    #[must_use]
    pub fn indexer_config(&self) -> IndexerConfig {
        IndexerConfig {
            chunker: ChunkerConfig {
                size: self.index.chunk_size,
                overlap: self.index.chunk_overlap,
            },
            extensions: self.index.extensions.clone(),
        }
    }
}
