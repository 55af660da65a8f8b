//! Error types for scribe-index.

use std::path::PathBuf;

/// Errors that can occur while building, loading, or querying the index.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// Misconfigured chunking parameters or corpus location.
    #[error("configuration error: {0}")]
    Config(String),

    /// An artifact file does not exist on disk.
    #[error("artifact not found: {}", .0.display())]
    ArtifactNotFound(PathBuf),

    /// No artifact pair has been loaded into the serving process.
    #[error("index not loaded: run the indexer and make sure the index files exist")]
    IndexNotLoaded,

    /// Artifacts exist but do not form a consistent pair.
    #[error("artifact corrupt: {0}")]
    ArtifactCorrupt(String),

    /// Vector dimension differs from the index dimension.
    #[error("vector dimension mismatch: index has {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Embedding provider failure.
    #[error("embedding provider error: {0}")]
    Llm(#[from] scribe_llm::LlmError),

    /// IO error reading or writing artifacts.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias using `IndexError`.
pub type Result<T> = std::result::Result<T, IndexError>;
