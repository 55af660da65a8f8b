//! Remote model abstraction: tool-calling chat completions and text embeddings.

pub mod any;
pub mod embed;
pub mod error;
pub(crate) mod http;
#[cfg(feature = "mock")]
pub mod mock;
pub mod openai;
pub mod provider;

pub use embed::EmbeddingClient;
pub use error::LlmError;
pub use provider::LlmProvider;
