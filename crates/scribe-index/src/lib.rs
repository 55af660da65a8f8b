//! Retrieval pipeline over a folder of Markdown notes.
//!
//! Documents are split into overlapping character windows, embedded through a
//! remote provider, and stored in a flat inner-product index whose rows line up
//! one-to-one with a parallel metadata list. Both are persisted as a pair and
//! loaded wholesale for query-time retrieval.

pub mod artifacts;
pub mod chunker;
pub mod error;
pub mod indexer;
pub mod metadata;
pub mod retriever;
pub mod store;

pub use artifacts::{IndexHandle, LoadedIndex};
pub use chunker::{ChunkRecord, ChunkerConfig};
pub use error::{IndexError, Result};
pub use retriever::{Retriever, SearchResult};
