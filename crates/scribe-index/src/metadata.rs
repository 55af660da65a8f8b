//! JSON metadata artifact: one chunk record per index row.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::chunker::ChunkRecord;
use crate::error::{IndexError, Result};

const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataStore {
    pub version: u32,
    pub build_id: Uuid,
    pub records: Vec<ChunkRecord>,
}

impl MetadataStore {
    #[must_use]
    pub fn new(build_id: Uuid, records: Vec<ChunkRecord>) -> Self {
        Self {
            version: FORMAT_VERSION,
            build_id,
            records,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn get(&self, row: usize) -> Option<&ChunkRecord> {
        self.records.get(row)
    }

    /// # Errors
    ///
    /// Returns `IndexError::Json` if serialization fails.
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// # Errors
    ///
    /// Returns `IndexError::ArtifactCorrupt` for malformed JSON or an
    /// unsupported format version.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let store: Self = serde_json::from_slice(bytes)
            .map_err(|e| IndexError::ArtifactCorrupt(format!("metadata file: {e}")))?;
        if store.version != FORMAT_VERSION {
            return Err(IndexError::ArtifactCorrupt(format!(
                "unsupported metadata format version {}",
                store.version
            )));
        }
        Ok(store)
    }
}
