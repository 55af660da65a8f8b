//! Index + metadata artifact pair: loading, persistence, and the shared handle
//! that serving code reads through.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::chunker::ChunkRecord;
use crate::error::{IndexError, Result};
use crate::metadata::MetadataStore;
use crate::store::FlatIndex;

/// A consistent index/metadata pair: same row count, same build id.
#[derive(Debug, Clone)]
pub struct LoadedIndex {
    index: FlatIndex,
    metadata: MetadataStore,
}

impl LoadedIndex {
    /// # Errors
    ///
    /// Returns `IndexError::ArtifactCorrupt` if the row counts differ.
    pub fn new(index: FlatIndex, metadata: MetadataStore) -> Result<Self> {
        if index.len() != metadata.len() {
            return Err(IndexError::ArtifactCorrupt(format!(
                "index has {} rows but metadata has {} records",
                index.len(),
                metadata.len()
            )));
        }
        Ok(Self { index, metadata })
    }

    #[must_use]
    pub fn index(&self) -> &FlatIndex {
        &self.index
    }

    #[must_use]
    pub fn metadata(&self) -> &MetadataStore {
        &self.metadata
    }

    #[must_use]
    pub fn records(&self) -> &[ChunkRecord] {
        &self.metadata.records
    }

    #[must_use]
    pub fn build_id(&self) -> Uuid {
        self.metadata.build_id
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Read both artifacts and verify they belong together.
    ///
    /// # Errors
    ///
    /// `ArtifactNotFound` if either file is missing, `ArtifactCorrupt` if
    /// either is malformed or the pair disagrees on row count or build id.
    pub async fn load(index_path: &Path, metadata_path: &Path) -> Result<Self> {
        let index_bytes = read_artifact(index_path).await?;
        let metadata_bytes = read_artifact(metadata_path).await?;

        let (index, index_build) = FlatIndex::decode(&index_bytes)?;
        let metadata = MetadataStore::decode(&metadata_bytes)?;
        if index_build != metadata.build_id {
            return Err(IndexError::ArtifactCorrupt(format!(
                "build id mismatch: index {index_build}, metadata {}",
                metadata.build_id
            )));
        }
        let loaded = Self::new(index, metadata)?;
        tracing::info!(
            rows = loaded.len(),
            dim = loaded.index.dim(),
            build_id = %loaded.build_id(),
            "loaded index artifacts"
        );
        Ok(loaded)
    }

    /// Write both artifacts so that either both are replaced or neither is.
    ///
    /// Each file is written and synced to a temporary sibling first; the
    /// temporaries are renamed into place only after both writes succeed. The
    /// previous index file is moved aside until the metadata rename lands and
    /// is put back if it does not. On any failure the temporaries are removed.
    ///
    /// # Errors
    ///
    /// Returns `IndexError::Io` or `IndexError::Json` on write failure.
    pub async fn persist(&self, index_path: &Path, metadata_path: &Path) -> Result<()> {
        let build_id = self.build_id();
        let index_tmp = temp_sibling(index_path, "tmp", build_id);
        let metadata_tmp = temp_sibling(metadata_path, "tmp", build_id);
        let index_backup = temp_sibling(index_path, "bak", build_id);

        let result = async {
            write_synced(&index_tmp, &self.index.encode(build_id)).await?;
            write_synced(&metadata_tmp, &self.metadata.encode()?).await?;
            swap_pair(
                (&index_tmp, index_path),
                (&metadata_tmp, metadata_path),
                &index_backup,
            )
            .await
        }
        .await;

        if let Err(e) = result {
            tracing::warn!("persisting index artifacts failed, removing temporaries: {e}");
            let _ = tokio::fs::remove_file(&index_tmp).await;
            let _ = tokio::fs::remove_file(&metadata_tmp).await;
            return Err(e);
        }

        tracing::info!(
            index = %index_path.display(),
            metadata = %metadata_path.display(),
            rows = self.len(),
            %build_id,
            "persisted index artifacts"
        );
        Ok(())
    }
}

async fn read_artifact(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path).await.map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            IndexError::ArtifactNotFound(path.to_path_buf())
        } else {
            IndexError::Io(e)
        }
    })
}

async fn write_synced(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    Ok(())
}

/// Rename both temporaries into place, restoring the previous index file if
/// the metadata rename fails after the index rename succeeded.
async fn swap_pair(
    (index_tmp, index_path): (&Path, &Path),
    (metadata_tmp, metadata_path): (&Path, &Path),
    index_backup: &Path,
) -> Result<()> {
    let had_previous = match tokio::fs::rename(index_path, index_backup).await {
        Ok(()) => true,
        Err(e) if e.kind() == ErrorKind::NotFound => false,
        Err(e) => return Err(e.into()),
    };

    if let Err(e) = tokio::fs::rename(index_tmp, index_path).await {
        restore_index(index_path, index_backup, had_previous).await;
        return Err(e.into());
    }

    if let Err(e) = tokio::fs::rename(metadata_tmp, metadata_path).await {
        restore_index(index_path, index_backup, had_previous).await;
        return Err(e.into());
    }

    if had_previous {
        let _ = tokio::fs::remove_file(index_backup).await;
    }
    Ok(())
}

async fn restore_index(index_path: &Path, index_backup: &Path, had_previous: bool) {
    let restored = if had_previous {
        tokio::fs::rename(index_backup, index_path).await
    } else {
        match tokio::fs::remove_file(index_path).await {
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            other => other,
        }
    };
    if let Err(e) = restored {
        tracing::error!(
            index = %index_path.display(),
            "could not restore previous index file: {e}"
        );
    }
}

fn temp_sibling(path: &Path, tag: &str, build_id: Uuid) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".{tag}-{}", build_id.simple()));
    path.with_file_name(name)
}

/// Shared slot for the currently served artifact pair.
///
/// Readers take an `Arc` snapshot and never observe a half-replaced pair; a
/// reload swaps the whole snapshot in one write.
#[derive(Debug, Clone, Default)]
pub struct IndexHandle {
    inner: Arc<RwLock<Option<Arc<LoadedIndex>>>>,
}

impl IndexHandle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_index(loaded: LoadedIndex) -> Self {
        let handle = Self::new();
        handle.replace(loaded);
        handle
    }

    /// Current snapshot, or `None` when nothing is loaded.
    #[must_use]
    pub fn snapshot(&self) -> Option<Arc<LoadedIndex>> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn replace(&self, loaded: LoadedIndex) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(loaded));
    }

    pub fn clear(&self) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.snapshot().is_some()
    }

    /// `(index rows, metadata records)` of the current snapshot, zeros when unloaded.
    #[must_use]
    pub fn counts(&self) -> (usize, usize) {
        self.snapshot()
            .map_or((0, 0), |s| (s.index().len(), s.metadata().len()))
    }

    /// Load the pair from disk and swap it in. The previous snapshot stays in
    /// place if loading fails.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`LoadedIndex::load`].
    pub async fn reload(&self, index_path: &Path, metadata_path: &Path) -> Result<()> {
        let loaded = LoadedIndex::load(index_path, metadata_path).await?;
        self.replace(loaded);
        Ok(())
    }
}
