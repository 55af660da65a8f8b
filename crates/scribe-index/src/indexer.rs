//! Notes indexing pipeline: walk → chunk → embed → index → persist.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::artifacts::LoadedIndex;
use crate::chunker::{ChunkRecord, ChunkerConfig, chunk_document};
use crate::error::{IndexError, Result};
use crate::metadata::MetadataStore;
use crate::store::FlatIndex;
use scribe_llm::EmbeddingClient;
use scribe_llm::provider::LlmProvider;

/// Indexer configuration.
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    pub chunker: ChunkerConfig,
    /// File extensions (without the dot) that count as documents.
    pub extensions: Vec<String>,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            chunker: ChunkerConfig::default(),
            extensions: vec!["md".into()],
        }
    }
}

/// Summary of an indexing run.
#[derive(Debug, Default, Clone, Serialize)]
pub struct IndexReport {
    pub files_found: usize,
    pub files_indexed: usize,
    pub files_skipped: usize,
    pub chunks: usize,
    pub dimension: usize,
    pub errors: Vec<String>,
    pub duration_ms: u64,
}

/// Builds a fresh artifact pair from a folder of notes.
pub struct NotesIndexer<P: LlmProvider> {
    embedder: EmbeddingClient<P>,
    config: IndexerConfig,
}

impl<P: LlmProvider> NotesIndexer<P> {
    #[must_use]
    pub fn new(embedder: EmbeddingClient<P>, config: IndexerConfig) -> Self {
        Self { embedder, config }
    }

    #[must_use]
    pub fn from_provider(provider: Arc<P>, batch_size: usize, config: IndexerConfig) -> Self {
        Self::new(EmbeddingClient::new(provider, batch_size), config)
    }

    /// Chunk and embed every eligible document under `root` into an in-memory
    /// pair. An empty corpus yields an empty pair.
    ///
    /// # Errors
    ///
    /// `Config` for an invalid chunker configuration or a missing root folder;
    /// `Llm` if embedding fails. Unreadable documents are skipped and recorded
    /// in the report instead.
    pub async fn build(&self, root: &Path) -> Result<(LoadedIndex, IndexReport)> {
        let start = std::time::Instant::now();
        self.config.chunker.validate()?;
        if !root.is_dir() {
            return Err(IndexError::Config(format!(
                "notes folder does not exist: {}",
                root.display()
            )));
        }

        let mut report = IndexReport::default();
        let (files, walk_errors) = self.collect_documents(root);
        report.files_found = files.len();
        report.errors.extend(walk_errors);
        tracing::info!(root = %root.display(), files = files.len(), "indexing started");

        let mut records: Vec<ChunkRecord> = Vec::new();
        for (i, path) in files.iter().enumerate() {
            let file = path.display().to_string();
            let text = match tokio::fs::read_to_string(path).await {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(file = %file, "skipping unreadable document: {e}");
                    report.files_skipped += 1;
                    report.errors.push(format!("{file}: {e}"));
                    continue;
                }
            };
            if text.trim().is_empty() {
                tracing::debug!(file = %file, "skipping empty document");
                report.files_skipped += 1;
                continue;
            }

            let chunks = chunk_document(&text, &file, &self.config.chunker)?;
            tracing::debug!(
                file = %file,
                progress = format_args!("{}/{}", i + 1, files.len()),
                chunks = chunks.len(),
            );
            report.files_indexed += 1;
            records.extend(chunks);
        }
        report.chunks = records.len();

        let build_id = Uuid::new_v4();
        let loaded = if records.is_empty() {
            LoadedIndex::new(FlatIndex::new(0), MetadataStore::new(build_id, records))?
        } else {
            let texts: Vec<String> = records.iter().map(|r| r.text.clone()).collect();
            let vectors = self.embedder.embed(&texts).await?;
            let dim = vectors.first().map_or(0, Vec::len);
            let mut index = FlatIndex::new(dim);
            index.add(&vectors)?;
            LoadedIndex::new(index, MetadataStore::new(build_id, records))?
        };
        report.dimension = loaded.index().dim();
        report.duration_ms = start.elapsed().as_millis().try_into().unwrap_or(u64::MAX);

        tracing::info!(
            files = report.files_indexed,
            skipped = report.files_skipped,
            chunks = report.chunks,
            dim = report.dimension,
            duration_ms = report.duration_ms,
            "indexing finished"
        );
        Ok((loaded, report))
    }

    /// [`build`](Self::build), then persist the pair unless the corpus was empty.
    ///
    /// Returns `None` in place of the pair when nothing was written.
    ///
    /// # Errors
    ///
    /// Propagates build errors and artifact write failures.
    pub async fn build_and_persist(
        &self,
        root: &Path,
        index_path: &Path,
        metadata_path: &Path,
    ) -> Result<(Option<LoadedIndex>, IndexReport)> {
        let (loaded, report) = self.build(root).await?;
        if loaded.is_empty() {
            tracing::warn!(root = %root.display(), "no documents indexed, artifacts left untouched");
            return Ok((None, report));
        }
        loaded.persist(index_path, metadata_path).await?;
        Ok((Some(loaded), report))
    }

    /// Eligible files under `root`, hidden and ignored paths excluded, sorted
    /// so row order is reproducible. Entries the walker cannot read are
    /// logged and returned as report errors.
    fn collect_documents(&self, root: &Path) -> (Vec<PathBuf>, Vec<String>) {
        let mut files = Vec::new();
        let mut errors = Vec::new();
        let walker = ignore::WalkBuilder::new(root)
            .hidden(true)
            .git_ignore(true)
            .require_git(false)
            .build();
        for entry in walker {
            match entry {
                Ok(entry) => {
                    if let Some(e) = entry.error() {
                        tracing::warn!(path = %entry.path().display(), "ignore rules partially applied: {e}");
                        errors.push(e.to_string());
                    }
                    if entry.file_type().is_some_and(|ft| ft.is_file())
                        && self.is_eligible(entry.path())
                    {
                        files.push(entry.into_path());
                    }
                }
                Err(e) => {
                    tracing::warn!("skipping unreadable entry: {e}");
                    errors.push(e.to_string());
                }
            }
        }
        files.sort();
        (files, errors)
    }

    fn is_eligible(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                self.config
                    .extensions
                    .iter()
                    .any(|want| want.trim_start_matches('.').eq_ignore_ascii_case(ext))
            })
    }
}
