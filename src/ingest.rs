//! Ingestion pipeline: page texts → overlapping windows → embeddings →
//! chunk store, then a lexical-index invalidation.
//!
//! Chunk ids are deterministic from (vendor, document, page, window index),
//! so re-ingesting the same document replaces its chunks instead of
//! duplicating them.

use std::sync::Arc;
use std::time::Duration;

use crate::config::ChunkingConfig;
use crate::embedding::Embedder;
use crate::error::{IngestError, RetrievalError};
use crate::models::{Chunk, ChunkMetadata, PageText};
use crate::search::engine::RetrievalEngine;
use crate::store::ChunkStore;

/// Chunks embedded and committed per round trip.
const EMBED_BATCH: usize = 32;

pub struct IngestionPipeline {
    store: Arc<ChunkStore>,
    embedder: Arc<dyn Embedder>,
    engine: Arc<RetrievalEngine>,
    chunking: ChunkingConfig,
    embed_timeout: Duration,
}

impl IngestionPipeline {
    pub fn new(
        store: Arc<ChunkStore>,
        embedder: Arc<dyn Embedder>,
        engine: Arc<RetrievalEngine>,
        chunking: ChunkingConfig,
        embed_timeout: Duration,
    ) -> Self {
        Self {
            store,
            embedder,
            engine,
            chunking,
            embed_timeout,
        }
    }

    /// Ingest one document's pre-extracted pages. Returns the number of
    /// chunks written.
    ///
    /// Batches are embedded and committed in order; a failure aborts the
    /// remainder and reports how many chunks had already been committed, so
    /// the caller can decide whether to retry. Blank pages produce zero
    /// chunks and succeed with a count of 0.
    pub async fn ingest(
        &self,
        vendor: &str,
        document: &str,
        pages: &[PageText],
    ) -> Result<usize, IngestError> {
        let source_path = format!("{vendor}/{document}");
        let mut planned: Vec<(String, String, ChunkMetadata)> = Vec::new();

        for page in pages {
            for (index, text) in window_text(&page.text, &self.chunking).into_iter().enumerate() {
                let id = chunk_id(vendor, document, page.page.as_deref(), index);
                let metadata = ChunkMetadata {
                    vendor: vendor.to_string(),
                    document: document.to_string(),
                    page: page.page.clone(),
                    chunk_index: index,
                    source_path: source_path.clone(),
                };
                planned.push((id, text, metadata));
            }
        }

        if planned.is_empty() {
            tracing::info!(vendor, document, "ingestion produced no chunks");
            return Ok(0);
        }

        let mut written = 0usize;
        for batch in planned.chunks(EMBED_BATCH) {
            let texts: Vec<String> = batch.iter().map(|(_, text, _)| text.clone()).collect();

            let embeddings = match self.encode_batch(&texts).await {
                Ok(embeddings) => embeddings,
                Err(e) => return self.abort(written, e),
            };

            let chunks: Vec<Chunk> = batch
                .iter()
                .zip(embeddings)
                .map(|((id, text, metadata), embedding)| Chunk {
                    id: id.clone(),
                    text: text.clone(),
                    embedding,
                    metadata: metadata.clone(),
                })
                .collect();

            if let Err(e) = self.store.upsert_batch(chunks) {
                return self.abort(written, e);
            }
            written += batch.len();
        }

        self.engine.invalidate();
        tracing::info!(vendor, document, chunks = written, "document ingested");
        Ok(written)
    }

    /// Remove every chunk of (vendor, document) from the store and
    /// invalidate the indices. All-or-nothing: an unknown pair returns
    /// `NotFound` and removes nothing.
    pub fn delete_document(&self, vendor: &str, document: &str) -> Result<usize, RetrievalError> {
        let removed = self.store.remove_document(vendor, document)?;
        if removed == 0 {
            return Err(RetrievalError::NotFound {
                vendor: vendor.to_string(),
                document: document.to_string(),
            });
        }
        self.engine.invalidate();
        tracing::info!(vendor, document, chunks = removed, "document deleted");
        Ok(removed)
    }

    async fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RetrievalError> {
        match tokio::time::timeout(self.embed_timeout, self.embedder.encode_batch(texts)).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(RetrievalError::Timeout(self.embed_timeout)),
        }
    }

    /// Chunks committed before a failure are kept and must become
    /// searchable, so the invalidation still runs on the abort path.
    fn abort(&self, written: usize, source: RetrievalError) -> Result<usize, IngestError> {
        if written > 0 {
            self.engine.invalidate();
        }
        Err(IngestError { written, source })
    }
}

/// Split text into overlapping windows of whitespace-delimited words.
/// Consecutive windows share `overlap` words; the last window may be short.
pub fn window_text(text: &str, config: &ChunkingConfig) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return Vec::new();
    }
    if words.len() <= config.chunk_size {
        return vec![words.join(" ")];
    }

    let step = config.chunk_size.saturating_sub(config.overlap).max(1);
    let mut windows = Vec::new();
    let mut start = 0;
    while start < words.len() {
        let end = (start + config.chunk_size).min(words.len());
        windows.push(words[start..end].join(" "));
        if end == words.len() {
            break;
        }
        start += step;
    }
    windows
}

/// Deterministic chunk id matching the `{vendor}_{document}_p{page}_c{index}`
/// scheme (page segment omitted for unpaginated sources).
fn chunk_id(vendor: &str, document: &str, page: Option<&str>, index: usize) -> String {
    match page {
        Some(page) => format!("{vendor}_{document}_p{page}_c{index}"),
        None => format!("{vendor}_{document}_c{index}"),
    }
}
