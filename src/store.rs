use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::error::{IndexError, RetrievalError};
use crate::models::{Chunk, DocumentSummary};

/// Durable chunk store: the single source of truth for the corpus.
///
/// Both the lexical and the vector index are derived caches rebuilt from this
/// store; losing either loses nothing. Chunks are keyed by their
/// deterministic id, so an upsert with an existing id replaces the previous
/// version. Persistence is a JSON file written atomically (temp file +
/// rename), and mutations are committed whole batches at a time: a reader
/// never observes a partially-written chunk.
pub struct ChunkStore {
    chunks: RwLock<BTreeMap<String, Chunk>>,
    persist_path: PathBuf,
}

impl ChunkStore {
    /// Open an existing store under `data_dir` or create an empty one.
    pub fn open_or_create(data_dir: &Path) -> Result<Self, RetrievalError> {
        std::fs::create_dir_all(data_dir)?;
        let persist_path = data_dir.join("chunks.json");

        let chunks = if persist_path.exists() {
            let data = std::fs::read_to_string(&persist_path)?;
            serde_json::from_str(&data).map_err(|e| IndexError::Corrupt(e.to_string()))?
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            chunks: RwLock::new(chunks),
            persist_path,
        })
    }

    /// Insert or replace a batch of chunks.
    ///
    /// Dimensionality is validated for the whole batch before anything is
    /// inserted, so a mismatch never leaves the batch half-applied.
    pub fn upsert_batch(&self, batch: Vec<Chunk>) -> Result<(), RetrievalError> {
        if batch.is_empty() {
            return Ok(());
        }

        let mut chunks = self.chunks.write();

        let expected = chunks
            .values()
            .next()
            .map(|c| c.embedding.len())
            .unwrap_or_else(|| batch[0].embedding.len());
        for chunk in &batch {
            if chunk.embedding.len() != expected {
                return Err(IndexError::DimensionMismatch {
                    expected,
                    got: chunk.embedding.len(),
                }
                .into());
            }
        }

        for chunk in batch {
            chunks.insert(chunk.id.clone(), chunk);
        }

        self.persist(&chunks)
    }

    /// Remove every chunk belonging to (vendor, document).
    /// Returns the number removed; zero means the pair was never indexed and
    /// nothing was touched.
    pub fn remove_document(&self, vendor: &str, document: &str) -> Result<usize, RetrievalError> {
        let mut chunks = self.chunks.write();
        let before = chunks.len();
        chunks.retain(|_, c| !(c.metadata.vendor == vendor && c.metadata.document == document));
        let removed = before - chunks.len();

        if removed > 0 {
            self.persist(&chunks)?;
        }
        Ok(removed)
    }

    /// Fetch a single chunk by id.
    pub fn get(&self, id: &str) -> Option<Chunk> {
        self.chunks.read().get(id).cloned()
    }

    /// Visit every chunk under the read lock, in id order.
    pub fn for_each<F: FnMut(&Chunk)>(&self, mut f: F) {
        let chunks = self.chunks.read();
        for chunk in chunks.values() {
            f(chunk);
        }
    }

    pub fn len(&self) -> usize {
        self.chunks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.read().is_empty()
    }

    /// Established embedding dimensionality, or `None` while the store is empty.
    pub fn dimension(&self) -> Option<usize> {
        self.chunks.read().values().next().map(|c| c.embedding.len())
    }

    pub fn contains_vendor(&self, vendor: &str) -> bool {
        self.chunks
            .read()
            .values()
            .any(|c| c.metadata.vendor == vendor)
    }

    /// Aggregate chunks by (vendor, document), sorted for stable listings.
    pub fn document_summaries(&self) -> Vec<DocumentSummary> {
        let chunks = self.chunks.read();
        let mut grouped: BTreeMap<(String, String), (usize, BTreeSet<String>)> = BTreeMap::new();

        for chunk in chunks.values() {
            let key = (
                chunk.metadata.vendor.clone(),
                chunk.metadata.document.clone(),
            );
            let entry = grouped.entry(key).or_default();
            entry.0 += 1;
            if let Some(page) = &chunk.metadata.page {
                entry.1.insert(page.clone());
            }
        }

        grouped
            .into_iter()
            .map(|((vendor, document), (chunk_count, pages))| DocumentSummary {
                vendor,
                document,
                chunk_count,
                page_count: pages.len(),
            })
            .collect()
    }

    /// Persist the current contents (atomic write via temp file + rename).
    fn persist(&self, chunks: &BTreeMap<String, Chunk>) -> Result<(), RetrievalError> {
        let data = serde_json::to_string(chunks)
            .map_err(|e| IndexError::Corrupt(e.to_string()))?;
        let tmp_path = self.persist_path.with_extension("json.tmp");
        std::fs::write(&tmp_path, &data)?;
        std::fs::rename(&tmp_path, &self.persist_path)?;
        Ok(())
    }
}
