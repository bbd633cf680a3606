//! Retrieval engine facade: Embedder → {vector, lexical} → fusion.
//!
//! The engine is stateless across calls except for the lexical snapshot
//! cache. The cache moves between `fresh` and `stale`: `invalidate()` bumps
//! the corpus version, and the next query that needs the lexical index
//! rebuilds a snapshot tagged with that version and swaps it in atomically.
//! Queries already holding the previous `Arc` keep ranking against a
//! consistent corpus, never a half-old, half-new mix.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};

use crate::config::RetrievalConfig;
use crate::embedding::Embedder;
use crate::error::RetrievalError;
use crate::models::FusedHit;
use crate::search::bm25::LexicalSnapshot;
use crate::search::fusion::reciprocal_rank_fusion;
use crate::search::vector::{VectorHit, VectorIndex};
use crate::store::ChunkStore;

/// Versioned lexical snapshot holder.
///
/// `version` counts committed corpus mutations; the snapshot remembers the
/// version it was built from. Rebuilds are serialized by `rebuild` so
/// concurrent stale queries do not duplicate the work, and readers of a
/// fresh snapshot never block each other.
struct LexicalCache {
    store: Arc<ChunkStore>,
    version: AtomicU64,
    snapshot: RwLock<Arc<LexicalSnapshot>>,
    rebuild: Mutex<()>,
}

impl LexicalCache {
    fn new(store: Arc<ChunkStore>) -> Self {
        let snapshot = Arc::new(LexicalSnapshot::build(&store, 0));
        Self {
            store,
            version: AtomicU64::new(0),
            snapshot: RwLock::new(snapshot),
            rebuild: Mutex::new(()),
        }
    }

    fn invalidate(&self) {
        self.version.fetch_add(1, Ordering::Release);
    }

    /// Return a snapshot no older than the current corpus version, unless
    /// the caller explicitly opts into whatever was last built
    /// (`allow_stale`).
    fn current(&self, allow_stale: bool) -> Arc<LexicalSnapshot> {
        let target = self.version.load(Ordering::Acquire);
        {
            let snapshot = self.snapshot.read();
            if allow_stale || snapshot.version >= target {
                return snapshot.clone();
            }
        }

        let _guard = self.rebuild.lock();
        // Another task may have rebuilt while we waited for the lock.
        let target = self.version.load(Ordering::Acquire);
        {
            let snapshot = self.snapshot.read();
            if snapshot.version >= target {
                return snapshot.clone();
            }
        }

        // The version is captured before reading the store, so a mutation
        // landing mid-rebuild leaves the new snapshot marked stale and the
        // next query rebuilds again.
        let fresh = Arc::new(LexicalSnapshot::build(&self.store, target));
        tracing::debug!(
            version = target,
            docs = fresh.doc_count(),
            "lexical snapshot rebuilt"
        );
        *self.snapshot.write() = fresh.clone();
        fresh
    }
}

/// Orchestrates hybrid retrieval over the shared chunk store.
pub struct RetrievalEngine {
    store: Arc<ChunkStore>,
    embedder: Arc<dyn Embedder>,
    vectors: VectorIndex,
    lexical: Arc<LexicalCache>,
    config: RetrievalConfig,
}

impl RetrievalEngine {
    pub fn new(
        store: Arc<ChunkStore>,
        embedder: Arc<dyn Embedder>,
        config: RetrievalConfig,
    ) -> Self {
        let vectors = VectorIndex::new(store.clone(), config.max_distance);
        let lexical = Arc::new(LexicalCache::new(store.clone()));
        Self {
            store,
            embedder,
            vectors,
            lexical,
            config,
        }
    }

    /// Hybrid search: encode the question once, over-fetch `2k` candidates
    /// from each index concurrently, fuse with RRF, return the top `k`.
    ///
    /// Over-fetching gives fusion enough headroom that a chunk strong in
    /// only one signal is not excluded before fusion can see it. An empty
    /// corpus or no hit above the relevance floor is an empty `Ok`.
    pub async fn hybrid_query(
        &self,
        question: &str,
        k: usize,
    ) -> Result<Vec<FusedHit>, RetrievalError> {
        if k == 0 || self.store.is_empty() {
            return Ok(Vec::new());
        }

        let query_vector = self.encode(question).await?;
        let fetch = k * 2;

        let vectors = self.vectors.clone();
        let vector_task =
            tokio::task::spawn_blocking(move || vectors.search(&query_vector, fetch, None));

        let lexical = self.lexical.clone();
        let query = question.to_string();
        let lexical_task =
            tokio::task::spawn_blocking(move || lexical.current(false).search(&query, fetch));

        let (vector_hits, lexical_hits) = tokio::join!(vector_task, lexical_task);
        let vector_hits = vector_hits.map_err(|e| RetrievalError::Task(e.to_string()))??;
        let lexical_hits = lexical_hits.map_err(|e| RetrievalError::Task(e.to_string()))?;

        tracing::debug!(
            vector = vector_hits.len(),
            lexical = lexical_hits.len(),
            k,
            "hybrid search candidates collected"
        );

        Ok(reciprocal_rank_fusion(
            &vector_hits,
            &lexical_hits,
            k,
            self.config.rrf_k,
        ))
    }

    /// Vector-only search restricted to one vendor's chunks. Filtering
    /// already narrows candidates to a single trusted facet, so fusion is
    /// bypassed. An unknown vendor yields an empty result.
    pub async fn vendor_query(
        &self,
        question: &str,
        vendor: &str,
        k: usize,
    ) -> Result<Vec<VectorHit>, RetrievalError> {
        if k == 0 || !self.store.contains_vendor(vendor) {
            return Ok(Vec::new());
        }

        let query_vector = self.encode(question).await?;
        let vectors = self.vectors.clone();
        let vendor = vendor.to_string();
        let hits = tokio::task::spawn_blocking(move || {
            vectors.search(&query_vector, k, Some(vendor.as_str()))
        })
        .await
        .map_err(|e| RetrievalError::Task(e.to_string()))??;
        Ok(hits)
    }

    /// Mark the lexical snapshot stale. Called after every committed
    /// ingestion or deletion; the next query rebuilds before answering.
    pub fn invalidate(&self) {
        self.lexical.invalidate();
    }

    /// Expose the lexical snapshot, honoring the staleness contract:
    /// `allow_stale` opts into the last-built snapshot without rebuilding.
    pub fn lexical_snapshot(&self, allow_stale: bool) -> Arc<LexicalSnapshot> {
        self.lexical.current(allow_stale)
    }

    async fn encode(&self, text: &str) -> Result<Vec<f32>, RetrievalError> {
        let deadline = Duration::from_millis(self.config.embed_timeout_ms);
        match tokio::time::timeout(deadline, self.embedder.encode(text)).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(RetrievalError::Timeout(deadline)),
        }
    }
}
