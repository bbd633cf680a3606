//! Nearest-neighbor search over chunk embeddings.
//!
//! The index is an adapter over the chunk store rather than a separate
//! structure: every search scans the live store under its read lock, so
//! upserts and deletions are visible the moment the store commits them.
//! Brute-force cosine distance is adequate for a corpus of thousands to low
//! millions of chunks.

use std::sync::Arc;

use crate::error::IndexError;
use crate::models::ChunkMetadata;
use crate::store::ChunkStore;

/// A vector search hit. Distance is cosine distance (1 − cosine similarity):
/// lower means more similar.
#[derive(Debug, Clone)]
pub struct VectorHit {
    pub chunk_id: String,
    pub text: String,
    pub metadata: ChunkMetadata,
    pub distance: f32,
}

#[derive(Clone)]
pub struct VectorIndex {
    store: Arc<ChunkStore>,
    /// Optional relevance floor: hits farther than this are dropped.
    /// `None` keeps every hit regardless of distance.
    max_distance: Option<f32>,
}

impl VectorIndex {
    pub fn new(store: Arc<ChunkStore>, max_distance: Option<f32>) -> Self {
        Self {
            store,
            max_distance,
        }
    }

    /// Search for the `k` nearest chunks, ascending by distance, ties broken
    /// by chunk id ascending. `vendor` restricts candidates to chunks whose
    /// metadata vendor field matches exactly.
    pub fn search(
        &self,
        query: &[f32],
        k: usize,
        vendor: Option<&str>,
    ) -> Result<Vec<VectorHit>, IndexError> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let Some(dimension) = self.store.dimension() else {
            return Ok(Vec::new());
        };
        if query.len() != dimension {
            return Err(IndexError::DimensionMismatch {
                expected: dimension,
                got: query.len(),
            });
        }

        let mut scored: Vec<(f32, String)> = Vec::new();
        self.store.for_each(|chunk| {
            if let Some(v) = vendor {
                if chunk.metadata.vendor != v {
                    return;
                }
            }
            let distance = 1.0 - cosine_similarity(query, &chunk.embedding);
            if let Some(max) = self.max_distance {
                if distance > max {
                    return;
                }
            }
            scored.push((distance, chunk.id.clone()));
        });

        scored.sort_by(|a, b| match a.0.partial_cmp(&b.0) {
            Some(std::cmp::Ordering::Equal) | None => a.1.cmp(&b.1),
            Some(ordering) => ordering,
        });
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .filter_map(|(distance, id)| {
                self.store.get(&id).map(|chunk| VectorHit {
                    chunk_id: chunk.id,
                    text: chunk.text,
                    metadata: chunk.metadata,
                    distance,
                })
            })
            .collect())
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Chunk, ChunkMetadata};

    fn chunk(id: &str, vendor: &str, embedding: Vec<f32>) -> Chunk {
        Chunk {
            id: id.to_string(),
            text: format!("text of {id}"),
            embedding,
            metadata: ChunkMetadata {
                vendor: vendor.to_string(),
                document: "doc.pdf".to_string(),
                page: None,
                chunk_index: 0,
                source_path: format!("{vendor}/doc.pdf"),
            },
        }
    }

    fn index_with(chunks: Vec<Chunk>) -> (tempfile::TempDir, VectorIndex) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(ChunkStore::open_or_create(dir.path()).unwrap());
        store.upsert_batch(chunks).unwrap();
        (dir, VectorIndex::new(store, None))
    }

    #[test]
    fn test_search_orders_by_ascending_distance() {
        let (_dir, index) = index_with(vec![
            chunk("far", "Dell", vec![0.0, 1.0, 0.0]),
            chunk("near", "Dell", vec![0.9, 0.1, 0.0]),
            chunk("mid", "Dell", vec![0.5, 0.5, 0.0]),
        ]);

        let hits = index.search(&[1.0, 0.0, 0.0], 10, None).unwrap();
        let ids: Vec<&str> = hits.iter().map(|h| h.chunk_id.as_str()).collect();
        assert_eq!(ids, vec!["near", "mid", "far"]);
        assert!(hits[0].distance <= hits[1].distance);
    }

    #[test]
    fn test_tied_distances_break_by_id() {
        let (_dir, index) = index_with(vec![
            chunk("b", "Dell", vec![1.0, 0.0]),
            chunk("a", "Dell", vec![1.0, 0.0]),
        ]);

        let hits = index.search(&[1.0, 0.0], 10, None).unwrap();
        assert_eq!(hits[0].chunk_id, "a");
        assert_eq!(hits[1].chunk_id, "b");
    }

    #[test]
    fn test_dimension_mismatch_is_an_error() {
        let (_dir, index) = index_with(vec![chunk("a", "Dell", vec![1.0, 0.0])]);
        let err = index.search(&[1.0, 0.0, 0.0], 10, None).unwrap_err();
        assert!(matches!(
            err,
            IndexError::DimensionMismatch { expected: 2, got: 3 }
        ));
    }

    #[test]
    fn test_empty_store_returns_empty_not_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(ChunkStore::open_or_create(dir.path()).unwrap());
        let index = VectorIndex::new(store, None);
        assert!(index.search(&[1.0, 0.0], 10, None).unwrap().is_empty());
    }

    #[test]
    fn test_vendor_filter_is_exact() {
        let (_dir, index) = index_with(vec![
            chunk("a", "Fortinet", vec![1.0, 0.0]),
            chunk("b", "Cisco", vec![1.0, 0.0]),
            chunk("c", "Fortinet", vec![0.0, 1.0]),
        ]);

        let hits = index.search(&[1.0, 0.0], 10, Some("Fortinet")).unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|h| h.metadata.vendor == "Fortinet"));
    }

    #[test]
    fn test_max_distance_gates_hits() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(ChunkStore::open_or_create(dir.path()).unwrap());
        store
            .upsert_batch(vec![
                chunk("close", "Dell", vec![1.0, 0.0]),
                chunk("orthogonal", "Dell", vec![0.0, 1.0]),
            ])
            .unwrap();
        let index = VectorIndex::new(store, Some(0.5));

        let hits = index.search(&[1.0, 0.0], 10, None).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].chunk_id, "close");
    }

    #[test]
    fn test_deletion_is_visible_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(ChunkStore::open_or_create(dir.path()).unwrap());
        store
            .upsert_batch(vec![chunk("a", "Dell", vec![1.0, 0.0])])
            .unwrap();
        let index = VectorIndex::new(store.clone(), None);

        assert_eq!(index.search(&[1.0, 0.0], 10, None).unwrap().len(), 1);
        store.remove_document("Dell", "doc.pdf").unwrap();
        assert!(index.search(&[1.0, 0.0], 10, None).unwrap().is_empty());
    }
}
