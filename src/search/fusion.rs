//! Reciprocal Rank Fusion of the vector and lexical rankings.
//!
//! Cosine distance and BM25 score are not comparable units, so fusion uses
//! rank position only: every hit at 0-indexed rank `r` contributes
//! `1 / (rrf_k + r + 1)` to its chunk's accumulator, and a chunk appearing
//! in both lists sums both contributions. Agreement between the semantic and
//! lexical signal is rewarded without any score normalization.

use std::collections::HashMap;

use crate::models::FusedHit;
use crate::search::bm25::LexicalHit;
use crate::search::vector::VectorHit;

/// Merge the two rankings and keep the top `k` by fused score descending,
/// ties broken by chunk id ascending.
///
/// Display fields (text, metadata) come from whichever list first contained
/// the chunk; when both did, the vector copy wins. The copies are identical
/// in content; the preference exists purely so output is deterministic.
pub fn reciprocal_rank_fusion(
    vector_hits: &[VectorHit],
    lexical_hits: &[LexicalHit],
    k: usize,
    rrf_k: f32,
) -> Vec<FusedHit> {
    let mut fused: HashMap<String, FusedHit> = HashMap::new();

    for (rank, hit) in vector_hits.iter().enumerate() {
        let rrf_score = 1.0 / (rrf_k + rank as f32 + 1.0);
        let entry = fused
            .entry(hit.chunk_id.clone())
            .or_insert_with(|| FusedHit {
                chunk_id: hit.chunk_id.clone(),
                text: hit.text.clone(),
                metadata: hit.metadata.clone(),
                combined_score: 0.0,
                vector_distance: None,
                lexical_score: None,
            });
        entry.vector_distance = Some(hit.distance);
        entry.combined_score += rrf_score;
    }

    for (rank, hit) in lexical_hits.iter().enumerate() {
        let rrf_score = 1.0 / (rrf_k + rank as f32 + 1.0);
        let entry = fused
            .entry(hit.chunk_id.clone())
            .or_insert_with(|| FusedHit {
                chunk_id: hit.chunk_id.clone(),
                text: hit.text.clone(),
                metadata: hit.metadata.clone(),
                combined_score: 0.0,
                vector_distance: None,
                lexical_score: None,
            });
        entry.lexical_score = Some(hit.score);
        entry.combined_score += rrf_score;
    }

    let mut results: Vec<FusedHit> = fused.into_values().collect();
    results.sort_by(|a, b| match b.combined_score.partial_cmp(&a.combined_score) {
        Some(std::cmp::Ordering::Equal) | None => a.chunk_id.cmp(&b.chunk_id),
        Some(ordering) => ordering,
    });
    results.truncate(k);
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChunkMetadata;

    fn meta(vendor: &str) -> ChunkMetadata {
        ChunkMetadata {
            vendor: vendor.to_string(),
            document: "doc.pdf".to_string(),
            page: None,
            chunk_index: 0,
            source_path: format!("{vendor}/doc.pdf"),
        }
    }

    fn vector_hit(id: &str, distance: f32) -> VectorHit {
        VectorHit {
            chunk_id: id.to_string(),
            text: format!("vector copy of {id}"),
            metadata: meta("Acme"),
            distance,
        }
    }

    fn lexical_hit(id: &str, score: f32) -> LexicalHit {
        LexicalHit {
            chunk_id: id.to_string(),
            text: format!("lexical copy of {id}"),
            metadata: meta("Acme"),
            score,
        }
    }

    #[test]
    fn test_empty_inputs() {
        let results = reciprocal_rank_fusion(&[], &[], 10, 60.0);
        assert!(results.is_empty());
    }

    #[test]
    fn test_vector_only() {
        let hits = vec![vector_hit("a", 0.1), vector_hit("b", 0.3)];
        let results = reciprocal_rank_fusion(&hits, &[], 10, 60.0);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chunk_id, "a");
        assert!(results[0].combined_score > results[1].combined_score);
        assert_eq!(results[0].vector_distance, Some(0.1));
        assert!(results[0].lexical_score.is_none());
    }

    #[test]
    fn test_lexical_only() {
        let hits = vec![lexical_hit("a", 5.0), lexical_hit("b", 3.0)];
        let results = reciprocal_rank_fusion(&[], &hits, 10, 60.0);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chunk_id, "a");
        assert_eq!(results[0].lexical_score, Some(5.0));
    }

    #[test]
    fn test_chunk_in_both_lists_is_boosted() {
        // "both" is rank 1 in each list; "v" and "l" are rank 0 in one list
        // only. Two mid contributions beat one top contribution.
        let vector = vec![vector_hit("v", 0.1), vector_hit("both", 0.2)];
        let lexical = vec![lexical_hit("l", 9.0), lexical_hit("both", 7.0)];

        let results = reciprocal_rank_fusion(&vector, &lexical, 10, 60.0);
        assert_eq!(results[0].chunk_id, "both");
        assert_eq!(results.len(), 3);
    }

    #[test]
    fn test_top_of_both_lists_ranks_first() {
        let vector = vec![vector_hit("a", 0.1), vector_hit("b", 0.2)];
        let lexical = vec![lexical_hit("a", 9.0), lexical_hit("c", 2.0)];

        let results = reciprocal_rank_fusion(&vector, &lexical, 10, 60.0);
        assert_eq!(results[0].chunk_id, "a");
    }

    #[test]
    fn test_display_fields_prefer_vector_copy() {
        let vector = vec![vector_hit("a", 0.1)];
        let lexical = vec![lexical_hit("a", 5.0)];

        let results = reciprocal_rank_fusion(&vector, &lexical, 10, 60.0);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].text, "vector copy of a");
        assert_eq!(results[0].vector_distance, Some(0.1));
        assert_eq!(results[0].lexical_score, Some(5.0));
    }

    #[test]
    fn test_tied_scores_break_by_chunk_id() {
        // Same rank in disjoint lists gives identical fused scores.
        let vector = vec![vector_hit("b", 0.1)];
        let lexical = vec![lexical_hit("a", 5.0)];

        let results = reciprocal_rank_fusion(&vector, &lexical, 10, 60.0);
        assert_eq!(results[0].chunk_id, "a");
        assert_eq!(results[1].chunk_id, "b");
    }

    #[test]
    fn test_truncates_to_k() {
        let vector: Vec<VectorHit> = (0..20)
            .map(|i| vector_hit(&format!("chunk_{i:02}"), i as f32 * 0.01))
            .collect();
        let results = reciprocal_rank_fusion(&vector, &[], 5, 60.0);
        assert_eq!(results.len(), 5);
    }

    #[test]
    fn test_rrf_contribution_formula() {
        let vector = vec![vector_hit("a", 0.1)];
        let results = reciprocal_rank_fusion(&vector, &[], 10, 60.0);
        let expected = 1.0 / (60.0 + 1.0);
        assert!((results[0].combined_score - expected).abs() < 1e-6);
    }
}
