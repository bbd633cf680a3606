//! In-memory BM25 index over a chunk store snapshot.
//!
//! There is no incremental update path: any ingestion or deletion
//! invalidates the snapshot and the next query rebuilds it whole from the
//! store. Rebuild cost is linear in corpus size; ingestion is rare relative
//! to queries.

use std::collections::HashMap;

use crate::models::ChunkMetadata;
use crate::store::ChunkStore;

const K1: f32 = 1.5;
const B: f32 = 0.75;

/// A lexical search hit carrying its display fields.
#[derive(Debug, Clone)]
pub struct LexicalHit {
    pub chunk_id: String,
    pub text: String,
    pub metadata: ChunkMetadata,
    pub score: f32,
}

/// Immutable tokenized corpus + term statistics, tagged with the corpus
/// version it was built from. Shared across concurrent readers behind an
/// `Arc`; replaced wholesale on rebuild.
pub struct LexicalSnapshot {
    pub version: u64,
    docs: Vec<DocEntry>,
    doc_freq: HashMap<String, u32>,
    avg_len: f32,
}

struct DocEntry {
    chunk_id: String,
    text: String,
    metadata: ChunkMetadata,
    term_freq: HashMap<String, u32>,
    len: u32,
}

/// Lowercase and split on non-word boundaries. No stemming, no stopwords:
/// vendor codes and model numbers ("FortiGate-200", "R740xd") must survive
/// tokenization intact as their alphanumeric parts.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

impl LexicalSnapshot {
    /// Build from the current store contents. Iteration is in id order, so
    /// two builds over the same corpus produce identical snapshots.
    pub fn build(store: &ChunkStore, version: u64) -> Self {
        let mut docs = Vec::new();
        store.for_each(|chunk| {
            let tokens = tokenize(&chunk.text);
            let mut term_freq = HashMap::new();
            for token in &tokens {
                *term_freq.entry(token.clone()).or_insert(0u32) += 1;
            }
            docs.push(DocEntry {
                chunk_id: chunk.id.clone(),
                text: chunk.text.clone(),
                metadata: chunk.metadata.clone(),
                len: tokens.len() as u32,
                term_freq,
            });
        });

        let mut doc_freq: HashMap<String, u32> = HashMap::new();
        for doc in &docs {
            for term in doc.term_freq.keys() {
                *doc_freq.entry(term.clone()).or_insert(0) += 1;
            }
        }

        let avg_len = if docs.is_empty() {
            0.0
        } else {
            docs.iter().map(|d| d.len as f32).sum::<f32>() / docs.len() as f32
        };

        Self {
            version,
            docs,
            doc_freq,
            avg_len,
        }
    }

    pub fn doc_count(&self) -> usize {
        self.docs.len()
    }

    /// Score every document against the query and return the top `k` by BM25
    /// score descending, ties broken by chunk id ascending.
    ///
    /// Chunks with score ≤ 0 are excluded entirely: zero term overlap means
    /// "not a match", not "low match". An empty corpus or an empty query
    /// yields an empty result, never an error.
    pub fn search(&self, query: &str, k: usize) -> Vec<LexicalHit> {
        if self.docs.is_empty() || k == 0 {
            return Vec::new();
        }
        let terms = tokenize(query);
        if terms.is_empty() {
            return Vec::new();
        }

        let n = self.docs.len() as f32;
        let mut hits = Vec::new();

        for doc in &self.docs {
            let mut score = 0.0f32;
            for term in &terms {
                let Some(&tf) = doc.term_freq.get(term) else {
                    continue;
                };
                let df = self.doc_freq[term] as f32;
                let idf = (1.0 + (n - df + 0.5) / (df + 0.5)).ln();
                let tf = tf as f32;
                let norm = K1 * (1.0 - B + B * doc.len as f32 / self.avg_len);
                score += idf * tf * (K1 + 1.0) / (tf + norm);
            }

            if score > 0.0 {
                hits.push(LexicalHit {
                    chunk_id: doc.chunk_id.clone(),
                    text: doc.text.clone(),
                    metadata: doc.metadata.clone(),
                    score,
                });
            }
        }

        hits.sort_by(|a, b| match b.score.partial_cmp(&a.score) {
            Some(std::cmp::Ordering::Equal) | None => a.chunk_id.cmp(&b.chunk_id),
            Some(ordering) => ordering,
        });
        hits.truncate(k);
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Chunk, ChunkMetadata};

    fn store_with(texts: &[(&str, &str)]) -> (tempfile::TempDir, ChunkStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ChunkStore::open_or_create(dir.path()).unwrap();
        let chunks: Vec<Chunk> = texts
            .iter()
            .map(|(id, text)| Chunk {
                id: id.to_string(),
                text: text.to_string(),
                embedding: vec![0.0],
                metadata: ChunkMetadata {
                    vendor: "Acme".to_string(),
                    document: "doc.pdf".to_string(),
                    page: None,
                    chunk_index: 0,
                    source_path: "Acme/doc.pdf".to_string(),
                },
            })
            .collect();
        store.upsert_batch(chunks).unwrap();
        (dir, store)
    }

    #[test]
    fn test_tokenize_lowercases_and_splits() {
        assert_eq!(
            tokenize("FortiGate-200 VPN setup!"),
            vec!["fortigate", "200", "vpn", "setup"]
        );
    }

    #[test]
    fn test_tokenize_keeps_underscores_together() {
        assert_eq!(tokenize("max_vpn_tunnels"), vec!["max_vpn_tunnels"]);
    }

    #[test]
    fn test_empty_corpus_returns_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = ChunkStore::open_or_create(dir.path()).unwrap();
        let snapshot = LexicalSnapshot::build(&store, 0);
        assert!(snapshot.search("anything", 10).is_empty());
    }

    #[test]
    fn test_zero_overlap_excluded() {
        let (_dir, store) = store_with(&[
            ("a", "FortiGate firewall VPN setup"),
            ("b", "Cisco switch VLAN config"),
        ]);
        let snapshot = LexicalSnapshot::build(&store, 0);
        let hits = snapshot.search("FortiGate VPN", 10);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].chunk_id, "a");
    }

    #[test]
    fn test_rarer_term_scores_higher() {
        let (_dir, store) = store_with(&[
            ("a", "routing table routing protocol"),
            ("b", "routing overview"),
            ("c", "bgp peering session"),
        ]);
        let snapshot = LexicalSnapshot::build(&store, 0);
        // "bgp" appears in one doc, "routing" in two: the bgp doc should win
        // a query mentioning both terms once.
        let hits = snapshot.search("bgp routing", 10);
        assert_eq!(hits[0].chunk_id, "c");
    }

    #[test]
    fn test_tied_scores_break_by_id() {
        let (_dir, store) = store_with(&[("b", "identical text"), ("a", "identical text")]);
        let snapshot = LexicalSnapshot::build(&store, 0);
        let hits = snapshot.search("identical", 10);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunk_id, "a");
        assert_eq!(hits[1].chunk_id, "b");
    }

    #[test]
    fn test_truncates_to_k() {
        let (_dir, store) = store_with(&[
            ("a", "vpn one"),
            ("b", "vpn two"),
            ("c", "vpn three"),
        ]);
        let snapshot = LexicalSnapshot::build(&store, 0);
        assert_eq!(snapshot.search("vpn", 2).len(), 2);
    }

    #[test]
    fn test_empty_query_returns_empty() {
        let (_dir, store) = store_with(&[("a", "some text")]);
        let snapshot = LexicalSnapshot::build(&store, 0);
        assert!(snapshot.search("!!!", 10).is_empty());
    }
}
