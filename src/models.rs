use serde::{Deserialize, Serialize};

/// The atomic retrievable unit: a bounded passage of document text with its
/// embedding and provenance metadata.
///
/// Ids are deterministic from (vendor, document, page, chunk index), so
/// re-ingesting the same logical chunk overwrites instead of duplicating.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub text: String,
    pub embedding: Vec<f32>,
    pub metadata: ChunkMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub vendor: String,
    pub document: String,
    pub page: Option<String>,
    pub chunk_index: usize,
    pub source_path: String,
}

/// One page of already-extracted document text handed to ingestion.
/// The core parses no file formats; extraction happens upstream.
#[derive(Debug, Clone, Deserialize)]
pub struct PageText {
    pub page: Option<String>,
    pub text: String,
}

/// A fused search result: vector and lexical rankings merged via RRF.
#[derive(Debug, Clone, Serialize)]
pub struct FusedHit {
    pub chunk_id: String,
    pub text: String,
    pub metadata: ChunkMetadata,
    pub combined_score: f32,
    /// Cosine distance when the chunk appeared in the vector ranking.
    pub vector_distance: Option<f32>,
    /// BM25 score when the chunk appeared in the lexical ranking.
    pub lexical_score: Option<f32>,
}

/// Per-document aggregate used by the listing endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentSummary {
    pub vendor: String,
    pub document: String,
    pub chunk_count: usize,
    pub page_count: usize,
}

/// A single conversation turn (user or assistant).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

// ─── Request/response types ──────────────────────────────

/// Query request
#[derive(Debug, Clone, Deserialize)]
pub struct QueryRequest {
    pub question: String,
    pub session_id: Option<String>,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Restrict results to a single vendor (vector-only search).
    pub vendor: Option<String>,
}

fn default_top_k() -> usize {
    5
}

/// Source metadata for one retrieved passage, index-aligned with the chunk
/// texts in the response.
#[derive(Debug, Clone, Serialize)]
pub struct SourceInfo {
    pub vendor: String,
    pub document: String,
    pub page: Option<String>,
    pub chunk: usize,
    pub score: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    /// Retrieved chunk texts, most relevant first.
    pub chunks: Vec<String>,
    /// Source metadata, index-aligned with `chunks`.
    pub sources: Vec<SourceInfo>,
    pub session_id: String,
}

/// Ingest request: pre-extracted page texts for one document.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestRequest {
    pub vendor: String,
    pub document: String,
    pub pages: Vec<PageText>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestResponse {
    pub vendor: String,
    pub document: String,
    pub chunks_added: usize,
    pub total_chunks: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentListResponse {
    pub documents: Vec<DocumentSummary>,
    pub total_chunks: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    pub vendor: String,
    pub document: String,
    pub chunks_removed: usize,
    pub total_remaining: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub chunk_count: usize,
    pub embedding_model: String,
}
