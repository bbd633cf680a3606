use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Where the chunk store is persisted
    pub data_dir: PathBuf,
    /// Server bind address
    pub bind_addr: String,
    /// Embedding backend configuration
    pub embedding: EmbeddingConfig,
    /// Document chunking configuration
    pub chunking: ChunkingConfig,
    /// Search and fusion configuration
    pub retrieval: RetrievalConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// "ollama" or "openai"
    pub provider: String,
    /// Base URL for the embedding API
    pub base_url: String,
    /// Model name for embeddings
    pub model: String,
    /// API key (only needed for cloud providers)
    pub api_key: Option<String>,
    /// Embedding vector dimension
    pub dimension: usize,
}

/// Chunking trades retrieval recall against chunk count and index size, so
/// window and overlap are configuration rather than constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Words per chunk window
    pub chunk_size: usize,
    /// Words shared between consecutive windows
    pub overlap: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// RRF rank constant
    pub rrf_k: f32,
    /// Optional cosine-distance ceiling for vector hits. `None` keeps the
    /// original behavior of never excluding low-similarity vector hits.
    pub max_distance: Option<f32>,
    /// Deadline for embedding calls, per request
    pub embed_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            bind_addr: "127.0.0.1:8080".to_string(),
            embedding: EmbeddingConfig::default(),
            chunking: ChunkingConfig::default(),
            retrieval: RetrievalConfig::default(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            base_url: "http://localhost:11434".to_string(),
            model: "nomic-embed-text".to_string(),
            api_key: None,
            dimension: 768,
        }
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 250,
            overlap: 50,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            rrf_k: 60.0,
            max_distance: None,
            embed_timeout_ms: 30_000,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = std::env::var("DOC_SEARCH_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Ok(addr) = std::env::var("DOC_SEARCH_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Ok(provider) = std::env::var("EMBED_PROVIDER") {
            config.embedding.provider = provider;
        }
        if let Ok(url) = std::env::var("EMBED_BASE_URL") {
            config.embedding.base_url = url;
        }
        if let Ok(model) = std::env::var("EMBED_MODEL") {
            config.embedding.model = model;
        }
        if let Ok(key) = std::env::var("EMBED_API_KEY") {
            config.embedding.api_key = Some(key);
        }
        if let Ok(dim) = std::env::var("EMBED_DIM") {
            if let Ok(d) = dim.parse() {
                config.embedding.dimension = d;
            }
        }
        if let Ok(val) = std::env::var("DOC_SEARCH_CHUNK_SIZE") {
            if let Ok(v) = val.parse() {
                config.chunking.chunk_size = v;
            }
        }
        if let Ok(val) = std::env::var("DOC_SEARCH_CHUNK_OVERLAP") {
            if let Ok(v) = val.parse() {
                config.chunking.overlap = v;
            }
        }
        if let Ok(val) = std::env::var("DOC_SEARCH_RRF_K") {
            if let Ok(v) = val.parse() {
                config.retrieval.rrf_k = v;
            }
        }
        if let Ok(val) = std::env::var("DOC_SEARCH_MAX_DISTANCE") {
            if let Ok(v) = val.parse::<f32>() {
                config.retrieval.max_distance = Some(v);
            }
        }
        if let Ok(val) = std::env::var("DOC_SEARCH_EMBED_TIMEOUT_MS") {
            if let Ok(v) = val.parse() {
                config.retrieval.embed_timeout_ms = v;
            }
        }

        config
    }

    /// Reject configurations that cannot produce a working pipeline.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.chunking.chunk_size == 0 {
            anyhow::bail!("chunk_size must be positive");
        }
        if self.chunking.overlap >= self.chunking.chunk_size {
            anyhow::bail!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                self.chunking.overlap,
                self.chunking.chunk_size
            );
        }
        if self.retrieval.rrf_k <= 0.0 {
            anyhow::bail!("rrf_k must be positive");
        }
        if self.embedding.dimension == 0 {
            anyhow::bail!("embedding dimension must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_overlap_must_be_smaller_than_chunk_size() {
        let mut config = Config::default();
        config.chunking.chunk_size = 50;
        config.chunking.overlap = 50;
        assert!(config.validate().is_err());
    }
}
