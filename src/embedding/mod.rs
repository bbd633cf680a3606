//! Text-to-vector encoding behind a capability trait.
//!
//! One concrete backend is selected at startup from configuration; the
//! retrieval engine only ever sees `dyn Embedder`, which keeps ranking logic
//! backend-agnostic and lets tests substitute a deterministic encoder.

pub mod ollama;
pub mod openai;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::EmbeddingConfig;
use crate::error::EmbeddingError;

pub use ollama::OllamaEmbedder;
pub use openai::OpenAiEmbedder;

/// Maximum characters to send per text to the embedding API.
/// nomic-embed-text has an 8 192-token context; prose tokenises at roughly
/// 1 token per 3-4 chars, so 3 000 chars stays safely under the limit even
/// for dense technical text full of identifiers.
const MAX_EMBED_CHARS: usize = 3_000;

/// Deterministic text encoder. Same text and same model id must produce the
/// same vector across calls; ranking reproducibility depends on it.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Encode a single text. Empty input is an error, not an empty vector.
    async fn encode(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Encode a batch of texts, preserving order.
    async fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Fixed output dimensionality of this backend.
    fn dimension(&self) -> usize;
}

/// Build the configured backend. The provider string is consulted exactly
/// once, here; everything downstream dispatches through the trait.
pub fn from_config(
    config: &EmbeddingConfig,
    client: reqwest::Client,
) -> anyhow::Result<Arc<dyn Embedder>> {
    match config.provider.as_str() {
        "ollama" => Ok(Arc::new(OllamaEmbedder::new(client, config.clone()))),
        "openai" => Ok(Arc::new(OpenAiEmbedder::new(client, config.clone()))),
        other => anyhow::bail!("Unknown embedding provider: {other}"),
    }
}

/// Reject blank input before any network round-trip.
fn check_not_blank(texts: &[String]) -> Result<(), EmbeddingError> {
    if texts.is_empty() || texts.iter().any(|t| t.trim().is_empty()) {
        return Err(EmbeddingError::EmptyInput);
    }
    Ok(())
}

/// Truncate `text` to at most `MAX_EMBED_CHARS`, splitting on a UTF-8 char
/// boundary.
fn truncate_for_embedding(text: &str) -> &str {
    if text.len() <= MAX_EMBED_CHARS {
        return text;
    }
    let mut end = MAX_EMBED_CHARS;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_text_untouched() {
        assert_eq!(truncate_for_embedding("hello"), "hello");
    }

    #[test]
    fn test_truncate_respects_char_boundary() {
        let text = "é".repeat(MAX_EMBED_CHARS); // 2 bytes per char
        let truncated = truncate_for_embedding(&text);
        assert!(truncated.len() <= MAX_EMBED_CHARS);
        assert!(truncated.chars().all(|c| c == 'é'));
    }

    #[test]
    fn test_blank_input_rejected() {
        assert!(check_not_blank(&[]).is_err());
        assert!(check_not_blank(&["  ".to_string()]).is_err());
        assert!(check_not_blank(&["ok".to_string()]).is_ok());
    }
}
