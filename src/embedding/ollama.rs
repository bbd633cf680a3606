use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::EmbeddingConfig;
use crate::error::EmbeddingError;

use super::{check_not_blank, truncate_for_embedding, Embedder};

/// Ollama supports batch embedding through the /api/embed endpoint.
const BATCH_SIZE: usize = 32;

/// Embedding backend talking to a local Ollama server.
pub struct OllamaEmbedder {
    client: reqwest::Client,
    config: EmbeddingConfig,
}

#[derive(Serialize)]
struct EmbedRequest {
    model: String,
    input: Vec<String>,
    /// Ask Ollama to silently truncate inputs that exceed the model's
    /// context length instead of returning a 400 error.
    truncate: bool,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl OllamaEmbedder {
    pub fn new(client: reqwest::Client, config: EmbeddingConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn encode(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let results = self.encode_batch(&[text.to_string()]).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::Backend("No embedding returned".to_string()))
    }

    async fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        check_not_blank(texts)?;

        let url = format!("{}/api/embed", self.config.base_url);
        let truncated: Vec<String> = texts
            .iter()
            .map(|t| truncate_for_embedding(t).to_string())
            .collect();

        let mut all_embeddings = Vec::with_capacity(texts.len());

        for chunk in truncated.chunks(BATCH_SIZE) {
            let req = EmbedRequest {
                model: self.config.model.clone(),
                input: chunk.to_vec(),
                truncate: true,
            };

            let resp = self
                .client
                .post(&url)
                .json(&req)
                .send()
                .await
                .map_err(|e| EmbeddingError::Backend(format!("Ollama embed call failed: {e}")))?;

            if !resp.status().is_success() {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                return Err(EmbeddingError::Backend(format!(
                    "Ollama embed API returned {status}: {body}"
                )));
            }

            let body: EmbedResponse = resp.json().await.map_err(|e| {
                EmbeddingError::Backend(format!("Failed to parse Ollama embed response: {e}"))
            })?;

            if body.embeddings.len() != chunk.len() {
                return Err(EmbeddingError::Backend(format!(
                    "Ollama returned {} embeddings for {} inputs",
                    body.embeddings.len(),
                    chunk.len()
                )));
            }

            all_embeddings.extend(body.embeddings);
        }

        Ok(all_embeddings)
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }
}
