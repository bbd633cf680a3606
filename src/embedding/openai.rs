use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::EmbeddingConfig;
use crate::error::EmbeddingError;

use super::{check_not_blank, truncate_for_embedding, Embedder};

const BATCH_SIZE: usize = 64;

/// Embedding backend for OpenAI-compatible APIs.
pub struct OpenAiEmbedder {
    client: reqwest::Client,
    config: EmbeddingConfig,
}

#[derive(Serialize)]
struct EmbedRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedData>,
}

#[derive(Deserialize)]
struct EmbedData {
    embedding: Vec<f32>,
}

impl OpenAiEmbedder {
    pub fn new(client: reqwest::Client, config: EmbeddingConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn encode(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let results = self.encode_batch(&[text.to_string()]).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::Backend("No embedding returned".to_string()))
    }

    async fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        check_not_blank(texts)?;

        let url = format!("{}/v1/embeddings", self.config.base_url);
        let api_key = self.config.api_key.as_deref().unwrap_or_default();
        let truncated: Vec<String> = texts
            .iter()
            .map(|t| truncate_for_embedding(t).to_string())
            .collect();

        let mut all_embeddings = Vec::with_capacity(texts.len());

        for chunk in truncated.chunks(BATCH_SIZE) {
            let req = EmbedRequest {
                model: self.config.model.clone(),
                input: chunk.to_vec(),
            };

            let resp = self
                .client
                .post(&url)
                .header("Authorization", format!("Bearer {api_key}"))
                .json(&req)
                .send()
                .await
                .map_err(|e| EmbeddingError::Backend(format!("OpenAI embed call failed: {e}")))?;

            if !resp.status().is_success() {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                return Err(EmbeddingError::Backend(format!(
                    "OpenAI embed API returned {status}: {body}"
                )));
            }

            let body: EmbedResponse = resp.json().await.map_err(|e| {
                EmbeddingError::Backend(format!("Failed to parse OpenAI embed response: {e}"))
            })?;

            if body.data.len() != chunk.len() {
                return Err(EmbeddingError::Backend(format!(
                    "OpenAI returned {} embeddings for {} inputs",
                    body.data.len(),
                    chunk.len()
                )));
            }

            all_embeddings.extend(body.data.into_iter().map(|d| d.embedding));
        }

        Ok(all_embeddings)
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }
}
