use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::Deserialize;

use super::{EmbeddingClientConfig, EmbeddingProvider};

#[derive(Debug, Deserialize)]
pub struct EmbeddingResponse {
    pub data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingData {
    pub embedding: Vec<f32>,
}

impl EmbeddingResponse {
    fn into_embedding(self) -> Result<Vec<f32>> {
        self.data
            .into_iter()
            .next()
            .map(|data| data.embedding)
            .ok_or_else(|| anyhow::anyhow!("No embedding in response"))
    }
}

/// Embeddings over the OpenAI-compatible `/embeddings` endpoint.
pub struct OpenAiEmbedder {
    client: Client,
    config: EmbeddingClientConfig,
}

impl OpenAiEmbedder {
    pub fn new(config: EmbeddingClientConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let body = serde_json::json!({
            "model": self.config.model(),
            "input": text,
            "encoding_format": "float"
        });

        let resp = self
            .client
            .post(self.config.embeddings_url())
            .bearer_auth(self.config.api_key().expose_secret())
            .json(&body)
            .send()
            .await
            .context("Embedding request failed")?
            .error_for_status()
            .context("Embedding endpoint returned an error status")?
            .json::<EmbeddingResponse>()
            .await
            .context("Failed to decode embedding response")?;

        let embedding = resp.into_embedding()?;
        tracing::debug!(dimensions = embedding.len(), "generated embedding");
        Ok(embedding)
    }
}
