use super::OpenAiClient;
use crate::{Result, StashError};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl OpenAiClient {
    /// Embed a single text. No retry and no caching: a provider failure
    /// propagates to the caller as `Upstream`.
    #[inline]
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.is_empty() {
            return Err(StashError::Validation(
                "embedding input must not be empty".to_string(),
            ));
        }

        debug!("Generating embedding for text (length: {})", text.len());

        let url = self.endpoint("v1/embeddings")?;
        let request = EmbeddingRequest {
            model: &self.embedding_model,
            input: text,
        };

        let response = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| StashError::Upstream(format!("embedding request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(StashError::Upstream(format!(
                "embedding request returned HTTP {}",
                response.status()
            )));
        }

        let body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| StashError::Upstream(format!("malformed embedding response: {}", e)))?;

        let embedding = body
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| StashError::Upstream("no embedding returned".to_string()))?;

        debug!("Generated embedding with {} dimensions", embedding.len());
        Ok(embedding)
    }
}
