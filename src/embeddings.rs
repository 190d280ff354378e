//! # Embeddings
//!
//! The [`Embedder`] trait is the seam between the index/search code and whatever
//! produces vectors. [`OpenAiEmbedder`] talks to any OpenAI compatible
//! `/embeddings` endpoint.
//!
//! The embedder is built once in `main` from [`MuseConfig`] and passed by reference
//! to [`update_index`](crate::index::update_index) and
//! [`find_related`](crate::search::find_related). It only holds credentials and an
//! HTTP connection pool, so there is nothing to tear down.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::time::Duration;
use tracing::debug;

use crate::config::MuseConfig;

/// Anything that can turn text into a vector.
#[allow(async_fn_in_trait)]
pub trait Embedder {
    /// Embed `input`. Implementations do not retry.
    async fn embed(&self, input: &str) -> Result<Vec<f32>, Box<dyn Error>>;
}

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

/// Embeddings over HTTP, `POST {api_base}/embeddings`.
#[derive(Debug, Clone)]
pub struct OpenAiEmbedder {
    client: Client,
    api_base: String,
    api_key: String,
    model: String,
}

impl OpenAiEmbedder {
    /// Build an embedder whose requests time out after `timeout`.
    pub fn new(
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, Box<dyn Error>> {
        let client = Client::builder().timeout(timeout).build()?;
        let api_base: String = api_base.into();
        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    pub fn from_config(config: &MuseConfig) -> Result<Self, Box<dyn Error>> {
        Self::new(
            config.api_base.clone(),
            config.api_key.clone(),
            config.embedding_model.clone(),
            config.request_timeout(),
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl Embedder for OpenAiEmbedder {
    async fn embed(&self, input: &str) -> Result<Vec<f32>, Box<dyn Error>> {
        let url = format!("{}/embeddings", self.api_base);
        debug!("Requesting embedding from {url} ({} bytes)", input.len());

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&EmbeddingRequest {
                model: &self.model,
                input,
            })
            .send()
            .await?
            .error_for_status()?;

        let body: EmbeddingResponse = response.json().await?;
        body.data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| "embedding response contained no data".into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn embedder_for(server: &MockServer) -> OpenAiEmbedder {
        OpenAiEmbedder::new(
            server.base_url(),
            "test-key",
            "text-embedding-ada-002",
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_embed_sends_model_and_input() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/embeddings")
                    .header("authorization", "Bearer test-key")
                    .json_body(json!({
                        "model": "text-embedding-ada-002",
                        "input": "hello world"
                    }));
                then.status(200).json_body(json!({
                    "object": "list",
                    "data": [{ "object": "embedding", "index": 0, "embedding": [0.5, -0.25, 1.0] }],
                    "model": "text-embedding-ada-002"
                }));
            })
            .await;

        let v = embedder_for(&server).embed("hello world").await.unwrap();

        mock.assert_async().await;
        assert_eq!(v, vec![0.5, -0.25, 1.0]);
    }

    #[tokio::test]
    async fn test_embed_http_error_is_err() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/embeddings");
                then.status(500).body("boom");
            })
            .await;

        assert!(embedder_for(&server).embed("x").await.is_err());
    }

    #[tokio::test]
    async fn test_embed_empty_data_is_err() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/embeddings");
                then.status(200).json_body(json!({ "data": [] }));
            })
            .await;

        let err = embedder_for(&server).embed("x").await.unwrap_err();
        assert!(err.to_string().contains("no data"));
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let e = OpenAiEmbedder::new("http://x/v1/", "k", "m", Duration::from_secs(1)).unwrap();
        assert_eq!(e.api_base, "http://x/v1");
        assert_eq!(e.model(), "m");
    }
}
