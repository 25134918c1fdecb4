//! Gemini embedContent client.

use super::{EmbeddingProvider, EmbeddingTask};
use crate::config::EmbeddingConfig;
use crate::error::{EmbeddingError, IndexError};
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct GeminiEmbedder {
    client: reqwest::Client,
    base_url: String,
    model: String,
    dimension: usize,
}

impl GeminiEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self, IndexError> {
        Self::with_base_url(config, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(config: &EmbeddingConfig, base_url: &str) -> Result<Self, IndexError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-goog-api-key",
            HeaderValue::from_str(config.api_key.trim()).map_err(|_| {
                EmbeddingError::InitializationFailed("API key is not a valid header value".into())
            })?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| EmbeddingError::InitializationFailed(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            dimension: config.dimension,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:embedContent", self.base_url, self.model)
    }
}

#[derive(Debug, Serialize)]
struct EmbedContentRequest<'a> {
    content: Content<'a>,
    #[serde(rename = "taskType")]
    task_type: &'static str,
    #[serde(rename = "outputDimensionality")]
    output_dimensionality: usize,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedContentResponse {
    embedding: EmbeddingValues,
}

#[derive(Debug, Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

fn build_request(text: &str, task: EmbeddingTask, dimension: usize) -> EmbedContentRequest<'_> {
    EmbedContentRequest {
        content: Content {
            parts: vec![Part { text }],
        },
        task_type: task.as_api_str(),
        output_dimensionality: dimension,
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for GeminiEmbedder {
    async fn embed(&self, text: &str, task: EmbeddingTask) -> Result<Vec<f32>> {
        let request = build_request(text, task, self.dimension);

        let response = self
            .client
            .post(self.endpoint())
            .json(&request)
            .send()
            .await
            .context("embedding request failed to send")?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(EmbeddingError::RequestFailed {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let parsed: EmbedContentResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;

        let values = parsed.embedding.values;
        if values.len() != self.dimension {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimension,
                actual: values.len(),
            }
            .into());
        }
        Ok(values)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
