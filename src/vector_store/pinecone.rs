//! Pinecone data-plane client over HTTP.

use super::{Namespace, QueryMatch, VectorRecord, VectorStore};
use crate::config::StoreConfig;
use crate::error::{IndexError, StoreError};
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};

/// Upper bound the service accepts per delete request
const DELETE_BATCH_SIZE: usize = 1000;

pub struct PineconeStore {
    client: reqwest::Client,
    base_url: String,
}

impl PineconeStore {
    pub fn new(config: &StoreConfig) -> Result<Self, IndexError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "Api-Key",
            HeaderValue::from_str(config.api_key.trim()).map_err(|_| {
                StoreError::InitializationFailed("API key is not a valid header value".into())
            })?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| StoreError::InitializationFailed(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.host.trim_end_matches('/').to_string(),
        })
    }

    async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("vector store request to {} failed to send", path))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(StoreError::RequestFailed {
                status: status.as_u16(),
                body,
            }
            .into());
        }
        Ok(response)
    }
}

#[derive(Debug, Serialize)]
struct UpsertRequest<'a> {
    vectors: &'a [VectorRecord],
    namespace: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct UpsertResponse {
    #[serde(rename = "upsertedCount", default)]
    upserted_count: usize,
}

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    vector: &'a [f32],
    #[serde(rename = "topK")]
    top_k: usize,
    namespace: &'a str,
    #[serde(rename = "includeMetadata")]
    include_metadata: bool,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryResponseMatch>,
}

#[derive(Debug, Deserialize)]
struct QueryResponseMatch {
    id: String,
    #[serde(default)]
    score: f32,
    metadata: Option<crate::types::ChunkMetadata>,
}

#[derive(Debug, Serialize)]
struct DeleteRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    ids: Option<&'a [String]>,
    #[serde(rename = "deleteAll", skip_serializing_if = "Option::is_none")]
    delete_all: Option<bool>,
    namespace: &'a str,
}

#[async_trait::async_trait]
impl VectorStore for PineconeStore {
    async fn upsert(&self, namespace: Namespace, records: Vec<VectorRecord>) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }
        let count = records.len();
        let request = UpsertRequest {
            vectors: &records,
            namespace: namespace.as_str(),
        };
        let response = self.post("/vectors/upsert", &request).await?;
        let parsed: UpsertResponse = response
            .json()
            .await
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))?;

        Ok(if parsed.upserted_count > 0 {
            parsed.upserted_count
        } else {
            count
        })
    }

    async fn query(
        &self,
        namespace: Namespace,
        vector: Vec<f32>,
        top_k: usize,
    ) -> Result<Vec<QueryMatch>> {
        let request = QueryRequest {
            vector: &vector,
            top_k,
            namespace: namespace.as_str(),
            include_metadata: true,
        };
        let response = self.post("/query", &request).await?;
        let parsed: QueryResponse = response
            .json()
            .await
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))?;

        Ok(parsed
            .matches
            .into_iter()
            .filter_map(|entry| {
                let Some(metadata) = entry.metadata else {
                    tracing::debug!("match {} carries no metadata, dropping", entry.id);
                    return None;
                };
                Some(QueryMatch {
                    id: entry.id,
                    score: entry.score,
                    metadata,
                })
            })
            .collect())
    }

    async fn delete_ids(&self, namespace: Namespace, ids: &[String]) -> Result<()> {
        for batch in ids.chunks(DELETE_BATCH_SIZE) {
            let request = DeleteRequest {
                ids: Some(batch),
                delete_all: None,
                namespace: namespace.as_str(),
            };
            self.post("/vectors/delete", &request).await?;
        }
        Ok(())
    }

    async fn delete_all(&self, namespace: Namespace) -> Result<()> {
        let request = DeleteRequest {
            ids: None,
            delete_all: Some(true),
            namespace: namespace.as_str(),
        };
        self.post("/vectors/delete", &request).await?;
        Ok(())
    }
}
