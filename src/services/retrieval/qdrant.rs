// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Commercial

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::config::Config;
use crate::error::{Error, Result};

/// Payload key holding the passage text (shared with LangChain-built collections).
const TEXT_KEY: &str = "page_content";

/// Points per upsert request.
const UPSERT_BATCH: usize = 64;

/// REST client for one Qdrant collection.
pub struct QdrantIndex {
    client: Client,
    base_url: String,
    collection: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub id: String,
    pub score: f32,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct IndexPoint {
    pub id: u64,
    pub vector: Vec<f32>,
    pub text: String,
    pub source: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionInfo {
    pub points_count: u64,
}

#[derive(Deserialize)]
struct Envelope<T> {
    result: T,
}

#[derive(Deserialize)]
struct CollectionResult {
    #[serde(default)]
    points_count: Option<u64>,
}

#[derive(Deserialize)]
struct ScoredPoint {
    id: Value,
    score: f32,
    #[serde(default)]
    payload: Option<Value>,
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    vector: &'a [f32],
    limit: usize,
    with_payload: bool,
}

impl QdrantIndex {
    pub fn new(config: &Config) -> Self {
        Self::with_collection(
            &config.qdrant_url,
            &config.law_collection,
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn with_collection(url: &str, collection: &str, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: url.trim_end_matches('/').to_string(),
            collection: collection.to_string(),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    fn collection_url(&self) -> String {
        format!("{}/collections/{}", self.base_url, self.collection)
    }

    /// `None` when the collection does not exist.
    pub async fn info(&self) -> Result<Option<CollectionInfo>> {
        let response = self
            .client
            .get(self.collection_url())
            .send()
            .await
            .map_err(|e| Error::Retrieval(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = Self::check(response).await?;

        let envelope: Envelope<CollectionResult> = response
            .json()
            .await
            .map_err(|e| Error::Retrieval(e.to_string()))?;

        Ok(Some(CollectionInfo {
            points_count: envelope.result.points_count.unwrap_or(0),
        }))
    }

    pub async fn create(&self, dimensions: usize) -> Result<()> {
        let response = self
            .client
            .put(self.collection_url())
            .json(&json!({"vectors": {"size": dimensions, "distance": "Cosine"}}))
            .send()
            .await
            .map_err(|e| Error::Retrieval(e.to_string()))?;

        Self::check(response).await.map(|_| ())
    }

    pub async fn drop_collection(&self) -> Result<()> {
        let response = self
            .client
            .delete(self.collection_url())
            .send()
            .await
            .map_err(|e| Error::Retrieval(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        Self::check(response).await.map(|_| ())
    }

    pub async fn upsert(&self, points: &[IndexPoint]) -> Result<()> {
        let url = format!("{}/points?wait=true", self.collection_url());

        for batch in points.chunks(UPSERT_BATCH) {
            let points: Vec<Value> = batch
                .iter()
                .map(|p| {
                    json!({
                        "id": p.id,
                        "vector": p.vector,
                        "payload": {
                            TEXT_KEY: p.text,
                            "metadata": {"source": p.source, "chunk": p.id}
                        }
                    })
                })
                .collect();

            let response = self
                .client
                .put(&url)
                .json(&json!({ "points": points }))
                .send()
                .await
                .map_err(|e| Error::Retrieval(e.to_string()))?;
            Self::check(response).await?;
        }

        Ok(())
    }

    /// Nearest `k` points, ordered by score (desc) then id so equal scores
    /// come back in a stable order.
    pub async fn search(&self, vector: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        let url = format!("{}/points/search", self.collection_url());

        let response = self
            .client
            .post(&url)
            .json(&SearchRequest {
                vector,
                limit: k,
                with_payload: true,
            })
            .send()
            .await
            .map_err(|e| Error::Retrieval(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::Retrieval(format!(
                "collection '{}' not found",
                self.collection
            )));
        }
        let response = Self::check(response).await?;

        let envelope: Envelope<Vec<ScoredPoint>> = response
            .json()
            .await
            .map_err(|e| Error::Retrieval(e.to_string()))?;

        let mut hits: Vec<SearchHit> = envelope
            .result
            .into_iter()
            .map(|point| SearchHit {
                id: match point.id {
                    Value::String(s) => s,
                    other => other.to_string(),
                },
                score: point.score,
                text: point
                    .payload
                    .as_ref()
                    .and_then(|p| p.get(TEXT_KEY).or_else(|| p.get("text")))
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            })
            .collect();

        hits.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
        hits.truncate(k);
        Ok(hits)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(Error::Retrieval(format!("HTTP {status}: {body}")))
    }
}
