// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Commercial

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

pub mod embed;
pub mod qdrant;

use crate::domain::{Passage, RetrievedContext};
use crate::error::{Error, Result};

pub use embed::OllamaEmbedder;
pub use qdrant::QdrantIndex;

#[async_trait]
pub trait Embedder: Send + Sync {
    /// One vector per input, in input order.
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>>;
}

#[async_trait]
pub trait Retriever: Send + Sync {
    /// Top-`k` passages for `query`, most relevant first.
    async fn retrieve(&self, query: &str, k: usize) -> Result<RetrievedContext>;
}

/// Embeds the query and searches a Qdrant collection.
pub struct VectorRetriever {
    embedder: Arc<dyn Embedder>,
    index: QdrantIndex,
}

impl VectorRetriever {
    pub fn new(embedder: Arc<dyn Embedder>, index: QdrantIndex) -> Self {
        Self { embedder, index }
    }
}

#[async_trait]
impl Retriever for VectorRetriever {
    async fn retrieve(&self, query: &str, k: usize) -> Result<RetrievedContext> {
        let mut vectors = self.embedder.embed(&[query.to_string()]).await?;
        let vector = vectors
            .pop()
            .ok_or_else(|| Error::Embedding("no vector returned for query".into()))?;

        let hits = self.index.search(&vector, k).await?;
        debug!(
            collection = self.index.collection(),
            hits = hits.len(),
            "retrieved passages"
        );

        Ok(RetrievedContext {
            passages: hits
                .into_iter()
                .enumerate()
                .map(|(rank, hit)| Passage {
                    rank,
                    score: hit.score,
                    text: hit.text,
                })
                .collect(),
        })
    }
}
