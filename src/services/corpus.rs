// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Commercial

use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::services::retrieval::qdrant::IndexPoint;
use crate::services::retrieval::{Embedder, QdrantIndex};
use crate::services::segmenter::Segmenter;

/// Chunks embedded per request while loading.
const EMBED_BATCH: usize = 32;

/// One-time loading of the legal corpus into the retrieval index.
///
/// Must finish before any classification traffic uses the collection.
pub struct CorpusLoader {
    embedder: Arc<dyn Embedder>,
    index: QdrantIndex,
    segmenter: Segmenter,
}

impl CorpusLoader {
    pub fn new(embedder: Arc<dyn Embedder>, index: QdrantIndex, segmenter: Segmenter) -> Self {
        Self {
            embedder,
            index,
            segmenter,
        }
    }

    /// Chunk, embed and upsert `text`. With `recreate` the collection is
    /// dropped first; otherwise new points are appended after existing ones.
    /// Returns the number of chunks written.
    pub async fn load(&self, text: &str, source: &str, recreate: bool) -> Result<usize> {
        let chunks: Vec<String> = self
            .segmenter
            .segment(text)
            .into_iter()
            .map(|unit| unit.text)
            .collect();

        if chunks.is_empty() {
            return Err(Error::EmptyInput);
        }

        if recreate {
            info!(collection = self.index.collection(), "dropping collection");
            self.index.drop_collection().await?;
        }

        let existing = self.index.info().await?;
        let mut created = existing.is_some();
        let mut next_id = existing.map(|info| info.points_count).unwrap_or(0);

        for batch in chunks.chunks(EMBED_BATCH) {
            let vectors = self.embedder.embed(batch).await?;

            if !created {
                let dimensions = vectors.first().map(Vec::len).unwrap_or_default();
                if dimensions == 0 {
                    return Err(Error::Embedding("embedding model returned empty vectors".into()));
                }
                self.index.create(dimensions).await?;
                created = true;
            }

            let points: Vec<IndexPoint> = batch
                .iter()
                .zip(vectors)
                .map(|(text, vector)| {
                    let point = IndexPoint {
                        id: next_id,
                        vector,
                        text: text.clone(),
                        source: source.to_string(),
                    };
                    next_id += 1;
                    point
                })
                .collect();

            self.index.upsert(&points).await?;
            debug!(points = points.len(), "upserted batch");
        }

        info!(
            collection = self.index.collection(),
            chunks = chunks.len(),
            "corpus loaded"
        );
        Ok(chunks.len())
    }
}
