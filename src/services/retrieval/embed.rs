// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Commercial

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::Embedder;
use crate::config::Config;
use crate::error::{Error, Result};

/// Embeddings from Ollama's `/api/embed`.
pub struct OllamaEmbedder {
    client: Client,
    host: String,
    model: String,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl OllamaEmbedder {
    pub fn new(config: &Config) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();

        Self {
            client,
            host: config.ollama_host.trim_end_matches('/').to_string(),
            model: config.embed_model.clone(),
        }
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/api/embed", self.host);

        let response = self
            .client
            .post(&url)
            .json(&EmbedRequest {
                model: &self.model,
                input: inputs,
            })
            .send()
            .await
            .map_err(|e| Error::Embedding(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Embedding(format!("HTTP {status}: {body}")));
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| Error::Embedding(e.to_string()))?;

        if parsed.embeddings.len() != inputs.len() {
            return Err(Error::Embedding(format!(
                "expected {} vectors, got {}",
                inputs.len(),
                parsed.embeddings.len()
            )));
        }

        Ok(parsed.embeddings)
    }
}
