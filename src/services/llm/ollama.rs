// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Commercial

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{LlmProvider, OutputMode, SYSTEM_PROMPT};
use crate::config::Config;
use crate::error::{Error, Result};

pub struct OllamaProvider {
    client: Client,
    host: String,
    model: String,
    temperature: f32,
    num_predict: u32,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    system: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'a Value>,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
}

#[derive(Deserialize)]
struct TagsResponse {
    models: Vec<ModelInfo>,
}

#[derive(Deserialize)]
struct ModelInfo {
    name: String,
}

impl OllamaProvider {
    pub fn new(config: &Config) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();

        Self {
            client,
            // Sanitize: remove trailing slashes to avoid //api/generate
            host: config.ollama_host.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            num_predict: config.num_predict,
        }
    }

    /// List models installed on the server.
    pub async fn health_check(&self) -> Result<Vec<String>> {
        let url = format!("{}/api/tags", self.host);

        let response = self
            .client
            .get(&url)
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .map_err(|_| Error::OllamaNotRunning {
                host: self.host.clone(),
            })?;

        if !response.status().is_success() {
            return Err(Error::OllamaNotRunning {
                host: self.host.clone(),
            });
        }

        let tags: TagsResponse = response.json().await.map_err(|e| Error::Provider {
            provider: "ollama".into(),
            message: e.to_string(),
        })?;

        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    pub async fn verify_model(&self) -> Result<()> {
        let available = self.health_check().await?;

        // "qwen3:8b" matches itself; a bare "qwen3" matches "qwen3:latest"
        let found = available
            .iter()
            .any(|name| name == &self.model || name == &format!("{}:latest", self.model));

        if !found {
            return Err(Error::ModelNotFound {
                model: self.model.clone(),
                available,
            });
        }

        Ok(())
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    async fn generate(
        &self,
        prompt: &str,
        mode: OutputMode<'_>,
        cancel: CancellationToken,
    ) -> Result<String> {
        let url = format!("{}/api/generate", self.host);
        let format = match mode {
            OutputMode::Text => None,
            OutputMode::Json(schema) => Some(schema),
        };

        debug!(
            model = %self.model,
            prompt_chars = prompt.len(),
            structured = format.is_some(),
            "ollama generate"
        );

        let request = GenerateRequest {
            model: &self.model,
            prompt,
            system: SYSTEM_PROMPT,
            stream: true,
            format,
            options: GenerateOptions {
                temperature: self.temperature,
                num_predict: self.num_predict,
            },
        };

        let sent = tokio::select! {
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            sent = self.client.post(&url).json(&request).send() => sent,
        };

        let response = sent.map_err(|e| Error::Provider {
            provider: "ollama".into(),
            message: if e.is_timeout() {
                "request timed out".into()
            } else {
                e.to_string()
            },
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Provider {
                provider: "ollama".into(),
                message: format!("HTTP {status}: {body}"),
            });
        }

        let mut stream = response.bytes_stream();
        let mut full_response = String::new();

        // Chunks from bytes_stream() are not aligned to newlines
        let mut line_buffer = String::new();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    return Err(Error::Cancelled);
                }
                chunk = stream.next() => {
                    let Some(chunk) = chunk else {
                        break;
                    };

                    let chunk = chunk.map_err(|e| Error::Provider {
                        provider: "ollama".into(),
                        message: e.to_string(),
                    })?;

                    line_buffer.push_str(&String::from_utf8_lossy(&chunk));

                    // Newline-delimited JSON
                    while let Some(newline_pos) = line_buffer.find('\n') {
                        let line: String = line_buffer.drain(..=newline_pos).collect();
                        let line = line.trim();

                        if line.is_empty() {
                            continue;
                        }

                        if let Ok(resp) = serde_json::from_str::<GenerateResponse>(line) {
                            full_response.push_str(&resp.response);

                            if resp.done {
                                return Ok(full_response.trim().to_string());
                            }
                        }
                    }
                }
            }
        }

        if !line_buffer.trim().is_empty() {
            if let Ok(resp) = serde_json::from_str::<GenerateResponse>(line_buffer.trim()) {
                full_response.push_str(&resp.response);
            }
        }

        Ok(full_response.trim().to_string())
    }

    async fn verify(&self) -> Result<()> {
        self.verify_model().await
    }

    fn name(&self) -> &str {
        "ollama"
    }
}
