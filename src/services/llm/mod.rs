// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Commercial

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

pub mod ollama;
pub mod openai;

use crate::config::{Config, Provider};
use crate::error::Result;

pub const SYSTEM_PROMPT: &str = "You are a film classification expert. You rate scripts for age \
appropriateness under the applicable law and answer only with a single JSON object.";

/// What shape of output to ask the model for.
#[derive(Debug, Clone, Copy)]
pub enum OutputMode<'a> {
    /// Free-form completion.
    Text,
    /// Structured output constrained by the given JSON Schema where the
    /// backend supports it.
    Json(&'a Value),
}

#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate a full completion; abandons the request when `cancel` fires.
    async fn generate(
        &self,
        prompt: &str,
        mode: OutputMode<'_>,
        cancel: CancellationToken,
    ) -> Result<String>;

    /// Check the backend is reachable and the model is usable.
    async fn verify(&self) -> Result<()>;

    fn name(&self) -> &str;
}

pub fn create_provider(config: &Config) -> Result<Box<dyn LlmProvider>> {
    match config.provider {
        Provider::Ollama => Ok(Box::new(ollama::OllamaProvider::new(config))),
        Provider::OpenAI => Ok(Box::new(openai::OpenAiProvider::new(config))),
    }
}
