// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Commercial

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::domain::ClassificationSchema;
use crate::error::{Error, Result};
use crate::services::guided::{self, CLASSIFICATION_JSON_SCHEMA};
use crate::services::llm::{LlmProvider, OutputMode};
use crate::services::sanitizer::{ParseOutcome, ResponseSanitizer};

pub const DEFAULT_PROMPT_TEMPLATE: &str = r#"You are rating a film script for age appropriateness.

Use the legal requirements below as the basis of your decision.

LEGAL CONTEXT:
{context}

SCRIPT FRAGMENT:
{script}

Rate each category with exactly one of: None, Mid, Moderate, Severe.
Give a one-sentence reason per category quoting what you saw.
Propose an age category, one of: 0+, 6+, 12+, 16+, 18+.

Answer with a single JSON object and nothing else:
{
  "AgeCategory": "...",
  "ParentsGuide": {
    "Sex & Nudity": {"Severity": "...", "Reason": "..."},
    "Violence & Gore": {"Severity": "...", "Reason": "..."},
    "Profanity": {"Severity": "...", "Reason": "..."},
    "Alcohol, Drugs & Smoking": {"Severity": "...", "Reason": "..."},
    "Frightening & Intense Scenes": {"Severity": "...", "Reason": "..."}
  },
  "Summary": "..."
}"#;

/// Classification prompt with `{context}` and `{script}` placeholders.
#[derive(Debug, Clone)]
pub struct PromptTemplate(String);

impl PromptTemplate {
    /// `{script_fragment}` is accepted as an alias of `{script}`.
    pub fn new(template: impl Into<String>) -> Result<Self> {
        let template = template.into().replace("{script_fragment}", "{script}");
        if !template.contains("{script}") {
            return Err(Error::Config(
                "prompt template must contain a {script} placeholder".into(),
            ));
        }
        Ok(Self(template))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        Self::new(std::fs::read_to_string(path)?)
    }

    /// Substitute both placeholders in one pass so text inside the context
    /// is never re-expanded.
    pub fn render(&self, context: &str, script: &str) -> String {
        let mut rendered = String::with_capacity(self.0.len() + context.len() + script.len());
        let mut rest = self.0.as_str();

        while let Some(pos) = rest.find('{') {
            rendered.push_str(&rest[..pos]);
            let tail = &rest[pos..];
            if let Some(after) = tail.strip_prefix("{context}") {
                rendered.push_str(context);
                rest = after;
            } else if let Some(after) = tail.strip_prefix("{script}") {
                rendered.push_str(script);
                rest = after;
            } else {
                rendered.push('{');
                rest = &tail[1..];
            }
        }

        rendered.push_str(rest);
        rendered
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self(DEFAULT_PROMPT_TEMPLATE.to_string())
    }
}

/// Prompt -> model -> schema, with a guided fallback. Never fails.
pub struct Classifier {
    provider: Arc<dyn LlmProvider>,
    template: PromptTemplate,
    timeout: Duration,
    cancel: CancellationToken,
}

impl Classifier {
    pub fn new(provider: Arc<dyn LlmProvider>, template: PromptTemplate, timeout: Duration) -> Self {
        Self {
            provider,
            template,
            timeout,
            cancel: CancellationToken::new(),
        }
    }

    /// Abandon in-flight model calls when `cancel` fires.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Classify one unit (or a combined text) against `context`.
    ///
    /// Unparseable output goes through the guided fallback; a failed model
    /// call yields the minimal error record.
    pub async fn classify(&self, script: &str, context: &str) -> ClassificationSchema {
        let prompt = self.template.render(context, script);

        let raw = match self.call(&prompt, OutputMode::Text).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(provider = self.provider.name(), error = %e, "model call failed");
                return ClassificationSchema::error(e);
            }
        };

        match ResponseSanitizer::parse(&raw) {
            ParseOutcome::Parsed(record) => record,
            ParseOutcome::NeedsFallback(reason) => {
                debug!(reason = %reason, raw_len = raw.len(), "falling back to guided generation");
                self.guided(script, context).await
            }
        }
    }

    /// One constrained re-query; if that still does not parse, the
    /// schema-directed fill.
    async fn guided(&self, script: &str, context: &str) -> ClassificationSchema {
        let prompt = guided::guided_prompt(script, context);

        match self
            .call(&prompt, OutputMode::Json(&CLASSIFICATION_JSON_SCHEMA))
            .await
        {
            Ok(raw) => match ResponseSanitizer::parse(&raw) {
                ParseOutcome::Parsed(record) => return record,
                ParseOutcome::NeedsFallback(reason) => {
                    warn!(reason = %reason, "guided output unusable, filling from schema");
                }
            },
            Err(Error::Cancelled) => return ClassificationSchema::error(Error::Cancelled),
            Err(e) => {
                warn!(error = %e, "guided model call failed, filling from schema");
            }
        }

        guided::unknown_record()
    }

    async fn call(&self, prompt: &str, mode: OutputMode<'_>) -> Result<String> {
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        tokio::time::timeout(
            self.timeout,
            self.provider.generate(prompt, mode, self.cancel.clone()),
        )
        .await
        .map_err(|_| Error::Timeout {
            operation: format!("{} model call", self.provider.name()),
            secs: self.timeout.as_secs(),
        })?
    }
}
