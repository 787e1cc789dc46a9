// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Commercial

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::{FutureExt, StreamExt, stream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::domain::{
    AgeCategory, AnalysisResult, ClassificationSchema, NO_CONTEXT_MARKER, ScriptUnit,
};
use crate::error::{Error, Result};
use crate::services::aggregator::SeverityAggregator;
use crate::services::classifier::{Classifier, PromptTemplate};
use crate::services::guided;
use crate::services::llm::{self, LlmProvider};
use crate::services::resolver::AgeResolver;
use crate::services::retrieval::{
    Embedder, OllamaEmbedder, QdrantIndex, Retriever, VectorRetriever,
};
use crate::services::segmenter::Segmenter;

/// Canonical query for the shared legal context of a submission.
pub const LEGAL_CONTEXT_QUERY: &str = "age rating classification of films: scenes of violence, \
erotic content and nudity, obscene language, drugs alcohol and smoking, frightening scenes";

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub legal_query: String,
    pub retrieval_k: usize,
    pub max_concurrent_units: usize,
    pub retrieval_timeout: Duration,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            legal_query: LEGAL_CONTEXT_QUERY.to_string(),
            retrieval_k: 5,
            max_concurrent_units: 1,
            retrieval_timeout: Duration::from_secs(300),
        }
    }
}

impl PipelineOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            legal_query: LEGAL_CONTEXT_QUERY.to_string(),
            retrieval_k: config.retrieval_k,
            max_concurrent_units: config.max_concurrent_units,
            retrieval_timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

/// segment -> shared legal context -> classify units -> aggregate -> resolve.
pub struct Pipeline {
    segmenter: Segmenter,
    retriever: Arc<dyn Retriever>,
    classifier: Classifier,
    options: PipelineOptions,
    cancel: CancellationToken,
}

impl Pipeline {
    pub fn new(
        segmenter: Segmenter,
        retriever: Arc<dyn Retriever>,
        classifier: Classifier,
        options: PipelineOptions,
    ) -> Self {
        Self {
            segmenter,
            retriever,
            classifier,
            options,
            cancel: CancellationToken::new(),
        }
    }

    /// Wire the production collaborators (model provider, Ollama embeddings,
    /// Qdrant) from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let provider: Arc<dyn LlmProvider> = Arc::from(llm::create_provider(config)?);
        let template = match config.prompt_file {
            Some(ref path) => PromptTemplate::from_file(path)?,
            None => PromptTemplate::default(),
        };
        let classifier = Classifier::new(
            provider,
            template,
            Duration::from_secs(config.timeout_secs),
        );

        let embedder: Arc<dyn Embedder> = Arc::new(OllamaEmbedder::new(config));
        let retriever = Arc::new(VectorRetriever::new(embedder, QdrantIndex::new(config)));

        Ok(Self::new(
            Segmenter::from_config(config),
            retriever,
            classifier,
            PipelineOptions::from_config(config),
        ))
    }

    /// Cancel in-flight model calls when `cancel` fires.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.classifier = self.classifier.with_cancellation(cancel.clone());
        self.cancel = cancel;
        self
    }

    /// Rate one submission. Never fails: any error or panic along the way
    /// becomes the minimal `Unknown` record.
    pub async fn run_analysis(&self, text: &str) -> AnalysisResult {
        match AssertUnwindSafe(self.analyze(text)).catch_unwind().await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                warn!(error = %e, "analysis failed");
                AnalysisResult::error(e)
            }
            Err(_) => {
                error!("analysis panicked");
                AnalysisResult::error("internal failure during analysis")
            }
        }
    }

    async fn analyze(&self, text: &str) -> Result<AnalysisResult> {
        let units = self.segmenter.segment(text);
        if units.is_empty() {
            return Err(Error::EmptyInput);
        }
        info!(units = units.len(), chars = text.len(), "submission segmented");

        let context = self.legal_context().await;

        // buffered() yields in input order regardless of completion order
        let results: Vec<ClassificationSchema> = stream::iter(&units)
            .map(|unit| self.classify_unit(unit, &context))
            .buffered(self.options.max_concurrent_units.max(1))
            .collect()
            .await;

        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        Ok(Self::assemble(&results))
    }

    async fn legal_context(&self) -> String {
        let retrieved = tokio::time::timeout(
            self.options.retrieval_timeout,
            self.retriever
                .retrieve(&self.options.legal_query, self.options.retrieval_k),
        )
        .await
        .unwrap_or_else(|_| {
            Err(Error::Timeout {
                operation: "legal context retrieval".into(),
                secs: self.options.retrieval_timeout.as_secs(),
            })
        });

        match retrieved {
            Ok(context) if !context.is_empty() => {
                debug!(passages = context.passages.len(), "legal context retrieved");
                context.to_prompt_context()
            }
            Ok(_) => {
                warn!("legal index returned no passages, continuing without context");
                NO_CONTEXT_MARKER.to_string()
            }
            Err(e) => {
                warn!(error = %e, "legal context unavailable, continuing without context");
                NO_CONTEXT_MARKER.to_string()
            }
        }
    }

    async fn classify_unit(&self, unit: &ScriptUnit, context: &str) -> ClassificationSchema {
        debug!(unit = unit.index, chars = unit.text.len(), "classifying unit");
        let result = self.classifier.classify(&unit.text, context).await;
        debug!(
            unit = unit.index,
            proposed = %result.age_category,
            informative = result.is_informative(),
            "unit classified"
        );
        result
    }

    /// Combine per-unit records (in unit order) into the final record.
    pub fn assemble(results: &[ClassificationSchema]) -> AnalysisResult {
        if !results.iter().any(ClassificationSchema::is_informative) {
            // Nothing usable came back; surface the first failure if any
            if let Some(failed) = results.iter().find(|r| r.summary.starts_with("Error:")) {
                return failed.clone();
            }
            let mut record = guided::unknown_record();
            record.summary = format!(
                "Model output could not be parsed for any of {} segment(s)",
                results.len()
            );
            return record;
        }

        let aggregated = SeverityAggregator::aggregate(results);
        let computed = AgeResolver::resolve(&aggregated);
        let proposed = AgeResolver::most_restrictive(results.iter().map(|r| r.age_category));
        let age_category = AgeResolver::reconcile(proposed, computed);

        info!(
            computed = %computed,
            proposed = %proposed,
            final_category = %age_category,
            "age category resolved"
        );

        AnalysisResult {
            age_category,
            parents_guide: SeverityAggregator::merge_guide(results, &aggregated),
            summary: Self::summarize(results, age_category),
        }
    }

    fn summarize(results: &[ClassificationSchema], age_category: AgeCategory) -> String {
        let mut summaries: Vec<&str> = results
            .iter()
            .filter(|r| r.is_informative())
            .map(|r| r.summary.trim())
            .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("unknown"))
            .collect();
        summaries.dedup();

        if summaries.is_empty() {
            format!(
                "Rated {age_category} from {} segment(s); the model gave no summary.",
                results.len()
            )
        } else {
            summaries.join("\n")
        }
    }
}
