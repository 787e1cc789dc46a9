// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Commercial

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use scriptrate::domain::{
    AgeCategory, ClassificationSchema, ContentCategory, GuideEntry, Passage, RetrievedContext,
    Severity,
};
use scriptrate::error::{Error, Result};
use scriptrate::services::llm::{LlmProvider, OutputMode};
use scriptrate::services::retrieval::Retriever;

/// What a stub model does for one call.
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    Fail(String),
    /// Never answers within any sane test timeout.
    Hang,
}

#[allow(dead_code)]
pub fn text(s: impl Into<String>) -> Reply {
    Reply::Text(s.into())
}

/// Model stub answering from a queue, one reply per call.
#[allow(dead_code)]
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Reply>>,
    calls: AtomicUsize,
    json_calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl ScriptedProvider {
    pub fn new(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            calls: AtomicUsize::new(0),
            json_calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn json_calls(&self) -> usize {
        self.json_calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn generate(
        &self,
        prompt: &str,
        mode: OutputMode<'_>,
        _cancel: CancellationToken,
    ) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if matches!(mode, OutputMode::Json(_)) {
            self.json_calls.fetch_add(1, Ordering::SeqCst);
        }
        self.prompts.lock().unwrap().push(prompt.to_string());

        let reply = self.replies.lock().unwrap().pop_front();
        respond(reply.unwrap_or_else(|| Reply::Fail("no scripted reply left".into()))).await
    }

    async fn verify(&self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Model stub answering by prompt content: the first route whose marker
/// appears in the prompt wins, after its delay.
#[allow(dead_code)]
pub struct RoutedProvider {
    routes: Vec<(String, Duration, Reply)>,
    fallback: Reply,
}

#[allow(dead_code)]
impl RoutedProvider {
    pub fn new(fallback: Reply) -> Self {
        Self {
            routes: Vec::new(),
            fallback,
        }
    }

    pub fn route(mut self, marker: &str, reply: Reply) -> Self {
        self.routes.push((marker.to_string(), Duration::ZERO, reply));
        self
    }

    pub fn route_delayed(mut self, marker: &str, delay: Duration, reply: Reply) -> Self {
        self.routes.push((marker.to_string(), delay, reply));
        self
    }
}

#[async_trait]
impl LlmProvider for RoutedProvider {
    async fn generate(
        &self,
        prompt: &str,
        _mode: OutputMode<'_>,
        _cancel: CancellationToken,
    ) -> Result<String> {
        let (delay, reply) = self
            .routes
            .iter()
            .find(|(marker, _, _)| prompt.contains(marker.as_str()))
            .map(|(_, delay, reply)| (*delay, reply.clone()))
            .unwrap_or((Duration::ZERO, self.fallback.clone()));

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        respond(reply).await
    }

    async fn verify(&self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "routed"
    }
}

async fn respond(reply: Reply) -> Result<String> {
    match reply {
        Reply::Text(s) => Ok(s),
        Reply::Fail(message) => Err(Error::Provider {
            provider: "stub".into(),
            message,
        }),
        Reply::Hang => {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Err(Error::Provider {
                provider: "stub".into(),
                message: "hung".into(),
            })
        }
    }
}

/// Retrieval stub with canned passages, or a canned failure.
#[allow(dead_code)]
pub struct StubRetriever {
    result: std::result::Result<Vec<String>, String>,
    calls: AtomicUsize,
}

#[allow(dead_code)]
impl StubRetriever {
    pub fn with_passages(passages: &[&str]) -> Self {
        Self {
            result: Ok(passages.iter().map(|p| p.to_string()).collect()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            result: Err(message.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Retriever for StubRetriever {
    async fn retrieve(&self, _query: &str, k: usize) -> Result<RetrievedContext> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.result {
            Ok(ref passages) => Ok(RetrievedContext {
                passages: passages
                    .iter()
                    .take(k)
                    .enumerate()
                    .map(|(rank, text)| Passage {
                        rank,
                        score: 1.0 - rank as f32 * 0.1,
                        text: text.clone(),
                    })
                    .collect(),
            }),
            Err(ref message) => Err(Error::Retrieval(message.clone())),
        }
    }
}

/// Model answer in the shape the classification prompt asks for.
#[allow(dead_code)]
pub fn model_json(age: &str, severities: [&str; 5], summary: &str) -> String {
    let guide: serde_json::Map<String, serde_json::Value> = ContentCategory::ALL
        .iter()
        .zip(severities)
        .map(|(category, severity)| {
            (
                category.label().to_string(),
                json!({"Severity": severity, "Reason": format!("{} looked {}", category.label(), severity)}),
            )
        })
        .collect();

    json!({
        "AgeCategory": age,
        "ParentsGuide": guide,
        "Summary": summary,
    })
    .to_string()
}

/// Classification record with the given severities in `ContentCategory::ALL` order.
#[allow(dead_code)]
pub fn make_record(age: AgeCategory, severities: [Severity; 5]) -> ClassificationSchema {
    ClassificationSchema {
        age_category: age,
        parents_guide: ContentCategory::ALL
            .iter()
            .zip(severities)
            .map(|(category, severity)| {
                (*category, GuideEntry::rated(severity, format!("{category}: {severity}")))
            })
            .collect(),
        summary: String::new(),
    }
}

#[allow(dead_code)]
pub const ALL_NONE: [Severity; 5] = [Severity::None; 5];
