// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Commercial

// miette's Diagnostic derive generates code that triggers this false positive
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    #[error("Input text is empty")]
    #[diagnostic(
        code(scriptrate::input::empty),
        help("Extract plain text from the document before submitting it")
    )]
    EmptyInput,

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Cannot connect to Ollama at {host}")]
    #[diagnostic(
        code(scriptrate::ollama::not_running),
        help("Start Ollama with: ollama serve")
    )]
    OllamaNotRunning { host: String },

    #[error("Model '{model}' not found. Available: {}", available.join(", "))]
    #[diagnostic(
        code(scriptrate::ollama::model_not_found),
        help("Pull the model with: ollama pull {model}")
    )]
    ModelNotFound {
        model: String,
        available: Vec<String>,
    },

    #[error("Provider '{provider}' error: {message}")]
    #[diagnostic(code(scriptrate::provider::error))]
    Provider { provider: String, message: String },

    #[error("{operation} timed out after {secs}s")]
    #[diagnostic(
        code(scriptrate::timeout),
        help("Raise timeout_secs or use a smaller model")
    )]
    Timeout { operation: String, secs: u64 },

    #[error("Embedding failed: {0}")]
    #[diagnostic(code(scriptrate::retrieval::embedding))]
    Embedding(String),

    #[error("Retrieval index error: {0}")]
    #[diagnostic(
        code(scriptrate::retrieval::index),
        help("Check qdrant_url and that the legal corpus was loaded with `scriptrate ingest`")
    )]
    Retrieval(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(scriptrate::config::error))]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("Dialog error: {0}")]
    Dialog(String),

    #[cfg(feature = "secure-storage")]
    #[error("Keyring error: {0}")]
    #[diagnostic(
        code(scriptrate::keyring::error),
        help("Check your system keychain configuration")
    )]
    Keyring(String),
}

impl From<dialoguer::Error> for Error {
    fn from(e: dialoguer::Error) -> Self {
        Error::Dialog(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
