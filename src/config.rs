// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Commercial

use directories::ProjectDirs;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use url::Url;

use crate::cli::Cli;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Ollama,
    OpenAI,
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ollama => write!(f, "ollama"),
            Self::OpenAI => write!(f, "openai"),
        }
    }
}

/// How submitted text is cut into units
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Segmentation {
    /// Split at scene headings (INT./EXT. ...)
    #[default]
    Scenes,
    /// Fixed overlapping character windows
    Window,
}

impl std::fmt::Display for Segmentation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Scenes => write!(f, "scenes"),
            Self::Window => write!(f, "window"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub provider: Provider,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_ollama_host")]
    pub ollama_host: String,

    /// Base URL for OpenAI-compatible APIs (default: https://api.openai.com/v1)
    #[serde(default)]
    pub openai_base_url: Option<String>,

    #[serde(default)]
    pub api_key: Option<String>,

    /// Ollama embedding model used for the legal index
    #[serde(default = "default_embed_model")]
    pub embed_model: String,

    #[serde(default = "default_qdrant_url")]
    pub qdrant_url: String,

    /// Qdrant collection holding the legal corpus
    #[serde(default = "default_law_collection")]
    pub law_collection: String,

    /// Passages fetched per retrieval query
    #[serde(default = "default_retrieval_k")]
    pub retrieval_k: usize,

    /// Chunk size in characters (corpus windows, max unit length)
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Default legal corpus for `scriptrate ingest`
    #[serde(default)]
    pub law_path: Option<PathBuf>,

    #[serde(default)]
    pub segmentation: Segmentation,

    /// Case-insensitive line prefixes that start a new scene
    #[serde(default = "default_scene_markers")]
    pub scene_markers: Vec<String>,

    /// Units classified concurrently (default 1: sequential)
    #[serde(default = "default_max_concurrent_units")]
    pub max_concurrent_units: usize,

    /// Per-call timeout in seconds for model and index requests (default 300)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// LLM temperature (0.0-2.0, default 0.0 for repeatable ratings)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate (default 1024)
    #[serde(default = "default_num_predict")]
    pub num_predict: u32,

    /// Replace the built-in classification prompt; must contain `{script}`
    #[serde(default)]
    pub prompt_file: Option<PathBuf>,
}

fn default_model() -> String {
    "qwen3:8b".into()
}
fn default_ollama_host() -> String {
    "http://localhost:11434".into()
}
fn default_embed_model() -> String {
    "nomic-embed-text".into()
}
fn default_qdrant_url() -> String {
    "http://localhost:6333".into()
}
fn default_law_collection() -> String {
    "law_collection".into()
}
fn default_retrieval_k() -> usize {
    5
}
fn default_chunk_size() -> usize {
    4_000
}
fn default_chunk_overlap() -> usize {
    200
}
fn default_scene_markers() -> Vec<String> {
    ["INT.", "EXT.", "INT/EXT", "I/E", "SCENE", "СЦЕНА", "ИНТ.", "НАТ."]
        .into_iter()
        .map(String::from)
        .collect()
}
fn default_max_concurrent_units() -> usize {
    1
}
fn default_timeout_secs() -> u64 {
    300
}
fn default_temperature() -> f32 {
    0.0
}
fn default_num_predict() -> u32 {
    1024
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            model: default_model(),
            ollama_host: default_ollama_host(),
            openai_base_url: None,
            api_key: None,
            embed_model: default_embed_model(),
            qdrant_url: default_qdrant_url(),
            law_collection: default_law_collection(),
            retrieval_k: default_retrieval_k(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            law_path: None,
            segmentation: Segmentation::default(),
            scene_markers: default_scene_markers(),
            max_concurrent_units: default_max_concurrent_units(),
            timeout_secs: default_timeout_secs(),
            temperature: default_temperature(),
            num_predict: default_num_predict(),
            prompt_file: None,
        }
    }
}

impl Config {
    /// Load with priority: CLI > ENV > user config > project config > defaults
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        // Project-level config (.scriptrate.toml in working directory)
        if let Ok(cwd) = std::env::current_dir() {
            let project_config = cwd.join(".scriptrate.toml");
            if project_config.exists() {
                figment = figment.merge(Toml::file(&project_config));
            }
        }

        if let Some(path) = Self::config_path() {
            if path.exists() {
                figment = figment.merge(Toml::file(&path));
            }
        }

        // SCRIPTRATE_MODEL, SCRIPTRATE_QDRANT_URL, ...
        figment = figment.merge(Env::prefixed("SCRIPTRATE_").split("__"));

        let mut config: Config = figment
            .extract()
            .map_err(|e| Error::Config(e.to_string()))?;

        if config.api_key.is_none() && config.provider == Provider::OpenAI {
            config.api_key = std::env::var("OPENAI_API_KEY").ok();
        }

        #[cfg(feature = "secure-storage")]
        if config.api_key.is_none() && config.provider != Provider::Ollama {
            let provider_name = config.provider.to_string();
            if let Ok(entry) = keyring::Entry::new("scriptrate", &provider_name) {
                if let Ok(key) = entry.get_password() {
                    config.api_key = Some(key);
                }
            }
        }

        config.apply_cli(cli);
        config.validate()?;
        Ok(config)
    }

    pub fn config_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "scriptrate").map(|dirs| dirs.config_dir().to_path_buf())
    }

    pub fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|d| d.join("config.toml"))
    }

    fn apply_cli(&mut self, cli: &Cli) {
        if let Some(ref p) = cli.provider {
            self.provider = match p.to_lowercase().as_str() {
                "openai" => Provider::OpenAI,
                _ => Provider::Ollama,
            };
        }
        if let Some(ref m) = cli.model {
            self.model = m.clone();
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.provider == Provider::OpenAI && self.api_key.is_none() {
            return Err(Error::Config(
                "openai requires an API key. Set SCRIPTRATE_API_KEY or OPENAI_API_KEY".into(),
            ));
        }

        if self.model.trim().is_empty() {
            return Err(Error::Config("model cannot be empty".into()));
        }

        Self::validate_url("ollama_host", &self.ollama_host)?;
        Self::validate_url("qdrant_url", &self.qdrant_url)?;
        if let Some(ref base) = self.openai_base_url {
            Self::validate_url("openai_base_url", base)?;
        }

        if self.law_collection.trim().is_empty() {
            return Err(Error::Config("law_collection cannot be empty".into()));
        }

        if !(1..=50).contains(&self.retrieval_k) {
            return Err(Error::Config(format!(
                "retrieval_k must be 1–50, got {}",
                self.retrieval_k
            )));
        }

        if !(200..=200_000).contains(&self.chunk_size) {
            return Err(Error::Config(format!(
                "chunk_size must be 200–200000, got {}",
                self.chunk_size
            )));
        }

        if self.chunk_overlap >= self.chunk_size {
            return Err(Error::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }

        if self.segmentation == Segmentation::Scenes
            && self.scene_markers.iter().all(|m| m.trim().is_empty())
        {
            return Err(Error::Config(
                "scene_markers cannot be empty with segmentation = \"scenes\"".into(),
            ));
        }

        if !(1..=32).contains(&self.max_concurrent_units) {
            return Err(Error::Config(format!(
                "max_concurrent_units must be 1–32, got {}",
                self.max_concurrent_units
            )));
        }

        if !(1..=3600).contains(&self.timeout_secs) {
            return Err(Error::Config(format!(
                "timeout_secs must be 1–3600, got {}",
                self.timeout_secs
            )));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(Error::Config(format!(
                "temperature must be 0.0–2.0, got {}",
                self.temperature
            )));
        }

        Ok(())
    }

    fn validate_url(field: &str, value: &str) -> Result<()> {
        let parsed = Url::parse(value)
            .map_err(|e| Error::Config(format!("{field} is not a valid URL ('{value}'): {e}")))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "{field} must start with http:// or https://, got '{value}'"
            )));
        }

        Ok(())
    }

    /// Create default config file with secure permissions
    pub fn create_default() -> Result<PathBuf> {
        let Some(dir) = Self::config_dir() else {
            return Err(Error::Config("Cannot determine config directory".into()));
        };

        fs::create_dir_all(&dir)?;

        let path = dir.join("config.toml");
        let content = r#"# scriptrate configuration

# LLM provider: ollama, openai
provider = "ollama"

# Generative model (for Ollama, use `ollama list` to see available)
model = "qwen3:8b"

# Ollama server URL (generation and embeddings)
ollama_host = "http://localhost:11434"

# Embedding model for the legal corpus index
embed_model = "nomic-embed-text"

# Qdrant server and collection holding the legal corpus
qdrant_url = "http://localhost:6333"
law_collection = "law_collection"

# Passages of legal context added to every prompt
retrieval_k = 5

# Chunking (characters) for the corpus and for over-long scenes
chunk_size = 4000
chunk_overlap = 200

# Legal corpus loaded by `scriptrate ingest` (plain text)
# law_path = "data/law.txt"

# Unit segmentation: "scenes" (scene headings) or "window"
segmentation = "scenes"

# Units classified at once against the model server
max_concurrent_units = 1

# Per-request timeout in seconds
timeout_secs = 300
"#;

        fs::write(&path, content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(&path)?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&path, perms)?;
        }

        Ok(path)
    }
}
