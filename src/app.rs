// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Commercial

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chardetng::EncodingDetector;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::AsyncReadExt;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::cli::{Cli, Commands};
use crate::config::{Config, Provider};
use crate::domain::AnalysisResult;
use crate::error::{Error, Result};
use crate::services::{
    corpus::CorpusLoader,
    llm,
    pipeline::Pipeline,
    retrieval::{Embedder, OllamaEmbedder, QdrantIndex},
    segmenter::Segmenter,
};

pub struct App {
    cli: Cli,
    config: Config,
    cancel_token: CancellationToken,
}

impl App {
    pub fn new(cli: Cli) -> Result<Self> {
        let config = Config::load(&cli)?;
        debug!(
            provider = %config.provider,
            model = %config.model,
            segmentation = %config.segmentation,
            "config loaded"
        );
        let cancel_token = CancellationToken::new();
        Ok(Self {
            cli,
            config,
            cancel_token,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        let cancel = self.cancel_token.clone();
        tokio::spawn(async move {
            signal::ctrl_c().await.ok();
            cancel.cancel();
        });

        match self.cli.command {
            Commands::Analyze {
                ref input,
                ref output,
            } => self.analyze(input, output.as_deref()).await,
            Commands::Ingest { ref path, recreate } => self.ingest(path.as_deref(), recreate).await,
            Commands::Init => {
                let path = Config::create_default()?;
                println!("Created config: {}", path.display());
                Ok(())
            }
            Commands::Config => {
                self.show_config();
                Ok(())
            }
            Commands::Doctor => self.run_doctor().await,
            Commands::Completions { shell } => {
                let mut cmd = <Cli as clap::CommandFactory>::command();
                clap_complete::generate(shell, &mut cmd, "scriptrate", &mut std::io::stdout());
                Ok(())
            }
            #[cfg(feature = "secure-storage")]
            Commands::SetKey { ref provider } => self.set_api_key(provider),
            #[cfg(feature = "secure-storage")]
            Commands::GetKey { ref provider } => self.get_api_key(provider),
        }
    }

    // ─── Analyze ───

    async fn analyze(&self, input: &Path, output: Option<&Path>) -> Result<()> {
        let text = read_input(input).await?;
        debug!(chars = text.len(), "input read");

        let pipeline = Pipeline::from_config(&self.config)?.with_cancellation(self.cancel_token.clone());

        self.print_status(&format!(
            "Rating with {} ({})...",
            self.config.provider, self.config.model
        ));

        let spinner = self.spinner("classifying script units");
        let result = pipeline.run_analysis(&text).await;
        if let Some(pb) = spinner {
            pb.finish_and_clear();
        }

        if self.cancel_token.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let rendered = serde_json::to_string_pretty(&result)?;
        match output {
            Some(path) => {
                tokio::fs::write(path, format!("{rendered}\n")).await?;
                eprintln!(
                    "{} Wrote {} to {}",
                    style("✓").green().bold(),
                    result.age_category,
                    path.display()
                );
            }
            None => println!("{rendered}"),
        }

        self.report(&result);
        Ok(())
    }

    fn report(&self, result: &AnalysisResult) {
        if result.summary.starts_with("Error:") {
            self.print_warning(&result.summary);
        } else if !result.age_category.is_valid() {
            self.print_warning("No age category could be determined");
        } else {
            eprintln!(
                "{} Age category: {}",
                style("✓").green().bold(),
                style(result.age_category).bold()
            );
        }
    }

    // ─── Ingest ───

    async fn ingest(&self, path: Option<&Path>, recreate: bool) -> Result<()> {
        let path: PathBuf = match path.or(self.config.law_path.as_deref()) {
            Some(p) => p.to_path_buf(),
            None => {
                return Err(Error::Config(
                    "No corpus file given. Pass a path or set law_path in the config".into(),
                ));
            }
        };

        let text = read_input(&path).await?;
        let embedder: Arc<dyn Embedder> = Arc::new(OllamaEmbedder::new(&self.config));
        let segmenter = Segmenter::FixedWindow {
            size: self.config.chunk_size,
            overlap: self.config.chunk_overlap,
        };
        let loader = CorpusLoader::new(embedder, QdrantIndex::new(&self.config), segmenter);

        self.print_status(&format!(
            "Loading {} into collection '{}'...",
            path.display(),
            self.config.law_collection
        ));

        let source = path.display().to_string();
        let spinner = self.spinner("embedding corpus chunks");
        let loaded = tokio::select! {
            res = loader.load(&text, &source, recreate) => res,
            _ = self.cancel_token.cancelled() => Err(Error::Cancelled),
        };
        if let Some(pb) = spinner {
            pb.finish_and_clear();
        }

        let chunks = loaded?;
        eprintln!(
            "{} Indexed {} chunk(s) into '{}'",
            style("✓").green().bold(),
            chunks,
            self.config.law_collection
        );
        Ok(())
    }

    // ─── Config / Doctor ───

    fn show_config(&self) {
        println!("Provider: {}", self.config.provider);
        println!("Model: {}", self.config.model);
        println!("Ollama host: {}", self.config.ollama_host);
        if let Some(ref url) = self.config.openai_base_url {
            println!("OpenAI base URL: {url}");
        }
        println!("Timeout: {}s", self.config.timeout_secs);
        println!("Temperature: {}", self.config.temperature);
        println!("Max tokens: {}", self.config.num_predict);
        println!("Concurrent units: {}", self.config.max_concurrent_units);
        if let Some(ref path) = self.config.prompt_file {
            println!("Prompt file: {}", path.display());
        }
        println!();
        println!("[retrieval]");
        println!("  embed_model: {}", self.config.embed_model);
        println!("  qdrant_url: {}", self.config.qdrant_url);
        println!("  law_collection: {}", self.config.law_collection);
        println!("  retrieval_k: {}", self.config.retrieval_k);
        if let Some(ref path) = self.config.law_path {
            println!("  law_path: {}", path.display());
        }
        println!();
        println!("[segmentation]");
        println!("  mode: {}", self.config.segmentation);
        println!("  chunk_size: {}", self.config.chunk_size);
        println!("  chunk_overlap: {}", self.config.chunk_overlap);
        println!("  scene_markers: {}", self.config.scene_markers.join(", "));
    }

    async fn run_doctor(&self) -> Result<()> {
        eprintln!("{} Running diagnostics...\n", style("→").cyan());

        eprintln!("{}", style("Configuration").bold().underlined());
        eprintln!("  Provider:    {}", self.config.provider);
        eprintln!("  Model:       {}", self.config.model);
        eprintln!("  Timeout:     {}s", self.config.timeout_secs);
        if let Some(ref path) = Config::config_path() {
            let status = if path.exists() { "found" } else { "not found" };
            eprintln!("  Config file: {} ({})", path.display(), status);
        }
        eprintln!();

        eprintln!("{}", style("Provider Check").bold().underlined());
        let provider = llm::create_provider(&self.config)?;
        match self.config.provider {
            Provider::Ollama => eprint!("  Ollama ({}): ", self.config.ollama_host),
            Provider::OpenAI => eprint!("  OpenAI API: "),
        }
        match provider.verify().await {
            Ok(()) => {
                eprintln!("{}", style("OK").green().bold());
                eprintln!(
                    "  Model '{}': {}",
                    self.config.model,
                    style("available").green()
                );
            }
            Err(Error::OllamaNotRunning { .. }) => {
                eprintln!("{}", style("NOT RUNNING").red().bold());
                eprintln!("  Start with: {}", style("ollama serve").yellow());
            }
            Err(Error::ModelNotFound { ref available, .. }) => {
                eprintln!("{}", style("connected").green());
                eprintln!(
                    "  Model '{}': {}",
                    self.config.model,
                    style("NOT FOUND").red().bold()
                );
                eprintln!(
                    "  Pull with: {}",
                    style(format!("ollama pull {}", self.config.model)).yellow()
                );
                if !available.is_empty() {
                    eprintln!("  Available: {}", available.join(", "));
                }
            }
            Err(e) => {
                eprintln!("{}: {}", style("ERROR").red().bold(), e);
            }
        }
        eprintln!();

        eprintln!("{}", style("Retrieval Index").bold().underlined());
        eprint!("  Embeddings ({}): ", self.config.embed_model);
        let embedder = OllamaEmbedder::new(&self.config);
        match embedder.embed(&["ping".to_string()]).await {
            Ok(vectors) => {
                let dims = vectors.first().map(Vec::len).unwrap_or_default();
                eprintln!("{} ({} dims)", style("OK").green().bold(), dims);
            }
            Err(e) => eprintln!("{}: {}", style("ERROR").red().bold(), e),
        }

        eprint!(
            "  Qdrant ({}) '{}': ",
            self.config.qdrant_url, self.config.law_collection
        );
        match QdrantIndex::new(&self.config).info().await {
            Ok(Some(info)) => {
                eprintln!(
                    "{} ({} passages)",
                    style("OK").green().bold(),
                    info.points_count
                );
            }
            Ok(None) => {
                eprintln!("{}", style("NOT FOUND").red().bold());
                eprintln!(
                    "  Load with: {}",
                    style("scriptrate ingest <corpus.txt>").yellow()
                );
            }
            Err(e) => eprintln!("{}: {}", style("ERROR").red().bold(), e),
        }

        eprintln!();
        eprintln!("{} Diagnostics complete.", style("✓").green().bold());

        Ok(())
    }

    // ─── Keyring Commands ───

    #[cfg(feature = "secure-storage")]
    fn set_api_key(&self, provider: &str) -> Result<()> {
        let provider_lower = provider.to_lowercase();
        if provider_lower != "openai" {
            return Err(Error::Config(format!(
                "Keyring storage is only for cloud providers (openai), got '{}'",
                provider
            )));
        }

        eprintln!(
            "Enter API key for {} (input will be hidden):",
            style(&provider_lower).bold()
        );

        let key = dialoguer::Password::new()
            .with_prompt("API key")
            .interact()?;

        if key.trim().is_empty() {
            return Err(Error::Config("API key cannot be empty".into()));
        }

        let entry = keyring::Entry::new("scriptrate", &provider_lower)
            .map_err(|e| Error::Keyring(e.to_string()))?;
        entry
            .set_password(key.trim())
            .map_err(|e| Error::Keyring(e.to_string()))?;

        eprintln!(
            "{} API key stored for {}",
            style("✓").green().bold(),
            provider_lower
        );
        Ok(())
    }

    #[cfg(feature = "secure-storage")]
    fn get_api_key(&self, provider: &str) -> Result<()> {
        let provider_lower = provider.to_lowercase();
        if provider_lower != "openai" {
            return Err(Error::Config(format!(
                "Keyring storage is only for cloud providers (openai), got '{}'",
                provider
            )));
        }

        let entry = keyring::Entry::new("scriptrate", &provider_lower)
            .map_err(|e| Error::Keyring(e.to_string()))?;

        match entry.get_password() {
            Ok(_) => {
                eprintln!(
                    "{} API key for {} is stored in keychain",
                    style("✓").green().bold(),
                    provider_lower
                );
            }
            Err(keyring::Error::NoEntry) => {
                eprintln!(
                    "{} No API key found for {} in keychain",
                    style("✗").red().bold(),
                    provider_lower
                );
                eprintln!(
                    "  Store one with: {}",
                    style(format!("scriptrate set-key {}", provider_lower)).yellow()
                );
            }
            Err(e) => {
                return Err(Error::Keyring(e.to_string()));
            }
        }

        Ok(())
    }

    // ─── Output Helpers ───

    fn spinner(&self, msg: &'static str) -> Option<ProgressBar> {
        if !std::io::stderr().is_terminal() {
            return None;
        }
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg} [{elapsed}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(msg);
        pb.enable_steady_tick(Duration::from_millis(120));
        Some(pb)
    }

    fn print_status(&self, msg: &str) {
        eprintln!("{} {}", style("→").cyan(), msg);
    }

    fn print_warning(&self, msg: &str) {
        eprintln!("{} {}", style("warning:").yellow().bold(), msg);
    }
}

/// Read a file, or stdin for `-`, as text.
async fn read_input(path: &Path) -> Result<String> {
    let bytes = if path.as_os_str() == "-" {
        let mut buf = Vec::new();
        tokio::io::stdin().read_to_end(&mut buf).await?;
        buf
    } else {
        tokio::fs::read(path).await?
    };

    Ok(decode_text(bytes))
}

/// UTF-8 as is; anything else goes through charset detection first.
fn decode_text(bytes: Vec<u8>) -> String {
    let bytes = match String::from_utf8(bytes) {
        Ok(text) => return text,
        Err(err) => err.into_bytes(),
    };

    let mut detector = EncodingDetector::new();
    detector.feed(&bytes, true);
    let encoding = detector.guess(None, true);
    let (text, _, had_errors) = encoding.decode(&bytes);
    debug!(encoding = encoding.name(), had_errors, "input decoded");
    text.into_owned()
}
