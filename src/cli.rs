// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Commercial

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "scriptrate")]
#[command(version)]
#[command(about = "Age-rating classification of film scripts with retrieval-augmented LLM prompting", long_about = None)]
pub struct Cli {
    /// LLM provider (ollama, openai)
    #[arg(short, long, global = true, env = "SCRIPTRATE_PROVIDER")]
    pub provider: Option<String>,

    /// Model name
    #[arg(short, long, global = true, env = "SCRIPTRATE_MODEL")]
    pub model: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rate a script and print the classification record as JSON
    Analyze {
        /// Plain-text script, or `-` for stdin
        input: PathBuf,

        /// Write the JSON record here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Load the legal corpus into the retrieval index
    Ingest {
        /// Plain-text corpus (defaults to `law_path` from the config)
        path: Option<PathBuf>,

        /// Drop the collection before loading
        #[arg(long)]
        recreate: bool,
    },
    /// Initialize config file
    Init,
    /// Show current configuration
    Config,
    /// Check model provider and retrieval index connectivity
    Doctor,
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Store the API key for a cloud provider in the system keychain
    #[cfg(feature = "secure-storage")]
    SetKey {
        /// Provider name (openai)
        provider: String,
    },
    /// Check whether an API key is stored in the system keychain
    #[cfg(feature = "secure-storage")]
    GetKey {
        /// Provider name (openai)
        provider: String,
    },
}
