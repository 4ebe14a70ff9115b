use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use docent_core::config::VaultBackend;
use docent_llm::ProviderKind;

#[derive(Debug, Parser)]
#[command(name = "docent", version, about = "Ask questions about a PDF corpus", long_about = None)]
pub struct Cli {
    /// Config file (falls back to `DOCENT_CONFIG`, then `config/default.toml`)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Where provider API keys are read from
    #[arg(long, global = true, value_enum)]
    pub vault: Option<VaultArg>,

    /// Secrets file used by the `file` vault
    #[arg(long, global = true)]
    pub secrets: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum VaultArg {
    Env,
    File,
}

impl From<VaultArg> for VaultBackend {
    fn from(arg: VaultArg) -> Self {
        match arg {
            VaultArg::Env => Self::Env,
            VaultArg::File => Self::File,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract, chunk and embed the documents, then replace the index
    Ingest {
        #[arg(long)]
        docs: Option<PathBuf>,
        #[arg(long)]
        index: Option<PathBuf>,
        /// Re-embed files even when unchanged
        #[arg(long)]
        full: bool,
    },
    /// Answer one question
    Ask {
        question: String,
        #[command(flatten)]
        model: ModelArgs,
        /// Print the retrieved passages with their scores
        #[arg(long)]
        show_sources: bool,
    },
    /// Interactive question loop
    Chat {
        #[command(flatten)]
        model: ModelArgs,
    },
    /// List selectable models
    Models {
        /// Include models marked inactive
        #[arg(long)]
        all: bool,
    },
    /// Check whether a provider can serve requests
    Health {
        provider: Option<ProviderKind>,
    },
    /// Check index, local runner and credentials
    Doctor,
}

/// Per-query overrides of the `[llm]` defaults.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ModelArgs {
    #[arg(long)]
    pub model: Option<String>,
    #[arg(long)]
    pub provider: Option<ProviderKind>,
    #[arg(long)]
    pub temperature: Option<f32>,
    /// Generation timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,
    /// Number of passages to retrieve
    #[arg(long)]
    pub documents: Option<usize>,
}
