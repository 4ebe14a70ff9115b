mod chat;
mod cli;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::Parser;
use docent_core::config::VaultBackend;
use docent_core::doctor::{self, CheckStatus};
use docent_core::format::format_elapsed;
use docent_core::vault::{EnvVaultProvider, FileVaultProvider, VaultProvider};
use docent_core::{Assistant, Config, QueryError, QueryResult};
use docent_index::document::{TextSplitter, default_loaders};
use docent_index::{IndexHandle, IngestOptions, Ingestor};
use docent_llm::{ModelConfig, ProviderKind};
use tokio_util::sync::CancellationToken;

use crate::cli::{Cli, Command, ModelArgs};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_subscriber();

    let cli = Cli::parse();
    let config = load_config(&cli).await?;

    match cli.command {
        Command::Ingest { docs, index, full } => ingest(&config, docs, index, full).await,
        Command::Ask {
            question,
            model,
            show_sources,
        } => {
            let selection = model_selection(&config, &model);
            let assistant = ready_assistant(config).await?;
            ask(&assistant, &question, &selection, show_sources).await
        }
        Command::Chat { model } => {
            let selection = model_selection(&config, &model);
            let assistant = ready_assistant(config).await?;
            chat::run(&assistant, selection).await
        }
        Command::Models { all } => {
            models(&Assistant::new(config, IndexHandle::new()), all).await;
            Ok(())
        }
        Command::Health { provider } => {
            health(&Assistant::new(config, IndexHandle::new()), provider).await
        }
        Command::Doctor => run_doctor(Assistant::new(config, IndexHandle::new())).await,
    }
}

/// Logs go to stderr so stdout carries only answers.
fn init_subscriber() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

/// Priority: `--config` > `DOCENT_CONFIG` > `config/default.toml`.
fn resolve_config_path(cli: &Cli) -> PathBuf {
    if let Some(path) = &cli.config {
        return path.clone();
    }
    if let Ok(path) = std::env::var("DOCENT_CONFIG") {
        return PathBuf::from(path);
    }
    PathBuf::from("config/default.toml")
}

async fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let path = resolve_config_path(cli);
    let mut config =
        Config::load(&path).with_context(|| format!("loading {}", path.display()))?;

    if let Some(backend) = cli.vault {
        config.vault.backend = backend.into();
    }
    if let Some(secrets) = &cli.secrets {
        config.vault.path.clone_from(secrets);
    }

    let vault: Box<dyn VaultProvider> = match config.vault.backend {
        VaultBackend::Env => Box::new(EnvVaultProvider),
        VaultBackend::File => Box::new(
            FileVaultProvider::load(&config.vault.path)
                .with_context(|| format!("reading secrets from {}", config.vault.path.display()))?,
        ),
    };
    config.resolve_secrets(vault.as_ref()).await?;
    tracing::debug!(backend = ?config.vault.backend, "secrets resolved");
    Ok(config)
}

async fn ready_assistant(config: Config) -> anyhow::Result<Assistant> {
    let assistant = Assistant::new(config, IndexHandle::new());
    if let Err(e) = assistant.load_index().await {
        report(&e);
        return Err(e.into());
    }
    Ok(assistant)
}

/// `[llm]` defaults with command-line overrides. A model named without a provider takes
/// the provider listed for it in the catalog.
fn model_selection(config: &Config, args: &ModelArgs) -> ModelConfig {
    let mut selection = config.default_model_config();
    if let Some(model) = &args.model {
        selection.model_name.clone_from(model);
        if args.provider.is_none()
            && let Some(entry) = config.catalog().into_iter().find(|m| &m.name == model)
        {
            selection.provider = entry.provider;
        }
    }
    if let Some(provider) = args.provider {
        selection.provider = provider;
    }
    if let Some(t) = args.temperature {
        selection.temperature = t;
    }
    if let Some(s) = args.timeout {
        selection.timeout_seconds = s;
    }
    if let Some(k) = args.documents {
        selection.max_documents = k;
    }
    selection
}

async fn ingest(
    config: &Config,
    docs: Option<PathBuf>,
    index: Option<PathBuf>,
    full: bool,
) -> anyhow::Result<()> {
    let options = IngestOptions {
        docs_dir: docs.unwrap_or_else(|| config.index.docs_dir.clone()),
        index_dir: index.unwrap_or_else(|| config.index.index_dir.clone()),
        full,
    };
    let registry = docent_core::ProviderRegistry::from_config(config);
    let ingestor = Ingestor::new(
        TextSplitter::new(config.splitter_config()),
        registry.embed_fn(),
        config.embedding.model.clone(),
    )
    .with_loaders(default_loaders(config.max_file_size_bytes()))
    .with_embed_timeout(Duration::from_secs(config.timeouts.embedding_seconds));

    let started = std::time::Instant::now();
    let (_, report) = ingestor
        .run(&options)
        .await
        .with_context(|| format!("ingesting {}", options.docs_dir.display()))?;

    println!(
        "Indexed {} files ({} embedded, {} unchanged) into {} chunks in {}",
        report.files,
        report.embedded_files,
        report.reused_files,
        report.chunks,
        format_elapsed(started.elapsed())
    );
    for name in &report.skipped {
        println!("  skipped {name}");
    }
    Ok(())
}

async fn ask(
    assistant: &Assistant,
    question: &str,
    selection: &ModelConfig,
    show_sources: bool,
) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    match assistant.submit_query(question, selection, &cancel).await {
        Ok(result) => {
            print_result(&result, show_sources);
            Ok(())
        }
        Err(e) => {
            report(&e);
            Err(e.into())
        }
    }
}

pub(crate) fn print_result(result: &QueryResult, show_sources: bool) {
    println!("{}", result.answer_text.trim());
    println!();
    println!(
        "[{} · {} · {}]",
        result.provider_used,
        result.model_used,
        format_elapsed(result.elapsed())
    );
    if !result.cited_sources.is_empty() {
        let sources: Vec<String> = result.cited_sources.iter().map(ToString::to_string).collect();
        println!("Sources: {}", sources.join(", "));
    }
    if show_sources {
        for (i, hit) in result.retrieved.iter().enumerate() {
            println!();
            println!("#{} {} p.{} (score {:.3})", i + 1, hit.source_id, hit.page, hit.score);
            println!("{}", hit.text.trim());
        }
    }
}

/// Print the error kind and what to do about it.
pub(crate) fn report(err: &QueryError) {
    eprintln!("{}: {err}", err.kind());
    if let Some(hint) = err.guidance() {
        eprintln!("hint: {hint}");
    }
}

async fn models(assistant: &Assistant, all: bool) {
    let installed = assistant.local_models().await.ok();
    for provider in ProviderKind::ALL {
        let entries: Vec<_> = assistant
            .list_available_models(all)
            .into_iter()
            .filter(|m| m.provider == provider)
            .collect();
        if entries.is_empty() {
            continue;
        }
        let ready = assistant.pipeline().registry().has_credential(provider);
        println!("{provider}{}", if ready { "" } else { " (no API key)" });
        for m in entries {
            let pulled = match (&installed, provider) {
                (Some(names), ProviderKind::Local) if names.contains(&m.name) => " [pulled]",
                _ => "",
            };
            let inactive = if m.active { "" } else { " [inactive]" };
            println!("  {}{pulled}{inactive}", m.name);
            println!("      {}", m.description);
            println!(
                "      cost: {} · speed: {} · quality: {}",
                m.cost, m.speed, m.quality
            );
            if !m.requirements.is_empty() {
                println!("      requires: {}", m.requirements);
            }
        }
    }
}

async fn health(assistant: &Assistant, provider: Option<ProviderKind>) -> anyhow::Result<()> {
    let kinds = provider.map_or_else(|| ProviderKind::ALL.to_vec(), |p| vec![p]);
    let mut failed = false;
    for kind in kinds {
        match assistant.check_service_health(kind).await {
            Ok(true) => println!("{kind}: ok"),
            Ok(false) => {
                failed |= provider.is_some();
                let key = kind.credential_key().unwrap_or("credential");
                println!("{kind}: {key} not configured");
            }
            Err(e) => {
                failed |= provider.is_some() || kind == ProviderKind::Local;
                println!("{kind}: {}", e.kind());
                if let Some(hint) = e.guidance() {
                    println!("  hint: {hint}");
                }
            }
        }
    }
    if failed {
        bail!("health check failed");
    }
    Ok(())
}

async fn run_doctor(assistant: Assistant) -> anyhow::Result<()> {
    let report = doctor::diagnose(assistant.config(), assistant.pipeline().registry()).await;
    for check in &report.checks {
        println!("[{:>4}] {}: {}", check.status, check.name, check.detail);
        if check.status != CheckStatus::Ok
            && let Some(hint) = &check.guidance
        {
            println!("       {hint}");
        }
    }
    if !report.healthy() {
        bail!("doctor found problems");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    #[test]
    fn selection_defaults_to_llm_section() {
        let config = Config::default();
        let selection = model_selection(&config, &ModelArgs::default());
        assert_eq!(selection, config.default_model_config());
    }

    #[test]
    fn catalog_model_implies_provider() {
        let config = Config::default();
        let hosted = config
            .catalog()
            .into_iter()
            .find(|m| m.provider == ProviderKind::Groq)
            .unwrap();
        let selection = model_selection(
            &config,
            &ModelArgs {
                model: Some(hosted.name.clone()),
                ..ModelArgs::default()
            },
        );
        assert_eq!(selection.provider, ProviderKind::Groq);
        assert_eq!(selection.model_name, hosted.name);
    }

    #[test]
    fn explicit_provider_wins_over_catalog() {
        let config = Config::default();
        let selection = model_selection(
            &config,
            &ModelArgs {
                model: Some("custom-model".into()),
                provider: Some(ProviderKind::Together),
                temperature: Some(0.1),
                timeout: Some(60),
                documents: Some(4),
            },
        );
        assert_eq!(selection.provider, ProviderKind::Together);
        assert_eq!(selection.timeout_seconds, 60);
        assert_eq!(selection.max_documents, 4);
    }

    #[test]
    #[serial]
    fn config_path_priority() {
        let cli = Cli::try_parse_from(["docent", "doctor"]).unwrap();
        unsafe { std::env::remove_var("DOCENT_CONFIG") };
        assert_eq!(resolve_config_path(&cli), PathBuf::from("config/default.toml"));

        unsafe { std::env::set_var("DOCENT_CONFIG", "/etc/docent.toml") };
        assert_eq!(resolve_config_path(&cli), PathBuf::from("/etc/docent.toml"));

        let cli = Cli::try_parse_from(["docent", "--config", "mine.toml", "doctor"]).unwrap();
        assert_eq!(resolve_config_path(&cli), PathBuf::from("mine.toml"));
        unsafe { std::env::remove_var("DOCENT_CONFIG") };
    }
}
