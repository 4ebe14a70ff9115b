//! Environment diagnostics: is everything in place to answer questions?

use std::fmt;

use docent_index::store;
use docent_llm::ProviderKind;

use crate::config::Config;
use crate::registry::ProviderRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Ok,
    /// Usable, but some feature will not work.
    Warn,
    Fail,
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Ok => "ok",
            Self::Warn => "warn",
            Self::Fail => "FAIL",
        })
    }
}

#[derive(Debug, Clone)]
pub struct Check {
    pub name: String,
    pub status: CheckStatus,
    pub detail: String,
    pub guidance: Option<String>,
}

impl Check {
    fn ok(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: CheckStatus::Ok,
            detail: detail.into(),
            guidance: None,
        }
    }

    fn problem(
        status: CheckStatus,
        name: impl Into<String>,
        detail: impl Into<String>,
        guidance: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            status,
            detail: detail.into(),
            guidance: Some(guidance.into()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Report {
    pub checks: Vec<Check>,
}

impl Report {
    /// True when no check failed. Warnings do not count.
    #[must_use]
    pub fn healthy(&self) -> bool {
        self.checks.iter().all(|c| c.status != CheckStatus::Fail)
    }
}

/// Run every check against `config`.
pub async fn diagnose(config: &Config, registry: &ProviderRegistry) -> Report {
    let mut checks = Vec::new();

    let index_dir = &config.index.index_dir;
    if store::exists(index_dir) {
        match store::load(index_dir).await {
            Ok(index) => {
                let built_with = &index.manifest().embedding_model;
                checks.push(Check::ok(
                    "index",
                    format!(
                        "{} chunks from {} files ({built_with})",
                        index.len(),
                        index.manifest().sources.len(),
                    ),
                ));
                if *built_with != config.embedding.model {
                    checks.push(Check::problem(
                        CheckStatus::Warn,
                        "index embedding model",
                        format!(
                            "index built with {built_with}, queries embed with {}",
                            config.embedding.model
                        ),
                        "Rebuild it with `docent ingest --full`",
                    ));
                }
            }
            Err(e) => checks.push(Check::problem(
                CheckStatus::Fail,
                "index",
                e.to_string(),
                "Rebuild it with `docent ingest --full`",
            )),
        }
    } else {
        checks.push(Check::problem(
            CheckStatus::Fail,
            "index",
            format!("no index at {}", index_dir.display()),
            "Build it with `docent ingest`",
        ));
    }

    if config.index.docs_dir.is_dir() {
        checks.push(Check::ok(
            "documents",
            config.index.docs_dir.display().to_string(),
        ));
    } else {
        checks.push(Check::problem(
            CheckStatus::Warn,
            "documents",
            format!("{} is not a directory", config.index.docs_dir.display()),
            "Put the PDFs to index there or set index.docs_dir",
        ));
    }

    let runner = registry.local_runner();
    match runner.list_local_models().await {
        Ok(models) => {
            checks.push(Check::ok("local runner", runner.base_url()));
            let wanted = &config.embedding.model;
            if models.iter().any(|m| model_matches(m, wanted)) {
                checks.push(Check::ok("embedding model", wanted.clone()));
            } else {
                checks.push(Check::problem(
                    CheckStatus::Fail,
                    "embedding model",
                    format!("{wanted} is not pulled"),
                    format!("Run `ollama pull {wanted}`"),
                ));
            }
        }
        Err(e) => {
            let status = if config.llm.provider == ProviderKind::Local {
                CheckStatus::Fail
            } else {
                CheckStatus::Warn
            };
            checks.push(Check::problem(
                status,
                "local runner",
                e.to_string(),
                "Start it with `ollama serve`; embeddings need it for every provider",
            ));
        }
    }

    for kind in ProviderKind::ALL.into_iter().filter(|k| k.is_hosted()) {
        let Some(key) = kind.credential_key() else {
            continue;
        };
        let name = format!("{kind} credential");
        if registry.has_credential(kind) {
            checks.push(Check::ok(name, key));
        } else {
            let status = if config.llm.provider == kind {
                CheckStatus::Fail
            } else {
                CheckStatus::Warn
            };
            checks.push(Check::problem(
                status,
                name,
                format!("{key} not set"),
                format!(
                    "Set {key} in {} or the environment",
                    config.vault.path.display()
                ),
            ));
        }
    }

    for check in &checks {
        tracing::debug!(check = %check.name, status = %check.status, "{}", check.detail);
    }
    Report { checks }
}

/// Ollama reports tagged names (`all-minilm:latest`); an untagged name matches `:latest`.
fn model_matches(installed: &str, wanted: &str) -> bool {
    installed == wanted
        || (!wanted.contains(':') && installed.strip_suffix(":latest") == Some(wanted))
}
