use std::collections::HashMap;

use docent_llm::compatible::CompatibleProvider;
use docent_llm::gemini::GeminiProvider;
use docent_llm::ollama::OllamaProvider;
use docent_llm::{AnyProvider, EmbedFn, ProviderKind};

use crate::config::Config;

/// One configured adapter per provider kind, plus the embedding client.
///
/// Credentials are captured at construction; a missing key surfaces as an authentication
/// error when that provider is asked to generate.
#[derive(Debug, Clone)]
pub struct ProviderRegistry {
    ollama: OllamaProvider,
    gemini: GeminiProvider,
    groq: CompatibleProvider,
    together: CompatibleProvider,
    embedder: OllamaProvider,
    overrides: HashMap<ProviderKind, AnyProvider>,
}

impl ProviderRegistry {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let key = |kind| {
            config
                .secrets
                .for_provider(kind)
                .map(|s| s.expose().to_owned())
        };
        Self {
            ollama: OllamaProvider::new(&config.llm.ollama_url, config.embedding.model.clone()),
            gemini: GeminiProvider::with_base_url(
                key(ProviderKind::Google),
                config.llm.google_base_url.clone(),
            ),
            groq: CompatibleProvider::new(
                ProviderKind::Groq,
                key(ProviderKind::Groq),
                config.llm.groq_base_url.clone(),
            ),
            together: CompatibleProvider::new(
                ProviderKind::Together,
                key(ProviderKind::Together),
                config.llm.together_base_url.clone(),
            ),
            embedder: OllamaProvider::new(config.embedding_url(), config.embedding.model.clone()),
            overrides: HashMap::new(),
        }
    }

    /// Replace the adapter used for `kind`.
    #[must_use]
    pub fn with_provider(mut self, kind: ProviderKind, provider: AnyProvider) -> Self {
        self.overrides.insert(kind, provider);
        self
    }

    #[must_use]
    pub fn provider(&self, kind: ProviderKind) -> AnyProvider {
        if let Some(p) = self.overrides.get(&kind) {
            return p.clone();
        }
        match kind {
            ProviderKind::Local => AnyProvider::Ollama(self.ollama.clone()),
            ProviderKind::Google => AnyProvider::Gemini(self.gemini.clone()),
            ProviderKind::Groq => AnyProvider::Compatible(self.groq.clone()),
            ProviderKind::Together => AnyProvider::Compatible(self.together.clone()),
        }
    }

    #[must_use]
    pub fn has_credential(&self, kind: ProviderKind) -> bool {
        match kind {
            ProviderKind::Local => true,
            ProviderKind::Google => self.gemini.has_credential(),
            ProviderKind::Groq => self.groq.has_credential(),
            ProviderKind::Together => self.together.has_credential(),
        }
    }

    #[must_use]
    pub fn local_runner(&self) -> &OllamaProvider {
        &self.ollama
    }

    #[must_use]
    pub fn embedder(&self) -> &OllamaProvider {
        &self.embedder
    }

    #[must_use]
    pub fn embed_fn(&self) -> EmbedFn {
        self.embedder.embed_fn()
    }
}
