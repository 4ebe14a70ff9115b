use std::fmt;

use crate::error::LlmError;
use crate::model::{ModelConfig, ProviderKind};
use crate::openai::OpenAiProvider;
use crate::provider::LlmProvider;

pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const TOGETHER_BASE_URL: &str = "https://api.together.xyz/v1";

/// Hosted backend reached through the OpenAI-compatible chat completions API.
#[derive(Clone)]
pub struct CompatibleProvider {
    inner: OpenAiProvider,
    kind: ProviderKind,
}

impl CompatibleProvider {
    #[must_use]
    pub fn new(kind: ProviderKind, api_key: Option<String>, base_url: String) -> Self {
        Self {
            inner: OpenAiProvider::new(kind.as_str(), api_key, base_url),
            kind,
        }
    }

    #[must_use]
    pub fn groq(api_key: Option<String>) -> Self {
        Self::new(ProviderKind::Groq, api_key, GROQ_BASE_URL.into())
    }

    #[must_use]
    pub fn together(api_key: Option<String>) -> Self {
        Self::new(ProviderKind::Together, api_key, TOGETHER_BASE_URL.into())
    }

    #[must_use]
    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    #[must_use]
    pub fn has_credential(&self) -> bool {
        self.inner.has_credential()
    }
}

impl fmt::Debug for CompatibleProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompatibleProvider")
            .field("kind", &self.kind)
            .field("inner", &self.inner)
            .finish()
    }
}

impl LlmProvider for CompatibleProvider {
    async fn generate(&self, prompt: &str, config: &ModelConfig) -> Result<String, LlmError> {
        self.inner.generate(prompt, config).await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
