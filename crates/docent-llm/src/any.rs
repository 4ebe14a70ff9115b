use crate::compatible::CompatibleProvider;
use crate::error::LlmError;
use crate::gemini::GeminiProvider;
#[cfg(any(test, feature = "mock"))]
use crate::mock::MockProvider;
use crate::model::ModelConfig;
use crate::ollama::OllamaProvider;
use crate::provider::LlmProvider;

/// Generates a match over all `AnyProvider` variants, binding the inner provider
/// and evaluating the given closure for each arm.
macro_rules! delegate_provider {
    ($self:expr, |$p:ident| $expr:expr) => {
        match $self {
            AnyProvider::Ollama($p) => $expr,
            AnyProvider::Gemini($p) => $expr,
            AnyProvider::Compatible($p) => $expr,
            #[cfg(any(test, feature = "mock"))]
            AnyProvider::Mock($p) => $expr,
        }
    };
}

/// Closed set of generation backends, selected per query.
#[derive(Debug, Clone)]
pub enum AnyProvider {
    Ollama(OllamaProvider),
    Gemini(GeminiProvider),
    /// Groq and Together.
    Compatible(CompatibleProvider),
    #[cfg(any(test, feature = "mock"))]
    Mock(MockProvider),
}

impl LlmProvider for AnyProvider {
    async fn generate(&self, prompt: &str, config: &ModelConfig) -> Result<String, LlmError> {
        delegate_provider!(self, |p| p.generate(prompt, config).await)
    }

    fn name(&self) -> &str {
        delegate_provider!(self, |p| p.name())
    }
}
