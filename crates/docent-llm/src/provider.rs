use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use crate::error::LlmError;
use crate::model::ModelConfig;

pub type EmbedFuture = Pin<Box<dyn Future<Output = Result<Vec<f32>, LlmError>> + Send>>;

/// Shareable embedding closure, as returned by [`crate::ollama::OllamaProvider::embed_fn`].
pub type EmbedFn = std::sync::Arc<dyn Fn(&str) -> EmbedFuture + Send + Sync>;

pub trait LlmProvider: Send + Sync {
    /// Send a single prompt to the backend and return the generated text.
    ///
    /// Implementations translate `config` into provider parameters and never retry.
    ///
    /// # Errors
    ///
    /// Returns an error classified into the shared taxonomy: authentication, rate limit,
    /// unavailable backend, or failed generation.
    fn generate(
        &self,
        prompt: &str,
        config: &ModelConfig,
    ) -> impl Future<Output = Result<String, LlmError>> + Send;

    fn name(&self) -> &str;
}

/// Run `generate` bounded by the config's `timeout_seconds`.
///
/// # Errors
///
/// Returns [`LlmError::Timeout`] when the budget elapses, otherwise whatever the provider
/// returned.
pub async fn generate_with_timeout<P: LlmProvider>(
    provider: &P,
    prompt: &str,
    config: &ModelConfig,
) -> Result<String, LlmError> {
    generate_within(provider, prompt, config, config.timeout()).await
}

/// Run `generate` bounded by an explicit budget (used for retries with the remaining time).
///
/// # Errors
///
/// Returns [`LlmError::Timeout`] when `budget` elapses, otherwise whatever the provider
/// returned.
pub async fn generate_within<P: LlmProvider>(
    provider: &P,
    prompt: &str,
    config: &ModelConfig,
    budget: Duration,
) -> Result<String, LlmError> {
    match tokio::time::timeout(budget, provider.generate(prompt, config)).await {
        Ok(result) => result,
        Err(_) => Err(LlmError::Timeout {
            provider: provider.name().to_owned(),
            seconds: config.timeout_seconds,
        }),
    }
}
