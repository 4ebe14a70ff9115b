use std::sync::Arc;

use ollama_rs::Ollama;
use ollama_rs::generation::chat::ChatMessage;
use ollama_rs::generation::chat::request::ChatMessageRequest;
use ollama_rs::generation::embeddings::request::{EmbeddingsInput, GenerateEmbeddingsRequest};
use ollama_rs::models::ModelOptions;

use crate::error::LlmError;
use crate::model::ModelConfig;
use crate::provider::{EmbedFn, EmbedFuture, LlmProvider};

const PROVIDER: &str = "ollama";

/// Local model runner backend. Also serves embeddings for ingestion and retrieval.
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    client: Ollama,
    base_url: String,
    embedding_model: String,
}

impl OllamaProvider {
    #[must_use]
    pub fn new(base_url: &str, embedding_model: String) -> Self {
        let (host, port) = parse_host_port(base_url);
        Self {
            client: Ollama::new(host, port),
            base_url: base_url.trim_end_matches('/').to_owned(),
            embedding_model,
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    /// Check if the runner is reachable.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Unavailable`] if the connection to Ollama fails.
    pub async fn health_check(&self) -> Result<(), LlmError> {
        self.list_local_models().await.map(|_| ())
    }

    /// Names of the models pulled into the local runner.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Unavailable`] if the runner cannot be reached.
    pub async fn list_local_models(&self) -> Result<Vec<String>, LlmError> {
        let models = self
            .client
            .list_local_models()
            .await
            .map_err(|e| LlmError::Unavailable {
                provider: PROVIDER.into(),
                reason: format!("failed to connect to Ollama at {}, is it running? {e}", self.base_url),
            })?;
        Ok(models.into_iter().map(|m| m.name).collect())
    }

    /// Embed one text with the configured embedding model.
    ///
    /// # Errors
    ///
    /// Returns an error if the runner is unreachable or returns no vector.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        let request = GenerateEmbeddingsRequest::new(
            self.embedding_model.clone(),
            EmbeddingsInput::from(text),
        );

        let response = self
            .client
            .generate_embeddings(request)
            .await
            .map_err(|e| classify(&e, "Ollama embedding request failed"))?;

        response
            .embeddings
            .into_iter()
            .next()
            .ok_or(LlmError::EmptyResponse {
                provider: PROVIDER.into(),
            })
    }

    /// Return a cloneable closure that calls [`Self::embed`].
    #[must_use]
    pub fn embed_fn(&self) -> EmbedFn {
        let provider = Arc::new(self.clone());
        Arc::new(move |text: &str| -> EmbedFuture {
            let p = Arc::clone(&provider);
            let owned = text.to_owned();
            Box::pin(async move { p.embed(&owned).await })
        })
    }
}

impl LlmProvider for OllamaProvider {
    async fn generate(&self, prompt: &str, config: &ModelConfig) -> Result<String, LlmError> {
        let request = ChatMessageRequest::new(
            config.model_name.clone(),
            vec![ChatMessage::user(prompt.to_owned())],
        )
        .options(ModelOptions::default().temperature(config.temperature));

        let response = self
            .client
            .send_chat_messages(request)
            .await
            .map_err(|e| classify(&e, "Ollama chat request failed"))?;

        let content = response.message.content;
        if content.trim().is_empty() {
            return Err(LlmError::EmptyResponse {
                provider: PROVIDER.into(),
            });
        }
        Ok(content)
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        PROVIDER
    }
}

/// Refused or reset connections mean the runner process is down.
fn classify(err: &(dyn std::error::Error + 'static), context: &str) -> LlmError {
    if is_connection_error(err) {
        LlmError::Unavailable {
            provider: PROVIDER.into(),
            reason: format!("{context}: {err}. Start the runner with `ollama serve`"),
        }
    } else {
        LlmError::Generation {
            provider: PROVIDER.into(),
            message: format!("{context}: {err}"),
        }
    }
}

fn is_connection_error(err: &(dyn std::error::Error + 'static)) -> bool {
    use std::io::ErrorKind;

    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(io) = e.downcast_ref::<std::io::Error>()
            && matches!(
                io.kind(),
                ErrorKind::ConnectionRefused
                    | ErrorKind::ConnectionReset
                    | ErrorKind::ConnectionAborted
                    | ErrorKind::NotConnected
                    | ErrorKind::AddrNotAvailable
            )
        {
            return true;
        }
        let text = e.to_string();
        if text.contains("error trying to connect") || text.contains("Connection refused") {
            return true;
        }
        current = e.source();
    }
    false
}

fn parse_host_port(url: &str) -> (String, u16) {
    let url = url.trim_end_matches('/');
    if let Some(colon_pos) = url.rfind(':') {
        let port_str = &url[colon_pos + 1..];
        if let Ok(port) = port_str.parse::<u16>() {
            let host = url[..colon_pos].to_string();
            return (host, port);
        }
    }
    (url.to_string(), 11434)
}
