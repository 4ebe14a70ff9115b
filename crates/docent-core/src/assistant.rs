//! Front-end facade: the three calls an interactive client makes.

use std::sync::Arc;

use docent_index::IndexHandle;
use docent_llm::{ModelConfig, ModelInfo, ProviderKind};
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::QueryError;
use crate::pipeline::{QueryPipeline, QueryResult};
use crate::registry::ProviderRegistry;

#[derive(Debug, Clone)]
pub struct Assistant {
    config: Arc<Config>,
    pipeline: QueryPipeline,
}

impl Assistant {
    /// Wire adapters and the query pipeline from a loaded configuration.
    ///
    /// Secrets must already be resolved into `config`.
    #[must_use]
    pub fn new(config: Config, index: IndexHandle) -> Self {
        let registry = ProviderRegistry::from_config(&config);
        let pipeline = QueryPipeline::from_config(&config, registry, index);
        Self::with_pipeline(config, pipeline)
    }

    #[must_use]
    pub fn with_pipeline(config: Config, pipeline: QueryPipeline) -> Self {
        Self {
            config: Arc::new(config),
            pipeline,
        }
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn pipeline(&self) -> &QueryPipeline {
        &self.pipeline
    }

    #[must_use]
    pub fn index(&self) -> &IndexHandle {
        self.pipeline.index()
    }

    /// Load the persisted index from the configured directory and publish it.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Index`] if no index has been built yet or it cannot be read.
    pub async fn load_index(&self) -> Result<u64, QueryError> {
        let version = self.index().load(&self.config.index.index_dir).await?;
        Ok(version)
    }

    /// Model catalog, built-ins merged with configured entries.
    #[must_use]
    pub fn list_available_models(&self, include_inactive: bool) -> Vec<ModelInfo> {
        self.config
            .catalog()
            .into_iter()
            .filter(|m| include_inactive || m.active)
            .collect()
    }

    /// Answer a question with the given model selection.
    ///
    /// # Errors
    ///
    /// See [`QueryPipeline::submit`].
    pub async fn submit_query(
        &self,
        question: &str,
        config: &ModelConfig,
        cancel: &CancellationToken,
    ) -> Result<QueryResult, QueryError> {
        self.pipeline.submit(question, config, cancel).await
    }

    /// Whether `provider` can currently serve requests.
    ///
    /// The local runner is probed over the network. Hosted providers report whether a
    /// credential is configured; no request is sent.
    ///
    /// # Errors
    ///
    /// Returns a `ServiceUnavailable` error when the local runner cannot be reached.
    pub async fn check_service_health(&self, provider: ProviderKind) -> Result<bool, QueryError> {
        let registry = self.pipeline.registry();
        match provider {
            ProviderKind::Local => {
                registry.local_runner().health_check().await?;
                tracing::debug!("local runner reachable");
                Ok(true)
            }
            hosted => {
                let ok = registry.has_credential(hosted);
                if !ok {
                    tracing::debug!(provider = %hosted, "no credential configured");
                }
                Ok(ok)
            }
        }
    }

    /// Models pulled into the local runner.
    ///
    /// # Errors
    ///
    /// Returns a `ServiceUnavailable` error when the local runner cannot be reached.
    pub async fn local_models(&self) -> Result<Vec<String>, QueryError> {
        self.pipeline
            .registry()
            .local_runner()
            .list_local_models()
            .await
            .map_err(QueryError::from)
    }
}

#[cfg(test)]
mod tests {
    use docent_index::{DocumentChunk, DocumentIndex, IndexManifest};
    use docent_llm::mock::MockProvider;
    use docent_llm::{AnyProvider, EmbedFn, EmbedFuture};

    use super::*;
    use crate::error::ErrorKind;
    use crate::vault::Secret;

    fn unreachable_config() -> Config {
        let mut config = Config::default();
        config.llm.ollama_url = "http://127.0.0.1:1".into();
        config
    }

    fn assistant(config: Config) -> Assistant {
        let index = IndexHandle::with_index(
            DocumentIndex::build(
                vec![DocumentChunk {
                    text: "INAOE is a research institute...".into(),
                    source_id: "doc1.pdf".into(),
                    page: 1,
                    chunk_index: 0,
                    embedding: vec![1.0, 0.0],
                }],
                IndexManifest::new("test"),
            )
            .unwrap(),
        );
        let embed: EmbedFn =
            Arc::new(|_: &str| -> EmbedFuture { Box::pin(async { Ok(vec![1.0, 0.0]) }) });
        let registry = ProviderRegistry::from_config(&config).with_provider(
            ProviderKind::Local,
            AnyProvider::Mock(MockProvider::answering("respuesta")),
        );
        let pipeline = QueryPipeline::new(registry, index, embed);
        Assistant::with_pipeline(config, pipeline)
    }

    #[test]
    fn inactive_models_hidden_by_default() {
        let mut config = unreachable_config();
        let first = config.catalog()[0].clone();
        config.models.push(ModelInfo {
            active: false,
            ..first
        });
        let name = config.models[0].name.clone();
        let a = assistant(config);

        assert!(!a.list_available_models(false).iter().any(|m| m.name == name));
        assert!(a.list_available_models(true).iter().any(|m| m.name == name));
    }

    #[tokio::test]
    async fn submit_query_runs_pipeline() {
        let a = assistant(unreachable_config());
        let cfg = ModelConfig::new(ProviderKind::Local, "mistral:7b");
        let result = a
            .submit_query("¿Qué es el INAOE?", &cfg, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(result.answer_text, "respuesta");
        assert_eq!(result.cited_sources.len(), 1);
    }

    #[tokio::test]
    async fn unreachable_local_runner_is_service_unavailable() {
        let a = assistant(unreachable_config());
        let err = a.check_service_health(ProviderKind::Local).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ServiceUnavailable);
    }

    #[tokio::test]
    async fn hosted_health_reflects_credentials() {
        let mut config = unreachable_config();
        config.secrets.together_api_key = Some(Secret::new("tk"));
        let a = assistant(config);
        assert!(a.check_service_health(ProviderKind::Together).await.unwrap());
        assert!(!a.check_service_health(ProviderKind::Google).await.unwrap());
    }

    #[tokio::test]
    async fn load_index_without_build_is_index_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = unreachable_config();
        config.index.index_dir = dir.path().join("index");
        let a = Assistant::new(config, IndexHandle::new());
        let err = a.load_index().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IndexUnavailable);
    }
}
