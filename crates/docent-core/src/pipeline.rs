use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use docent_index::{IndexHandle, ScoredChunk};
use docent_llm::retry::backoff_delay;
use docent_llm::{
    AnyProvider, EmbedFn, LlmError, LlmProvider, ModelConfig, generate_with_timeout,
    generate_within,
};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::config::{Config, RetryConfig};
use crate::error::QueryError;
use crate::prompt::PromptTemplate;
use crate::question::QuestionPolicy;
use crate::registry::ProviderRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStage {
    Validating,
    Retrieving,
    Prompting,
    Generating,
    Completed,
    Failed,
}

impl QueryStage {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validating => "validating",
            Self::Retrieving => "retrieving",
            Self::Prompting => "prompting",
            Self::Generating => "generating",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for QueryStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceRef {
    pub source_id: String,
    pub page: u32,
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (p. {})", self.source_id, self.page)
    }
}

/// Owned copy of a retrieved chunk, without its embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedChunk {
    pub text: String,
    pub source_id: String,
    pub page: u32,
    pub score: f32,
}

impl From<&ScoredChunk<'_>> for RetrievedChunk {
    fn from(hit: &ScoredChunk<'_>) -> Self {
        Self {
            text: hit.chunk.text.clone(),
            source_id: hit.chunk.source_id.clone(),
            page: hit.chunk.page,
            score: hit.score,
        }
    }
}

#[derive(Debug, Clone)]
pub struct QueryResult {
    pub answer_text: String,
    /// Distinct `(source, page)` pairs in retrieval order.
    pub cited_sources: Vec<SourceRef>,
    pub elapsed_ms: u64,
    pub provider_used: String,
    pub model_used: String,
    pub retrieved: Vec<RetrievedChunk>,
}

impl QueryResult {
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.elapsed_ms)
    }
}

#[derive(Clone)]
struct Inner {
    registry: ProviderRegistry,
    index: IndexHandle,
    embed_fn: EmbedFn,
    /// Model behind `embed_fn`; checked against the index manifest when set.
    embedding_model: Option<String>,
    policy: QuestionPolicy,
    template: PromptTemplate,
    retry: RetryConfig,
    embed_timeout: Duration,
}

/// Validate, retrieve, prompt and generate for one question at a time.
///
/// Cheap to clone; concurrent queries share only the current index snapshot.
#[derive(Clone)]
pub struct QueryPipeline {
    inner: Arc<Inner>,
}

impl fmt::Debug for QueryPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryPipeline")
            .field("index_version", &self.inner.index.version())
            .field("policy", &self.inner.policy)
            .field("retry", &self.inner.retry)
            .finish_non_exhaustive()
    }
}

impl QueryPipeline {
    #[must_use]
    pub fn new(registry: ProviderRegistry, index: IndexHandle, embed_fn: EmbedFn) -> Self {
        Self {
            inner: Arc::new(Inner {
                registry,
                index,
                embed_fn,
                embedding_model: None,
                policy: QuestionPolicy::default(),
                template: PromptTemplate::default(),
                retry: RetryConfig::default(),
                embed_timeout: Duration::from_secs(30),
            }),
        }
    }

    /// Pipeline wired from configuration, embedding through the configured Ollama model.
    #[must_use]
    pub fn from_config(config: &Config, registry: ProviderRegistry, index: IndexHandle) -> Self {
        let embed_fn = registry.embed_fn();
        let template = config
            .query
            .prompt_template
            .as_deref()
            .map_or_else(PromptTemplate::default, PromptTemplate::new);
        Self::new(registry, index, embed_fn)
            .with_embedding_model(config.embedding.model.clone())
            .with_policy(QuestionPolicy::from(&config.query))
            .with_template(template)
            .with_retry(config.retry.clone())
            .with_embed_timeout(Duration::from_secs(config.timeouts.embedding_seconds))
    }

    fn inner_mut(&mut self) -> &mut Inner {
        Arc::make_mut(&mut self.inner)
    }

    /// Refuse to query an index built with a different embedding model.
    #[must_use]
    pub fn with_embedding_model(mut self, model: impl Into<String>) -> Self {
        self.inner_mut().embedding_model = Some(model.into());
        self
    }

    #[must_use]
    pub fn with_policy(mut self, policy: QuestionPolicy) -> Self {
        self.inner_mut().policy = policy;
        self
    }

    #[must_use]
    pub fn with_template(mut self, template: PromptTemplate) -> Self {
        self.inner_mut().template = template;
        self
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.inner_mut().retry = retry;
        self
    }

    #[must_use]
    pub fn with_embed_timeout(mut self, timeout: Duration) -> Self {
        self.inner_mut().embed_timeout = timeout;
        self
    }

    #[must_use]
    pub fn index(&self) -> &IndexHandle {
        &self.inner.index
    }

    #[must_use]
    pub fn registry(&self) -> &ProviderRegistry {
        &self.inner.registry
    }

    /// Answer `question` with the backend selected in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Cancelled`] if `cancel` fires first, otherwise the error of the
    /// stage that failed.
    pub async fn submit(
        &self,
        question: &str,
        config: &ModelConfig,
        cancel: &CancellationToken,
    ) -> Result<QueryResult, QueryError> {
        let span = tracing::info_span!(
            "query",
            provider = %config.provider,
            model = %config.model_name
        );
        let run = self.run(question, config).instrument(span);

        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                tracing::info!(stage = %QueryStage::Failed, "query cancelled");
                Err(QueryError::Cancelled)
            }
            result = run => result,
        }
    }

    async fn run(&self, question: &str, config: &ModelConfig) -> Result<QueryResult, QueryError> {
        let started = Instant::now();
        let mut stage = QueryStage::Validating;
        let result = self.run_stages(question, config, started, &mut stage).await;
        match &result {
            Ok(r) => tracing::info!(
                stage = %QueryStage::Completed,
                elapsed_ms = r.elapsed_ms,
                sources = r.cited_sources.len(),
                "query completed"
            ),
            Err(e) => tracing::warn!(
                stage = %QueryStage::Failed,
                failed_in = %stage,
                kind = %e.kind(),
                "query failed: {e}"
            ),
        }
        result
    }

    async fn run_stages(
        &self,
        question: &str,
        config: &ModelConfig,
        started: Instant,
        stage: &mut QueryStage,
    ) -> Result<QueryResult, QueryError> {
        let inner = &self.inner;

        tracing::debug!(stage = %stage, "validating question");
        let question = inner.policy.validate(question)?;
        config
            .validate()
            .map_err(|e| QueryError::InvalidConfig(e.to_string()))?;

        *stage = QueryStage::Retrieving;
        let snapshot = inner.index.snapshot()?;
        if let Some(model) = &inner.embedding_model {
            let built_with = &snapshot.manifest().embedding_model;
            if built_with != model {
                return Err(QueryError::EmbeddingModelMismatch {
                    index_model: built_with.clone(),
                    query_model: model.clone(),
                });
            }
        }
        tracing::debug!(stage = %stage, chunks = snapshot.len(), "retrieving");
        let embedding = self.embed(question).await?;
        let hits = snapshot.retrieve(&embedding, config.max_documents)?;

        *stage = QueryStage::Prompting;
        tracing::debug!(stage = %stage, retrieved = hits.len(), "assembling prompt");
        let prompt = inner.template.render(&hits, question);

        *stage = QueryStage::Generating;
        let provider = inner.registry.provider(config.provider);
        tracing::debug!(stage = %stage, backend = provider.name(), "generating");
        let answer = self.generate(&provider, &prompt, config).await?;

        *stage = QueryStage::Completed;
        let retrieved: Vec<RetrievedChunk> = hits.iter().map(RetrievedChunk::from).collect();
        Ok(QueryResult {
            answer_text: answer,
            cited_sources: cite(&retrieved),
            elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            provider_used: config.provider.to_string(),
            model_used: config.model_name.clone(),
            retrieved,
        })
    }

    async fn embed(&self, question: &str) -> Result<Vec<f32>, QueryError> {
        let timeout = self.inner.embed_timeout;
        match tokio::time::timeout(timeout, (self.inner.embed_fn)(question)).await {
            Ok(Ok(v)) => Ok(v),
            Ok(Err(e)) => Err(QueryError::Embedding(e)),
            Err(_) => Err(QueryError::Embedding(LlmError::Timeout {
                provider: "embedding".into(),
                seconds: timeout.as_secs(),
            })),
        }
    }

    /// One attempt, plus a single retry on rate limiting when the wait fits in the budget.
    async fn generate(
        &self,
        provider: &AnyProvider,
        prompt: &str,
        config: &ModelConfig,
    ) -> Result<String, QueryError> {
        let budget = config.timeout();
        let started = Instant::now();

        let err = match generate_with_timeout(provider, prompt, config).await {
            Ok(answer) => return Ok(answer),
            Err(e) => e,
        };
        let retry = &self.inner.retry;
        if !(retry.enabled && err.is_retryable()) {
            return Err(err.into());
        }

        let wait = backoff_delay(err.retry_after(), Duration::from_millis(retry.backoff_ms));
        let remaining = budget.saturating_sub(started.elapsed());
        if wait >= remaining {
            tracing::info!(
                wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX),
                "rate limited, retry would exceed the timeout budget"
            );
            return Err(err.into());
        }

        tracing::info!(
            wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX),
            "rate limited, retrying once"
        );
        tokio::time::sleep(wait).await;
        let remaining = budget.saturating_sub(started.elapsed());
        generate_within(provider, prompt, config, remaining)
            .await
            .map_err(QueryError::from)
    }
}

fn cite(retrieved: &[RetrievedChunk]) -> Vec<SourceRef> {
    let mut out: Vec<SourceRef> = Vec::new();
    for hit in retrieved {
        let source = SourceRef {
            source_id: hit.source_id.clone(),
            page: hit.page,
        };
        if !out.contains(&source) {
            out.push(source);
        }
    }
    out
}
