use std::fmt;

use docent_index::IndexError;
use docent_llm::{LlmError, ProviderKind};

/// Failure categories reported to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidQuestion,
    InvalidConfig,
    IndexUnavailable,
    AuthenticationError,
    RateLimited,
    GenerationTimeout,
    GenerationFailed,
    ServiceUnavailable,
    Cancelled,
}

impl ErrorKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidQuestion => "invalid_question",
            Self::InvalidConfig => "invalid_config",
            Self::IndexUnavailable => "index_unavailable",
            Self::AuthenticationError => "authentication_error",
            Self::RateLimited => "rate_limited",
            Self::GenerationTimeout => "generation_timeout",
            Self::GenerationFailed => "generation_failed",
            Self::ServiceUnavailable => "service_unavailable",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("invalid question: {0}")]
    InvalidQuestion(String),

    #[error("invalid model configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error("index was built with embedding model {index_model}, queries embed with {query_model}")]
    EmbeddingModelMismatch {
        index_model: String,
        query_model: String,
    },

    #[error("embedding service unavailable: {0}")]
    Embedding(#[source] LlmError),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("query cancelled")]
    Cancelled,
}

impl QueryError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidQuestion(_) => ErrorKind::InvalidQuestion,
            Self::InvalidConfig(_) => ErrorKind::InvalidConfig,
            Self::Index(_) | Self::EmbeddingModelMismatch { .. } => ErrorKind::IndexUnavailable,
            Self::Embedding(_) => ErrorKind::ServiceUnavailable,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Llm(e) => match e {
                LlmError::Authentication { .. } => ErrorKind::AuthenticationError,
                LlmError::RateLimited { .. } => ErrorKind::RateLimited,
                LlmError::Timeout { .. } => ErrorKind::GenerationTimeout,
                LlmError::Unavailable { .. } => ErrorKind::ServiceUnavailable,
                LlmError::InvalidConfig(_) => ErrorKind::InvalidConfig,
                LlmError::Http(_)
                | LlmError::Json(_)
                | LlmError::EmptyResponse { .. }
                | LlmError::Generation { .. }
                | LlmError::Other(_) => ErrorKind::GenerationFailed,
            },
        }
    }

    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::RateLimited
    }

    /// What the user can do about it, when there is something to do.
    #[must_use]
    pub fn guidance(&self) -> Option<String> {
        let hint = match self.kind() {
            ErrorKind::InvalidQuestion => {
                "Ask a complete question, e.g. \"¿Qué líneas de investigación tiene el INAOE?\""
                    .to_owned()
            }
            ErrorKind::InvalidConfig => {
                "Temperature must be 0-1, timeout 30-300s and documents 3-10".to_owned()
            }
            ErrorKind::IndexUnavailable if self.needs_rebuild() => {
                "Rebuild the index with the current embedding model: `docent ingest --full`"
                    .to_owned()
            }
            ErrorKind::IndexUnavailable => {
                "Build the document index first with `docent ingest`".to_owned()
            }
            ErrorKind::AuthenticationError => match self.provider() {
                Some(kind) => match kind.credential_key() {
                    Some(key) => {
                        format!("Set {key} in .streamlit/secrets.toml or the environment")
                    }
                    None => "Check the provider credentials".to_owned(),
                },
                None => "Check the provider credentials".to_owned(),
            },
            ErrorKind::RateLimited => {
                "The provider is rate limiting requests; wait a moment and try again".to_owned()
            }
            ErrorKind::GenerationTimeout => {
                "Raise the timeout or pick a faster model".to_owned()
            }
            ErrorKind::ServiceUnavailable => {
                "Start the local runner with `ollama serve` and check the configured URL"
                    .to_owned()
            }
            ErrorKind::GenerationFailed | ErrorKind::Cancelled => return None,
        };
        Some(hint)
    }

    fn needs_rebuild(&self) -> bool {
        matches!(
            self,
            Self::EmbeddingModelMismatch { .. } | Self::Index(IndexError::DimensionMismatch { .. })
        )
    }

    fn provider(&self) -> Option<ProviderKind> {
        match self {
            Self::Llm(LlmError::Authentication { provider }) => provider.parse().ok(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn llm_errors_map_to_taxonomy() {
        let cases = [
            (
                LlmError::Authentication {
                    provider: "google".into(),
                },
                ErrorKind::AuthenticationError,
            ),
            (
                LlmError::RateLimited {
                    provider: "groq".into(),
                    retry_after: None,
                },
                ErrorKind::RateLimited,
            ),
            (
                LlmError::Timeout {
                    provider: "ollama".into(),
                    seconds: 30,
                },
                ErrorKind::GenerationTimeout,
            ),
            (
                LlmError::Unavailable {
                    provider: "ollama".into(),
                    reason: "refused".into(),
                },
                ErrorKind::ServiceUnavailable,
            ),
            (
                LlmError::Generation {
                    provider: "together".into(),
                    message: "500".into(),
                },
                ErrorKind::GenerationFailed,
            ),
            (
                LlmError::EmptyResponse {
                    provider: "groq".into(),
                },
                ErrorKind::GenerationFailed,
            ),
        ];
        for (err, kind) in cases {
            assert_eq!(QueryError::from(err).kind(), kind);
        }
    }

    #[test]
    fn embedding_failure_is_service_unavailable() {
        let err = QueryError::Embedding(LlmError::Other("down".into()));
        assert_eq!(err.kind(), ErrorKind::ServiceUnavailable);
    }

    #[test]
    fn index_errors_are_index_unavailable() {
        let err = QueryError::from(IndexError::Unavailable("not built".into()));
        assert_eq!(err.kind(), ErrorKind::IndexUnavailable);
        assert!(err.guidance().unwrap().contains("docent ingest"));
    }

    #[test]
    fn stale_index_guidance_asks_for_full_rebuild() {
        let mismatch = QueryError::EmbeddingModelMismatch {
            index_model: "all-minilm".into(),
            query_model: "nomic-embed-text".into(),
        };
        assert_eq!(mismatch.kind(), ErrorKind::IndexUnavailable);
        assert!(mismatch.guidance().unwrap().contains("docent ingest --full"));

        let dims = QueryError::from(IndexError::DimensionMismatch {
            expected: 384,
            actual: 768,
        });
        assert!(dims.guidance().unwrap().contains("--full"));
    }

    #[test]
    fn only_rate_limit_is_retryable() {
        let limited = QueryError::from(LlmError::RateLimited {
            provider: "groq".into(),
            retry_after: Some(Duration::from_secs(1)),
        });
        assert!(limited.is_retryable());
        assert!(!QueryError::Cancelled.is_retryable());
    }

    #[test]
    fn auth_guidance_names_the_key() {
        let err = QueryError::from(LlmError::Authentication {
            provider: "together".into(),
        });
        assert!(err.guidance().unwrap().contains("TOGETHER_API_KEY"));
    }

    #[test]
    fn kind_display_is_snake_case() {
        assert_eq!(ErrorKind::GenerationTimeout.to_string(), "generation_timeout");
    }
}
