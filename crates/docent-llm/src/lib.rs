//! Generation backend abstraction and the hosted/local adapters behind it.

pub mod any;
pub mod compatible;
pub mod error;
pub mod gemini;
pub mod http;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod model;
pub mod ollama;
pub mod openai;
pub mod provider;
pub mod retry;

pub use any::AnyProvider;
pub use error::LlmError;
pub use model::{ModelConfig, ModelInfo, ProviderKind, builtin_catalog};
pub use provider::{EmbedFn, EmbedFuture, LlmProvider, generate_with_timeout, generate_within};
