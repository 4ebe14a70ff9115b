//! Query pipeline, configuration, and provider wiring.

pub mod assistant;
pub mod config;
pub mod doctor;
pub mod error;
pub mod format;
pub mod pipeline;
pub mod prompt;
pub mod question;
pub mod registry;
pub mod vault;

pub use assistant::Assistant;
pub use config::{Config, ConfigError};
pub use error::{ErrorKind, QueryError};
pub use pipeline::{QueryPipeline, QueryResult, QueryStage, RetrievedChunk, SourceRef};
pub use registry::ProviderRegistry;
