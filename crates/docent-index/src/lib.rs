//! Document ingestion and the persisted vector index used for retrieval.

pub mod chunk;
pub mod document;
pub mod error;
pub mod handle;
pub mod index;
pub mod ingest;
pub mod manifest;
pub mod store;

pub use chunk::{DocumentChunk, ScoredChunk};
pub use error::IndexError;
pub use handle::IndexHandle;
pub use index::DocumentIndex;
pub use ingest::{IngestOptions, IngestReport, Ingestor};
pub use manifest::{IndexManifest, SourceEntry};
