use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("file too large: {0} bytes")]
    FileTooLarge(u64),

    #[cfg(feature = "pdf")]
    #[error("PDF error in {path}: {message}")]
    Pdf { path: PathBuf, message: String },

    #[error("embedding failed for {source_id}: {error}")]
    Embedding {
        source_id: String,
        #[source]
        error: docent_llm::LlmError,
    },

    #[error("index error: {0}")]
    Index(#[from] crate::error::IndexError),
}
