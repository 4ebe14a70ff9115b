use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MANIFEST_VERSION: u32 = 1;

/// Per-file record used to skip unchanged sources on the next ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceEntry {
    pub path: String,
    /// blake3 hex digest of the file bytes.
    pub content_hash: String,
    pub chunk_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexManifest {
    pub version: u32,
    pub embedding_model: String,
    pub dimension: usize,
    pub built_at: DateTime<Utc>,
    #[serde(default)]
    pub sources: Vec<SourceEntry>,
}

impl IndexManifest {
    #[must_use]
    pub fn new(embedding_model: impl Into<String>) -> Self {
        Self {
            version: MANIFEST_VERSION,
            embedding_model: embedding_model.into(),
            dimension: 0,
            built_at: Utc::now(),
            sources: Vec::new(),
        }
    }

    #[must_use]
    pub fn source(&self, path: &str) -> Option<&SourceEntry> {
        self.sources.iter().find(|s| s.path == path)
    }
}
