use serde::{Deserialize, Serialize};

/// One embedded span of source text. Immutable once the index is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub text: String,
    /// File name relative to the documents directory.
    pub source_id: String,
    /// 1-based page number.
    pub page: u32,
    /// Position within the page's split sequence.
    pub chunk_index: usize,
    pub embedding: Vec<f32>,
}

/// A chunk borrowed from an index snapshot together with its similarity to the query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredChunk<'a> {
    pub chunk: &'a DocumentChunk,
    pub score: f32,
}
