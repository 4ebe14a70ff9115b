use std::cmp::Ordering;

use crate::chunk::{DocumentChunk, ScoredChunk};
use crate::error::IndexError;
use crate::manifest::IndexManifest;

/// Read-only set of embedded chunks, in ingestion order.
#[derive(Debug, Clone)]
pub struct DocumentIndex {
    manifest: IndexManifest,
    chunks: Vec<DocumentChunk>,
}

impl DocumentIndex {
    /// Assemble an index, fixing its dimension from the first chunk.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::DimensionMismatch`] on the first chunk whose embedding length
    /// differs from the first one.
    pub fn build(
        chunks: Vec<DocumentChunk>,
        mut manifest: IndexManifest,
    ) -> Result<Self, IndexError> {
        if let Some(first) = chunks.first() {
            let expected = first.embedding.len();
            if let Some(bad) = chunks.iter().find(|c| c.embedding.len() != expected) {
                return Err(IndexError::DimensionMismatch {
                    expected,
                    actual: bad.embedding.len(),
                });
            }
            manifest.dimension = expected;
        }
        Ok(Self { manifest, chunks })
    }

    #[must_use]
    pub fn empty(embedding_model: impl Into<String>) -> Self {
        Self {
            manifest: IndexManifest::new(embedding_model),
            chunks: Vec::new(),
        }
    }

    #[must_use]
    pub fn manifest(&self) -> &IndexManifest {
        &self.manifest
    }

    #[must_use]
    pub fn chunks(&self) -> &[DocumentChunk] {
        &self.chunks
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    #[must_use]
    pub fn dimension(&self) -> usize {
        self.manifest.dimension
    }

    /// Chunks of one source file, in their original order.
    pub fn chunks_for<'a>(&'a self, source_id: &'a str) -> impl Iterator<Item = &'a DocumentChunk> {
        self.chunks.iter().filter(move |c| c.source_id == source_id)
    }

    /// Top `k` chunks by cosine similarity, highest first.
    ///
    /// Equal scores keep ingestion order; NaN scores sort last. Asking for more chunks than
    /// the index holds returns all of them.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::InvalidK`] for `k == 0` and [`IndexError::DimensionMismatch`]
    /// when the query vector has a different length than the indexed embeddings.
    pub fn retrieve(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk<'_>>, IndexError> {
        if k == 0 {
            return Err(IndexError::InvalidK);
        }
        if self.chunks.is_empty() {
            return Ok(Vec::new());
        }
        if query.len() != self.dimension() {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension(),
                actual: query.len(),
            });
        }

        let mut scored: Vec<(usize, f32)> = self
            .chunks
            .iter()
            .enumerate()
            .map(|(i, c)| (i, cosine_similarity(query, &c.embedding)))
            .collect();

        scored.sort_by(|(ia, a), (ib, b)| by_score_desc(*a, *b).then(ia.cmp(ib)));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(i, score)| ScoredChunk {
                chunk: &self.chunks[i],
                score,
            })
            .collect())
    }
}

fn by_score_desc(a: f32, b: f32) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (true, true) => Ordering::Equal,
    }
}

pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
