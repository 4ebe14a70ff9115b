//! Directory scan, extraction, chunking and embedding into a replacement index.

use std::path::{Path, PathBuf};
use std::time::Duration;

use docent_llm::{EmbedFn, LlmError};

use crate::chunk::DocumentChunk;
use crate::document::{
    DEFAULT_MAX_FILE_SIZE, DocumentError, DocumentLoader, TextSplitter, default_loaders,
};
use crate::error::IndexError;
use crate::handle::IndexHandle;
use crate::index::DocumentIndex;
use crate::manifest::{IndexManifest, SourceEntry};
use crate::store;

#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub docs_dir: PathBuf,
    pub index_dir: PathBuf,
    /// Re-embed every file even when its content hash is unchanged.
    pub full: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub files: usize,
    pub reused_files: usize,
    pub embedded_files: usize,
    pub chunks: usize,
    pub skipped: Vec<String>,
}

pub struct Ingestor {
    splitter: TextSplitter,
    loaders: Vec<Box<dyn DocumentLoader>>,
    embed_fn: EmbedFn,
    embedding_model: String,
    embed_timeout: Duration,
}

impl Ingestor {
    #[must_use]
    pub fn new(splitter: TextSplitter, embed_fn: EmbedFn, embedding_model: impl Into<String>) -> Self {
        Self {
            splitter,
            loaders: default_loaders(DEFAULT_MAX_FILE_SIZE),
            embed_fn,
            embedding_model: embedding_model.into(),
            embed_timeout: Duration::from_secs(60),
        }
    }

    #[must_use]
    pub fn with_loaders(mut self, loaders: Vec<Box<dyn DocumentLoader>>) -> Self {
        self.loaders = loaders;
        self
    }

    #[must_use]
    pub fn with_embed_timeout(mut self, timeout: Duration) -> Self {
        self.embed_timeout = timeout;
        self
    }

    fn loader_for(&self, path: &Path) -> Option<&dyn DocumentLoader> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        self.loaders
            .iter()
            .find(|l| l.supported_extensions().contains(&ext.as_str()))
            .map(|l| l.as_ref())
    }

    async fn embed(&self, source_id: &str, text: &str) -> Result<Vec<f32>, DocumentError> {
        let result = tokio::time::timeout(self.embed_timeout, (self.embed_fn)(text))
            .await
            .unwrap_or_else(|_| {
                Err(LlmError::Timeout {
                    provider: "embedding".into(),
                    seconds: self.embed_timeout.as_secs(),
                })
            });
        result.map_err(|error| DocumentError::Embedding {
            source_id: source_id.to_owned(),
            error,
        })
    }

    /// Build a new index from every supported file directly inside `docs_dir`.
    ///
    /// Files whose content hash matches an entry of `previous` (built with the same
    /// embedding model) reuse its chunks instead of being extracted and embedded again.
    ///
    /// # Errors
    ///
    /// Fails on the first unreadable file, extraction error or embedding failure.
    pub async fn build(
        &self,
        docs_dir: &Path,
        previous: Option<&DocumentIndex>,
    ) -> Result<(DocumentIndex, IngestReport), DocumentError> {
        let previous = previous.filter(|p| p.manifest().embedding_model == self.embedding_model);
        let files = scan(docs_dir).await?;

        let mut report = IngestReport::default();
        let mut manifest = IndexManifest::new(self.embedding_model.clone());
        let mut chunks: Vec<DocumentChunk> = Vec::new();

        for path in files {
            let Some(source_id) = path.file_name().map(|n| n.to_string_lossy().into_owned())
            else {
                continue;
            };
            let Some(loader) = self.loader_for(&path) else {
                tracing::debug!(file = %source_id, "unsupported file skipped");
                report.skipped.push(source_id);
                continue;
            };

            let bytes = tokio::fs::read(&path)
                .await
                .map_err(|source| DocumentError::Read {
                    path: path.clone(),
                    source,
                })?;
            let content_hash = blake3::hash(&bytes).to_hex().to_string();
            report.files += 1;

            let reusable = previous.and_then(|p| {
                p.manifest()
                    .source(&source_id)
                    .filter(|entry| entry.content_hash == content_hash)
                    .map(|_| p.chunks_for(&source_id).cloned().collect::<Vec<_>>())
            });

            let file_chunks = if let Some(reused) = reusable {
                tracing::info!(file = %source_id, chunks = reused.len(), "unchanged, reusing");
                report.reused_files += 1;
                reused
            } else {
                let embedded = self.embed_file(loader, &path, &source_id).await?;
                tracing::info!(file = %source_id, chunks = embedded.len(), "embedded");
                report.embedded_files += 1;
                embedded
            };

            manifest.sources.push(SourceEntry {
                path: source_id,
                content_hash,
                chunk_count: file_chunks.len(),
            });
            chunks.extend(file_chunks);
        }

        report.chunks = chunks.len();
        let index = DocumentIndex::build(chunks, manifest)?;
        Ok((index, report))
    }

    async fn embed_file(
        &self,
        loader: &dyn DocumentLoader,
        path: &Path,
        source_id: &str,
    ) -> Result<Vec<DocumentChunk>, DocumentError> {
        let pages = loader.load(path).await?;
        let mut out = Vec::new();
        for mut page in pages {
            source_id.clone_into(&mut page.metadata.source);
            for chunk in self.splitter.split(&page) {
                let embedding = self.embed(source_id, &chunk.content).await?;
                out.push(DocumentChunk {
                    text: chunk.content,
                    source_id: chunk.metadata.source,
                    page: chunk.metadata.page,
                    chunk_index: chunk.chunk_index,
                    embedding,
                });
            }
        }
        Ok(out)
    }

    /// Build from `options.docs_dir` and atomically replace the index in `options.index_dir`.
    ///
    /// The existing index stays in place if anything fails.
    ///
    /// # Errors
    ///
    /// Returns the first read, extraction, embedding or write failure.
    pub async fn run(
        &self,
        options: &IngestOptions,
    ) -> Result<(DocumentIndex, IngestReport), DocumentError> {
        let previous = if options.full {
            None
        } else {
            match store::load(&options.index_dir).await {
                Ok(index) => Some(index),
                Err(IndexError::Unavailable(_)) => None,
                Err(e) => {
                    tracing::warn!("previous index unreadable, rebuilding from scratch: {e}");
                    None
                }
            }
        };

        let (index, report) = self.build(&options.docs_dir, previous.as_ref()).await?;
        store::save(&index, &options.index_dir).await?;
        Ok((index, report))
    }

    /// [`Self::run`], then publish the result so new queries see it.
    ///
    /// # Errors
    ///
    /// Same as [`Self::run`]; nothing is published on failure.
    pub async fn run_and_publish(
        &self,
        options: &IngestOptions,
        handle: &IndexHandle,
    ) -> Result<IngestReport, DocumentError> {
        let (index, report) = self.run(options).await?;
        handle.publish(index);
        Ok(report)
    }
}

/// Regular files directly inside `dir`, sorted by name.
async fn scan(dir: &Path) -> Result<Vec<PathBuf>, DocumentError> {
    let read_err = |source| DocumentError::Read {
        path: dir.to_path_buf(),
        source,
    };
    let mut entries = tokio::fs::read_dir(dir).await.map_err(read_err)?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(read_err)? {
        if entry.file_type().await.map_err(read_err)?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use docent_llm::EmbedFuture;

    use super::*;
    use crate::document::SplitterConfig;

    fn counting_embed(calls: Arc<AtomicUsize>) -> EmbedFn {
        Arc::new(move |text: &str| -> EmbedFuture {
            calls.fetch_add(1, Ordering::SeqCst);
            #[allow(clippy::cast_precision_loss)]
            let v = vec![text.len() as f32, 1.0];
            Box::pin(async move { Ok(v) })
        })
    }

    fn failing_embed() -> EmbedFn {
        Arc::new(|_: &str| -> EmbedFuture {
            Box::pin(async { Err(LlmError::Other("embedding runner down".into())) })
        })
    }

    fn ingestor(embed: EmbedFn) -> Ingestor {
        Ingestor::new(TextSplitter::new(SplitterConfig::default()), embed, "test-embed")
    }

    fn write(dir: &Path, name: &str, body: &str) {
        std::fs::write(dir.join(name), body).unwrap();
    }

    #[tokio::test]
    async fn builds_chunks_in_file_order() {
        let docs = tempfile::tempdir().unwrap();
        write(docs.path(), "b.txt", "Optics research includes lasers.");
        write(docs.path(), "a.txt", "INAOE is a research institute.");
        write(docs.path(), "image.png", "ignored");

        let calls = Arc::new(AtomicUsize::new(0));
        let (index, report) = ingestor(counting_embed(Arc::clone(&calls)))
            .build(docs.path(), None)
            .await
            .unwrap();

        assert_eq!(report.files, 2);
        assert_eq!(report.skipped, vec!["image.png".to_owned()]);
        assert_eq!(index.chunks()[0].source_id, "a.txt");
        assert_eq!(index.chunks()[1].source_id, "b.txt");
        assert_eq!(index.chunks()[0].page, 1);
        assert_eq!(index.dimension(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn unchanged_files_are_not_re_embedded() {
        let docs = tempfile::tempdir().unwrap();
        write(docs.path(), "a.txt", "First document.");
        write(docs.path(), "b.txt", "Second document.");

        let calls = Arc::new(AtomicUsize::new(0));
        let ing = ingestor(counting_embed(Arc::clone(&calls)));
        let (first, _) = ing.build(docs.path(), None).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        write(docs.path(), "b.txt", "Second document, revised.");
        let (second, report) = ing.build(docs.path(), Some(&first)).await.unwrap();

        assert_eq!(report.reused_files, 1);
        assert_eq!(report.embedded_files, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(second.chunks()[1].text, "Second document, revised.");
    }

    #[tokio::test]
    async fn different_embedding_model_forces_full_rebuild() {
        let docs = tempfile::tempdir().unwrap();
        write(docs.path(), "a.txt", "Text.");

        let calls = Arc::new(AtomicUsize::new(0));
        let (first, _) = ingestor(counting_embed(Arc::clone(&calls)))
            .build(docs.path(), None)
            .await
            .unwrap();

        let other = Ingestor::new(
            TextSplitter::new(SplitterConfig::default()),
            counting_embed(Arc::clone(&calls)),
            "other-embed",
        );
        let (_, report) = other.build(docs.path(), Some(&first)).await.unwrap();
        assert_eq!(report.reused_files, 0);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn removed_files_drop_out_of_index() {
        let docs = tempfile::tempdir().unwrap();
        write(docs.path(), "a.txt", "Kept.");
        write(docs.path(), "b.txt", "Removed.");
        let ing = ingestor(counting_embed(Arc::new(AtomicUsize::new(0))));
        let (first, _) = ing.build(docs.path(), None).await.unwrap();

        std::fs::remove_file(docs.path().join("b.txt")).unwrap();
        let (second, _) = ing.build(docs.path(), Some(&first)).await.unwrap();

        assert_eq!(second.len(), 1);
        assert!(second.manifest().source("b.txt").is_none());
    }

    #[tokio::test]
    async fn embedding_failure_names_the_file() {
        let docs = tempfile::tempdir().unwrap();
        write(docs.path(), "a.txt", "Some text.");

        let err = ingestor(failing_embed())
            .build(docs.path(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentError::Embedding { ref source_id, .. } if source_id == "a.txt"));
    }

    #[tokio::test]
    async fn missing_docs_dir_is_read_error() {
        let err = ingestor(failing_embed())
            .build(Path::new("/nonexistent/docs"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentError::Read { .. }));
    }

    #[tokio::test]
    async fn empty_corpus_builds_empty_index() {
        let docs = tempfile::tempdir().unwrap();
        let (index, report) = ingestor(failing_embed())
            .build(docs.path(), None)
            .await
            .unwrap();
        assert!(index.is_empty());
        assert_eq!(report.files, 0);
    }

    #[tokio::test]
    async fn hung_embedding_times_out() {
        let docs = tempfile::tempdir().unwrap();
        write(docs.path(), "a.txt", "Text.");
        let hang: EmbedFn = Arc::new(|_: &str| -> EmbedFuture { Box::pin(std::future::pending()) });

        let err = ingestor(hang)
            .with_embed_timeout(Duration::from_millis(20))
            .build(docs.path(), None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DocumentError::Embedding { error: LlmError::Timeout { .. }, .. }
        ));
    }
}
