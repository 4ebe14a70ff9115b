use std::path::Path;
use std::sync::Arc;

use docent_index::document::{SplitterConfig, TextSplitter};
use docent_index::{IndexHandle, IngestOptions, Ingestor, store};
use docent_llm::{EmbedFn, EmbedFuture, LlmError};

/// Two-dimensional embedding: mentions of "INAOE" point one way, everything else the other.
fn keyword_embed() -> EmbedFn {
    Arc::new(|text: &str| -> EmbedFuture {
        let v = if text.contains("INAOE") {
            vec![1.0, 0.1]
        } else {
            vec![0.1, 1.0]
        };
        Box::pin(async move { Ok(v) })
    })
}

fn broken_embed() -> EmbedFn {
    Arc::new(|_: &str| -> EmbedFuture {
        Box::pin(async { Err(LlmError::Other("connection refused".into())) })
    })
}

fn ingestor(embed: EmbedFn) -> Ingestor {
    Ingestor::new(TextSplitter::new(SplitterConfig::default()), embed, "all-minilm")
}

fn options(root: &Path, full: bool) -> IngestOptions {
    IngestOptions {
        docs_dir: root.join("docs"),
        index_dir: root.join("index"),
        full,
    }
}

fn seed(root: &Path) {
    std::fs::create_dir_all(root.join("docs")).unwrap();
    std::fs::write(
        root.join("docs/doc1.txt"),
        "INAOE is a research institute in Tonantzintla.",
    )
    .unwrap();
    std::fs::write(
        root.join("docs/doc2.md"),
        "Optics research includes adaptive optics and photonics.",
    )
    .unwrap();
}

#[tokio::test]
async fn ingest_persist_load_and_retrieve() {
    let root = tempfile::tempdir().unwrap();
    seed(root.path());

    let report = ingestor(keyword_embed())
        .run(&options(root.path(), false))
        .await
        .unwrap()
        .1;
    assert_eq!(report.files, 2);
    assert_eq!(report.chunks, 2);

    let handle = IndexHandle::new();
    assert_eq!(handle.load(&root.path().join("index")).await.unwrap(), 1);

    let snapshot = handle.snapshot().unwrap();
    let hits = snapshot.retrieve(&[1.0, 0.0], 2).unwrap();
    assert_eq!(hits[0].chunk.source_id, "doc1.txt");
    assert_eq!(hits[1].chunk.source_id, "doc2.md");
}

#[tokio::test]
async fn rerun_reuses_unchanged_files() {
    let root = tempfile::tempdir().unwrap();
    seed(root.path());
    let ing = ingestor(keyword_embed());

    ing.run(&options(root.path(), false)).await.unwrap();
    let (_, report) = ing.run(&options(root.path(), false)).await.unwrap();
    assert_eq!(report.reused_files, 2);
    assert_eq!(report.embedded_files, 0);

    let (_, report) = ing.run(&options(root.path(), true)).await.unwrap();
    assert_eq!(report.embedded_files, 2);
}

#[tokio::test]
async fn failed_ingestion_leaves_existing_index_untouched() {
    let root = tempfile::tempdir().unwrap();
    seed(root.path());
    ingestor(keyword_embed())
        .run(&options(root.path(), false))
        .await
        .unwrap();

    std::fs::write(root.path().join("docs/doc3.txt"), "New material.").unwrap();
    let handle = IndexHandle::new();
    let result = ingestor(broken_embed())
        .run_and_publish(&options(root.path(), false), &handle)
        .await;

    assert!(result.is_err());
    assert_eq!(handle.version(), 0);
    let persisted = store::load(&root.path().join("index")).await.unwrap();
    assert_eq!(persisted.len(), 2);
}

#[tokio::test]
async fn publish_swaps_snapshot_for_new_readers_only() {
    let root = tempfile::tempdir().unwrap();
    seed(root.path());
    let handle = IndexHandle::new();
    let ing = ingestor(keyword_embed());

    ing.run_and_publish(&options(root.path(), false), &handle)
        .await
        .unwrap();
    let before = handle.snapshot().unwrap();

    std::fs::remove_file(root.path().join("docs/doc2.md")).unwrap();
    ing.run_and_publish(&options(root.path(), false), &handle)
        .await
        .unwrap();

    assert_eq!(before.len(), 2);
    assert_eq!(handle.snapshot().unwrap().len(), 1);
    assert_eq!(handle.version(), 2);
}
