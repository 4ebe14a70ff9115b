//! On-disk index layout: `<dir>/index.json`, replaced by renaming a sibling `<dir>.tmp`.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::chunk::DocumentChunk;
use crate::error::IndexError;
use crate::index::DocumentIndex;
use crate::manifest::IndexManifest;

pub const INDEX_FILE: &str = "index.json";

#[derive(Serialize)]
struct IndexFileRef<'a> {
    manifest: &'a IndexManifest,
    chunks: &'a [DocumentChunk],
}

#[derive(Deserialize)]
struct IndexFile {
    manifest: IndexManifest,
    chunks: Vec<DocumentChunk>,
}

fn sibling(dir: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(dir.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

#[must_use]
pub fn index_file(dir: &Path) -> PathBuf {
    dir.join(INDEX_FILE)
}

#[must_use]
pub fn exists(dir: &Path) -> bool {
    index_file(dir).is_file()
}

/// Write `index` to `dir`, fully replacing whatever was there.
///
/// Readers of `dir` see either the previous file or the new one.
///
/// # Errors
///
/// Returns [`IndexError::Io`] if the temporary directory cannot be written or swapped in.
pub async fn save(index: &DocumentIndex, dir: &Path) -> Result<(), IndexError> {
    let tmp = sibling(dir, ".tmp");
    let old = sibling(dir, ".old");

    if tokio::fs::try_exists(&tmp).await.unwrap_or(false) {
        tokio::fs::remove_dir_all(&tmp)
            .await
            .map_err(|e| IndexError::io(&tmp, e))?;
    }
    if let Some(parent) = dir.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| IndexError::io(parent, e))?;
    }
    tokio::fs::create_dir_all(&tmp)
        .await
        .map_err(|e| IndexError::io(&tmp, e))?;

    let bytes = serde_json::to_vec(&IndexFileRef {
        manifest: index.manifest(),
        chunks: index.chunks(),
    })?;
    let tmp_file = index_file(&tmp);
    tokio::fs::write(&tmp_file, bytes)
        .await
        .map_err(|e| IndexError::io(&tmp_file, e))?;

    let had_previous = tokio::fs::try_exists(dir).await.unwrap_or(false);
    if had_previous {
        if tokio::fs::try_exists(&old).await.unwrap_or(false) {
            tokio::fs::remove_dir_all(&old)
                .await
                .map_err(|e| IndexError::io(&old, e))?;
        }
        tokio::fs::rename(dir, &old)
            .await
            .map_err(|e| IndexError::io(dir, e))?;
    }

    if let Err(e) = tokio::fs::rename(&tmp, dir).await {
        if had_previous {
            restore_previous(&old, dir).await;
        }
        return Err(IndexError::io(dir, e));
    }

    if had_previous && let Err(e) = tokio::fs::remove_dir_all(&old).await {
        tracing::warn!(path = %old.display(), "failed to remove previous index: {e}");
    }

    tracing::info!(
        path = %dir.display(),
        chunks = index.len(),
        sources = index.manifest().sources.len(),
        "index written"
    );
    Ok(())
}

/// Move the previous index back after a failed swap. Returns whether it is back in place.
async fn restore_previous(old: &Path, dir: &Path) -> bool {
    match tokio::fs::rename(old, dir).await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!(
                path = %old.display(),
                index_dir = %dir.display(),
                "failed to restore previous index: {e}"
            );
            false
        }
    }
}

/// Read and validate the index persisted in `dir`.
///
/// # Errors
///
/// Returns [`IndexError::Unavailable`] when no index has been written yet, and
/// [`IndexError::Json`] or [`IndexError::DimensionMismatch`] for a corrupt file.
pub async fn load(dir: &Path) -> Result<DocumentIndex, IndexError> {
    let path = index_file(dir);
    let bytes = match tokio::fs::read(&path).await {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(IndexError::Unavailable(format!(
                "no index at {}",
                path.display()
            )));
        }
        Err(e) => return Err(IndexError::io(&path, e)),
    };
    let file: IndexFile = serde_json::from_slice(&bytes)?;
    let index = DocumentIndex::build(file.chunks, file.manifest)?;
    tracing::debug!(path = %path.display(), chunks = index.len(), "index loaded");
    Ok(index)
}
