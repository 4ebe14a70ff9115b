use std::path::Path;
use std::sync::Arc;

use tokio::sync::watch;

use crate::error::IndexError;
use crate::index::DocumentIndex;
use crate::store;

#[derive(Debug, Clone)]
struct Published {
    index: Arc<DocumentIndex>,
    version: u64,
}

/// Shared cell holding the current index snapshot.
///
/// Readers clone the `Arc` once and keep using it; a rebuild publishes a new `Arc` without
/// touching snapshots already handed out.
#[derive(Debug, Clone)]
pub struct IndexHandle {
    tx: Arc<watch::Sender<Option<Published>>>,
}

impl Default for IndexHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexHandle {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    #[must_use]
    pub fn with_index(index: DocumentIndex) -> Self {
        let handle = Self::new();
        handle.publish(index);
        handle
    }

    /// Current snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Unavailable`] if no index has been published.
    pub fn snapshot(&self) -> Result<Arc<DocumentIndex>, IndexError> {
        self.tx
            .borrow()
            .as_ref()
            .map(|p| Arc::clone(&p.index))
            .ok_or_else(|| {
                IndexError::Unavailable("index has not been built or loaded".into())
            })
    }

    /// Swap in a new index and return its version.
    pub fn publish(&self, index: DocumentIndex) -> u64 {
        let index = Arc::new(index);
        let mut version = 0;
        self.tx.send_modify(|current| {
            version = current.as_ref().map_or(1, |p| p.version + 1);
            *current = Some(Published {
                index: Arc::clone(&index),
                version,
            });
        });
        tracing::info!(version, chunks = index.len(), "index snapshot published");
        version
    }

    /// Version of the published snapshot, 0 when nothing is published.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.tx.borrow().as_ref().map_or(0, |p| p.version)
    }

    /// Load the persisted index from `dir` and publish it.
    ///
    /// # Errors
    ///
    /// Propagates [`store::load`] failures; the current snapshot is kept in that case.
    pub async fn load(&self, dir: &Path) -> Result<u64, IndexError> {
        let index = store::load(dir).await?;
        Ok(self.publish(index))
    }
}
