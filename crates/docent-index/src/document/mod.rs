pub mod error;
pub mod loader;
pub mod splitter;
pub mod types;

pub use error::DocumentError;
pub use loader::TextLoader;
pub use splitter::{SplitterConfig, TextSplitter};
pub use types::{Chunk, Document, DocumentMetadata};

#[cfg(feature = "pdf")]
pub use loader::PdfLoader;

/// Default maximum file size: 50 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// Reads a file into one [`Document`] per page.
pub trait DocumentLoader: Send + Sync {
    fn load(
        &self,
        path: &std::path::Path,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Vec<Document>, DocumentError>> + Send + '_>,
    >;

    fn supported_extensions(&self) -> &[&str];
}

/// Loaders for every format this build can read.
#[must_use]
pub fn default_loaders(max_file_size: u64) -> Vec<Box<dyn DocumentLoader>> {
    let mut loaders: Vec<Box<dyn DocumentLoader>> = Vec::new();
    #[cfg(feature = "pdf")]
    loaders.push(Box::new(PdfLoader { max_file_size }));
    loaders.push(Box::new(TextLoader { max_file_size }));
    loaders
}
