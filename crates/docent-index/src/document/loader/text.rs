use std::path::Path;
use std::pin::Pin;

use crate::document::{
    DEFAULT_MAX_FILE_SIZE, Document, DocumentError, DocumentLoader, DocumentMetadata,
};

/// Plain text and Markdown, loaded as a single page.
pub struct TextLoader {
    pub max_file_size: u64,
}

impl Default for TextLoader {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl DocumentLoader for TextLoader {
    fn load(
        &self,
        path: &Path,
    ) -> Pin<Box<dyn std::future::Future<Output = Result<Vec<Document>, DocumentError>> + Send + '_>>
    {
        let path = path.to_path_buf();
        let max_size = self.max_file_size;
        Box::pin(async move {
            let len = tokio::fs::metadata(&path)
                .await
                .map_err(|source| DocumentError::Read {
                    path: path.clone(),
                    source,
                })?
                .len();
            if len > max_size {
                return Err(DocumentError::FileTooLarge(len));
            }

            let bytes = tokio::fs::read(&path)
                .await
                .map_err(|source| DocumentError::Read {
                    path: path.clone(),
                    source,
                })?;
            // Older institutional notes are often Latin-1; keep them searchable.
            let content = match String::from_utf8(bytes) {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(path = %path.display(), "not valid UTF-8, decoding lossily");
                    String::from_utf8_lossy(e.as_bytes()).into_owned()
                }
            };

            let is_markdown = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("md") || e.eq_ignore_ascii_case("markdown"));
            let content_type = if is_markdown { "text/markdown" } else { "text/plain" };

            Ok(vec![Document {
                content,
                metadata: DocumentMetadata {
                    source: path.display().to_string(),
                    content_type: content_type.to_owned(),
                    page: 1,
                },
            }])
        })
    }

    fn supported_extensions(&self) -> &[&str] {
        &["txt", "md", "markdown"]
    }
}
