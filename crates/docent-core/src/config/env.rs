use std::path::PathBuf;

use super::{Config, VaultBackend};

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("DOCENT_LLM_PROVIDER") {
            match v.parse() {
                Ok(kind) => self.llm.provider = kind,
                Err(_) => tracing::warn!("ignoring invalid DOCENT_LLM_PROVIDER value: {v}"),
            }
        }
        if let Ok(v) = std::env::var("DOCENT_LLM_MODEL") {
            self.llm.model = v;
        }
        if let Ok(v) = std::env::var("DOCENT_OLLAMA_URL") {
            self.llm.ollama_url = v;
        }
        if let Ok(v) = std::env::var("DOCENT_EMBEDDING_MODEL") {
            self.embedding.model = v;
        }
        if let Ok(v) = std::env::var("DOCENT_INDEX_DIR") {
            self.index.index_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("DOCENT_DOCS_DIR") {
            self.index.docs_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("DOCENT_QUERY_MAX_CHARS")
            && let Ok(n) = v.parse::<usize>()
        {
            self.query.max_question_chars = n;
        }
        if let Ok(v) = std::env::var("DOCENT_VAULT_BACKEND") {
            match v.to_ascii_lowercase().as_str() {
                "env" => self.vault.backend = VaultBackend::Env,
                "file" => self.vault.backend = VaultBackend::File,
                _ => tracing::warn!("ignoring invalid DOCENT_VAULT_BACKEND value: {v}"),
            }
        }
    }
}
