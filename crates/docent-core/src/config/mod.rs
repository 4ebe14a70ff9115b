mod env;
mod types;

#[cfg(test)]
mod tests;

pub use types::*;

use std::path::Path;

use docent_index::document::SplitterConfig;
use docent_llm::{ModelConfig, ModelInfo, builtin_catalog};

use crate::vault::{Secret, VaultProvider};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl Config {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed, or if the result
    /// fails [`Config::validate`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.display().to_string(),
                source,
            })?;
            toml::from_str::<Self>(&content).map_err(|source| ConfigError::Parse {
                path: path.display().to_string(),
                source,
            })?
        } else {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.default_model_config()
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("[llm] {e}")))?;

        if self.index.chunk_size == 0 {
            return Err(ConfigError::Invalid("index.chunk_size must be > 0".into()));
        }
        if self.index.chunk_overlap >= self.index.chunk_size {
            return Err(ConfigError::Invalid(format!(
                "index.chunk_overlap ({}) must be smaller than index.chunk_size ({})",
                self.index.chunk_overlap, self.index.chunk_size
            )));
        }
        if self.query.min_question_chars == 0
            || self.query.min_question_chars > self.query.max_question_chars
        {
            return Err(ConfigError::Invalid(format!(
                "query bounds invalid: min {} / max {}",
                self.query.min_question_chars, self.query.max_question_chars
            )));
        }
        if let Some(template) = &self.query.prompt_template
            && !(template.contains("{context}") && template.contains("{question}"))
        {
            return Err(ConfigError::Invalid(
                "query.prompt_template must contain {context} and {question}".into(),
            ));
        }
        if self.timeouts.embedding_seconds == 0 {
            return Err(ConfigError::Invalid(
                "timeouts.embedding_seconds must be > 0".into(),
            ));
        }
        if self.embedding.model.trim().is_empty() {
            return Err(ConfigError::Invalid("embedding.model must not be empty".into()));
        }
        Ok(())
    }

    /// Resolve provider credentials through the vault.
    ///
    /// # Errors
    ///
    /// Returns an error if the vault backend fails.
    pub async fn resolve_secrets(&mut self, vault: &dyn VaultProvider) -> anyhow::Result<()> {
        for key in SECRET_KEYS {
            if let Some(val) = vault.get_secret(key).await?
                && !val.trim().is_empty()
                && let Some(slot) = self.secrets.slot_mut(key)
            {
                *slot = Some(Secret::new(val.trim()));
            }
        }
        Ok(())
    }

    /// Per-query settings seeded from `[llm]`.
    #[must_use]
    pub fn default_model_config(&self) -> ModelConfig {
        ModelConfig::new(self.llm.provider, self.llm.model.clone())
            .with_temperature(self.llm.temperature)
            .with_timeout_seconds(self.llm.timeout_seconds)
            .with_max_documents(self.llm.max_documents)
    }

    /// Built-in models followed by `[[models]]` entries; a config entry with the same name
    /// replaces the built-in one.
    #[must_use]
    pub fn catalog(&self) -> Vec<ModelInfo> {
        let mut catalog = builtin_catalog();
        for extra in &self.models {
            if let Some(existing) = catalog.iter_mut().find(|m| m.name == extra.name) {
                *existing = extra.clone();
            } else {
                catalog.push(extra.clone());
            }
        }
        catalog
    }

    #[must_use]
    pub fn embedding_url(&self) -> &str {
        self.embedding
            .base_url
            .as_deref()
            .unwrap_or(&self.llm.ollama_url)
    }

    #[must_use]
    pub fn splitter_config(&self) -> SplitterConfig {
        SplitterConfig {
            chunk_size: self.index.chunk_size,
            chunk_overlap: self.index.chunk_overlap,
            sentence_aware: true,
        }
    }

    #[must_use]
    pub fn max_file_size_bytes(&self) -> u64 {
        self.index.max_file_size_mb.saturating_mul(1024 * 1024)
    }
}
