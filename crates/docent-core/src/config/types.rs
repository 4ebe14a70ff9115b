use std::path::PathBuf;

use docent_llm::compatible::{GROQ_BASE_URL, TOGETHER_BASE_URL};
use docent_llm::gemini::GEMINI_BASE_URL;
use docent_llm::{ModelConfig, ModelInfo, ProviderKind};
use serde::{Deserialize, Serialize};

use crate::vault::Secret;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub query: QueryConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    #[serde(default)]
    pub vault: VaultConfig,
    /// Extra catalog entries appended to the built-in models.
    #[serde(default)]
    pub models: Vec<ModelInfo>,
    #[serde(skip)]
    pub secrets: ResolvedSecrets,
}

/// Default model selection plus backend endpoints.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmConfig {
    #[serde(default = "default_provider")]
    pub provider: ProviderKind,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_max_documents")]
    pub max_documents: usize,
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,
    #[serde(default = "default_google_base_url")]
    pub google_base_url: String,
    #[serde(default = "default_groq_base_url")]
    pub groq_base_url: String,
    #[serde(default = "default_together_base_url")]
    pub together_base_url: String,
}

fn default_provider() -> ProviderKind {
    ProviderKind::Local
}

fn default_model() -> String {
    ModelConfig::default().model_name
}

fn default_temperature() -> f32 {
    ModelConfig::default().temperature
}

fn default_timeout_seconds() -> u64 {
    ModelConfig::default().timeout_seconds
}

fn default_max_documents() -> usize {
    ModelConfig::default().max_documents
}

pub(crate) fn default_ollama_url() -> String {
    "http://localhost:11434".into()
}

fn default_google_base_url() -> String {
    GEMINI_BASE_URL.into()
}

fn default_groq_base_url() -> String {
    GROQ_BASE_URL.into()
}

fn default_together_base_url() -> String {
    TOGETHER_BASE_URL.into()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            temperature: default_temperature(),
            timeout_seconds: default_timeout_seconds(),
            max_documents: default_max_documents(),
            ollama_url: default_ollama_url(),
            google_base_url: default_google_base_url(),
            groq_base_url: default_groq_base_url(),
            together_base_url: default_together_base_url(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmbeddingConfig {
    /// Ollama endpoint serving embeddings; falls back to `llm.ollama_url`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default = "default_embedding_model")]
    pub model: String,
}

fn default_embedding_model() -> String {
    "all-minilm".into()
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            model: default_embedding_model(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IndexConfig {
    #[serde(default = "default_index_dir")]
    pub index_dir: PathBuf,
    #[serde(default = "default_docs_dir")]
    pub docs_dir: PathBuf,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: u64,
}

fn default_index_dir() -> PathBuf {
    PathBuf::from("data/index")
}

fn default_docs_dir() -> PathBuf {
    PathBuf::from("docs")
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    200
}

fn default_max_file_size_mb() -> u64 {
    50
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            index_dir: default_index_dir(),
            docs_dir: default_docs_dir(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            max_file_size_mb: default_max_file_size_mb(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueryConfig {
    #[serde(default = "default_min_question_chars")]
    pub min_question_chars: usize,
    #[serde(default = "default_max_question_chars")]
    pub max_question_chars: usize,
    #[serde(default)]
    pub require_question_word: bool,
    #[serde(default = "default_question_words")]
    pub question_words: Vec<String>,
    /// Replaces the built-in prompt; must contain `{context}` and `{question}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_template: Option<String>,
}

fn default_min_question_chars() -> usize {
    3
}

fn default_max_question_chars() -> usize {
    500
}

pub(crate) fn default_question_words() -> Vec<String> {
    [
        "qué", "cuál", "cómo", "dónde", "cuándo", "por qué", "quién", "explain", "describe",
        "what", "how", "where", "when", "why", "who",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            min_question_chars: default_min_question_chars(),
            max_question_chars: default_max_question_chars(),
            require_question_word: false,
            question_words: default_question_words(),
            prompt_template: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetryConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Wait before the single retry when the provider sends no `Retry-After`.
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

fn default_true() -> bool {
    true
}

fn default_backoff_ms() -> u64 {
    1000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backoff_ms: default_backoff_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TimeoutConfig {
    #[serde(default = "default_embedding_timeout")]
    pub embedding_seconds: u64,
}

fn default_embedding_timeout() -> u64 {
    30
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            embedding_seconds: default_embedding_timeout(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VaultBackend {
    #[default]
    Env,
    File,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VaultConfig {
    #[serde(default)]
    pub backend: VaultBackend,
    #[serde(default = "default_secrets_path")]
    pub path: PathBuf,
}

fn default_secrets_path() -> PathBuf {
    PathBuf::from(".streamlit/secrets.toml")
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            backend: VaultBackend::default(),
            path: default_secrets_path(),
        }
    }
}

/// Provider credentials resolved once through the vault.
#[derive(Debug, Clone, Default)]
pub struct ResolvedSecrets {
    pub google_api_key: Option<Secret>,
    pub groq_api_key: Option<Secret>,
    pub together_api_key: Option<Secret>,
    /// Accepted for compatibility with existing secrets files; no backend reads it.
    pub huggingface_api_key: Option<Secret>,
}

impl ResolvedSecrets {
    #[must_use]
    pub fn for_provider(&self, kind: ProviderKind) -> Option<&Secret> {
        match kind {
            ProviderKind::Local => None,
            ProviderKind::Google => self.google_api_key.as_ref(),
            ProviderKind::Groq => self.groq_api_key.as_ref(),
            ProviderKind::Together => self.together_api_key.as_ref(),
        }
    }

    pub(crate) fn slot_mut(&mut self, key: &str) -> Option<&mut Option<Secret>> {
        match key {
            "GOOGLE_API_KEY" => Some(&mut self.google_api_key),
            "GROQ_API_KEY" => Some(&mut self.groq_api_key),
            "TOGETHER_API_KEY" => Some(&mut self.together_api_key),
            "HUGGINGFACE_API_KEY" => Some(&mut self.huggingface_api_key),
            _ => None,
        }
    }
}

pub const SECRET_KEYS: [&str; 4] = [
    "GOOGLE_API_KEY",
    "GROQ_API_KEY",
    "HUGGINGFACE_API_KEY",
    "TOGETHER_API_KEY",
];
