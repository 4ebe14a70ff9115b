use std::io::Write;

use docent_llm::ProviderKind;
use serial_test::serial;

use super::*;
use crate::vault::MockVaultProvider;

const ENV_KEYS: [&str; 8] = [
    "DOCENT_LLM_PROVIDER",
    "DOCENT_LLM_MODEL",
    "DOCENT_OLLAMA_URL",
    "DOCENT_EMBEDDING_MODEL",
    "DOCENT_INDEX_DIR",
    "DOCENT_DOCS_DIR",
    "DOCENT_QUERY_MAX_CHARS",
    "DOCENT_VAULT_BACKEND",
];

fn clear_env() {
    for key in ENV_KEYS {
        unsafe { std::env::remove_var(key) };
    }
}

fn write_config(body: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(body.as_bytes()).unwrap();
    file
}

#[test]
#[serial]
fn missing_file_yields_defaults() {
    clear_env();
    let config = Config::load(std::path::Path::new("/nonexistent/docent.toml")).unwrap();
    assert_eq!(config.llm.provider, ProviderKind::Local);
    assert_eq!(config.llm.model, "mistral:7b");
    assert_eq!(config.index.chunk_size, 1000);
    assert_eq!(config.index.chunk_overlap, 200);
    assert_eq!(config.query.max_question_chars, 500);
    assert_eq!(config.embedding.model, "all-minilm");
    assert!(config.retry.enabled);
    assert_eq!(config.vault.backend, VaultBackend::Env);
}

#[test]
#[serial]
fn parses_sections_from_toml() {
    clear_env();
    let file = write_config(
        r#"
[llm]
provider = "google"
model = "gemini-1.5-flash"
temperature = 0.0
timeout_seconds = 60

[index]
index_dir = "/var/lib/docent/index"
chunk_size = 500
chunk_overlap = 50

[query]
require_question_word = true

[retry]
backoff_ms = 250

[vault]
backend = "file"
path = "secrets.toml"

[[models]]
name = "qwen2:7b"
provider = "local"
description = "Custom local model"
"#,
    );

    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.llm.provider, ProviderKind::Google);
    assert_eq!(config.llm.timeout_seconds, 60);
    assert_eq!(config.index.chunk_size, 500);
    assert!(config.query.require_question_word);
    assert_eq!(config.retry.backoff_ms, 250);
    assert_eq!(config.vault.backend, VaultBackend::File);
    assert!(config.catalog().iter().any(|m| m.name == "qwen2:7b" && m.active));
}

#[test]
#[serial]
fn env_overrides_file_values() {
    clear_env();
    let file = write_config("[llm]\nprovider = \"groq\"\nmodel = \"llama3-8b-8192\"\n");
    unsafe {
        std::env::set_var("DOCENT_LLM_PROVIDER", "together");
        std::env::set_var("DOCENT_LLM_MODEL", "meta-llama/Llama-2-7b-chat-hf");
        std::env::set_var("DOCENT_OLLAMA_URL", "http://gpu-box:11434");
        std::env::set_var("DOCENT_INDEX_DIR", "/tmp/idx");
        std::env::set_var("DOCENT_QUERY_MAX_CHARS", "800");
        std::env::set_var("DOCENT_VAULT_BACKEND", "file");
    }

    let config = Config::load(file.path()).unwrap();
    clear_env();

    assert_eq!(config.llm.provider, ProviderKind::Together);
    assert_eq!(config.llm.model, "meta-llama/Llama-2-7b-chat-hf");
    assert_eq!(config.llm.ollama_url, "http://gpu-box:11434");
    assert_eq!(config.embedding_url(), "http://gpu-box:11434");
    assert_eq!(config.index.index_dir, std::path::PathBuf::from("/tmp/idx"));
    assert_eq!(config.query.max_question_chars, 800);
    assert_eq!(config.vault.backend, VaultBackend::File);
}

#[test]
#[serial]
fn invalid_env_provider_is_ignored() {
    clear_env();
    unsafe { std::env::set_var("DOCENT_LLM_PROVIDER", "claude") };
    let config = Config::load(std::path::Path::new("/nonexistent.toml")).unwrap();
    clear_env();
    assert_eq!(config.llm.provider, ProviderKind::Local);
}

#[test]
#[serial]
fn malformed_toml_is_parse_error() {
    clear_env();
    let file = write_config("[llm\nprovider = ");
    assert!(matches!(Config::load(file.path()), Err(ConfigError::Parse { .. })));
}

#[test]
#[serial]
fn out_of_range_defaults_rejected() {
    clear_env();
    let file = write_config("[llm]\ntimeout_seconds = 5\n");
    assert!(matches!(Config::load(file.path()), Err(ConfigError::Invalid(_))));
}

#[test]
fn overlap_must_be_smaller_than_chunk() {
    let mut config = Config::default();
    config.index.chunk_overlap = config.index.chunk_size;
    assert!(config.validate().is_err());
}

#[test]
fn prompt_template_needs_placeholders() {
    let mut config = Config::default();
    config.query.prompt_template = Some("Answer: {question}".into());
    assert!(config.validate().is_err());
    config.query.prompt_template = Some("{context}\n{question}".into());
    assert!(config.validate().is_ok());
}

#[test]
fn config_entry_replaces_builtin_model() {
    let mut config = Config::default();
    config.models.push(docent_llm::ModelInfo {
        name: "llama3.2:3b".into(),
        provider: ProviderKind::Local,
        description: "enabled locally".into(),
        cost: String::new(),
        speed: String::new(),
        quality: String::new(),
        requirements: String::new(),
        active: true,
    });
    let catalog = config.catalog();
    let entry = catalog.iter().find(|m| m.name == "llama3.2:3b").unwrap();
    assert!(entry.active);
    assert_eq!(
        catalog.iter().filter(|m| m.name == "llama3.2:3b").count(),
        1
    );
}

#[tokio::test]
async fn resolve_secrets_fills_known_keys_only() {
    let vault = MockVaultProvider::new()
        .with_secret("GOOGLE_API_KEY", " g-key ")
        .with_secret("GROQ_API_KEY", "")
        .with_secret("HUGGINGFACE_API_KEY", "hf")
        .with_secret("UNRELATED", "x");

    let mut config = Config::default();
    config.resolve_secrets(&vault).await.unwrap();

    assert_eq!(
        config
            .secrets
            .for_provider(ProviderKind::Google)
            .map(Secret::expose),
        Some("g-key")
    );
    assert!(config.secrets.for_provider(ProviderKind::Groq).is_none());
    assert!(config.secrets.for_provider(ProviderKind::Local).is_none());
    assert!(config.secrets.huggingface_api_key.is_some());
}

#[test]
fn default_model_config_mirrors_llm_section() {
    let mut config = Config::default();
    config.llm.provider = ProviderKind::Groq;
    config.llm.model = "gemma-7b-it".into();
    config.llm.max_documents = 7;
    let mc = config.default_model_config();
    assert_eq!(mc.provider, ProviderKind::Groq);
    assert_eq!(mc.model_name, "gemma-7b-it");
    assert_eq!(mc.max_documents, 7);
}

#[test]
#[serial]
fn shipped_default_config_matches_builtin_defaults() {
    clear_env();
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config/default.toml");
    let config = Config::load(&path).unwrap();
    let defaults = Config::default();
    assert_eq!(config.default_model_config(), defaults.default_model_config());
    assert_eq!(config.index.index_dir, defaults.index.index_dir);
    assert_eq!(config.llm.groq_base_url, defaults.llm.groq_base_url);
    assert_eq!(config.timeouts.embedding_seconds, 30);
    assert!(config.models.is_empty());
}
