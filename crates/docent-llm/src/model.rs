//! Per-query model selection and the built-in model catalog.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::LlmError;

pub const MIN_TEMPERATURE: f32 = 0.0;
pub const MAX_TEMPERATURE: f32 = 1.0;
pub const MIN_TIMEOUT_SECONDS: u64 = 30;
pub const MAX_TIMEOUT_SECONDS: u64 = 300;
pub const MIN_DOCUMENTS: usize = 3;
pub const MAX_DOCUMENTS: usize = 10;

/// Generation backend selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Ollama runner on the local machine.
    Local,
    Google,
    Groq,
    Together,
}

impl ProviderKind {
    pub const ALL: [Self; 4] = [Self::Local, Self::Google, Self::Groq, Self::Together];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Google => "google",
            Self::Groq => "groq",
            Self::Together => "together",
        }
    }

    /// Secrets key holding this provider's API key, `None` for the local runner.
    #[must_use]
    pub fn credential_key(self) -> Option<&'static str> {
        match self {
            Self::Local => None,
            Self::Google => Some("GOOGLE_API_KEY"),
            Self::Groq => Some("GROQ_API_KEY"),
            Self::Together => Some("TOGETHER_API_KEY"),
        }
    }

    #[must_use]
    pub fn is_hosted(self) -> bool {
        self.credential_key().is_some()
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" | "ollama" => Ok(Self::Local),
            "google" | "gemini" => Ok(Self::Google),
            "groq" => Ok(Self::Groq),
            "together" => Ok(Self::Together),
            other => Err(LlmError::InvalidConfig(format!("unknown provider: {other}"))),
        }
    }
}

/// User-adjustable generation settings, created per query.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ModelConfig {
    pub provider: ProviderKind,
    pub model_name: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_max_documents")]
    pub max_documents: usize,
}

fn default_temperature() -> f32 {
    0.2
}

fn default_timeout_seconds() -> u64 {
    120
}

fn default_max_documents() -> usize {
    5
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Local,
            model_name: "mistral:7b".into(),
            temperature: default_temperature(),
            timeout_seconds: default_timeout_seconds(),
            max_documents: default_max_documents(),
        }
    }
}

impl ModelConfig {
    #[must_use]
    pub fn new(provider: ProviderKind, model_name: impl Into<String>) -> Self {
        Self {
            provider,
            model_name: model_name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    #[must_use]
    pub fn with_timeout_seconds(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_max_documents(mut self, max_documents: usize) -> Self {
        self.max_documents = max_documents;
        self
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Check every field against its allowed range.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::InvalidConfig`] naming the first offending field.
    pub fn validate(&self) -> Result<(), LlmError> {
        if self.model_name.trim().is_empty() {
            return Err(LlmError::InvalidConfig("model_name must not be empty".into()));
        }
        if !(MIN_TEMPERATURE..=MAX_TEMPERATURE).contains(&self.temperature) {
            return Err(LlmError::InvalidConfig(format!(
                "temperature {} outside [{MIN_TEMPERATURE}, {MAX_TEMPERATURE}]",
                self.temperature
            )));
        }
        if !(MIN_TIMEOUT_SECONDS..=MAX_TIMEOUT_SECONDS).contains(&self.timeout_seconds) {
            return Err(LlmError::InvalidConfig(format!(
                "timeout_seconds {} outside [{MIN_TIMEOUT_SECONDS}, {MAX_TIMEOUT_SECONDS}]",
                self.timeout_seconds
            )));
        }
        if !(MIN_DOCUMENTS..=MAX_DOCUMENTS).contains(&self.max_documents) {
            return Err(LlmError::InvalidConfig(format!(
                "max_documents {} outside [{MIN_DOCUMENTS}, {MAX_DOCUMENTS}]",
                self.max_documents
            )));
        }
        Ok(())
    }
}

/// Catalog entry describing a selectable model.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ModelInfo {
    pub name: String,
    pub provider: ProviderKind,
    pub description: String,
    #[serde(default)]
    pub cost: String,
    #[serde(default)]
    pub speed: String,
    #[serde(default)]
    pub quality: String,
    #[serde(default)]
    pub requirements: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

fn entry(
    name: &str,
    provider: ProviderKind,
    description: &str,
    [cost, speed, quality, requirements]: [&str; 4],
    active: bool,
) -> ModelInfo {
    ModelInfo {
        name: name.to_owned(),
        provider,
        description: description.to_owned(),
        cost: cost.to_owned(),
        speed: speed.to_owned(),
        quality: quality.to_owned(),
        requirements: requirements.to_owned(),
        active,
    }
}

/// Models known out of the box. Inactive entries are listed but not offered by default.
#[must_use]
pub fn builtin_catalog() -> Vec<ModelInfo> {
    vec![
        entry(
            "mistral:7b",
            ProviderKind::Local,
            "Local, strong for research questions, free, needs ~4GB RAM",
            ["free", "medium", "high", "Ollama running locally"],
            true,
        ),
        entry(
            "gemini-1.5-flash",
            ProviderKind::Google,
            "Google API, fast and accurate, free tier of 15 requests/min",
            ["free tier", "fast", "high", "GOOGLE_API_KEY"],
            true,
        ),
        entry(
            "gemini-1.5-pro",
            ProviderKind::Google,
            "Google API, best reasoning quality, slower and more expensive",
            ["paid", "slow", "very high", "GOOGLE_API_KEY"],
            true,
        ),
        entry(
            "llama3.2:3b",
            ProviderKind::Local,
            "Local, good balance of quality and speed, ~2GB RAM",
            ["free", "fast", "medium", "Ollama running locally"],
            false,
        ),
        entry(
            "llama3-8b-8192",
            ProviderKind::Groq,
            "Groq API, very fast inference",
            ["pay per use", "very fast", "high", "GROQ_API_KEY"],
            false,
        ),
        entry(
            "gemma-7b-it",
            ProviderKind::Groq,
            "Groq API, fast instruction-tuned Gemma",
            ["pay per use", "fast", "medium-high", "GROQ_API_KEY"],
            false,
        ),
        entry(
            "meta-llama/Llama-2-7b-chat-hf",
            ProviderKind::Together,
            "Together API, $25 free credits, high quality",
            ["free credits", "medium", "high", "TOGETHER_API_KEY"],
            false,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(ModelConfig::default().validate().is_ok());
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let cfg = ModelConfig::new(ProviderKind::Groq, "llama3-8b-8192")
            .with_temperature(1.0)
            .with_timeout_seconds(300)
            .with_max_documents(3);
        assert!(cfg.validate().is_ok());

        let cfg = cfg.with_temperature(0.0).with_timeout_seconds(30).with_max_documents(10);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn out_of_range_fields_rejected() {
        let base = ModelConfig::default();
        for bad in [
            base.clone().with_temperature(1.5),
            base.clone().with_temperature(-0.1),
            base.clone().with_timeout_seconds(29),
            base.clone().with_timeout_seconds(301),
            base.clone().with_max_documents(2),
            base.clone().with_max_documents(11),
            ModelConfig::new(ProviderKind::Local, "  "),
        ] {
            assert!(
                matches!(bad.validate(), Err(LlmError::InvalidConfig(_))),
                "expected rejection for {bad:?}"
            );
        }
    }

    #[test]
    fn nan_temperature_rejected() {
        let cfg = ModelConfig::default().with_temperature(f32::NAN);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn provider_parses_aliases() {
        assert_eq!("ollama".parse::<ProviderKind>().unwrap(), ProviderKind::Local);
        assert_eq!("Gemini".parse::<ProviderKind>().unwrap(), ProviderKind::Google);
        assert_eq!("groq".parse::<ProviderKind>().unwrap(), ProviderKind::Groq);
        assert!("claude".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn credential_keys() {
        assert_eq!(ProviderKind::Local.credential_key(), None);
        assert_eq!(ProviderKind::Google.credential_key(), Some("GOOGLE_API_KEY"));
        assert_eq!(ProviderKind::Together.credential_key(), Some("TOGETHER_API_KEY"));
        assert!(!ProviderKind::Local.is_hosted());
        assert!(ProviderKind::Groq.is_hosted());
    }

    #[test]
    fn provider_kind_serde_lowercase() {
        let cfg: ModelConfig =
            serde_json::from_str(r#"{"provider":"together","model_name":"m"}"#).unwrap();
        assert_eq!(cfg.provider, ProviderKind::Together);
        assert_eq!(cfg.timeout_seconds, 120);
        assert_eq!(cfg.max_documents, 5);
    }

    #[test]
    fn catalog_covers_every_provider() {
        let catalog = builtin_catalog();
        for kind in ProviderKind::ALL {
            assert!(catalog.iter().any(|m| m.provider == kind), "no model for {kind}");
        }
        assert!(catalog.iter().any(|m| m.name == "mistral:7b" && m.active));
    }
}
