use std::fmt;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::error::LlmError;
use crate::http::{check_status, require_key};
use crate::model::ModelConfig;
use crate::provider::LlmProvider;
use crate::retry::retry_after;

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const PROVIDER: &str = "google";

/// Google Generative Language API (`generateContent`).
#[derive(Clone)]
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl GeminiProvider {
    #[must_use]
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_base_url(api_key, GEMINI_BASE_URL.into())
    }

    #[must_use]
    pub fn with_base_url(api_key: Option<String>, mut base_url: String) -> Self {
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            client: crate::http::default_client(),
            api_key,
            base_url,
        }
    }

    #[must_use]
    pub fn has_credential(&self) -> bool {
        require_key(PROVIDER, self.api_key.as_deref()).is_ok()
    }
}

impl LlmProvider for GeminiProvider {
    async fn generate(&self, prompt: &str, config: &ModelConfig) -> Result<String, LlmError> {
        let key = require_key(PROVIDER, self.api_key.as_deref())?;

        let body = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: config.temperature,
            },
        };

        let response = self
            .client
            .post(format!(
                "{}/models/{}:generateContent",
                self.base_url, config.model_name
            ))
            .header("x-goog-api-key", key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::transport(PROVIDER, e))?;

        let status = response.status();
        let hint = retry_after(response.headers());
        let text = response
            .text()
            .await
            .map_err(|e| LlmError::transport(PROVIDER, e))?;

        // Invalid keys come back as 400 with a structured reason.
        if status == StatusCode::BAD_REQUEST && text.contains("API_KEY_INVALID") {
            tracing::warn!(provider = PROVIDER, "API key rejected");
            return Err(LlmError::Authentication {
                provider: PROVIDER.into(),
            });
        }
        check_status(PROVIDER, status, hint, &text)?;

        let resp: GenerateResponse = serde_json::from_str(&text)?;
        extract_text(resp)
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        PROVIDER
    }
}

fn extract_text(resp: GenerateResponse) -> Result<String, LlmError> {
    let Some(candidate) = resp.candidates.into_iter().next() else {
        let reason = resp
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .unwrap_or_else(|| "no candidates returned".into());
        return Err(LlmError::Generation {
            provider: PROVIDER.into(),
            message: format!("blocked: {reason}"),
        });
    };

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(LlmError::EmptyResponse {
            provider: PROVIDER.into(),
        });
    }
    Ok(text)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}
