use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::LlmError;
use crate::http::{check_status, require_key};
use crate::model::ModelConfig;
use crate::provider::LlmProvider;
use crate::retry::retry_after;

/// Client for any `/chat/completions` endpoint speaking the `OpenAI` wire format.
#[derive(Clone)]
pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    provider_name: String,
}

impl fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("provider_name", &self.provider_name)
            .finish()
    }
}

impl OpenAiProvider {
    #[must_use]
    pub fn new(provider_name: &str, api_key: Option<String>, mut base_url: String) -> Self {
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            client: crate::http::default_client(),
            api_key,
            base_url,
            provider_name: provider_name.to_owned(),
        }
    }

    #[must_use]
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn has_credential(&self) -> bool {
        require_key(&self.provider_name, self.api_key.as_deref()).is_ok()
    }

    async fn send_request(&self, prompt: &str, config: &ModelConfig) -> Result<String, LlmError> {
        let provider = self.provider_name.as_str();
        let key = require_key(provider, self.api_key.as_deref())?;

        let messages = [ApiMessage {
            role: "user",
            content: prompt,
        }];
        let body = ChatRequest {
            model: &config.model_name,
            messages: &messages,
            temperature: config.temperature,
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {key}"))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::transport(provider, e))?;

        let status = response.status();
        let hint = retry_after(response.headers());
        let text = response
            .text()
            .await
            .map_err(|e| LlmError::transport(provider, e))?;

        check_status(provider, status, hint, &text)?;

        let resp: ChatResponse = serde_json::from_str(&text)?;
        let content = resp
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(LlmError::EmptyResponse {
                provider: provider.to_owned(),
            });
        }
        Ok(content)
    }
}

impl LlmProvider for OpenAiProvider {
    async fn generate(&self, prompt: &str, config: &ModelConfig) -> Result<String, LlmError> {
        self.send_request(prompt, config).await
    }

    fn name(&self) -> &str {
        &self.provider_name
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ApiMessage<'a>],
    temperature: f32,
    stream: bool,
}

#[derive(Serialize)]
struct ApiMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::model::ProviderKind;

    fn config() -> ModelConfig {
        ModelConfig::new(ProviderKind::Groq, "llama3-8b-8192").with_temperature(0.4)
    }

    fn completion(content: &str) -> serde_json::Value {
        serde_json::json!({
            "id": "chatcmpl-1",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]
        })
    }

    #[test]
    fn debug_redacts_api_key() {
        let p = OpenAiProvider::new("groq", Some("gsk-secret".into()), "http://x/".into());
        let dbg = format!("{p:?}");
        assert!(!dbg.contains("gsk-secret"));
        assert!(dbg.contains("<redacted>"));
        assert_eq!(p.base_url(), "http://x");
    }

    #[test]
    fn request_serializes_temperature_and_single_user_message() {
        let messages = [ApiMessage {
            role: "user",
            content: "hola",
        }];
        let body = ChatRequest {
            model: "m",
            messages: &messages,
            temperature: 0.5,
            stream: false,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["temperature"], 0.5);
        assert_eq!(json["stream"], false);
    }

    #[tokio::test]
    async fn generate_returns_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer k"))
            .and(body_partial_json(serde_json::json!({"model": "llama3-8b-8192"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("Respuesta")))
            .expect(1)
            .mount(&server)
            .await;

        let p = OpenAiProvider::new("groq", Some("k".into()), server.uri());
        let answer = p.generate("pregunta", &config()).await.unwrap();
        assert_eq!(answer, "Respuesta");
    }

    #[tokio::test]
    async fn missing_key_fails_before_any_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("x")))
            .expect(0)
            .mount(&server)
            .await;

        let p = OpenAiProvider::new("together", None, server.uri());
        assert!(!p.has_credential());
        let err = p.generate("q", &config()).await.unwrap_err();
        assert!(matches!(err, LlmError::Authentication { ref provider } if provider == "together"));
    }

    #[tokio::test]
    async fn unauthorized_maps_to_authentication() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;

        let p = OpenAiProvider::new("groq", Some("bad".into()), server.uri());
        let err = p.generate("q", &config()).await.unwrap_err();
        assert!(matches!(err, LlmError::Authentication { .. }));
    }

    #[tokio::test]
    async fn rate_limit_carries_retry_after() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "2"))
            .mount(&server)
            .await;

        let p = OpenAiProvider::new("groq", Some("k".into()), server.uri());
        let err = p.generate("q", &config()).await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(err.retry_after(), Some(std::time::Duration::from_secs(2)));
    }

    #[tokio::test]
    async fn oversized_retry_after_still_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "1e30"))
            .mount(&server)
            .await;

        let p = OpenAiProvider::new("groq", Some("k".into()), server.uri());
        let err = p.generate("q", &config()).await.unwrap_err();
        assert!(matches!(err, LlmError::RateLimited { .. }));
        assert_eq!(err.retry_after(), None);
    }

    #[tokio::test]
    async fn empty_content_is_empty_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})))
            .mount(&server)
            .await;

        let p = OpenAiProvider::new("groq", Some("k".into()), server.uri());
        let err = p.generate("q", &config()).await.unwrap_err();
        assert!(matches!(err, LlmError::EmptyResponse { .. }));
    }

    #[tokio::test]
    async fn unreachable_host_is_unavailable() {
        let p = OpenAiProvider::new("groq", Some("k".into()), "http://127.0.0.1:1".into());
        let err = p.generate("q", &config()).await.unwrap_err();
        assert!(matches!(err, LlmError::Unavailable { .. }));
    }
}
