//! Test-only mock generation backend.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::LlmError;
use crate::model::ModelConfig;
use crate::provider::LlmProvider;

/// Scripted outcome for one `generate` call.
#[derive(Debug, Clone)]
pub enum MockReply {
    Text(String),
    RateLimited(Option<Duration>),
    Unauthorized,
    Unavailable,
    Fail(String),
    /// Never resolves.
    Hang,
}

#[derive(Debug, Clone)]
pub struct MockProvider {
    replies: Arc<Mutex<Vec<MockReply>>>,
    prompts: Arc<Mutex<Vec<String>>>,
    pub default_response: String,
    /// Milliseconds to sleep before answering.
    pub delay_ms: u64,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self {
            replies: Arc::new(Mutex::new(Vec::new())),
            prompts: Arc::new(Mutex::new(Vec::new())),
            default_response: "mock response".into(),
            delay_ms: 0,
        }
    }
}

impl MockProvider {
    #[must_use]
    pub fn with_replies(replies: Vec<MockReply>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies)),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn answering(text: &str) -> Self {
        Self {
            default_response: text.to_owned(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_delay(mut self, ms: u64) -> Self {
        self.delay_ms = ms;
        self
    }

    /// Prompts received so far, in call order.
    #[must_use]
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    #[must_use]
    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

impl LlmProvider for MockProvider {
    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, prompt: &str, _config: &ModelConfig) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_owned());
        if self.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
        }
        let reply = {
            let mut replies = self.replies.lock().unwrap();
            if replies.is_empty() {
                MockReply::Text(self.default_response.clone())
            } else {
                replies.remove(0)
            }
        };
        match reply {
            MockReply::Text(text) => Ok(text),
            MockReply::RateLimited(retry_after) => Err(LlmError::RateLimited {
                provider: "mock".into(),
                retry_after,
            }),
            MockReply::Unauthorized => Err(LlmError::Authentication {
                provider: "mock".into(),
            }),
            MockReply::Unavailable => Err(LlmError::Unavailable {
                provider: "mock".into(),
                reason: "mock runner offline".into(),
            }),
            MockReply::Fail(message) => Err(LlmError::Generation {
                provider: "mock".into(),
                message,
            }),
            MockReply::Hang => std::future::pending().await,
        }
    }
}
