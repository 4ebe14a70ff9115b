use crate::config::QueryConfig;
use crate::error::QueryError;

/// Length bounds and the optional interrogative-word rule for incoming questions.
#[derive(Debug, Clone)]
pub struct QuestionPolicy {
    pub min_chars: usize,
    pub max_chars: usize,
    pub require_question_word: bool,
    pub question_words: Vec<String>,
}

impl Default for QuestionPolicy {
    fn default() -> Self {
        Self::from(&QueryConfig::default())
    }
}

impl From<&QueryConfig> for QuestionPolicy {
    fn from(cfg: &QueryConfig) -> Self {
        Self {
            min_chars: cfg.min_question_chars,
            max_chars: cfg.max_question_chars,
            require_question_word: cfg.require_question_word,
            question_words: cfg.question_words.iter().map(|w| w.to_lowercase()).collect(),
        }
    }
}

impl QuestionPolicy {
    /// Return the trimmed question if it passes every rule.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidQuestion`] with a user-facing reason.
    pub fn validate<'a>(&self, question: &'a str) -> Result<&'a str, QueryError> {
        let trimmed = question.trim();
        if trimmed.is_empty() {
            return Err(QueryError::InvalidQuestion("the question is empty".into()));
        }
        let len = trimmed.chars().count();
        if len < self.min_chars {
            return Err(QueryError::InvalidQuestion(format!(
                "the question must have at least {} characters",
                self.min_chars
            )));
        }
        if len > self.max_chars {
            return Err(QueryError::InvalidQuestion(format!(
                "the question is too long ({len} characters, maximum {})",
                self.max_chars
            )));
        }
        if self.require_question_word {
            let lower = trimmed.to_lowercase();
            if !self.question_words.iter().any(|w| lower.contains(w.as_str())) {
                return Err(QueryError::InvalidQuestion(
                    "ask a real question (use qué, cómo, cuál, what, how, ...)".into(),
                ));
            }
        }
        Ok(trimmed)
    }
}
