mod openai;
mod stage;
mod webhook;

use crate::config::{env_parse, env_string};
use crate::types::{JudgeStyle, PromptSlots, TriviaQuestion};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

pub use openai::OpenAiCollaborator;
pub use stage::{run_ai_stage, run_roast_stage, RoundArtifacts};
pub use webhook::CombineBackend;

/// Result type for collaborator calls
pub type AiResult<T> = Result<T, AiError>;

#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("API request failed: {0}")]
    ApiError(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Response parsing failed: {0}")]
    ParseError(String),
}

/// One player's drawing with the prompt it was drawn from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sketch {
    pub image: String,
    pub slots: Option<PromptSlots>,
}

impl Sketch {
    pub fn describe(&self) -> String {
        self.slots
            .as_ref()
            .map_or_else(|| "mystery doodle".to_string(), PromptSlots::describe)
    }
}

/// External generative service the host consults during a round
#[async_trait]
pub trait Collaborator: Send + Sync {
    /// Merge every sketch into one scene, returned as a data URL
    async fn combine(&self, sketches: &[Sketch]) -> AiResult<String>;

    /// Ask a multiple-choice question about the combined scene
    async fn trivia_for(&self, image: &str) -> AiResult<TriviaQuestion>;

    /// One-sentence verdict in the judge's voice
    async fn roast_for(&self, image: &str, judge: JudgeStyle, nouns: &[String])
        -> AiResult<String>;

    fn name(&self) -> &str;
}

#[derive(Debug, Clone)]
pub struct AiConfig {
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    /// Optional image-combining backend tried before OpenAI
    pub combine_url: Option<String>,
    /// Deadline for every individual collaborator call
    pub timeout: Duration,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_model: "gpt-4o-mini".to_string(),
            combine_url: None,
            timeout: Duration::from_secs(60),
        }
    }
}

impl AiConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            openai_api_key: env_string("OPENAI_API_KEY"),
            openai_model: env_string("OPENAI_MODEL").unwrap_or(defaults.openai_model),
            combine_url: env_string("PROMPTED_COMBINE_URL"),
            timeout: env_parse::<u64>("PROMPTED_AI_TIMEOUT")
                .filter(|s| *s > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        }
    }

    /// Build the collaborator the host will use
    pub fn build_collaborator(&self) -> AiResult<Arc<dyn Collaborator>> {
        let api_key = self.openai_api_key.clone().ok_or_else(|| {
            AiError::ConfigError("No AI collaborator configured. Set OPENAI_API_KEY".to_string())
        })?;

        let mut collaborator = OpenAiCollaborator::new(api_key, self.openai_model.clone());
        if let Some(url) = &self.combine_url {
            tracing::info!("Using combine backend at {}", url);
            collaborator = collaborator.with_combine_backend(CombineBackend::new(url.clone())?);
        }
        Ok(Arc::new(collaborator))
    }
}

/// Pull the first JSON object out of a model reply, tolerating code fences
pub(crate) fn parse_trivia(text: &str) -> AiResult<TriviaQuestion> {
    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct RawTrivia {
        question: String,
        options: Vec<String>,
        correct_index: usize,
    }

    let start = text
        .find('{')
        .ok_or_else(|| AiError::ParseError("No JSON object in trivia reply".to_string()))?;
    let end = text
        .rfind('}')
        .filter(|end| *end > start)
        .ok_or_else(|| AiError::ParseError("Unterminated JSON in trivia reply".to_string()))?;

    let raw: RawTrivia = serde_json::from_str(&text[start..=end])
        .map_err(|e| AiError::ParseError(e.to_string()))?;
    let options: [String; 4] = raw.options.try_into().map_err(|opts: Vec<String>| {
        AiError::ParseError(format!("Expected 4 options, got {}", opts.len()))
    })?;

    let trivia = TriviaQuestion {
        question: raw.question.trim().to_string(),
        options,
        correct_index: raw.correct_index,
    };
    if !trivia.is_usable() {
        return Err(AiError::ParseError("Trivia question is incomplete".to_string()));
    }
    Ok(trivia)
}

/// First `<svg ...>...</svg>` element in a model reply
pub(crate) fn extract_svg(text: &str) -> Option<&str> {
    let start = text.find("<svg")?;
    let close = "</svg>";
    let end = text[start..].find(close)? + start + close.len();
    Some(&text[start..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_default_config() {
        let config = AiConfig::default();
        assert_eq!(config.openai_model, "gpt-4o-mini");
        assert_eq!(config.timeout, Duration::from_secs(60));
    }

    #[test]
    #[serial]
    fn test_from_env() {
        std::env::set_var("OPENAI_API_KEY", "  sk-test  ");
        std::env::set_var("OPENAI_MODEL", "");
        std::env::set_var("PROMPTED_AI_TIMEOUT", "5");

        let config = AiConfig::from_env();
        assert_eq!(config.openai_api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.openai_model, "gpt-4o-mini");
        assert_eq!(config.timeout, Duration::from_secs(5));

        for key in ["OPENAI_API_KEY", "OPENAI_MODEL", "PROMPTED_AI_TIMEOUT"] {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn test_build_without_key_fails() {
        let result = AiConfig::default().build_collaborator();
        assert!(matches!(result, Err(AiError::ConfigError(_))));
    }

    #[test]
    fn test_parse_trivia_with_code_fence() {
        let reply = "```json\n{\"question\": \"What is the frog holding?\", \
            \"options\": [\"A toaster\", \"A cactus\", \"Nothing\", \"A ghost\"], \
            \"correctIndex\": 1}\n```";
        let trivia = parse_trivia(reply).unwrap();
        assert_eq!(trivia.options[1], "A cactus");
        assert_eq!(trivia.correct_index, 1);
    }

    #[test]
    fn test_parse_trivia_rejects_bad_shapes() {
        assert!(parse_trivia("no json here").is_err());
        assert!(parse_trivia(r#"{"question":"Q","options":["a","b"],"correctIndex":0}"#).is_err());
        assert!(
            parse_trivia(r#"{"question":"Q","options":["a","b","c","d"],"correctIndex":4}"#)
                .is_err()
        );
        assert!(
            parse_trivia(r#"{"question":" ","options":["a","b","c","d"],"correctIndex":0}"#)
                .is_err()
        );
    }

    #[test]
    fn test_extract_svg() {
        let reply = "Here you go:\n<svg viewBox=\"0 0 10 10\"><rect/></svg>\nEnjoy!";
        assert_eq!(
            extract_svg(reply),
            Some("<svg viewBox=\"0 0 10 10\"><rect/></svg>")
        );
        assert_eq!(extract_svg("<svg><rect/>"), None);
        assert_eq!(extract_svg("nothing"), None);
    }

    #[test]
    fn test_sketch_describe() {
        let sketch = Sketch {
            image: String::new(),
            slots: Some(PromptSlots {
                emotion: "Smug".to_string(),
                style: "Neon".to_string(),
                noun: "Frog".to_string(),
            }),
        };
        assert_eq!(sketch.describe(), "Smug Neon Frog");
    }
}
