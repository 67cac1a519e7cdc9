use std::ops::AddAssign;
use std::time::Duration;

use async_openai::{config::OpenAIConfig, Client};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::errors::{AppError, AppResult};

/// Token counts reported for one or more generation calls.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

impl AddAssign for TokenUsage {
    fn add_assign(&mut self, other: Self) {
        self.prompt_tokens += other.prompt_tokens;
        self.completion_tokens += other.completion_tokens;
        self.total_tokens += other.total_tokens;
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Generation {
    pub text: String,
    pub usage: TokenUsage,
}

impl Generation {
    pub fn new(text: &str, usage: TokenUsage) -> Self {
        Self {
            text: text.to_string(),
            usage,
        }
    }
}

/// Single-shot text completion.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, temperature: f32) -> AppResult<Generation>;
}

pub struct OpenAiGenerator {
    client: Client<OpenAIConfig>,
    model: String,
    timeout: Duration,
}

impl OpenAiGenerator {
    pub fn new(api_key: &SecretString, api_base: &str, model: &str, timeout: Duration) -> Self {
        let config = OpenAIConfig::new()
            .with_api_key(api_key.expose_secret())
            .with_api_base(api_base.trim_end_matches('/'));

        Self {
            client: Client::with_config(config),
            model: model.to_string(),
            timeout,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<TokenUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatCompletion {
    fn into_generation(self) -> AppResult<Generation> {
        let text = self
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AppError::UpstreamError("completion returned no content".to_string()))?;

        Ok(Generation {
            text,
            usage: self.usage.unwrap_or_default(),
        })
    }
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    async fn generate(&self, prompt: &str, temperature: f32) -> AppResult<Generation> {
        let request = json!({
            "model": self.model,
            "temperature": temperature,
            "messages": [
                { "role": "user", "content": prompt }
            ]
        });

        let completion: ChatCompletion =
            tokio::time::timeout(self.timeout, self.client.chat().create_byot(request))
                .await
                .map_err(|_| {
                    AppError::UpstreamError(format!(
                        "generation timed out after {}s",
                        self.timeout.as_secs()
                    ))
                })??;

        let generation = completion.into_generation()?;
        log::debug!(
            "Generation used {} tokens ({} prompt, {} completion)",
            generation.usage.total_tokens,
            generation.usage.prompt_tokens,
            generation.usage.completion_tokens
        );
        Ok(generation)
    }
}
