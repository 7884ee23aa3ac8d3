//! OpenAI-Compatible Chat Provider
//!
//! Implementation of `TextProvider` against any OpenAI-compatible
//! `/chat/completions` endpoint. The primary and secondary providers are two
//! instances of this client pointed at different keys, hosts, or models.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use wizbook_core::{
    content::BookPrompt,
    error::{ContentError, Result},
    provider::TextProvider,
};

/// Chat provider configuration
#[derive(Clone, Debug)]
pub struct ChatProviderConfig {
    /// API key sent as a bearer token
    pub api_key: String,

    /// Base URL of the API, without the endpoint path
    pub base_url: String,

    /// Model identifier
    pub model: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ChatProviderConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.openai.com/v1".into(),
            model: "gpt-4o-mini".into(),
            timeout_secs: 30,
        }
    }
}

impl ChatProviderConfig {
    /// Primary provider config from `LLM_*` environment variables
    ///
    /// Returns `None` when no key is configured.
    pub fn primary_from_env() -> Option<Self> {
        Self::from_env_prefixed("LLM")
    }

    /// Secondary provider config from `LLM_SECONDARY_*` environment variables
    pub fn secondary_from_env() -> Option<Self> {
        Self::from_env_prefixed("LLM_SECONDARY")
    }

    fn from_env_prefixed(prefix: &str) -> Option<Self> {
        let api_key = std::env::var(format!("{prefix}_API_KEY")).ok()?;
        if api_key.trim().is_empty() {
            return None;
        }

        let defaults = Self::default();
        let base_url =
            std::env::var(format!("{prefix}_BASE_URL")).unwrap_or(defaults.base_url);
        let model = std::env::var(format!("{prefix}_MODEL")).unwrap_or(defaults.model);
        let timeout_secs = std::env::var("LLM_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.timeout_secs);

        Some(Self {
            api_key,
            base_url,
            model,
            timeout_secs,
        })
    }
}

/// OpenAI-compatible chat completion provider
pub struct ChatProvider {
    client: reqwest::Client,
    config: ChatProviderConfig,
    name: String,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

impl ChatProvider {
    /// Create a provider from configuration
    pub fn from_config(config: ChatProviderConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ContentError::Config(e.to_string()))?;

        let name = format!("openai:{}", config.model);
        Ok(Self {
            client,
            config,
            name,
        })
    }

    /// Primary provider from the environment, if configured
    pub fn primary_from_env() -> Option<Self> {
        ChatProviderConfig::primary_from_env().and_then(|c| Self::from_config(c).ok())
    }

    /// Secondary provider from the environment, if configured
    pub fn secondary_from_env() -> Option<Self> {
        ChatProviderConfig::secondary_from_env().and_then(|c| Self::from_config(c).ok())
    }

    fn map_error(e: reqwest::Error) -> ContentError {
        if e.is_timeout() || e.is_connect() {
            ContentError::ProviderUnavailable(e.to_string())
        } else {
            ContentError::Provider(e.to_string())
        }
    }
}

#[async_trait]
impl TextProvider for ChatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, prompt: &BookPrompt) -> Result<String> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            temperature: 0.7,
            max_tokens: 4096,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(Self::map_error)?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(ContentError::RateLimited(status.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ContentError::Provider(format!("{status}: {body}")));
        }

        let parsed: ChatResponse = response.json().await.map_err(Self::map_error)?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(ContentError::Provider("empty completion".into()));
        }

        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ChatProviderConfig::default();
        assert_eq!(config.base_url, "https://api.openai.com/v1");
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_provider_name_includes_model() {
        let provider = ChatProvider::from_config(ChatProviderConfig {
            api_key: "sk-test".into(),
            model: "gpt-4o".into(),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(provider.name(), "openai:gpt-4o");
    }

    #[test]
    fn test_request_serialization() {
        let request = ChatRequest {
            model: "gpt-4o-mini",
            messages: vec![ChatMessage {
                role: "user",
                content: "hello",
            }],
            temperature: 0.7,
            max_tokens: 4096,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["messages"][0]["role"], "user");
    }
}
