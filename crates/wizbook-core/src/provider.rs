//! Text Provider Strategy Pattern
//!
//! Defines a common interface for all text providers (remote LLM APIs, the
//! local template writer) so generation works against any backend without
//! code changes.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use wizbook_core::{Generator, GeneratorConfig};
//!
//! let generator = Generator::new(vec![primary, secondary], GeneratorConfig::default());
//! let content = generator.generate(&request).await?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::content::{count_words, BookPrompt, GeneratedContent, GenerateRequest};
use crate::error::Result;
use crate::template;

/// Strategy trait for text providers
///
/// Implement this trait to add support for new LLM backends. The generator
/// works exclusively through this interface.
#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Provider name, recorded on generated content for diagnostics
    fn name(&self) -> &str;

    /// Produce the full book text for a prompt
    async fn generate(&self, prompt: &BookPrompt) -> Result<String>;
}

/// Generator tuning knobs
#[derive(Clone, Debug)]
pub struct GeneratorConfig {
    /// Per-provider attempt timeout
    pub attempt_timeout: Duration,

    /// Minimum plausible completion length in words; shorter completions
    /// advance the chain instead of being returned
    pub min_words: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            attempt_timeout: Duration::from_secs(30),
            min_words: 120,
        }
    }
}

/// Provider chain with a guaranteed template fallback
///
/// Providers are tried in priority order; an error, a timeout, or an
/// implausibly short completion advances to the next candidate. When every
/// provider is exhausted the deterministic template writer produces the
/// content, so `generate` fails only on invalid input.
pub struct Generator {
    providers: Vec<Arc<dyn TextProvider>>,
    config: GeneratorConfig,
}

impl Generator {
    /// Create a generator over a prioritized provider list
    pub fn new(providers: Vec<Arc<dyn TextProvider>>, config: GeneratorConfig) -> Self {
        Self { providers, config }
    }

    /// Create a generator with no remote providers (template output only)
    pub fn template_only() -> Self {
        Self::new(Vec::new(), GeneratorConfig::default())
    }

    /// Names of the configured remote providers, in priority order
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Generate book content for a request
    ///
    /// Never fails due to provider unavailability; the only error case is
    /// request validation.
    pub async fn generate(&self, request: &GenerateRequest) -> Result<GeneratedContent> {
        let prompt = BookPrompt::for_request(request)?;

        for provider in &self.providers {
            let attempt = tokio::time::timeout(
                self.config.attempt_timeout,
                provider.generate(&prompt),
            );

            match attempt.await {
                Err(_) => {
                    tracing::warn!(
                        provider = provider.name(),
                        timeout_secs = self.config.attempt_timeout.as_secs(),
                        "provider attempt timed out, trying next"
                    );
                }
                Ok(Err(e)) => {
                    tracing::warn!(
                        provider = provider.name(),
                        error = %e,
                        "provider attempt failed, trying next"
                    );
                }
                Ok(Ok(body)) => {
                    let words = count_words(&body);
                    if words >= self.config.min_words {
                        tracing::info!(
                            provider = provider.name(),
                            words,
                            "generated content"
                        );
                        return Ok(GeneratedContent::from_body(request, body, provider.name()));
                    }
                    tracing::warn!(
                        provider = provider.name(),
                        words,
                        "completion too short, trying next"
                    );
                }
            }
        }

        let body = template::write_book(request);
        tracing::info!(topic = %request.topic.trim(), "generated content from template");
        Ok(GeneratedContent::from_body(
            request,
            body,
            template::PROVIDER_NAME,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ContentError;

    struct FixedProvider {
        name: &'static str,
        body: String,
    }

    #[async_trait]
    impl TextProvider for FixedProvider {
        fn name(&self) -> &str {
            self.name
        }

        async fn generate(&self, _prompt: &BookPrompt) -> Result<String> {
            Ok(self.body.clone())
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl TextProvider for FailingProvider {
        fn name(&self) -> &str {
            "failing"
        }

        async fn generate(&self, _prompt: &BookPrompt) -> Result<String> {
            Err(ContentError::ProviderUnavailable("connection refused".into()))
        }
    }

    struct SlowProvider;

    #[async_trait]
    impl TextProvider for SlowProvider {
        fn name(&self) -> &str {
            "slow"
        }

        async fn generate(&self, _prompt: &BookPrompt) -> Result<String> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("too late".into())
        }
    }

    fn long_body() -> String {
        "chapter ".repeat(200)
    }

    #[tokio::test]
    async fn test_empty_topic_fails_validation() {
        let generator = Generator::template_only();
        let result = generator.generate(&GenerateRequest::new("")).await;
        assert!(matches!(result, Err(ContentError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_template_fallback_always_produces_content() {
        let generator = Generator::template_only();
        let content = generator
            .generate(&GenerateRequest::new("Python Programming"))
            .await
            .unwrap();

        assert_eq!(content.provider, template::PROVIDER_NAME);
        assert!(content.word_count > 0);
        assert!(content.body.contains("Python Programming"));
    }

    #[tokio::test]
    async fn test_failing_provider_falls_through_to_template() {
        let generator = Generator::new(
            vec![Arc::new(FailingProvider)],
            GeneratorConfig::default(),
        );
        let content = generator
            .generate(&GenerateRequest::new("Beekeeping"))
            .await
            .unwrap();

        assert_eq!(content.provider, template::PROVIDER_NAME);
    }

    #[tokio::test]
    async fn test_first_healthy_provider_wins() {
        let generator = Generator::new(
            vec![
                Arc::new(FailingProvider),
                Arc::new(FixedProvider {
                    name: "secondary",
                    body: long_body(),
                }),
            ],
            GeneratorConfig::default(),
        );
        let content = generator
            .generate(&GenerateRequest::new("Beekeeping"))
            .await
            .unwrap();

        assert_eq!(content.provider, "secondary");
    }

    #[tokio::test]
    async fn test_short_completion_advances_chain() {
        let generator = Generator::new(
            vec![
                Arc::new(FixedProvider {
                    name: "thin",
                    body: "just a sentence".into(),
                }),
                Arc::new(FixedProvider {
                    name: "full",
                    body: long_body(),
                }),
            ],
            GeneratorConfig::default(),
        );
        let content = generator
            .generate(&GenerateRequest::new("Beekeeping"))
            .await
            .unwrap();

        assert_eq!(content.provider, "full");
    }

    #[tokio::test]
    async fn test_slow_provider_is_abandoned() {
        let config = GeneratorConfig {
            attempt_timeout: Duration::from_millis(50),
            ..Default::default()
        };
        let generator = Generator::new(vec![Arc::new(SlowProvider)], config);
        let content = generator
            .generate(&GenerateRequest::new("Beekeeping"))
            .await
            .unwrap();

        assert_eq!(content.provider, template::PROVIDER_NAME);
    }
}
