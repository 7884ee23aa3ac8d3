//! Generation Requests and Content
//!
//! Request validation, prompt construction, and the generated-content record
//! shared across providers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ContentError, Result};

/// A request to generate book content for a topic
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// Main topic of the book
    pub topic: String,

    /// Target audience (e.g., "beginners", "professionals")
    #[serde(default)]
    pub audience: Option<String>,

    /// Writing style (academic/casual/storytelling)
    #[serde(default)]
    pub style: Option<String>,

    /// Purchase tier, which sets the target length
    #[serde(default)]
    pub tier: Option<String>,
}

impl GenerateRequest {
    /// Create a request for a topic with default audience and style
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            audience: None,
            style: None,
            tier: None,
        }
    }

    /// Validate the request, normalizing the topic
    ///
    /// The topic must be non-empty after trimming. Returns the trimmed topic.
    pub fn validate(&self) -> Result<&str> {
        let topic = self.topic.trim();
        if topic.is_empty() {
            return Err(ContentError::InvalidInput("topic is required".into()));
        }
        Ok(topic)
    }

    /// Audience, defaulting to a general readership
    pub fn audience(&self) -> &str {
        self.audience.as_deref().unwrap_or("beginners")
    }

    /// Style, defaulting to professional prose
    pub fn style(&self) -> &str {
        self.style.as_deref().unwrap_or("professional")
    }

    /// Target length for the selected tier
    pub fn word_target(&self) -> &'static str {
        match self.tier.as_deref().map(str::trim) {
            Some(t) if t.eq_ignore_ascii_case("basic") => "5,000-8,000 words",
            Some(t) if t.eq_ignore_ascii_case("business") => "20,000-30,000 words",
            _ => "10,000-15,000 words",
        }
    }
}

/// Prompt pair sent to a text provider
#[derive(Clone, Debug)]
pub struct BookPrompt {
    /// System instructions (author persona, formatting rules)
    pub system: String,

    /// The book brief itself
    pub user: String,
}

impl BookPrompt {
    /// Build the prompt pair for a validated request
    pub fn for_request(request: &GenerateRequest) -> Result<Self> {
        let topic = request.validate()?;
        let audience = request.audience();
        let style = request.style();
        let target = request.word_target();

        let system = format!(
            "You are an expert book author specializing in high-quality, \
             comprehensive guides readers find valuable enough to pay for. \
             Write in a {style} style for {audience}. Expected length: {target}. \
             Format the book in clean Markdown with a main title, chapter \
             headings, section headers, and short actionable paragraphs."
        );

        let user = format!(
            "Create a comprehensive book about \"{topic}\" for {audience}.\n\
             \n\
             Requirements:\n\
             - Title: an engaging, marketable title\n\
             - Structure: 6-8 chapters with clear progression\n\
             - Content: practical, actionable information\n\
             - Style: {style} writing style\n\
             - Length: aim for {target}\n\
             \n\
             Include a table of contents, step-by-step instructions, common \
             mistakes to avoid, and a next-steps section. Start writing the \
             complete book now:"
        );

        Ok(Self { system, user })
    }
}

/// Generated book content with provenance for diagnostics
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GeneratedContent {
    /// Topic the content was generated for
    pub topic: String,

    /// Audience the content targets
    pub audience: String,

    /// Writing style used
    pub style: String,

    /// Whitespace-delimited word count of the body
    pub word_count: usize,

    /// The generated markdown text
    pub body: String,

    /// Name of the provider that produced the body
    pub provider: String,

    /// Generation timestamp
    pub created_at: DateTime<Utc>,
}

impl GeneratedContent {
    /// Assemble a content record from a provider completion
    pub fn from_body(request: &GenerateRequest, body: String, provider: &str) -> Self {
        Self {
            topic: request.topic.trim().to_string(),
            audience: request.audience().to_string(),
            style: request.style().to_string(),
            word_count: count_words(&body),
            body,
            provider: provider.to_string(),
            created_at: Utc::now(),
        }
    }
}

/// Count whitespace-delimited words
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_topic_rejected() {
        let request = GenerateRequest::new("   ");
        assert!(matches!(
            request.validate(),
            Err(ContentError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_topic_trimmed() {
        let request = GenerateRequest::new("  Python Programming  ");
        assert_eq!(request.validate().unwrap(), "Python Programming");
    }

    #[test]
    fn test_prompt_mentions_topic_and_audience() {
        let mut request = GenerateRequest::new("Sourdough Baking");
        request.audience = Some("home bakers".into());

        let prompt = BookPrompt::for_request(&request).unwrap();
        assert!(prompt.user.contains("Sourdough Baking"));
        assert!(prompt.user.contains("home bakers"));
        assert!(prompt.system.contains("home bakers"));
    }

    #[test]
    fn test_word_target_follows_tier() {
        let mut request = GenerateRequest::new("Chess");
        assert_eq!(request.word_target(), "10,000-15,000 words");

        request.tier = Some("basic".into());
        assert_eq!(request.word_target(), "5,000-8,000 words");

        request.tier = Some("Business".into());
        assert_eq!(request.word_target(), "20,000-30,000 words");

        request.tier = Some("platinum".into());
        assert_eq!(request.word_target(), "10,000-15,000 words");

        let prompt = BookPrompt::for_request(&request).unwrap();
        assert!(prompt.user.contains("10,000-15,000 words"));
    }

    #[test]
    fn test_word_count() {
        assert_eq!(count_words("one two  three\nfour"), 4);
        assert_eq!(count_words(""), 0);
    }
}
