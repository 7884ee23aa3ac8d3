//! # wizbook-runtime
//!
//! Remote text providers for the wizbook system.
//!
//! ## Providers
//!
//! - **OpenAI-compatible chat**: any `/chat/completions` endpoint, used for
//!   both the primary and the optional secondary provider
//!
//! ## Usage
//!
//! ```rust,ignore
//! use wizbook_runtime::ChatProvider;
//!
//! let providers = ChatProvider::primary_from_env()
//!     .into_iter()
//!     .chain(ChatProvider::secondary_from_env())
//!     .map(|p| Arc::new(p) as Arc<dyn TextProvider>)
//!     .collect();
//! let generator = Generator::new(providers, GeneratorConfig::default());
//! ```

pub mod openai;

pub use openai::{ChatProvider, ChatProviderConfig};

// Re-export core types for convenience
pub use wizbook_core::{ContentError, GeneratedContent, GenerateRequest, Generator, Result, TextProvider};
