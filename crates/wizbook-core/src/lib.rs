//! # wizbook-core
//!
//! Core book generation logic with provider-agnostic LLM abstraction and a
//! deterministic template fallback.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                       Generator                          │
//! │  ┌──────────────┐  ┌────────────────┐  ┌──────────────┐  │
//! │  │   Request    │  │  TextProvider  │  │   Template   │  │
//! │  │  Validation  │──│  chain (LLMs)  │──│   Fallback   │  │
//! │  └──────────────┘  └────────────────┘  └──────────────┘  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! The `TextProvider` trait enables swapping between remote LLM backends
//! without changing generation logic. Providers are tried in priority order
//! with bounded timeouts; the template writer guarantees that generation
//! never fails because an upstream is down.

pub mod content;
pub mod error;
pub mod provider;
pub mod template;

pub use content::{BookPrompt, GeneratedContent, GenerateRequest};
pub use error::{ContentError, Result};
pub use provider::{Generator, GeneratorConfig, TextProvider};
