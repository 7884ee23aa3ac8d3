//! # wizbook-pdf
//!
//! Watermarked PDF export of generated books.
//!
//! Text is laid out on A4 pages and written through an Identity-H composite
//! font as UTF-16BE, so accented Latin, CJK, and any other Unicode input
//! exports cleanly. Every page carries a diagonal preview watermark.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use wizbook_pdf::render_pdf;
//!
//! let bytes = render_pdf("The Complete Guide to Rust", &content.body)?;
//! // Serve with content-type application/pdf
//! ```

pub mod error;
pub mod layout;
pub mod render;

pub use error::{PdfError, Result};
pub use render::{render_pdf, title_from_markdown, WATERMARK};
