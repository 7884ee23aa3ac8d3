//! Error Types

use thiserror::Error;

/// Result type alias for PDF rendering
pub type Result<T> = std::result::Result<T, PdfError>;

/// PDF rendering errors
#[derive(Error, Debug)]
pub enum PdfError {
    /// Document construction or serialization failed
    #[error("PDF error: {0}")]
    Document(#[from] lopdf::Error),

    /// Serialization to the output buffer failed
    #[error("PDF I/O error: {0}")]
    Io(#[from] std::io::Error),
}
