//! Error types for the PDF Reader MCP Server

use thiserror::Error;

/// Result type alias for the PDF Reader MCP Server
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the PDF Reader MCP Server
#[derive(Error, Debug)]
pub enum Error {
    /// PDF file not found. Raised before any document is opened.
    #[error("File not found: {path}")]
    PdfNotFound { path: String },

    /// Invalid PDF file (exists but cannot be parsed)
    #[error("Invalid PDF file: {reason}")]
    InvalidPdf { reason: String },

    /// Explicit page number outside the document's page range.
    /// Only image extraction rejects pages; the text tools clamp instead.
    #[error("Page number {page} out of range (1-{total})")]
    PageOutOfRange { page: i32, total: u32 },

    /// PDFium error
    #[error("PDFium error: {reason}")]
    Pdfium { reason: String },

    /// OCR engine error. Recoverable: callers fall back to the text layer.
    #[error("OCR error: {reason}")]
    Ocr { reason: String },

    /// Path access denied (outside allowed resource directories)
    #[error("Path access denied: {path}")]
    PathAccessDenied { path: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Return a sanitized error message safe to send to clients.
    /// Engine internals are omitted; validation errors keep their details
    /// (path, requested page, valid bounds) since clients need them to
    /// correct the request. Full details should be logged via tracing
    /// before calling this.
    pub fn client_message(&self) -> String {
        match self {
            Error::PdfNotFound { path } => format!("File not found: {}", path),
            Error::InvalidPdf { .. } => "Invalid PDF file".to_string(),
            Error::PageOutOfRange { page, total } => {
                format!("Page number {} out of range (1-{})", page, total)
            }
            Error::Pdfium { .. } => "PDF processing error".to_string(),
            Error::Ocr { .. } => "OCR processing error".to_string(),
            Error::PathAccessDenied { .. } => "Access denied".to_string(),
            Error::Io(_) => "I/O error".to_string(),
            Error::Serialization(_) => "Serialization error".to_string(),
        }
    }
}
