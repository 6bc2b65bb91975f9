//! PDF Reader MCP Server Library
//!
//! This crate provides MCP tools for reading PDFs:
//! - `extract_text`: Extract the text layer, one entry per page
//! - `extract_via_ocr`: Extract text via OCR with per-page text-layer fallback
//! - `extract_images`: Extract the embedded images of a single page

pub mod error;
pub mod pdf;
pub mod server;

pub use error::{Error, Result};
pub use server::{
    run_server, run_server_with_config, run_server_with_dirs, PdfServer, ServerConfig,
};
