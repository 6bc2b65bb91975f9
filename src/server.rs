//! MCP Server implementation using rmcp

use crate::pdf::{extract_page_images, extract_text, extract_text_via_ocr};
use anyhow::Result;
use rmcp::{
    handler::server::tool::ToolRouter, handler::server::wrapper::Parameters, model::*,
    schemars::JsonSchema, service::RequestContext, tool, tool_handler, tool_router, RoleServer,
    ServerHandler, ServiceExt,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Security configuration for the PDF Reader MCP Server
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    /// Directories PDF paths must live under. Empty = all paths allowed.
    pub resource_dirs: Vec<String>,
}

/// PDF Reader MCP Server
#[derive(Clone)]
pub struct PdfServer {
    tool_router: ToolRouter<Self>,
    config: Arc<ServerConfig>,
}

fn default_start_page() -> i32 {
    1
}

fn default_page_number() -> i32 {
    1
}

fn default_language() -> String {
    "eng".to_string()
}

fn default_dpi() -> u32 {
    300
}

// ============================================================================
// Request/Response types for extract_text
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ExtractTextParams {
    /// Path to the PDF file
    pub file_path: String,
    /// Start page, 1-based (default: 1). Out-of-bounds values are clamped.
    #[serde(default = "default_start_page")]
    pub start_page: i32,
    /// End page, 1-based inclusive (default: last page)
    #[serde(default)]
    pub end_page: Option<i32>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct PageTextContent {
    /// Page number (1-indexed)
    pub page_number: u32,
    /// Extracted page text
    pub text: String,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct ExtractTextResult {
    /// Total number of pages in the document
    pub page_count: u32,
    /// Per-page text for the requested range, ascending page order
    pub pages: Vec<PageTextContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ============================================================================
// Request/Response types for extract_via_ocr
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ExtractViaOcrParams {
    /// Path to the PDF file
    pub file_path: String,
    /// Start page, 1-based (default: 1). Out-of-bounds values are clamped.
    #[serde(default = "default_start_page")]
    pub start_page: i32,
    /// End page, 1-based inclusive (default: last page)
    #[serde(default)]
    pub end_page: Option<i32>,
    /// Tesseract language code (default: "eng")
    #[serde(default = "default_language")]
    pub language: String,
    /// Rasterization resolution in DPI (default: 300)
    #[serde(default = "default_dpi")]
    pub dpi: u32,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct ExtractViaOcrResult {
    /// Concatenated text of all extracted pages
    pub text: String,
    /// Total number of pages in the document
    pub page_count: u32,
    /// Page numbers that were extracted, ascending
    pub extracted_pages: Vec<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ============================================================================
// Request/Response types for extract_images
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ExtractImagesParams {
    /// Path to the PDF file
    pub file_path: String,
    /// Page number, 1-based (default: 1). Must be within the document.
    #[serde(default = "default_page_number")]
    pub page_number: i32,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct ImageContent {
    /// Image id, `p{page}_img{index}` with a 0-based index in page order
    pub image_id: String,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Encoded image format (always "png")
    pub format: String,
    /// Base64 encoded image data
    pub image_b64: String,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct ExtractImagesResult {
    /// Images found on the requested page, in page order
    pub images: Vec<ImageContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ============================================================================
// Tool implementations
// ============================================================================

#[tool_router]
impl PdfServer {
    pub fn new() -> Self {
        Self::with_config(ServerConfig::default())
    }

    /// Create a new PdfServer with specified resource directories
    pub fn with_resource_dirs(dirs: Vec<String>) -> Self {
        Self::with_config(ServerConfig {
            resource_dirs: dirs,
        })
    }

    /// Create a new PdfServer with full configuration
    pub fn with_config(config: ServerConfig) -> Self {
        Self {
            tool_router: Self::tool_router(),
            config: Arc::new(config),
        }
    }

    /// Extract the text layer from a PDF file
    #[tool(
        description = "Extract text content from a PDF file, one entry per page. start_page/end_page select a 1-based inclusive range; out-of-bounds or reversed ranges are corrected rather than rejected."
    )]
    async fn extract_text(&self, Parameters(params): Parameters<ExtractTextParams>) -> String {
        let result = self
            .process_extract_text(&params)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, file_path = %params.file_path, "extract_text failed");
                ExtractTextResult {
                    page_count: 0,
                    pages: vec![],
                    error: Some(e.client_message()),
                }
            });

        serde_json::to_string_pretty(&result).unwrap_or_default()
    }

    /// Extract text from a PDF file using OCR
    #[tool(
        description = "Extract text from a PDF file using OCR (Tesseract). Pages are rasterized at the given dpi and recognized with the given language; a page whose OCR fails falls back to its text layer. Returns the concatenated text plus the list of extracted page numbers."
    )]
    async fn extract_via_ocr(
        &self,
        Parameters(params): Parameters<ExtractViaOcrParams>,
    ) -> String {
        let result = self
            .process_extract_via_ocr(&params)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, file_path = %params.file_path, "extract_via_ocr failed");
                ExtractViaOcrResult {
                    text: String::new(),
                    page_count: 0,
                    extracted_pages: vec![],
                    error: Some(e.client_message()),
                }
            });

        serde_json::to_string_pretty(&result).unwrap_or_default()
    }

    /// Extract embedded images from one page of a PDF file
    #[tool(
        description = "Extract the embedded images of a specific page (1-based) in a PDF file. Returns base64-encoded PNG data with stable per-page image ids. An out-of-range page_number is an error naming the valid range."
    )]
    async fn extract_images(
        &self,
        Parameters(params): Parameters<ExtractImagesParams>,
    ) -> String {
        let result = self
            .process_extract_images(&params)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, file_path = %params.file_path, "extract_images failed");
                ExtractImagesResult {
                    images: vec![],
                    error: Some(e.client_message()),
                }
            });

        serde_json::to_string_pretty(&result).unwrap_or_default()
    }
}

impl PdfServer {
    /// Validate that a path is within allowed resource directories.
    /// If no resource_dirs are configured, all paths are allowed.
    fn validate_path_access(&self, path: &str) -> crate::error::Result<()> {
        if self.config.resource_dirs.is_empty() {
            return Ok(());
        }

        let canonical =
            std::fs::canonicalize(path).map_err(|_| crate::error::Error::PathAccessDenied {
                path: path.to_string(),
            })?;

        for dir in &self.config.resource_dirs {
            if let Ok(canonical_dir) = std::fs::canonicalize(dir) {
                if canonical.starts_with(&canonical_dir) {
                    return Ok(());
                }
            }
        }

        Err(crate::error::Error::PathAccessDenied {
            path: path.to_string(),
        })
    }

    async fn process_extract_text(
        &self,
        params: &ExtractTextParams,
    ) -> crate::error::Result<ExtractTextResult> {
        self.validate_path_access(&params.file_path)?;

        let file_path = params.file_path.clone();
        let start_page = params.start_page;
        let end_page = params.end_page;

        // Move CPU-heavy PDF work to the blocking thread pool
        let extraction = tokio::task::spawn_blocking(move || {
            extract_text(Path::new(&file_path), start_page, end_page)
        })
        .await
        .map_err(|e| crate::error::Error::Pdfium {
            reason: format!("Task join error: {}", e),
        })??;

        Ok(ExtractTextResult {
            page_count: extraction.page_count,
            pages: extraction
                .pages
                .into_iter()
                .map(|p| PageTextContent {
                    page_number: p.page_number,
                    text: p.text,
                })
                .collect(),
            error: None,
        })
    }

    async fn process_extract_via_ocr(
        &self,
        params: &ExtractViaOcrParams,
    ) -> crate::error::Result<ExtractViaOcrResult> {
        self.validate_path_access(&params.file_path)?;

        let file_path = params.file_path.clone();
        let start_page = params.start_page;
        let end_page = params.end_page;
        let language = params.language.clone();
        let dpi = params.dpi;

        let extraction = tokio::task::spawn_blocking(move || {
            extract_text_via_ocr(Path::new(&file_path), start_page, end_page, &language, dpi)
        })
        .await
        .map_err(|e| crate::error::Error::Pdfium {
            reason: format!("Task join error: {}", e),
        })??;

        Ok(ExtractViaOcrResult {
            text: extraction.text,
            page_count: extraction.page_count,
            extracted_pages: extraction.extracted_pages,
            error: None,
        })
    }

    async fn process_extract_images(
        &self,
        params: &ExtractImagesParams,
    ) -> crate::error::Result<ExtractImagesResult> {
        self.validate_path_access(&params.file_path)?;

        let file_path = params.file_path.clone();
        let page_number = params.page_number;

        let images = tokio::task::spawn_blocking(move || {
            extract_page_images(Path::new(&file_path), page_number)
        })
        .await
        .map_err(|e| crate::error::Error::Pdfium {
            reason: format!("Task join error: {}", e),
        })??;

        Ok(ExtractImagesResult {
            images: images
                .into_iter()
                .map(|img| ImageContent {
                    image_id: img.image_id,
                    width: img.width,
                    height: img.height,
                    format: img.format,
                    image_b64: img.image_b64,
                })
                .collect(),
            error: None,
        })
    }
}

impl Default for PdfServer {
    fn default() -> Self {
        Self::new()
    }
}

#[tool_handler]
impl ServerHandler for PdfServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "PDF Reader MCP Server provides tools for reading PDFs: extract_text (text \
                 layer per page), extract_via_ocr (OCR with per-page text-layer fallback), \
                 and extract_images (embedded images of one page, base64 PNG)."
                    .into(),
            ),
        }
    }
}

/// Run the MCP server without resource directories
pub async fn run_server() -> Result<()> {
    run_server_with_config(ServerConfig::default()).await
}

/// Run the MCP server with specified resource directories
pub async fn run_server_with_dirs(resource_dirs: Vec<String>) -> Result<()> {
    run_server_with_config(ServerConfig { resource_dirs }).await
}

/// Run the MCP server with full configuration
pub async fn run_server_with_config(config: ServerConfig) -> Result<()> {
    let server = PdfServer::with_config(config);

    tracing::info!("PDF Reader MCP Server ready, waiting for connections...");

    let service = server.serve(rmcp::transport::io::stdio()).await?;
    service.waiting().await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_extract_text_params_defaults() {
        let json = r#"{"file_path": "/test.pdf"}"#;
        let params: ExtractTextParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.start_page, 1);
        assert_eq!(params.end_page, None);
    }

    #[test]
    fn test_extract_via_ocr_params_defaults() {
        let json = r#"{"file_path": "/test.pdf"}"#;
        let params: ExtractViaOcrParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.start_page, 1);
        assert_eq!(params.end_page, None);
        assert_eq!(params.language, "eng");
        assert_eq!(params.dpi, 300);
    }

    #[test]
    fn test_extract_images_params_defaults() {
        let json = r#"{"file_path": "/test.pdf"}"#;
        let params: ExtractImagesParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.page_number, 1);
    }

    #[test]
    fn test_negative_range_params_accepted() {
        // Range bounds are clamped later, never rejected at the schema level
        let json = r#"{"file_path": "/test.pdf", "start_page": -3, "end_page": 999}"#;
        let params: ExtractTextParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.start_page, -3);
        assert_eq!(params.end_page, Some(999));
    }

    #[tokio::test]
    async fn test_missing_file_reports_not_found() {
        let server = PdfServer::new();
        let params = ExtractTextParams {
            file_path: "/nonexistent/file.pdf".to_string(),
            start_page: 1,
            end_page: None,
        };
        let result = server.process_extract_text(&params).await;
        assert!(matches!(
            result,
            Err(crate::error::Error::PdfNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_file_error_folded_into_response() {
        let server = PdfServer::new();
        let response = server
            .extract_text(Parameters(ExtractTextParams {
                file_path: "/nonexistent/file.pdf".to_string(),
                start_page: 1,
                end_page: None,
            }))
            .await;
        let value: serde_json::Value = serde_json::from_str(&response).unwrap();
        assert_eq!(value["page_count"], 0);
        assert!(value["error"]
            .as_str()
            .unwrap()
            .contains("/nonexistent/file.pdf"));
    }

    #[tokio::test]
    async fn test_path_outside_resource_dirs_denied() {
        let dir = tempfile::tempdir().unwrap();
        let server = PdfServer::with_config(ServerConfig {
            resource_dirs: vec![dir.path().to_string_lossy().to_string()],
        });
        let params = ExtractImagesParams {
            file_path: "/etc/hosts".to_string(),
            page_number: 1,
        };
        let result = server.process_extract_images(&params).await;
        assert!(matches!(
            result,
            Err(crate::error::Error::PathAccessDenied { .. })
        ));
    }

    #[test]
    fn test_path_inside_resource_dirs_allowed() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("doc.pdf");
        std::fs::write(&file, b"%PDF-1.4").unwrap();

        let server = PdfServer::with_config(ServerConfig {
            resource_dirs: vec![dir.path().to_string_lossy().to_string()],
        });
        assert!(server
            .validate_path_access(&file.to_string_lossy())
            .is_ok());
    }

    #[test]
    fn test_no_resource_dirs_allows_all_paths() {
        let server = PdfServer::new();
        assert!(server.validate_path_access("/anywhere/at/all.pdf").is_ok());
    }
}
