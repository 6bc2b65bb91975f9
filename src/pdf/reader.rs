//! PDF document access built on PDFium
//!
//! Each extraction opens its own request-scoped document: the handle lives
//! inside [`with_document`] and is dropped on every exit path. Nothing is
//! shared or cached across requests.

use crate::error::{Error, Result};
use crate::pdf::ocr::OcrEngine;
use crate::pdf::range::PageRange;
use base64::Engine;
use pdfium_render::prelude::*;
use std::path::Path;

/// Text extracted from one page.
#[derive(Debug, Clone)]
pub struct PageText {
    /// Page number (1-indexed)
    pub page_number: u32,
    /// Page text with surrounding whitespace trimmed
    pub text: String,
}

/// Result of plain-text extraction over a page range.
#[derive(Debug, Clone)]
pub struct TextExtraction {
    /// Total number of pages in the document
    pub page_count: u32,
    /// Per-page text, ascending page order
    pub pages: Vec<PageText>,
}

/// Result of OCR extraction over a page range.
///
/// Unlike [`TextExtraction`] this carries a single concatenated string plus
/// the list of page numbers it covers. The two shapes differ on purpose; see
/// DESIGN.md.
#[derive(Debug, Clone)]
pub struct OcrExtraction {
    /// Concatenated page texts, each followed by a blank line
    pub text: String,
    /// Total number of pages in the document
    pub page_count: u32,
    /// Page numbers that were extracted, ascending
    pub extracted_pages: Vec<u32>,
}

/// One embedded image decoded from a page.
#[derive(Debug, Clone)]
pub struct PageImage {
    /// Synthesized id, `p{page}_img{index}` with a 0-based index
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

/// Get PDFium instance (creates new instance each time - PDFium is not thread-safe)
fn create_pdfium() -> Result<Pdfium> {
    let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| {
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(
                "/opt/pdfium/lib",
            ))
        })
        .or_else(|_| Pdfium::bind_to_system_library())
        .map_err(|e| Error::Pdfium {
            reason: format!("Failed to initialize PDFium: {}", e),
        })?;

    Ok(Pdfium::new(bindings))
}

/// Open the document at `path` and run `f` against it.
///
/// The path existence check happens before anything is read, and the `%PDF`
/// magic check before the engine is initialized, so a missing or obviously
/// non-PDF file never touches PDFium. The document is dropped when `f`
/// returns, on both the success and error paths.
fn with_document<T>(path: &Path, f: impl FnOnce(&PdfDocument) -> Result<T>) -> Result<T> {
    if !path.exists() {
        return Err(Error::PdfNotFound {
            path: path.display().to_string(),
        });
    }

    let data = std::fs::read(path)?;
    if data.len() < 4 || &data[0..4] != b"%PDF" {
        return Err(Error::InvalidPdf {
            reason: "Not a valid PDF file".to_string(),
        });
    }

    let pdfium = create_pdfium()?;
    let document = pdfium
        .load_pdf_from_byte_slice(&data, None)
        .map_err(|e| Error::Pdfium {
            reason: format!("{}", e),
        })?;

    f(&document)
}

/// Iterate a normalized page range in ascending order, calling `page_fn`
/// once per page and collecting its results in order.
///
/// Both text tools share this path so the range handling cannot drift
/// between them.
fn extract_range<T>(
    document: &PdfDocument,
    range: PageRange,
    mut page_fn: impl FnMut(&PdfPage, u32) -> Result<T>,
) -> Result<Vec<T>> {
    let pages = document.pages();
    let mut results = Vec::with_capacity(range.len());

    for page_number in range.iter() {
        let page = pages
            .get((page_number - 1) as u16)
            .map_err(|e| Error::Pdfium {
                reason: format!("Failed to get page {}: {}", page_number, e),
            })?;
        results.push(page_fn(&page, page_number)?);
    }

    Ok(results)
}

/// Text layer of one page, trimmed.
fn page_text_layer(page: &PdfPage) -> String {
    page.text()
        .map(|t| t.all())
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// Extract the text layer of every page in the (clamped) range.
pub fn extract_text(path: &Path, start_page: i32, end_page: Option<i32>) -> Result<TextExtraction> {
    with_document(path, |document| {
        let page_count = document.pages().len() as u32;
        let range = PageRange::normalize(start_page, end_page, page_count);

        let pages = extract_range(document, range, |page, page_number| {
            Ok(PageText {
                page_number,
                text: page_text_layer(page),
            })
        })?;

        Ok(TextExtraction { page_count, pages })
    })
}

/// Rasterize one page at `dpi` and run it through Tesseract.
fn recognize_page(page: &PdfPage, ocr: &mut OcrEngine, dpi: u32) -> Result<String> {
    let config = PdfRenderConfig::new().scale_page_by_factor(dpi as f32 / 72.0);
    let bitmap = page.render_with_config(&config).map_err(|e| Error::Pdfium {
        reason: format!("Failed to rasterize page: {}", e),
    })?;

    let mut png_bytes = Vec::new();
    bitmap
        .as_image()
        .write_to(
            &mut std::io::Cursor::new(&mut png_bytes),
            image::ImageFormat::Png,
        )
        .map_err(|e| Error::Ocr {
            reason: format!("Failed to encode page bitmap: {}", e),
        })?;

    ocr.recognize(&png_bytes, dpi)
}

/// Resolve one page's text from an OCR attempt, substituting the text layer
/// when the attempt failed.
///
/// Any per-page failure (rasterization, bitmap encoding, recognition) lands
/// here as an `Err` and is logged; the fallback is only evaluated when
/// needed.
fn ocr_text_or_fallback(
    attempt: Result<String>,
    page_number: u32,
    fallback: impl FnOnce() -> String,
) -> String {
    match attempt {
        Ok(recognized) => recognized,
        Err(e) => {
            tracing::warn!(page = page_number, error = %e, "OCR failed, falling back to text layer");
            fallback()
        }
    }
}

/// Extract text via OCR over the (clamped) range.
///
/// Each page is rendered at `dpi` and recognized with Tesseract. An OCR
/// failure on a page (engine init, rasterization, recognition) is logged as
/// a warning and that page's text layer is substituted; a failing page never
/// aborts the request.
pub fn extract_text_via_ocr(
    path: &Path,
    start_page: i32,
    end_page: Option<i32>,
    language: &str,
    dpi: u32,
) -> Result<OcrExtraction> {
    with_document(path, |document| {
        let page_count = document.pages().len() as u32;
        let range = PageRange::normalize(start_page, end_page, page_count);

        let mut engine = match OcrEngine::new(language) {
            Ok(engine) => Some(engine),
            Err(e) => {
                tracing::warn!(language, error = %e, "OCR engine unavailable, using text layer for all pages");
                None
            }
        };

        let mut text = String::new();
        extract_range(document, range, |page, page_number| {
            let page_text = match engine.as_mut() {
                Some(ocr) => {
                    ocr_text_or_fallback(recognize_page(page, ocr, dpi), page_number, || {
                        page_text_layer(page)
                    })
                }
                None => page_text_layer(page),
            };
            text.push_str(&page_text);
            text.push_str("\n\n");
            Ok(())
        })?;

        Ok(OcrExtraction {
            text,
            page_count,
            extracted_pages: range.iter().collect(),
        })
    })
}

/// Synthesize the stable id for an embedded image.
pub fn image_id(page_number: u32, index: usize) -> String {
    format!("p{}_img{}", page_number, index)
}

/// Extract the embedded images of a single page, in page order.
///
/// Unlike the range-based tools, an out-of-range `page_number` here is an
/// error carrying the requested value and the valid bounds.
pub fn extract_page_images(path: &Path, page_number: i32) -> Result<Vec<PageImage>> {
    with_document(path, |document| {
        let pages = document.pages();
        let page_count = pages.len() as u32;

        if page_number < 1 || page_number as u32 > page_count {
            return Err(Error::PageOutOfRange {
                page: page_number,
                total: page_count,
            });
        }

        let page = pages
            .get((page_number - 1) as u16)
            .map_err(|e| Error::Pdfium {
                reason: format!("Failed to get page {}: {}", page_number, e),
            })?;

        let mut images = Vec::new();
        for (object_index, object) in page.objects().iter().enumerate() {
            if let Some(image_object) = object.as_image_object() {
                // Images PDFium cannot decode are skipped; indices stay
                // contiguous over the decoded list.
                let dynamic_image = match image_object.get_processed_image(document) {
                    Ok(dynamic_image) => dynamic_image,
                    Err(e) => {
                        tracing::warn!(page = page_number, object_index, error = %e, "skipping undecodable image");
                        continue;
                    }
                };

                let mut png_bytes = Vec::new();
                if let Err(e) = dynamic_image.write_to(
                    &mut std::io::Cursor::new(&mut png_bytes),
                    image::ImageFormat::Png,
                ) {
                    tracing::warn!(page = page_number, object_index, error = %e, "skipping image that failed PNG encoding");
                    continue;
                }

                images.push(PageImage {
                    image_id: image_id(page_number as u32, images.len()),
                    width: dynamic_image.width(),
                    height: dynamic_image.height(),
                    format: "png".to_string(),
                    image_b64: base64::engine::general_purpose::STANDARD.encode(&png_bytes),
                });
            }
        }

        Ok(images)
    })
}
