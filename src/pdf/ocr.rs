//! OCR layer using Tesseract (via leptess)
//!
//! The engine is created once per request for the requested language and fed
//! rasterized page images. Every failure here is recoverable: callers fall
//! back to the page's text layer instead of propagating the error.

use crate::error::{Error, Result};
use leptess::LepTess;

/// Tesseract session for a single request.
pub struct OcrEngine {
    inner: LepTess,
}

impl OcrEngine {
    /// Initialize Tesseract for the given language code (e.g. "eng", "deu").
    pub fn new(language: &str) -> Result<Self> {
        let inner = LepTess::new(None, language).map_err(|e| Error::Ocr {
            reason: format!("failed to initialize Tesseract for language {:?}: {}", language, e),
        })?;
        Ok(Self { inner })
    }

    /// Recognize text in a PNG-encoded page image rendered at `dpi`.
    pub fn recognize(&mut self, png_data: &[u8], dpi: u32) -> Result<String> {
        self.inner
            .set_image_from_mem(png_data)
            .map_err(|e| Error::Ocr {
                reason: format!("failed to load page image: {}", e),
            })?;
        self.inner.set_source_resolution(dpi as i32);
        let text = self.inner.get_utf8_text().map_err(|e| Error::Ocr {
            reason: format!("failed to recognize text: {}", e),
        })?;
        Ok(text.trim().to_string())
    }
}
