//! PDF processing layer
//!
//! This module provides PDF processing functionality using PDFium and
//! Tesseract.

mod ocr;
mod range;
mod reader;

pub use ocr::OcrEngine;
pub use range::PageRange;
pub use reader::{
    extract_page_images, extract_text, extract_text_via_ocr, image_id, OcrExtraction, PageImage,
    PageText, TextExtraction,
};
