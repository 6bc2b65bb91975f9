//! Integration tests for the PDF Reader MCP Server

use pdf_reader_mcp::pdf::{
    extract_page_images, extract_text, extract_text_via_ocr, image_id, PageRange, TextExtraction,
};
use pdf_reader_mcp::Error;
use std::io::Write;
use std::path::PathBuf;

fn fixture_path(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    path
}

/// Open the fixture, skipping the test when no PDFium library is installed
/// on this host.
fn open_fixture(start: i32, end: Option<i32>) -> Option<TextExtraction> {
    match extract_text(&fixture_path("dummy.pdf"), start, end) {
        Ok(extraction) => Some(extraction),
        Err(Error::Pdfium { reason }) if reason.contains("initialize PDFium") => None,
        Err(other) => panic!("unexpected error: {other}"),
    }
}

// ============================================================================
// Failure paths (no engine required)
// ============================================================================

#[test]
fn test_missing_file_not_found_for_all_operations() {
    let path = PathBuf::from("/nonexistent/path/file.pdf");

    assert!(matches!(
        extract_text(&path, 1, None),
        Err(Error::PdfNotFound { .. })
    ));
    assert!(matches!(
        extract_text_via_ocr(&path, 1, None, "eng", 300),
        Err(Error::PdfNotFound { .. })
    ));
    assert!(matches!(
        extract_page_images(&path, 1),
        Err(Error::PdfNotFound { .. })
    ));
}

#[test]
fn test_missing_file_message_names_the_path() {
    let err = extract_text(&PathBuf::from("/nonexistent/report.pdf"), 1, None).unwrap_err();
    assert!(err.to_string().contains("/nonexistent/report.pdf"));
}

#[test]
fn test_non_pdf_file_rejected_before_engine() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"plain text, not a PDF").unwrap();

    assert!(matches!(
        extract_text(file.path(), 1, None),
        Err(Error::InvalidPdf { .. })
    ));
    assert!(matches!(
        extract_page_images(file.path(), 1),
        Err(Error::InvalidPdf { .. })
    ));
}

#[test]
fn test_corrupt_pdf_fails_to_open() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"%PDF-1.4\ngarbage that is not a document").unwrap();

    // Fails in the engine (or at engine init when PDFium is absent);
    // either way the request errors instead of hanging or panicking.
    assert!(extract_text(file.path(), 1, None).is_err());
}

// ============================================================================
// Range normalization over a real document
// ============================================================================

#[test]
fn test_extract_text_full_document() {
    let Some(extraction) = open_fixture(1, None) else {
        return;
    };
    assert_eq!(extraction.page_count, 1);
    assert_eq!(extraction.pages.len(), 1);
    assert_eq!(extraction.pages[0].page_number, 1);
    assert!(extraction.pages[0].text.contains("Hello PDF"));
}

#[test]
fn test_extract_text_clamps_out_of_bounds_range() {
    let Some(extraction) = open_fixture(-3, Some(999)) else {
        return;
    };
    assert_eq!(extraction.pages.len(), 1);
    assert_eq!(extraction.pages[0].page_number, 1);
}

#[test]
fn test_extract_text_corrects_reversed_range() {
    let Some(forward) = open_fixture(1, Some(1)) else {
        return;
    };
    let reversed = extract_text(&fixture_path("dummy.pdf"), 1, Some(-5)).unwrap();
    assert_eq!(forward.pages.len(), reversed.pages.len());
}

#[test]
fn test_extract_text_trims_page_text() {
    let Some(extraction) = open_fixture(1, None) else {
        return;
    };
    let text = &extraction.pages[0].text;
    assert_eq!(text, text.trim());
}

// ============================================================================
// OCR fallback policy
// ============================================================================

#[test]
fn test_ocr_unavailable_language_falls_back_to_text_layer() {
    if open_fixture(1, None).is_none() {
        return;
    }

    // No traineddata exists for this language, so OCR fails for every page;
    // the request must still succeed with the text-layer content.
    let extraction =
        extract_text_via_ocr(&fixture_path("dummy.pdf"), 1, None, "zz-bogus", 300).unwrap();
    assert_eq!(extraction.page_count, 1);
    assert_eq!(extraction.extracted_pages, vec![1]);
    assert!(extraction.text.contains("Hello PDF"));
}

#[test]
fn test_ocr_result_shape() {
    if open_fixture(1, None).is_none() {
        return;
    }

    let extraction =
        extract_text_via_ocr(&fixture_path("dummy.pdf"), -2, Some(50), "zz-bogus", 150).unwrap();
    // Clamped range, ascending extracted page list, blank line after each page
    assert_eq!(extraction.extracted_pages, vec![1]);
    assert!(extraction.text.ends_with("\n\n"));
}

// ============================================================================
// Image extraction
// ============================================================================

#[test]
fn test_extract_images_page_out_of_range() {
    if open_fixture(1, None).is_none() {
        return;
    }

    let err = extract_page_images(&fixture_path("dummy.pdf"), 50).unwrap_err();
    match &err {
        Error::PageOutOfRange { page, total } => {
            assert_eq!(*page, 50);
            assert_eq!(*total, 1);
        }
        other => panic!("expected PageOutOfRange, got {other:?}"),
    }
    // Message carries both the requested value and the valid bounds
    let msg = err.to_string();
    assert!(msg.contains("50"));
    assert!(msg.contains("1-1"));
}

#[test]
fn test_extract_images_zero_page_rejected() {
    if open_fixture(1, None).is_none() {
        return;
    }

    assert!(matches!(
        extract_page_images(&fixture_path("dummy.pdf"), 0),
        Err(Error::PageOutOfRange { .. })
    ));
}

#[test]
fn test_extract_images_page_without_images_is_empty() {
    if open_fixture(1, None).is_none() {
        return;
    }

    let images = extract_page_images(&fixture_path("dummy.pdf"), 1).unwrap();
    assert!(images.is_empty());
}

#[test]
fn test_image_id_synthesis() {
    assert_eq!(image_id(1, 0), "p1_img0");
    assert_eq!(image_id(7, 3), "p7_img3");
}

// ============================================================================
// Range normalization (pure)
// ============================================================================

#[test]
fn test_page_range_public_api() {
    let range = PageRange::normalize(5, Some(2), 10);
    assert_eq!((range.start(), range.end()), (2, 5));

    let range = PageRange::normalize(-3, Some(999), 10);
    assert_eq!((range.start(), range.end()), (1, 10));

    let range = PageRange::normalize(1, None, 7);
    assert_eq!((range.start(), range.end()), (1, 7));

    assert!(PageRange::normalize(1, None, 0).is_empty());
}
