//! OCR: turn page images into raw text.
//!
//! The engine sits behind a trait so tests can substitute a stub and so the
//! Tesseract backend could be swapped without touching the pipeline. Only
//! one real implementation exists: [`TesseractEngine`], driving the
//! `tesseract` CLI through `rusty-tesseract`.
//!
//! Pages are processed sequentially and concatenated in document order —
//! the pipeline is a single synchronous path per request, and tesseract
//! itself saturates a core per invocation anyway.

use crate::error::ExtractError;
use crate::output::ExtractedText;
use image::DynamicImage;
use std::sync::Arc;
use tracing::{debug, warn};

/// A text-recognition backend.
pub trait OcrEngine: Send + Sync {
    /// Engine identifier for logs and `Debug` output.
    fn name(&self) -> &'static str;

    /// Recognise the text on one page image.
    fn recognize(&self, page: usize, image: &DynamicImage) -> Result<String, ExtractError>;
}

/// OCR backed by the locally installed `tesseract` binary.
pub struct TesseractEngine {
    language: String,
}

impl TesseractEngine {
    /// Create an engine for the given Tesseract language code(s),
    /// e.g. "eng" or "eng+hin".
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
        }
    }
}

impl OcrEngine for TesseractEngine {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    fn recognize(&self, page: usize, image: &DynamicImage) -> Result<String, ExtractError> {
        // rusty-tesseract shells out to the tesseract binary, which reads
        // its input from disk, so the page goes through a temp PNG. PNG is
        // lossless; JPEG artefacts on rendered text measurably hurt OCR.
        let tmp = tempfile::Builder::new()
            .prefix("doc2fields-page")
            .suffix(".png")
            .tempfile()
            .map_err(|e| ExtractError::Internal(format!("tempfile: {e}")))?;

        image
            .save_with_format(tmp.path(), image::ImageFormat::Png)
            .map_err(|e| ExtractError::OcrFailed {
                page,
                detail: format!("failed to stage page image: {e}"),
            })?;

        let ocr_image =
            rusty_tesseract::Image::from_path(tmp.path()).map_err(|e| ExtractError::OcrFailed {
                page,
                detail: format!("{e}"),
            })?;

        let mut args = rusty_tesseract::Args::default();
        args.lang = self.language.clone();

        rusty_tesseract::image_to_string(&ocr_image, &args).map_err(|e| ExtractError::OcrFailed {
            page,
            detail: format!("{e}"),
        })
    }
}

/// OCR every page in order and concatenate the results.
///
/// Runs on the blocking pool: tesseract invocations are CPU-bound
/// subprocesses. A page that yields no text is logged and skipped; an
/// engine error aborts the extraction (the pipeline has no retry path).
pub async fn extract_text(
    pages: Vec<DynamicImage>,
    engine: Arc<dyn OcrEngine>,
) -> Result<ExtractedText, ExtractError> {
    let page_count = pages.len();

    tokio::task::spawn_blocking(move || {
        let mut chunks: Vec<String> = Vec::with_capacity(page_count);

        for (idx, image) in pages.iter().enumerate() {
            let page = idx + 1;
            let text = engine.recognize(page, image)?;
            let trimmed = text.trim();

            if trimmed.is_empty() {
                warn!("Page {}: OCR produced no text", page);
                continue;
            }

            debug!("Page {}: OCR produced {} chars", page, trimmed.len());
            chunks.push(trimmed.to_string());
        }

        Ok(ExtractedText {
            text: chunks.join("\n"),
            pages: page_count,
        })
    })
    .await
    .map_err(|e| ExtractError::Internal(format!("OCR task panicked: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    /// Stub engine returning canned text per page.
    struct FixedEngine(Vec<&'static str>);

    impl OcrEngine for FixedEngine {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn recognize(&self, page: usize, _image: &DynamicImage) -> Result<String, ExtractError> {
            Ok(self.0[page - 1].to_string())
        }
    }

    fn blank_page() -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 255])))
    }

    #[tokio::test]
    async fn pages_concatenated_in_order() {
        let engine = Arc::new(FixedEngine(vec!["page one", "  page two  ", "page three"]));
        let text = extract_text(vec![blank_page(), blank_page(), blank_page()], engine)
            .await
            .unwrap();
        assert_eq!(text.text, "page one\npage two\npage three");
        assert_eq!(text.pages, 3);
    }

    #[tokio::test]
    async fn blank_pages_are_skipped_not_fatal() {
        let engine = Arc::new(FixedEngine(vec!["", "only page with text", "\n\t"]));
        let text = extract_text(vec![blank_page(), blank_page(), blank_page()], engine)
            .await
            .unwrap();
        assert_eq!(text.text, "only page with text");
        assert!(!text.is_empty());
    }

    #[tokio::test]
    async fn all_blank_pages_yield_empty_text() {
        let engine = Arc::new(FixedEngine(vec!["", ""]));
        let text = extract_text(vec![blank_page(), blank_page()], engine)
            .await
            .unwrap();
        assert!(text.is_empty());
        assert_eq!(text.pages, 2);
    }

    #[test]
    fn tesseract_engine_name() {
        assert_eq!(TesseractEngine::new("eng").name(), "tesseract");
    }
}
