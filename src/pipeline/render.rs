//! Page acquisition: rasterise PDF pages via pdfium, or decode an uploaded
//! image directly.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async
//! contexts. `tokio::task::spawn_blocking` moves the work onto the blocking
//! thread pool so Tokio worker threads never stall during CPU-heavy
//! rendering. Image decoding goes through the same path for symmetry — a
//! 50 MP JPEG decode is not free either.

use crate::config::ExtractionConfig;
use crate::error::ExtractError;
use crate::output::DocumentMetadata;
use crate::pipeline::input::{InputFormat, ResolvedInput};
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// Produce the page images to OCR, in document order.
///
/// PDFs are rasterised page by page; PNG/JPEG uploads decode to a single
/// "page".
pub async fn load_pages(
    input: &ResolvedInput,
    config: &ExtractionConfig,
) -> Result<Vec<DynamicImage>, ExtractError> {
    match input.format {
        InputFormat::Pdf => {
            let path = input.path().to_path_buf();
            let max_pixels = config.max_rendered_pixels;
            let password = config.password.clone();

            tokio::task::spawn_blocking(move || {
                render_pdf_blocking(&path, max_pixels, password.as_deref())
            })
            .await
            .map_err(|e| ExtractError::Internal(format!("Render task panicked: {}", e)))?
        }
        InputFormat::Png | InputFormat::Jpeg => {
            let path = input.path().to_path_buf();

            tokio::task::spawn_blocking(move || {
                let img = image::open(&path).map_err(|e| ExtractError::InvalidImage {
                    path: path.clone(),
                    detail: e.to_string(),
                })?;
                debug!("Decoded image {} → {}x{} px", path.display(), img.width(), img.height());
                Ok(vec![img])
            })
            .await
            .map_err(|e| ExtractError::Internal(format!("Decode task panicked: {}", e)))?
        }
    }
}

/// Blocking implementation of PDF page rendering.
fn render_pdf_blocking(
    pdf_path: &Path,
    max_pixels: u32,
    password: Option<&str>,
) -> Result<Vec<DynamicImage>, ExtractError> {
    let pdfium = Pdfium::default();

    let document = pdfium
        .load_pdf_from_file(pdf_path, password)
        .map_err(|e| map_load_error(e, pdf_path, password))?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    info!("PDF loaded: {} pages", total_pages);

    let render_config = PdfRenderConfig::new()
        .set_target_width(max_pixels as i32)
        .set_maximum_height(max_pixels as i32);

    let mut results = Vec::with_capacity(total_pages);

    for idx in 0..total_pages {
        let page = pages
            .get(idx as u16)
            .map_err(|e| ExtractError::RasterisationFailed {
                page: idx + 1,
                detail: format!("{:?}", e),
            })?;

        let bitmap = page.render_with_config(&render_config).map_err(|e| {
            ExtractError::RasterisationFailed {
                page: idx + 1,
                detail: format!("{:?}", e),
            }
        })?;

        let image = bitmap.as_image();
        debug!(
            "Rendered page {} → {}x{} px",
            idx + 1,
            image.width(),
            image.height()
        );

        results.push(image);
    }

    Ok(results)
}

fn map_load_error(e: PdfiumError, pdf_path: &Path, password: Option<&str>) -> ExtractError {
    let err_str = format!("{:?}", e);
    if err_str.contains("Password") || err_str.contains("password") {
        if password.is_some() {
            ExtractError::WrongPassword {
                path: pdf_path.to_path_buf(),
            }
        } else {
            ExtractError::PasswordRequired {
                path: pdf_path.to_path_buf(),
            }
        }
    } else {
        ExtractError::CorruptPdf {
            path: pdf_path.to_path_buf(),
            detail: err_str,
        }
    }
}

/// Extract document metadata from a PDF without rendering pages.
pub async fn extract_metadata(
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<DocumentMetadata, ExtractError> {
    let path = pdf_path.to_path_buf();
    let pwd = password.map(|s| s.to_string());

    tokio::task::spawn_blocking(move || extract_metadata_blocking(&path, pwd.as_deref()))
        .await
        .map_err(|e| ExtractError::Internal(format!("Metadata task panicked: {}", e)))?
}

/// Blocking implementation of metadata extraction.
fn extract_metadata_blocking(
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<DocumentMetadata, ExtractError> {
    let pdfium = Pdfium::default();

    let document = pdfium
        .load_pdf_from_file(pdf_path, password)
        .map_err(|e| map_load_error(e, pdf_path, password))?;

    let metadata = document.metadata();
    let pages = document.pages();

    let get_meta = |tag: PdfDocumentMetadataTagType| -> Option<String> {
        metadata.get(tag).and_then(|t| {
            let v = t.value().to_string();
            if v.is_empty() {
                None
            } else {
                Some(v)
            }
        })
    };

    Ok(DocumentMetadata {
        title: get_meta(PdfDocumentMetadataTagType::Title),
        author: get_meta(PdfDocumentMetadataTagType::Author),
        subject: get_meta(PdfDocumentMetadataTagType::Subject),
        creator: get_meta(PdfDocumentMetadataTagType::Creator),
        producer: get_meta(PdfDocumentMetadataTagType::Producer),
        page_count: pages.len() as usize,
        pdf_version: format!("{:?}", document.version()),
    })
}
