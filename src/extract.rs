//! Top-level extraction entry points.
//!
//! One document in, one [`ExtractionOutput`] out. The pipeline is a single
//! sequential path — resolve the input, resolve the LLM provider, rasterise,
//! OCR, call the model, parse — with no feedback loops and no state that
//! outlives the call.
//!
//! The provider is resolved *before* any rendering or OCR work so that a
//! missing API key fails in milliseconds instead of after a multi-page OCR
//! run.

use crate::config::ExtractionConfig;
use crate::document::DocumentKind;
use crate::error::ExtractError;
use crate::output::{DocumentMetadata, ExtractedText, ExtractionOutput, ExtractionStats};
use crate::pipeline::input::InputFormat;
use crate::pipeline::ocr::{OcrEngine, TesseractEngine};
use crate::pipeline::{input, llm, ocr, render, response};
use edgequake_llm::{LLMProvider, ProviderFactory};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Extract structured fields from a document file or URL.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `input_str` — Local file path or HTTP/HTTPS URL (.pdf, .png, .jpg, .jpeg)
/// * `kind`      — Document type declared by the user
/// * `config`    — Extraction configuration
///
/// # Errors
/// Any stage failure aborts the extraction: unsupported or unreadable input,
/// rasterisation/OCR failure, empty OCR output ([`ExtractError::NoTextFound`]),
/// unconfigured provider, or a final LLM API failure.
pub async fn extract(
    input_str: impl AsRef<str>,
    kind: DocumentKind,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ExtractError> {
    let total_start = Instant::now();
    let input_str = input_str.as_ref();
    info!("Starting extraction: {} (kind: {})", input_str, kind);

    // ── Step 1: Resolve input ────────────────────────────────────────────
    let resolved = input::resolve_input(input_str, config.download_timeout_secs).await?;

    // ── Step 2: Resolve provider (fail fast on missing API key) ─────────
    let provider = resolve_provider(config)?;

    // ── Step 3: PDF metadata (images have none) ──────────────────────────
    let metadata = match resolved.format {
        InputFormat::Pdf => Some(
            render::extract_metadata(resolved.path(), config.password.as_deref()).await?,
        ),
        _ => None,
    };

    // ── Step 4: Rasterise / decode ───────────────────────────────────────
    let ocr_start = Instant::now();
    let pages = render::load_pages(&resolved, config).await?;
    debug!("Loaded {} page image(s)", pages.len());

    // ── Step 5: OCR ──────────────────────────────────────────────────────
    let engine = resolve_engine(config);
    let text = ocr::extract_text(pages, engine).await?;
    let ocr_duration_ms = ocr_start.elapsed().as_millis() as u64;
    info!(
        "OCR complete: {} chars from {} page(s) in {}ms",
        text.text.len(),
        text.pages,
        ocr_duration_ms
    );

    ensure_text(&text)?;

    // ── Step 6: LLM field extraction ─────────────────────────────────────
    let reply = llm::extract_fields(&provider, kind, &text.text, config).await?;

    // ── Step 7: Parse the reply ──────────────────────────────────────────
    let result = response::parse_reply(kind, &reply.content);

    let stats = ExtractionStats {
        pages: text.pages,
        ocr_duration_ms,
        llm_duration_ms: reply.duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
        input_tokens: reply.input_tokens,
        output_tokens: reply.output_tokens,
        retries: reply.retries,
    };

    info!(
        "Extraction complete: {} field(s), {}ms total",
        result.fields.len(),
        stats.total_duration_ms
    );

    Ok(ExtractionOutput {
        kind,
        text,
        result,
        metadata,
        stats,
    })
}

/// Extract structured fields from caller-supplied text, skipping OCR.
///
/// The counterpart to pasting text instead of uploading a scan: when the
/// document content is already digital (copied from a portal, produced by
/// another OCR run), the input, render, and OCR stages have nothing to do.
/// Empty or whitespace-only text is rejected with
/// [`ExtractError::NoTextFound`] before the provider is even resolved.
pub async fn extract_from_text(
    text: impl AsRef<str>,
    kind: DocumentKind,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ExtractError> {
    let total_start = Instant::now();
    let text = ExtractedText {
        text: text.as_ref().trim().to_string(),
        pages: 0,
    };
    ensure_text(&text)?;
    info!(
        "Starting extraction from {} chars of supplied text (kind: {})",
        text.text.len(),
        kind
    );

    let provider = resolve_provider(config)?;
    let reply = llm::extract_fields(&provider, kind, &text.text, config).await?;
    let result = response::parse_reply(kind, &reply.content);

    let stats = ExtractionStats {
        pages: 0,
        ocr_duration_ms: 0,
        llm_duration_ms: reply.duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
        input_tokens: reply.input_tokens,
        output_tokens: reply.output_tokens,
        retries: reply.retries,
    };

    Ok(ExtractionOutput {
        kind,
        text,
        result,
        metadata: None,
        stats,
    })
}

/// Run only the OCR stage and return the raw text.
///
/// Does not require an LLM provider or API key. Empty output is returned
/// as-is (check [`ExtractedText::is_empty`]); only full extraction treats
/// it as an error.
pub async fn extract_text_only(
    input_str: impl AsRef<str>,
    config: &ExtractionConfig,
) -> Result<ExtractedText, ExtractError> {
    let resolved = input::resolve_input(input_str.as_ref(), config.download_timeout_secs).await?;
    let pages = render::load_pages(&resolved, config).await?;
    let engine = resolve_engine(config);
    ocr::extract_text(pages, engine).await
}

/// Extract fields and write the full output as pretty JSON to a file.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn extract_to_file(
    input_str: impl AsRef<str>,
    kind: DocumentKind,
    output_path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<ExtractionStats, ExtractError> {
    let output = extract(input_str, kind, config).await?;
    let path = output_path.as_ref();

    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| ExtractError::Internal(format!("serialise output: {e}")))?;

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| ExtractError::OutputWriteFailed {
                path: path.to_path_buf(),
                source: e,
            })?;
    }

    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, &json)
        .await
        .map_err(|e| ExtractError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| ExtractError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    Ok(output.stats)
}

/// Synchronous wrapper around [`extract`].
///
/// Creates a temporary tokio runtime internally.
pub fn extract_sync(
    input_str: impl AsRef<str>,
    kind: DocumentKind,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ExtractError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ExtractError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(extract(input_str, kind, config))
}

/// Extract fields from in-memory file bytes.
///
/// Avoids the need for the caller to create a file: `bytes` are written to a
/// managed [`tempfile`] that is cleaned up automatically on return or panic.
/// `extension` selects the format, exactly as a filename would
/// ("pdf", "png", "jpg", "jpeg").
pub async fn extract_from_bytes(
    bytes: &[u8],
    extension: &str,
    kind: DocumentKind,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ExtractError> {
    let mut tmp = tempfile::Builder::new()
        .prefix("doc2fields-upload")
        .suffix(&format!(".{}", extension.trim_start_matches('.')))
        .tempfile()
        .map_err(|e| ExtractError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .map_err(|e| ExtractError::Internal(format!("tempfile write: {e}")))?;
    let path = tmp.path().to_string_lossy().to_string();
    // `tmp` is dropped (and the file deleted) when `extract` returns
    extract(&path, kind, config).await
}

/// Inspect document metadata without OCR or an API key.
///
/// For PDFs this reads the pdfium metadata dictionary; direct image uploads
/// report a single page and nothing else.
pub async fn inspect(input_str: impl AsRef<str>) -> Result<DocumentMetadata, ExtractError> {
    let resolved = input::resolve_input(input_str.as_ref(), 120).await?;
    match resolved.format {
        InputFormat::Pdf => render::extract_metadata(resolved.path(), None).await,
        _ => Ok(DocumentMetadata {
            page_count: 1,
            ..Default::default()
        }),
    }
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Empty OCR output is a user-visible state, not a crash.
fn ensure_text(text: &ExtractedText) -> Result<(), ExtractError> {
    if text.is_empty() {
        return Err(ExtractError::NoTextFound);
    }
    Ok(())
}

/// The OCR engine: caller-supplied, or Tesseract with the configured language.
fn resolve_engine(config: &ExtractionConfig) -> Arc<dyn OcrEngine> {
    match &config.ocr_engine {
        Some(engine) => Arc::clone(engine),
        None => Arc::new(TesseractEngine::new(config.ocr_language.clone())),
    }
}

/// Instantiate a named provider with the given model.
fn create_provider(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, ExtractError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        ExtractError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`) — the caller constructed
///    and configured the provider entirely; used as-is. Useful in tests.
///
/// 2. **Named provider + model** (`config.provider_name`) — reads the
///    corresponding API key (`GEMINI_API_KEY`, `OPENAI_API_KEY`, …) from the
///    environment.
///
/// 3. **Environment pair** (`DOC2FIELDS_LLM_PROVIDER` + `DOC2FIELDS_MODEL`)
///    — a provider/model choice made at the execution-environment level
///    (shell profile, CI). Checked before auto-detection so the model choice
///    is honoured even when multiple API keys are present.
///
/// 4. **Gemini preference** — the service is Gemini-backed by default, so a
///    present `GEMINI_API_KEY` wins over full auto-detection.
///
/// 5. **Full auto-detection** (`ProviderFactory::from_env`) — scans all
///    known API key variables and picks the first available provider.
fn resolve_provider(config: &ExtractionConfig) -> Result<Arc<dyn LLMProvider>, ExtractError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
        return create_provider(name, model);
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("DOC2FIELDS_LLM_PROVIDER"),
        std::env::var("DOC2FIELDS_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    if let Ok(gemini_key) = std::env::var("GEMINI_API_KEY") {
        if !gemini_key.is_empty() {
            let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
            return create_provider("gemini", model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| ExtractError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set GEMINI_API_KEY, OPENAI_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}

/// Default model when a provider is named without a model.
const DEFAULT_MODEL: &str = "gemini-1.5-flash";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_is_the_no_text_state() {
        let empty = ExtractedText {
            text: "   \n".into(),
            pages: 2,
        };
        assert!(matches!(ensure_text(&empty), Err(ExtractError::NoTextFound)));

        let ok = ExtractedText {
            text: "ELECTION COMMISSION OF INDIA".into(),
            pages: 1,
        };
        assert!(ensure_text(&ok).is_ok());
    }

    #[test]
    fn default_engine_is_tesseract() {
        let config = ExtractionConfig::default();
        assert_eq!(resolve_engine(&config).name(), "tesseract");
    }
}
