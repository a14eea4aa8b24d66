//! Error types for the doc2fields library.
//!
//! The pipeline has a single path with no branching recovery, so a single
//! fatal error enum covers every stage: input resolution, rasterisation,
//! OCR, and the LLM call. Whichever stage fails first surfaces its error
//! directly to the caller; nothing downstream runs.
//!
//! Error messages follow the "what went wrong + what to try" pattern so the
//! CLI can print them verbatim without extra explanation.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the doc2fields library.
#[derive(Debug, Error)]
pub enum ExtractError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// File extension is not one of pdf / png / jpg / jpeg.
    ///
    /// Raised during input resolution, before any bytes reach the OCR stage.
    #[error("Unsupported file extension '{extension}' for '{path}'\nSupported: .pdf, .png, .jpg, .jpeg")]
    UnsupportedExtension { path: PathBuf, extension: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file has a .pdf extension but does not start with the PDF magic bytes.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// The file has an image extension but could not be decoded.
    #[error("File is not a valid image: '{path}'\n{detail}")]
    InvalidImage { path: PathBuf, detail: String },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}\nTry repairing with: qpdf --decrypt input.pdf output.pdf")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// pdfium returned an error for a specific page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    // ── OCR errors ────────────────────────────────────────────────────────
    /// The OCR engine failed on a page.
    #[error("OCR failed on page {page}: {detail}\nCheck that the tesseract binary is installed and on PATH.")]
    OcrFailed { page: usize, detail: String },

    /// OCR ran on every page but produced no text at all.
    #[error("No text found in the document.\nThe file may be blank, or the scan quality too low for OCR.")]
    NoTextFound,

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The LLM API call failed after all retries.
    #[error("LLM API error after {retries} retries: {message}")]
    LlmApiError { retries: u32, message: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_extension_display() {
        let e = ExtractError::UnsupportedExtension {
            path: PathBuf::from("scan.webp"),
            extension: "webp".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("webp"), "got: {msg}");
        assert!(msg.contains(".jpeg"), "got: {msg}");
    }

    #[test]
    fn no_text_found_display() {
        let msg = ExtractError::NoTextFound.to_string();
        assert!(msg.contains("No text found"), "got: {msg}");
    }

    #[test]
    fn provider_not_configured_display() {
        let e = ExtractError::ProviderNotConfigured {
            provider: "gemini".into(),
            hint: "Set GEMINI_API_KEY".into(),
        };
        assert!(e.to_string().contains("gemini"));
        assert!(e.to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn llm_api_error_display() {
        let e = ExtractError::LlmApiError {
            retries: 3,
            message: "HTTP 500".into(),
        };
        assert!(e.to_string().contains("3 retries"));
        assert!(e.to_string().contains("HTTP 500"));
    }
}
