//! # doc2fields
//!
//! Extract structured fields from scanned government documents (Aadhaar,
//! PAN, passports, marksheets, invoices, …) using OCR and an LLM.
//!
//! ## Why this crate?
//!
//! Scanned identity documents and certificates carry a small, well-known set
//! of fields, but the scans themselves are messy: skewed photos, stamps,
//! multi-script text. Instead of hand-writing a parser per layout, this
//! crate OCRs the document with Tesseract and hands the raw text to an LLM
//! with a fixed, per-document-type instruction describing exactly which
//! fields to pull out.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF / PNG / JPEG
//!  │
//!  ├─ 1. Input    resolve local file or download from URL, gate extensions
//!  ├─ 2. Render   rasterise PDF pages via pdfium, or decode the image
//!  ├─ 3. OCR      tesseract per page, concatenated in order
//!  ├─ 4. LLM      per-document-type prompt → JSON field envelope
//!  └─ 5. Parse    best-effort JSON parse; raw reply always preserved
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use doc2fields::{extract, DocumentKind, ExtractionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from GEMINI_API_KEY / OPENAI_API_KEY / …
//!     let config = ExtractionConfig::default();
//!     let output = extract("aadhaar_scan.jpg", DocumentKind::Aadhaar, &config).await?;
//!     for (name, value) in &output.result.fields {
//!         println!("{name}: {value}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `doc2fields` binary (clap + anyhow + tracing-subscriber) |
//!
//! ## Requirements
//!
//! - A `tesseract` binary on `PATH` (the OCR backend)
//! - A pdfium shared library for PDF inputs (`PDFIUM_LIB_PATH` or system-installed)
//! - An API key for the LLM provider (`GEMINI_API_KEY` by default)

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod document;
pub mod error;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ExtractionConfig, ExtractionConfigBuilder};
pub use document::DocumentKind;
pub use error::ExtractError;
pub use extract::{
    extract, extract_from_bytes, extract_from_text, extract_sync, extract_text_only,
    extract_to_file, inspect,
};
pub use output::{
    DocumentMetadata, ExtractedText, ExtractionOutput, ExtractionStats, FieldResult,
};
pub use pipeline::ocr::{OcrEngine, TesseractEngine};
