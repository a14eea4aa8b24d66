//! Pipeline stages for document field extraction.
//!
//! Each submodule implements exactly one transformation step. Keeping
//! stages separate makes each independently testable and lets us swap an
//! implementation (e.g. a different OCR backend) without touching the
//! other stages.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ ocr ──▶ llm ──▶ response
//! (path/URL) (pdfium)  (tesseract) (API) (parse)
//! ```
//!
//! 1. [`input`]    — canonicalise the user-supplied path or URL, gate on
//!    the supported extensions, and verify magic bytes
//! 2. [`render`]   — rasterise PDF pages or decode the uploaded image; runs
//!    in `spawn_blocking` because pdfium is not async-safe
//! 3. [`ocr`]      — recognise text on each page in order via Tesseract
//! 4. [`llm`]      — drive the field-extraction call with retry/backoff;
//!    the only stage with network I/O
//! 5. [`response`] — deterministic cleanup and best-effort JSON parse of
//!    the model reply

pub mod input;
pub mod llm;
pub mod ocr;
pub mod render;
pub mod response;
