//! Output types returned by the extraction pipeline.
//!
//! Everything here is transient and `serde`-serialisable: nothing persists
//! beyond a single extraction, and `--json` on the CLI is just
//! `serde_json::to_string_pretty` over [`ExtractionOutput`].

use crate::document::DocumentKind;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Raw text produced by the OCR stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedText {
    /// Page texts concatenated in order, trimmed.
    pub text: String,
    /// Number of pages that were OCR'd (1 for a direct image upload).
    pub pages: usize,
}

impl ExtractedText {
    /// True when OCR produced nothing but whitespace across all pages.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Structured fields extracted by the LLM, parsed best-effort.
///
/// The pipeline never enforces a schema on the model's reply: `fields` is
/// whatever object the model returned, and `raw` always carries the
/// untouched response so nothing is lost when parsing fails.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldResult {
    /// Document type as reported by the model (falls back to the declared kind).
    pub document_type: String,
    /// Field name → value mapping. Empty when the reply was not valid JSON.
    pub fields: Map<String, Value>,
    /// Compliance status line from the model, when present.
    pub compliance_status: Option<String>,
    /// The model's raw (cleaned) response text.
    pub raw: String,
}

/// PDF document metadata, available without an API key via `inspect`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub page_count: usize,
    pub pdf_version: String,
}

/// Timing and token statistics for one extraction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionStats {
    /// Pages rasterised and OCR'd.
    pub pages: usize,
    /// Wall-clock time for rasterisation + OCR.
    pub ocr_duration_ms: u64,
    /// Wall-clock time for the LLM call (including retries).
    pub llm_duration_ms: u64,
    /// End-to-end wall-clock time.
    pub total_duration_ms: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    /// LLM retries that were needed before success.
    pub retries: u32,
}

/// Complete result of one document extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionOutput {
    /// The document kind declared by the caller.
    pub kind: DocumentKind,
    /// Raw OCR text, kept for preview display.
    pub text: ExtractedText,
    /// Structured fields from the LLM.
    pub result: FieldResult,
    /// PDF metadata (None for direct image uploads).
    pub metadata: Option<DocumentMetadata>,
    pub stats: ExtractionStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracted_text_emptiness() {
        let t = ExtractedText {
            text: "  \n\t ".into(),
            pages: 3,
        };
        assert!(t.is_empty());
        let t = ExtractedText {
            text: "GOVERNMENT OF INDIA".into(),
            pages: 1,
        };
        assert!(!t.is_empty());
    }

    #[test]
    fn output_round_trips_through_json() {
        let out = ExtractionOutput {
            kind: DocumentKind::Pan,
            text: ExtractedText {
                text: "INCOME TAX DEPARTMENT".into(),
                pages: 1,
            },
            result: FieldResult {
                document_type: "PAN Card".into(),
                fields: Map::new(),
                compliance_status: None,
                raw: "{}".into(),
            },
            metadata: None,
            stats: ExtractionStats::default(),
        };
        let json = serde_json::to_string(&out).unwrap();
        let back: ExtractionOutput = serde_json::from_str(&json).unwrap();
        assert_eq!(back.kind, DocumentKind::Pan);
        assert_eq!(back.result.document_type, "PAN Card");
    }
}
