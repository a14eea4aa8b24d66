//! Response handling: deterministic cleanup and best-effort parsing of the
//! model's reply.
//!
//! ## Why clean at all?
//!
//! Even well-prompted models occasionally disobey "Output JSON only":
//!
//! - Wrapping the object in ` ```json … ``` ` fences
//! - Using Windows-style `\r\n` line endings
//! - Emitting invisible Unicode (zero-width spaces, BOM)
//!
//! The cleanup rules here are cheap string passes that fix those quirks
//! without touching content. Parsing is strictly best-effort — the pipeline
//! enforces no schema, and the raw reply is always preserved on the
//! [`FieldResult`] so nothing is lost when the reply is not valid JSON.

use crate::document::DocumentKind;
use crate::output::FieldResult;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

/// Clean the raw model reply and parse it into a [`FieldResult`].
///
/// Recognises both the instructed envelope
/// (`{"properties": {"document_type": …, "extracted_data": {…}}, "compliance_status": …}`)
/// and a flat object with the same keys at top level. Anything else leaves
/// `fields` empty and the cleaned reply in `raw`.
pub fn parse_reply(kind: DocumentKind, reply: &str) -> FieldResult {
    let cleaned = clean_reply(reply);

    let mut result = FieldResult {
        document_type: kind.label().to_string(),
        fields: Map::new(),
        compliance_status: None,
        raw: cleaned.clone(),
    };

    let Ok(value) = serde_json::from_str::<Value>(&cleaned) else {
        return result;
    };

    // Envelope shape first, then flat.
    let document_type = value
        .pointer("/properties/document_type")
        .or_else(|| value.get("document_type"))
        .and_then(Value::as_str);
    if let Some(dt) = document_type {
        if !dt.is_empty() {
            result.document_type = dt.to_string();
        }
    }

    let extracted = value
        .pointer("/properties/extracted_data")
        .or_else(|| value.get("extracted_data"));
    match extracted {
        Some(Value::Object(map)) => result.fields = map.clone(),
        Some(other) if !other.is_null() => {
            result.fields.insert("value".to_string(), other.clone());
        }
        _ => {}
    }

    result.compliance_status = value
        .get("compliance_status")
        .and_then(Value::as_str)
        .map(str::to_string);

    result
}

/// Apply the cleanup passes in order: fences, line endings, invisible
/// characters, outer whitespace.
fn clean_reply(input: &str) -> String {
    let s = strip_json_fences(input);
    let s = normalise_line_endings(&s);
    let s = remove_invisible_chars(&s);
    s.trim().to_string()
}

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:json)?\s*\n(.*)\n```\s*$").unwrap());

fn strip_json_fences(input: &str) -> String {
    if let Some(caps) = RE_OUTER_FENCES.captures(input.trim()) {
        caps[1].to_string()
    } else {
        input.to_string()
    }
}

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

fn remove_invisible_chars(input: &str) -> String {
    input
        .chars()
        .filter(|c| {
            !matches!(
                c,
                '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{2060}' | '\u{FEFF}' | '\u{00AD}'
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_enveloped_reply() {
        let reply = r#"{
            "type": "object",
            "properties": {
                "document_type": "PAN Card",
                "extracted_data": {"name": "A KUMAR", "pan_number": "ABCDE1234F"}
            },
            "compliance_status": "Data extracted successfully for regulatory review.",
            "name": "response"
        }"#;
        let result = parse_reply(DocumentKind::Pan, reply);
        assert_eq!(result.document_type, "PAN Card");
        assert_eq!(result.fields["pan_number"], "ABCDE1234F");
        assert!(result
            .compliance_status
            .as_deref()
            .unwrap()
            .contains("successfully"));
    }

    #[test]
    fn parses_flat_reply() {
        let reply = r#"{"document_type": "Invoice", "extracted_data": {"total_amount": "₹4,200"}}"#;
        let result = parse_reply(DocumentKind::Invoice, reply);
        assert_eq!(result.document_type, "Invoice");
        assert_eq!(result.fields["total_amount"], "₹4,200");
        assert!(result.compliance_status.is_none());
    }

    #[test]
    fn strips_fences_before_parsing() {
        let reply = "```json\n{\"document_type\": \"Passport\", \"extracted_data\": {\"name\": \"X\"}}\n```";
        let result = parse_reply(DocumentKind::Passport, reply);
        assert_eq!(result.document_type, "Passport");
        assert_eq!(result.fields["name"], "X");
        assert!(!result.raw.starts_with("```"));
    }

    #[test]
    fn non_json_reply_keeps_raw_and_declared_kind() {
        let reply = "Sorry, I could not read this document.";
        let result = parse_reply(DocumentKind::Aadhaar, reply);
        assert_eq!(result.document_type, "Aadhaar Card");
        assert!(result.fields.is_empty());
        assert_eq!(result.raw, reply);
    }

    #[test]
    fn invisible_chars_are_removed() {
        let reply = "\u{FEFF}{\"document_type\": \"Contract\", \"extracted_data\": {}}\u{200B}";
        let result = parse_reply(DocumentKind::Contract, reply);
        assert_eq!(result.document_type, "Contract");
        assert!(!result.raw.contains('\u{FEFF}'));
    }

    #[test]
    fn crlf_reply_normalised() {
        let reply = "{\r\n  \"document_type\": \"Voter ID\",\r\n  \"extracted_data\": {}\r\n}";
        let result = parse_reply(DocumentKind::VoterId, reply);
        assert_eq!(result.document_type, "Voter ID");
        assert!(!result.raw.contains('\r'));
    }
}
