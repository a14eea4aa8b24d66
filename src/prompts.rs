//! Prompts for LLM-based field extraction.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth** — changing the JSON envelope or a document
//!    type's field list requires editing exactly one place.
//!
//! 2. **Testability** — unit tests can assert that each [`DocumentKind`]
//!    selects its fixed rule line without spinning up a real model.
//!
//! Callers can override the system prompt via
//! [`crate::config::ExtractionConfig::system_prompt`]; the constants here are
//! used only when no override is provided.

use crate::document::DocumentKind;

/// Default system prompt: instructs the model to emit a strict JSON envelope
/// with the detected document type, the extracted fields, and a compliance
/// status line.
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are an AI that extracts structured data from government documents.
Always output a JSON object strictly in this format:

{
  "type": "object",
  "properties": {
    "document_type": "<document type label, e.g. Aadhaar Card, PAN Card, Passport>",
    "extracted_data": { ...fields depending on document type OR fallback message only... }
  },
  "compliance_status": "<status based on completeness and compliance rules>",
  "name": "response"
}

### Rules for compliance_status ###
- If all fields are present and valid -> "Data extracted successfully for regulatory review."
- If some fields are missing or unclear -> "Partial data extracted — further verification required."
- If the document type cannot be identified -> "Document type not identified — manual review required."
- If a sensitive data format mismatch is detected -> "Data format issue — needs correction."
- If the text is minimal or unrelated to a document ->
  document_type = "text",
  extracted_data = {"message": "It appears that the input was minimal or unrelated to a document. Please provide a proper document."},
  compliance_status = "N/A".

### Important ###
- Never invent or hallucinate fields.
- If the input is non-document text, only return the fallback message under extracted_data.
- Output JSON only. Never include explanations outside JSON."#;

/// The fixed field-extraction rule for a document kind.
///
/// One line per kind, naming exactly the fields the model must extract.
/// These sets mirror what the corresponding physical documents carry.
pub fn field_rules(kind: DocumentKind) -> &'static str {
    match kind {
        DocumentKind::Aadhaar => "Extract: name, dob, gender, aadhaar_number, address.",
        DocumentKind::Pan => "Extract: name, father_name, dob, pan_number, signature.",
        DocumentKind::Passport => {
            "Extract: name, passport_number, dob, nationality, issue_date, expiry_date."
        }
        DocumentKind::DrivingLicense => {
            "Extract: name, license_number, dob, issue_date, validity."
        }
        DocumentKind::Marksheet => {
            "Extract: roll_no, exam_type, certificate_number, candidate_name, mother_name, \
             father_name, dob, school_name, exam_year, \
             subjects [{subject, max_marks, total_marks, grade}], result, date_of_issue, \
             place, verification_website."
        }
        DocumentKind::Invoice => {
            "Extract: invoice_number, date, seller_name, buyer_name, items, total_amount, tax_amount."
        }
        DocumentKind::Contract => {
            "Extract: contract_id, parties_involved, start_date, end_date, key_terms."
        }
        DocumentKind::VoterId => {
            "Extract: name, father_name, dob, gender, voter_id_number, address."
        }
        DocumentKind::BirthCertificate => {
            "Extract: child_name, father_name, mother_name, dob, place_of_birth, registration_number."
        }
        DocumentKind::PropertyRegistration => {
            "Extract: owner_name, property_address, registration_number, date_of_registration, \
             registrar_office."
        }
        DocumentKind::TaxReturn => {
            "Extract: taxpayer_name, pan_number, assessment_year, income, tax_paid, refund_status."
        }
        DocumentKind::IncomeCertificate => {
            "Extract: certificate_number, applicant_name, father_name, address, annual_income, \
             issue_date, validity, issuing_authority."
        }
        DocumentKind::Other => {
            "Detect the document type first, then extract the fields appropriate for that type. \
             If the text is not a document, return only the fallback message."
        }
    }
}

/// Build the user message: the declared kind, its fixed rule line, and the
/// raw OCR text wrapped in triple quotes so stray braces in the document
/// cannot be mistaken for instructions.
pub fn build_user_prompt(kind: DocumentKind, text: &str) -> String {
    format!(
        "Document type declared by the user: {}.\n{}\n\nDocument text:\n\"\"\"\n{}\n\"\"\"",
        kind.label(),
        field_rules(kind),
        text
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_kind_has_distinct_rules() {
        let mut rules: Vec<&str> = DocumentKind::ALL.iter().map(|k| field_rules(*k)).collect();
        rules.sort_unstable();
        rules.dedup();
        assert_eq!(rules.len(), DocumentKind::ALL.len());
    }

    #[test]
    fn user_prompt_contains_kind_and_rules() {
        let p = build_user_prompt(DocumentKind::Passport, "REPUBLIC OF INDIA");
        assert!(p.contains("Passport"));
        assert!(p.contains("passport_number"));
        assert!(p.contains("REPUBLIC OF INDIA"));
    }

    #[test]
    fn system_prompt_demands_json_only() {
        assert!(DEFAULT_SYSTEM_PROMPT.contains("Output JSON only"));
        assert!(DEFAULT_SYSTEM_PROMPT.contains("compliance_status"));
    }
}
