//! The document-type enumeration that drives prompt selection.
//!
//! Every supported government document has a fixed set of fields the model
//! is asked to extract (see [`crate::prompts`]). The kind is declared by the
//! user, never inferred from the file — the model only gets to detect the
//! type itself when the kind is [`DocumentKind::Other`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A government document type selecting which extraction rules to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Aadhaar,
    Pan,
    Passport,
    DrivingLicense,
    Marksheet,
    Invoice,
    Contract,
    VoterId,
    BirthCertificate,
    PropertyRegistration,
    TaxReturn,
    IncomeCertificate,
    /// Unspecified: the model detects the type and picks fields itself.
    #[default]
    Other,
}

impl DocumentKind {
    /// Every supported kind, in display order.
    pub const ALL: [DocumentKind; 13] = [
        DocumentKind::Aadhaar,
        DocumentKind::Pan,
        DocumentKind::Passport,
        DocumentKind::DrivingLicense,
        DocumentKind::Marksheet,
        DocumentKind::Invoice,
        DocumentKind::Contract,
        DocumentKind::VoterId,
        DocumentKind::BirthCertificate,
        DocumentKind::PropertyRegistration,
        DocumentKind::TaxReturn,
        DocumentKind::IncomeCertificate,
        DocumentKind::Other,
    ];

    /// Human-readable label, as it appears on the documents themselves.
    pub fn label(&self) -> &'static str {
        match self {
            DocumentKind::Aadhaar => "Aadhaar Card",
            DocumentKind::Pan => "PAN Card",
            DocumentKind::Passport => "Passport",
            DocumentKind::DrivingLicense => "Driving License",
            DocumentKind::Marksheet => "Marksheet",
            DocumentKind::Invoice => "Invoice",
            DocumentKind::Contract => "Contract",
            DocumentKind::VoterId => "Voter ID",
            DocumentKind::BirthCertificate => "Birth Certificate",
            DocumentKind::PropertyRegistration => "Property Registration",
            DocumentKind::TaxReturn => "Tax Return",
            DocumentKind::IncomeCertificate => "Income Certificate",
            DocumentKind::Other => "Other",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DocumentKind {
    type Err = String;

    /// Parse a CLI-style kind string. Case-insensitive; accepts both
    /// hyphenated and underscored forms plus a few common shorthands.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalised = s.trim().to_lowercase().replace(['-', ' '], "_");
        match normalised.as_str() {
            "aadhaar" | "aadhar" | "aadhaar_card" => Ok(DocumentKind::Aadhaar),
            "pan" | "pan_card" => Ok(DocumentKind::Pan),
            "passport" => Ok(DocumentKind::Passport),
            "driving_license" | "driving_licence" | "dl" => Ok(DocumentKind::DrivingLicense),
            "marksheet" | "mark_sheet" => Ok(DocumentKind::Marksheet),
            "invoice" => Ok(DocumentKind::Invoice),
            "contract" => Ok(DocumentKind::Contract),
            "voter_id" | "voterid" => Ok(DocumentKind::VoterId),
            "birth_certificate" => Ok(DocumentKind::BirthCertificate),
            "property_registration" => Ok(DocumentKind::PropertyRegistration),
            "tax_return" => Ok(DocumentKind::TaxReturn),
            "income_certificate" => Ok(DocumentKind::IncomeCertificate),
            "other" | "auto" | "text" => Ok(DocumentKind::Other),
            _ => Err(format!(
                "unknown document kind '{}' (expected one of: aadhaar, pan, passport, \
                 driving-license, marksheet, invoice, contract, voter-id, birth-certificate, \
                 property-registration, tax-return, income-certificate, other)",
                s
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_common_forms() {
        assert_eq!("aadhaar".parse::<DocumentKind>().unwrap(), DocumentKind::Aadhaar);
        assert_eq!("PAN".parse::<DocumentKind>().unwrap(), DocumentKind::Pan);
        assert_eq!(
            "driving-license".parse::<DocumentKind>().unwrap(),
            DocumentKind::DrivingLicense
        );
        assert_eq!("dl".parse::<DocumentKind>().unwrap(), DocumentKind::DrivingLicense);
        assert_eq!(
            "Voter ID".parse::<DocumentKind>().unwrap(),
            DocumentKind::VoterId
        );
    }

    #[test]
    fn parse_rejects_unknown() {
        let err = "ration-card".parse::<DocumentKind>().unwrap_err();
        assert!(err.contains("ration-card"), "got: {err}");
    }

    #[test]
    fn labels_are_unique() {
        let mut labels: Vec<&str> = DocumentKind::ALL.iter().map(|k| k.label()).collect();
        labels.sort_unstable();
        labels.dedup();
        assert_eq!(labels.len(), DocumentKind::ALL.len());
    }
}
