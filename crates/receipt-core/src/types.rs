//! Common types for receipt verification

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::InputError;

/// Placeholder held by a field whose rule did not match
pub const NOT_FOUND: &str = "Not Found";

/// Number of trailing account number characters used in the lookup key
pub const ACCOUNT_SUFFIX_LEN: usize = 8;

/// Identifiers supplied by the caller
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRequest {
    pub account_number: String,
    pub reference_number: String,
}

impl VerificationRequest {
    pub fn new(account_number: impl Into<String>, reference_number: impl Into<String>) -> Self {
        Self {
            account_number: account_number.into(),
            reference_number: reference_number.into(),
        }
    }
}

/// Identifier addressing one receipt at the remote source
///
/// Reference number followed by the last eight characters of the account
/// number.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LookupKey(String);

impl LookupKey {
    /// Validate the request and derive its key
    pub fn derive(request: &VerificationRequest) -> Result<Self, InputError> {
        let account = request.account_number.as_str();
        let reference = request.reference_number.as_str();

        if account.is_empty() || reference.is_empty() {
            return Err(InputError::MissingIdentifiers);
        }

        let account_len = account.chars().count();
        if account_len < ACCOUNT_SUFFIX_LEN {
            return Err(InputError::AccountNumberTooShort {
                required: ACCOUNT_SUFFIX_LEN,
                actual: account_len,
            });
        }

        // Char boundary of the suffix, not a byte offset
        let suffix_start = account
            .char_indices()
            .nth(account_len - ACCOUNT_SUFFIX_LEN)
            .map(|(idx, _)| idx)
            .unwrap_or(0);

        Ok(Self(format!("{}{}", reference, &account[suffix_start..])))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LookupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Receipt bytes as returned by the remote source
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawDocument(Vec<u8>);

impl RawDocument {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether the bytes carry a PDF header
    ///
    /// The header may be preceded by junk, so the first kilobyte is searched.
    pub fn looks_like_pdf(&self) -> bool {
        let window = &self.0[..self.0.len().min(1024)];
        window.windows(5).any(|w| w == b"%PDF-")
    }
}

impl From<Vec<u8>> for RawDocument {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

/// Page text runs, trimmed and joined in document order
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExtractedText(String);

impl ExtractedText {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Append one run followed by the join space
    pub(crate) fn push_run(&mut self, run: &str) {
        self.0.push_str(run.trim());
        self.0.push(' ');
    }
}

impl From<String> for ExtractedText {
    fn from(text: String) -> Self {
        Self(text)
    }
}

impl From<&str> for ExtractedText {
    fn from(text: &str) -> Self {
        Self(text.to_string())
    }
}

/// Verdict returned to the caller
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub is_valid: bool,
    pub payer: String,
    pub amount: String,
    pub date: String,
}

impl VerificationResult {
    /// Build a result, deriving validity from field presence
    pub fn from_fields(payer: Option<String>, amount: Option<String>, date: Option<String>) -> Self {
        let is_valid = payer.is_some() && amount.is_some() && date.is_some();
        let or_sentinel = |value: Option<String>| value.unwrap_or_else(|| NOT_FOUND.to_string());

        Self {
            is_valid,
            payer: or_sentinel(payer),
            amount: or_sentinel(amount),
            date: or_sentinel(date),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_lookup_key_uses_last_eight_account_chars() {
        let request = VerificationRequest::new("1000123456789", "FT24ABC123");
        let key = LookupKey::derive(&request).unwrap();
        assert_eq!(key.as_str(), "FT24ABC12323456789");
    }

    #[test]
    fn test_lookup_key_exactly_eight_chars() {
        let request = VerificationRequest::new("12345678", "REF");
        let key = LookupKey::derive(&request).unwrap();
        assert_eq!(key.to_string(), "REF12345678");
    }

    #[test]
    fn test_lookup_key_multibyte_account() {
        let request = VerificationRequest::new("ééé12345678", "R");
        let key = LookupKey::derive(&request).unwrap();
        assert_eq!(key.as_str(), "R12345678");
    }

    #[test]
    fn test_lookup_key_rejects_empty() {
        let missing_ref = VerificationRequest::new("1000123456789", "");
        assert_eq!(
            LookupKey::derive(&missing_ref),
            Err(InputError::MissingIdentifiers)
        );

        let missing_account = VerificationRequest::new("", "FT24ABC123");
        assert_eq!(
            LookupKey::derive(&missing_account),
            Err(InputError::MissingIdentifiers)
        );
    }

    #[test]
    fn test_lookup_key_rejects_short_account() {
        let request = VerificationRequest::new("1234567", "FT24ABC123");
        assert_eq!(
            LookupKey::derive(&request),
            Err(InputError::AccountNumberTooShort {
                required: 8,
                actual: 7
            })
        );
    }

    proptest! {
        /// Property: an empty identifier is rejected whatever the other holds
        #[test]
        fn empty_identifier_always_rejected(other in ".{0,32}", empty_account in any::<bool>()) {
            let request = if empty_account {
                VerificationRequest::new("", other)
            } else {
                VerificationRequest::new(other, "")
            };
            prop_assert_eq!(LookupKey::derive(&request), Err(InputError::MissingIdentifiers));
        }

        /// Property: the key always ends with the account's last eight characters
        #[test]
        fn key_ends_with_account_suffix(
            account in "[0-9]{8,20}",
            reference in "[A-Z0-9]{1,12}",
        ) {
            let key = LookupKey::derive(&VerificationRequest::new(account.clone(), reference.clone()))
                .unwrap();
            prop_assert!(key.as_str().starts_with(&reference));
            prop_assert!(key.as_str().ends_with(&account[account.len() - 8..]));
            prop_assert_eq!(key.as_str().len(), reference.len() + 8);
        }
    }

    #[test]
    fn test_request_deserializes_camel_case() {
        let json = r#"{"accountNumber":"1000123456789","referenceNumber":"FT24ABC123"}"#;
        let request: VerificationRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.account_number, "1000123456789");
        assert_eq!(request.reference_number, "FT24ABC123");
    }

    #[test]
    fn test_pdf_header_detection() {
        assert!(RawDocument::new(b"%PDF-1.7\n...".to_vec()).looks_like_pdf());
        assert!(RawDocument::new(b"\xef\xbb\xbf%PDF-1.4".to_vec()).looks_like_pdf());
        assert!(!RawDocument::new(b"<html>Not found</html>".to_vec()).looks_like_pdf());
        assert!(!RawDocument::new(Vec::new()).looks_like_pdf());
    }

    #[test]
    fn test_result_validity_requires_all_fields() {
        let complete = VerificationResult::from_fields(
            Some("JOHN DOE ".into()),
            Some("1,250.00".into()),
            Some("01/02/2024, 10:15:30 AM".into()),
        );
        assert!(complete.is_valid);

        let partial = VerificationResult::from_fields(None, Some("1,250.00".into()), None);
        assert!(!partial.is_valid);
        assert_eq!(partial.payer, NOT_FOUND);
        assert_eq!(partial.amount, "1,250.00");
        assert_eq!(partial.date, NOT_FOUND);
    }

    #[test]
    fn test_result_serializes_camel_case() {
        let result = VerificationResult::from_fields(None, None, None);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["isValid"], false);
        assert_eq!(json["payer"], NOT_FOUND);
    }
}
