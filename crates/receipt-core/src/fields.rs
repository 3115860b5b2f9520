//! Receipt field rules
//!
//! Each field is recovered by an independent (label, value shape) rule
//! scanned over the whole extracted text. The first match wins. A rule that
//! does not match leaves its field at [`NOT_FOUND`](crate::NOT_FOUND).
//!
//! A captured value never runs into the label of another rule, so
//! `"Payer JOHN DOE Transferred Amount 1,250.00"` yields the payer
//! `"JOHN DOE "`.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::types::{ExtractedText, VerificationResult};

/// Semantic fields carried by a receipt
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceiptField {
    Payer,
    Amount,
    Date,
}

/// A label and the shape of the value that follows it
#[derive(Debug, Clone)]
pub struct FieldRule {
    pub field: ReceiptField,
    pub label: &'static str,
    pattern: Regex,
}

impl FieldRule {
    /// Build a rule matching `label`, whitespace, then `value_shape`
    ///
    /// `value_shape` must contain exactly one capture group.
    pub fn new(
        field: ReceiptField,
        label: &'static str,
        value_shape: &str,
    ) -> Result<Self, regex::Error> {
        let pattern = Regex::new(&format!(r"{}\s+{}", regex::escape(label), value_shape))?;
        Ok(Self {
            field,
            label,
            pattern,
        })
    }

    /// First value following this rule's label, if any
    pub fn capture<'t>(&self, text: &'t str) -> Option<regex::Match<'t>> {
        self.pattern.captures(text).and_then(|caps| caps.get(1))
    }
}

lazy_static! {
    /// Rules for the issuing bank's payment receipt layout
    static ref RECEIPT_RULES: Vec<FieldRule> = vec![
        FieldRule::new(ReceiptField::Payer, "Payer", r"([A-Za-z\s]+)").unwrap(),
        FieldRule::new(ReceiptField::Amount, "Transferred Amount", r"([0-9,\.]+)").unwrap(),
        FieldRule::new(
            ReceiptField::Date,
            "Payment Date & Time",
            r"([0-9/]+, \d{1,2}:\d{2}:\d{2} [APM]{2})",
        )
        .unwrap(),
    ];
}

/// Default receipt rules
pub fn receipt_rules() -> &'static [FieldRule] {
    &RECEIPT_RULES
}

/// Applies a rule set to extracted text
#[derive(Debug, Clone, Copy)]
pub struct FieldExtractor<'r> {
    rules: &'r [FieldRule],
}

impl FieldExtractor<'static> {
    pub fn new() -> Self {
        Self {
            rules: receipt_rules(),
        }
    }
}

impl Default for FieldExtractor<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'r> FieldExtractor<'r> {
    pub fn with_rules(rules: &'r [FieldRule]) -> Self {
        Self { rules }
    }

    /// Value recovered for `field`, or `None` when its rule did not match
    pub fn find(&self, text: &str, field: ReceiptField) -> Option<String> {
        let rule = self.rules.iter().find(|r| r.field == field)?;
        let captured = rule.capture(text)?;
        let end = self.foreign_label_offset(rule, &text[captured.start()..], captured.len());
        let value = &captured.as_str()[..end];

        if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        }
    }

    /// Recover payer, amount and date and derive the verdict
    pub fn extract_fields(&self, text: &ExtractedText) -> VerificationResult {
        let text = text.as_str();
        VerificationResult::from_fields(
            self.find(text, ReceiptField::Payer),
            self.find(text, ReceiptField::Amount),
            self.find(text, ReceiptField::Date),
        )
    }

    /// Offset of the first other label starting inside the captured value
    ///
    /// The label may extend past the capture, so `rest` runs to the end of
    /// the text.
    fn foreign_label_offset(&self, own: &FieldRule, rest: &str, captured_len: usize) -> usize {
        self.rules
            .iter()
            .filter(|r| r.field != own.field)
            .filter_map(|r| rest.find(r.label))
            .filter(|&offset| offset < captured_len)
            .min()
            .unwrap_or(captured_len)
    }
}

/// Recover the receipt fields with the default rules
pub fn extract_fields(text: &ExtractedText) -> VerificationResult {
    FieldExtractor::new().extract_fields(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NOT_FOUND;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    const RECEIPT_TEXT: &str = "Commercial Bank of Ethiopia Payment Receipt \
        Payer JOHN DOE Transferred Amount 1,250.00 ETB Reference No. FT24ABC123 \
        Payment Date & Time 01/02/2024, 10:15:30 AM ";

    #[test]
    fn test_extracts_all_fields() {
        let result = extract_fields(&RECEIPT_TEXT.into());

        assert_eq!(
            result,
            VerificationResult {
                is_valid: true,
                payer: "JOHN DOE ".to_string(),
                amount: "1,250.00".to_string(),
                date: "01/02/2024, 10:15:30 AM".to_string(),
            }
        );
    }

    #[test]
    fn test_payer_stops_at_non_letter() {
        let text = "Payer ABEBE KEBEDE Account 1****5678 ";
        let payer = FieldExtractor::new().find(text, ReceiptField::Payer);
        assert_eq!(payer.as_deref(), Some("ABEBE KEBEDE Account "));
    }

    #[test]
    fn test_missing_payer_only_affects_payer() {
        let text = "Transferred Amount 500.00 Payment Date & Time 12/31/2023, 9:05:00 PM ";
        let result = extract_fields(&text.into());

        assert!(!result.is_valid);
        assert_eq!(result.payer, NOT_FOUND);
        assert_eq!(result.amount, "500.00");
        assert_eq!(result.date, "12/31/2023, 9:05:00 PM");
    }

    #[test]
    fn test_missing_amount_only_affects_amount() {
        let text = "Payer JANE ROE Payment Date & Time 1/2/2024, 10:15:30 AM ";
        let result = extract_fields(&text.into());

        assert!(!result.is_valid);
        assert_eq!(result.payer, "JANE ROE ");
        assert_eq!(result.amount, NOT_FOUND);
        assert_eq!(result.date, "1/2/2024, 10:15:30 AM");
    }

    #[test]
    fn test_date_requires_time_and_marker() {
        let text = "Payer JANE ROE Transferred Amount 10 Payment Date & Time 2024-01-02 10:15 ";
        let result = extract_fields(&text.into());

        assert!(!result.is_valid);
        assert_eq!(result.date, NOT_FOUND);
    }

    #[test]
    fn test_first_match_wins() {
        let text = "Transferred Amount 100.00 Transferred Amount 999.99 ";
        let amount = FieldExtractor::new().find(text, ReceiptField::Amount);
        assert_eq!(amount.as_deref(), Some("100.00"));
    }

    #[test]
    fn test_label_requires_whitespace_before_value() {
        let amount = FieldExtractor::new().find("Transferred Amount:100", ReceiptField::Amount);
        assert_eq!(amount, None);
    }

    #[test]
    fn test_labels_are_case_sensitive() {
        let result = extract_fields(&"payer JOHN DOE transferred amount 10 ".into());
        assert_eq!(result.payer, NOT_FOUND);
        assert_eq!(result.amount, NOT_FOUND);
    }

    #[test]
    fn test_value_consisting_only_of_label_is_absent() {
        let payer = FieldExtractor::new().find("Payer Transferred Amount 5", ReceiptField::Payer);
        assert_eq!(payer, None);
    }

    #[test]
    fn test_empty_text_yields_sentinels() {
        let result = extract_fields(&ExtractedText::default());
        assert!(!result.is_valid);
        assert_eq!(result.payer, NOT_FOUND);
        assert_eq!(result.amount, NOT_FOUND);
        assert_eq!(result.date, NOT_FOUND);
    }

    #[test]
    fn test_custom_rule_set() {
        let rules = vec![
            FieldRule::new(ReceiptField::Payer, "Sender", r"([A-Za-z\s]+)").unwrap(),
            FieldRule::new(ReceiptField::Amount, "Total", r"([0-9\.]+)").unwrap(),
            FieldRule::new(ReceiptField::Date, "On", r"([0-9/]+)").unwrap(),
        ];
        let extractor = FieldExtractor::with_rules(&rules);
        let result = extractor.extract_fields(&"Sender ALMAZ Total 12.50 On 03/04/2024 ".into());

        assert!(result.is_valid);
        assert_eq!(result.payer, "ALMAZ ");
        assert_eq!(result.amount, "12.50");
        assert_eq!(result.date, "03/04/2024");
    }

    proptest! {
        /// Property: extraction is a pure function of the text
        #[test]
        fn extract_fields_is_idempotent(text in ".{0,200}") {
            let text = ExtractedText::from(text);
            prop_assert_eq!(extract_fields(&text), extract_fields(&text));
        }

        /// Property: labelled values are recovered verbatim
        #[test]
        fn labelled_values_recovered(
            first in "[A-Z]{2,12}",
            last in "[A-Z]{2,12}",
            whole in 1u32..1_000_000,
            cents in 0u32..100,
            month in 1u32..13,
            day in 1u32..29,
            hour in 1u32..13,
        ) {
            let amount = format!("{}.{:02}", whole, cents);
            let date = format!("{:02}/{:02}/2024, {}:07:45 PM", day, month, hour);
            let text = format!(
                "Payer {} {} Transferred Amount {} Payment Date & Time {} ",
                first, last, amount, date
            );

            let result = extract_fields(&text.into());
            prop_assert!(result.is_valid);
            prop_assert_eq!(result.payer, format!("{} {} ", first, last));
            prop_assert_eq!(result.amount, amount);
            prop_assert_eq!(result.date, date);
        }
    }
}
