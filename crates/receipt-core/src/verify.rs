//! Verification pipeline
//!
//! validate → derive key → fetch → extract text → extract fields.
//! Any hard failure aborts the request; there are no partial results.

use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{UpstreamError, VerifyError};
use crate::extract::TextExtractor;
use crate::fetch::ReceiptSource;
use crate::fields::FieldExtractor;
use crate::types::{LookupKey, VerificationRequest, VerificationResult};

/// Composes receipt source, text extractor and field rules
///
/// Holds no mutable state, so one instance serves concurrent requests.
#[derive(Clone)]
pub struct ReceiptVerifier {
    source: Arc<dyn ReceiptSource>,
    extractor: TextExtractor,
    fields: FieldExtractor<'static>,
}

impl ReceiptVerifier {
    pub fn new(source: Arc<dyn ReceiptSource>, extractor: TextExtractor) -> Self {
        Self {
            source,
            extractor,
            fields: FieldExtractor::new(),
        }
    }

    /// Use a custom field rule set
    pub fn with_fields(mut self, fields: FieldExtractor<'static>) -> Self {
        self.fields = fields;
        self
    }

    /// Verify the receipt identified by `request`
    pub async fn verify(
        &self,
        request: &VerificationRequest,
    ) -> Result<VerificationResult, VerifyError> {
        let key = LookupKey::derive(request)?;
        debug!(lookup_key = %key, "Verifying receipt");

        let document = self
            .source
            .fetch(&key)
            .await
            .map_err(UpstreamError::from)?;

        let text = self
            .extractor
            .extract_text(document)
            .map_err(UpstreamError::from)?;

        let result = self.fields.extract_fields(&text);
        info!(
            lookup_key = %key,
            is_valid = result.is_valid,
            "Receipt verification complete"
        );

        Ok(result)
    }
}
