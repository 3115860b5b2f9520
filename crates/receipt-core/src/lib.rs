//! Bank payment receipt verification
//!
//! Retrieves a receipt PDF from the issuing bank, extracts its text in page
//! and run order, and recovers the payer, transferred amount and payment
//! date with a fixed set of label rules.
//!
//! ```no_run
//! use std::sync::Arc;
//! use receipt_core::{
//!     FetcherConfig, HttpReceiptFetcher, ReceiptVerifier, TextExtractor, VerificationRequest,
//! };
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let fetcher = HttpReceiptFetcher::new(FetcherConfig::default())?;
//! let verifier = ReceiptVerifier::new(Arc::new(fetcher), TextExtractor::default());
//!
//! let request = VerificationRequest::new("1000123456789", "FT24ABC123");
//! let result = verifier.verify(&request).await?;
//! println!("valid: {}, payer: {}", result.is_valid, result.payer);
//! # Ok(())
//! # }
//! ```

mod cmap;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod fields;
mod font;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod types;
pub mod verify;

pub use error::{ExtractError, FetchError, InputError, UpstreamError, VerifyError};
pub use extract::{ExtractorConfig, TextExtractor};
pub use fetch::{FetcherConfig, HttpReceiptFetcher, ReceiptSource, DEFAULT_RECEIPT_URL};
pub use fields::{extract_fields, FieldExtractor, FieldRule, ReceiptField};
pub use types::{
    ExtractedText, LookupKey, RawDocument, VerificationRequest, VerificationResult, NOT_FOUND,
};
pub use verify::ReceiptVerifier;
