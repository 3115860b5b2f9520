//! Error taxonomy for the verification pipeline
//!
//! Hard failures only. A receipt whose fields do not match is a normal
//! negative [`VerificationResult`](crate::VerificationResult), not an error.

use thiserror::Error;

/// Caller supplied incomplete identifiers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("Missing required parameters: accountNumber or referenceNumber")]
    MissingIdentifiers,

    #[error("accountNumber must have at least {required} characters, got {actual}")]
    AccountNumberTooShort { required: usize, actual: usize },
}

/// Failures retrieving the receipt from the issuing endpoint
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Invalid receipt source configuration: {0}")]
    Config(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request failed with status code {status}")]
    RemoteStatus { status: u16 },

    #[error("Remote source returned a body that is not a PDF document ({len} bytes)")]
    NotADocument { len: usize },
}

/// Failures turning receipt bytes into text
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("Failed to parse PDF: {0}")]
    Parse(String),

    #[error("Failed to decode text on page {page}: {message}")]
    Render { page: u32, message: String },
}

/// Any failure raised downstream of input validation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UpstreamError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Extract(#[from] ExtractError),
}

/// Error returned by [`ReceiptVerifier::verify`](crate::ReceiptVerifier::verify)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

impl From<FetchError> for VerifyError {
    fn from(err: FetchError) -> Self {
        VerifyError::Upstream(err.into())
    }
}

impl From<ExtractError> for VerifyError {
    fn from(err: ExtractError) -> Self {
        VerifyError::Upstream(err.into())
    }
}
