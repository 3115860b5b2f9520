//! Error types for the receipt server

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use receipt_core::{InputError, VerifyError};
use serde::Serialize;
use thiserror::Error;

/// Server error types
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("Error fetching data: {0}")]
    Upstream(String),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ServerError::InvalidRequest(message) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    message,
                    error: None,
                },
            ),
            ServerError::Upstream(error) => {
                tracing::error!("Error fetching data: {}", error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        message: "Error fetching data".to_string(),
                        error: Some(error),
                    },
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<VerifyError> for ServerError {
    fn from(err: VerifyError) -> Self {
        match err {
            VerifyError::Input(e) => ServerError::InvalidRequest(e.to_string()),
            VerifyError::Upstream(e) => ServerError::Upstream(e.to_string()),
        }
    }
}

/// Bodies that are absent, not JSON, or carry non-string identifiers hold
/// no usable identifiers
impl From<JsonRejection> for ServerError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("Rejected verify body: {}", rejection.body_text());
        ServerError::InvalidRequest(InputError::MissingIdentifiers.to_string())
    }
}
