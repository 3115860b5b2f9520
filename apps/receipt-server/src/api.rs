//! API handlers for the receipt server

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use receipt_core::{VerificationRequest, VerificationResult};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ServerError;
use crate::AppState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Handler: GET /health
pub async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "receipt-server",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Verify request body
///
/// Both fields are optional at the JSON level so that an absent or `null`
/// identifier is reported as a missing parameter rather than a body
/// rejection.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyApiRequest {
    pub account_number: Option<String>,
    pub reference_number: Option<String>,
}

impl From<VerifyApiRequest> for VerificationRequest {
    fn from(req: VerifyApiRequest) -> Self {
        VerificationRequest::new(
            req.account_number.unwrap_or_default(),
            req.reference_number.unwrap_or_default(),
        )
    }
}

/// Handler: POST /verify
pub async fn handle_verify(
    State(state): State<AppState>,
    payload: Result<Json<VerifyApiRequest>, JsonRejection>,
) -> Result<Json<VerificationResult>, ServerError> {
    let Json(req) = payload?;
    info!(
        "Verify request: reference={}",
        req.reference_number.as_deref().unwrap_or("<missing>")
    );

    let request = VerificationRequest::from(req);
    let result = state.verifier.verify(&request).await?;

    Ok(Json(result))
}
