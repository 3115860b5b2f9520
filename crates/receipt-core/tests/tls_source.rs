//! Receipt retrieval over HTTPS from a host with a self-signed certificate
//!
//! The bank's receipt host is not trusted by the default roots. The fetcher
//! has to accept it while every other client in the process keeps
//! rejecting it.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{http::header, routing::get, Router};
use axum_server::tls_rustls::RustlsConfig;
use axum_server::Handle;
use pretty_assertions::assert_eq;
use receipt_core::testing::ReceiptPdf;
use receipt_core::{
    FetcherConfig, HttpReceiptFetcher, LookupKey, ReceiptSource, ReceiptVerifier, TextExtractor,
    VerificationRequest,
};

async fn spawn_tls_bank(pdf: Vec<u8>) -> String {
    let _ = rustls::crypto::ring::default_provider().install_default();

    let certified = rcgen::generate_simple_self_signed(vec![
        "localhost".to_string(),
        "127.0.0.1".to_string(),
    ])
    .unwrap();
    let config = RustlsConfig::from_pem(
        certified.cert.pem().into_bytes(),
        certified.key_pair.serialize_pem().into_bytes(),
    )
    .await
    .unwrap();

    let app = Router::new().route(
        "/",
        get(move || {
            let pdf = pdf.clone();
            async move { ([(header::CONTENT_TYPE, "application/pdf")], pdf) }
        }),
    );

    let handle = Handle::new();
    let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
    let server_handle = handle.clone();
    tokio::spawn(async move {
        axum_server::bind_rustls(addr, config)
            .handle(server_handle)
            .serve(app.into_make_service())
            .await
            .unwrap();
    });

    let bound = handle.listening().await.unwrap();
    format!("https://127.0.0.1:{}/", bound.port())
}

fn request() -> VerificationRequest {
    VerificationRequest::new("1000123456789", "FT24ABC123")
}

fn receipt() -> Vec<u8> {
    ReceiptPdf::receipt("JOHN DOE", "1,250.00", "01/02/2024, 10:15:30 AM")
        .to_bytes()
        .unwrap()
}

#[tokio::test]
async fn fetcher_accepts_self_signed_receipt_host() {
    let pdf = receipt();
    let url = spawn_tls_bank(pdf.clone()).await;
    let fetcher = HttpReceiptFetcher::new(FetcherConfig {
        base_url: url,
        ..FetcherConfig::default()
    })
    .unwrap();

    let document = fetcher
        .fetch(&LookupKey::derive(&request()).unwrap())
        .await
        .unwrap();

    assert_eq!(document.as_bytes(), pdf.as_slice());
}

#[tokio::test]
async fn certificate_bypass_stays_with_fetcher() {
    let url = spawn_tls_bank(receipt()).await;

    // Built first, so any process-wide effect would already be in place
    let fetcher = HttpReceiptFetcher::new(FetcherConfig {
        base_url: url.clone(),
        ..FetcherConfig::default()
    })
    .unwrap();

    let strict = reqwest::Client::new().get(&url).send().await;
    assert!(strict.is_err(), "default client trusted a self-signed host");

    let verifier = ReceiptVerifier::new(Arc::new(fetcher), TextExtractor::default());
    let result = verifier.verify(&request()).await.unwrap();
    assert!(result.is_valid);
    assert_eq!(result.payer, "JOHN DOE ");
}
