//! Receipt retrieval from the issuing bank
//!
//! The bank's receipt host presents a certificate chain that the default
//! trust store rejects. [`HttpReceiptFetcher`] owns a dedicated reqwest
//! client with certificate verification disabled. Every other client in
//! the process keeps normal verification.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, Url};
use tracing::{debug, warn};

use crate::error::FetchError;
use crate::types::{LookupKey, RawDocument};

/// Receipt endpoint of the issuing bank
pub const DEFAULT_RECEIPT_URL: &str = "https://apps.cbe.com.et:100/";

/// The endpoint varies its response on these headers
pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:133.0) Gecko/20100101 Firefox/133.0";

const PDF_MIME: &str = "application/pdf";

/// Anything able to produce the receipt addressed by a lookup key
#[async_trait]
pub trait ReceiptSource: Send + Sync {
    /// Retrieve the raw receipt bytes. One attempt, no retries.
    async fn fetch(&self, key: &LookupKey) -> Result<RawDocument, FetchError>;
}

/// Settings for [`HttpReceiptFetcher`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetcherConfig {
    /// Receipt endpoint; the lookup key is sent as its `id` query parameter
    pub base_url: String,
    pub user_agent: String,
    /// Overall request timeout. `None` leaves the transport defaults.
    pub timeout: Option<Duration>,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_RECEIPT_URL.to_string(),
            user_agent: BROWSER_USER_AGENT.to_string(),
            timeout: None,
        }
    }
}

/// HTTPS fetcher for the bank's receipt endpoint
#[derive(Debug, Clone)]
pub struct HttpReceiptFetcher {
    http: Client,
    base_url: Url,
}

impl HttpReceiptFetcher {
    pub fn new(config: FetcherConfig) -> Result<Self, FetchError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| FetchError::Config(format!("{}: {}", config.base_url, e)))?;

        let mut builder = Client::builder()
            .danger_accept_invalid_certs(true)
            .user_agent(config.user_agent);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        let http = builder
            .build()
            .map_err(|e| FetchError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { http, base_url })
    }

    /// Full receipt URL for a lookup key
    pub fn receipt_url(&self, key: &LookupKey) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut().append_pair("id", key.as_str());
        url
    }
}

#[async_trait]
impl ReceiptSource for HttpReceiptFetcher {
    async fn fetch(&self, key: &LookupKey) -> Result<RawDocument, FetchError> {
        let url = self.receipt_url(key);
        debug!(%url, "Fetching receipt");

        let response = self
            .http
            .get(url)
            .header(ACCEPT, PDF_MIME)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Receipt source rejected lookup");
            return Err(FetchError::RemoteStatus {
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        let document = RawDocument::new(body.to_vec());

        if !document.looks_like_pdf() {
            warn!(len = document.len(), "Receipt source returned a non-PDF body");
            return Err(FetchError::NotADocument {
                len: document.len(),
            });
        }

        debug!(len = document.len(), "Receipt fetched");
        Ok(document)
    }
}
