//! Receipt verification server
//!
//! Verifies bank payment receipts on behalf of order-fulfilment clients.
//! Provides:
//!
//! - `POST /verify` - fetch a receipt by account and reference number and
//!   report payer, amount and payment date
//! - `GET /health` - liveness
//! - static assets from the public and standard fonts directories
//!
//! Configuration comes from command-line flags, the environment and an
//! optional `.env` file.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use clap::Parser;
use receipt_core::{HttpReceiptFetcher, ReceiptVerifier, TextExtractor};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod api;
mod config;
mod error;

use api::{handle_health, handle_verify};
use config::{AssetConfig, Args};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub verifier: ReceiptVerifier,
}

/// Build the full router: API routes, static assets and middleware
pub fn build_router(state: AppState, assets: &AssetConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/verify", post(handle_verify))
        .nest_service("/standard_fonts", ServeDir::new(&assets.standard_fonts_dir))
        .fallback_service(ServeDir::new(&assets.public_dir))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let fetcher = HttpReceiptFetcher::new(args.fetcher_config())?;
    let extractor = TextExtractor::new(args.extractor_config());
    let state = AppState {
        verifier: ReceiptVerifier::new(Arc::new(fetcher), extractor),
    };

    let assets = args.asset_config();
    let app = build_router(state, &assets);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Server running at http://{}", addr);
    info!("Receipt source: {}", args.receipt_url);
    info!(
        "Static assets: {} (fonts: {})",
        assets.public_dir.display(),
        assets.standard_fonts_dir.display()
    );

    axum::serve(listener, app).await?;

    Ok(())
}
