//! Command-line and environment configuration

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use receipt_core::{ExtractorConfig, FetcherConfig, DEFAULT_RECEIPT_URL};

/// Command-line arguments for the receipt server
///
/// Every option can also be set through the environment (or a `.env` file).
#[derive(Parser, Debug)]
#[command(name = "receipt-server")]
#[command(about = "Verifies bank payment receipts fetched from the issuing bank")]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "3000")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Receipt endpoint of the issuing bank
    #[arg(long, env = "RECEIPT_SOURCE_URL", default_value = DEFAULT_RECEIPT_URL)]
    pub receipt_url: String,

    /// Receipt fetch timeout in seconds (transport default when unset)
    #[arg(long, env = "FETCH_TIMEOUT_SECS")]
    pub fetch_timeout_secs: Option<u64>,

    /// Kerning adjustment (thousandths of an em) read as a word gap
    #[arg(long, env = "WORD_GAP_THRESHOLD", default_value = "100")]
    pub word_gap_threshold: f32,

    /// Directory served at `/`
    #[arg(long, env = "PUBLIC_DIR", default_value = "public")]
    pub public_dir: PathBuf,

    /// Directory served at `/standard_fonts`
    #[arg(long, env = "STANDARD_FONTS_DIR", default_value = "public/standard_fonts")]
    pub standard_fonts_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Locations of the static assets served next to the API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetConfig {
    pub public_dir: PathBuf,
    pub standard_fonts_dir: PathBuf,
}

impl Args {
    pub fn fetcher_config(&self) -> FetcherConfig {
        FetcherConfig {
            base_url: self.receipt_url.clone(),
            timeout: self.fetch_timeout_secs.map(Duration::from_secs),
            ..FetcherConfig::default()
        }
    }

    pub fn extractor_config(&self) -> ExtractorConfig {
        ExtractorConfig {
            word_gap_threshold: self.word_gap_threshold,
        }
    }

    pub fn asset_config(&self) -> AssetConfig {
        AssetConfig {
            public_dir: self.public_dir.clone(),
            standard_fonts_dir: self.standard_fonts_dir.clone(),
        }
    }
}
