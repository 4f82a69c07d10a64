//! # qrsentry
//!
//! A QR code risk scanner. It reads QR codes from images, checks decoded URLs against a
//! VirusTotal compatible reputation service and answers with a risk tier and localized safety
//! tips (English, Sinhala and Tamil).
//!
//! ## Features
//!
//! - **QR Code Reading**: Native reader with adaptive binarization, perspective correction,
//!   Reed-Solomon error correction and ECI aware segment decoding
//! - **Fallback Decoding**: A second pass with gaussian blur and a global Otsu threshold when the
//!   adaptive pass finds nothing
//! - **URL Reputation**: Submit-then-fetch lookup with per-call timeouts and a fixed decision
//!   table that never fails the request
//! - **Localized Tips**: Tips per risk tier and language loaded from a JSON resource
//! - **HTTP API and CLI**: `POST /scan_qr`, `GET /health` and a `scan` command
//!
//! ## Quick Start
//!
//! ### Reading a QR Code
//!
//! ```rust,no_run
//! use qrsentry::QRReader;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let img = image::open("qr_code.png")?.to_luma8();
//! let msg = QRReader::read(&img)?;
//! println!("Decoded: {msg}");
//! # Ok(())
//! # }
//! ```
//!
//! ### Scanning an Upload
//!
//! ```rust,no_run
//! use qrsentry::{config::AppConfig, handler::{RequestHandler, ScanRequest}};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::from_env()?;
//! let handler = RequestHandler::from_config(&config)?;
//!
//! let image = std::fs::read("qr_code.png")?;
//! let request = ScanRequest { image: Some(image.into()), text: None, lang: Some("si".into()) };
//! let result = handler.handle(request).await?;
//! println!("{} is {} risk", result.payload, result.risk);
//! # Ok(())
//! # }
//! ```
//!
//! ## Risk Tiers
//!
//! - **Low**: The payload is not a URL, or the reputation service reports it harmless
//! - **Medium**: The lookup failed, timed out, is still queued or has no reports
//! - **High**: At least one engine flags the URL as malicious or suspicious

pub(crate) mod common;
pub mod config;
pub mod decode;
pub mod error;
pub mod handler;
pub mod model;
pub mod reader;
pub mod reputation;
pub mod resolver;
pub mod sandbox;
pub mod server;
pub mod telemetry;
pub mod tips;

pub use common::metadata::{ECLevel, Version};
pub use common::utils::{QRError, QRResult};
pub use decode::{DecodeStrategy, PrimaryDecoder, QrDecoder, SecondaryDecoder};
pub use error::{SentryError, SentryResult};
pub use model::{DecodedPayload, PayloadSource, RiskTier, ScanResult, TipSet};
pub use reader::QRReader;
pub use resolver::RiskResolver;
pub use tips::TipsCatalog;
