//! Generic REST client infrastructure.
//!
//! A thin wrapper around `reqwest` with:
//!
//! - Consistent error handling via `RestError`
//! - JSON response deserialization
//! - Rate limit detection (HTTP 429 + Retry-After)
//!
//! # Example
//!
//! ```rust,ignore
//! use rest_client::RestClient;
//!
//! let client = RestClient::with_default_timeout("https://api.kraken.com")?;
//! let depth: serde_json::Value = client
//!     .get("/0/public/Depth", Some("pair=XBTUSD&count=20"))
//!     .await?;
//! ```

mod client;
mod error;

pub use client::RestClient;
pub use error::RestError;
