//! Polling connector for Kraken's public Depth endpoint.
//!
//! Kraken has no incremental feed here: every poll returns the top levels of
//! both sides, which become one `BookEvent::Snapshot`. Drive a
//! [`KrakenDepthSource`] with [`connector_core::run_poller`].
//!
//! # Example
//!
//! ```rust,ignore
//! use connector_core::{run_poller, ConnectorConfig};
//! use connector_kraken::{KrakenDepthSource, DEFAULT_REST_URL};
//!
//! let config = ConnectorConfig::new("BTCUSDT", DEFAULT_REST_URL);
//! let source = KrakenDepthSource::from_config(&config)?;
//! run_poller(source, config.poll_interval, sender, shutdown_rx, metrics).await?;
//! ```

mod client;
mod error;
mod responses;

pub use client::{pair_for_symbol, KrakenDepthSource, DEFAULT_REST_URL};
pub use error::KrakenError;
pub use responses::{parse_depth_response, DepthResponse, PairDepth};
