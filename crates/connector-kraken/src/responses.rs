//! Kraken public Depth response types.

use connector_core::parse_levels;
use model::BookEvent;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::KrakenError;

/// Response from GET /0/public/Depth.
///
/// ```json
/// {"error":[],"result":{"XXBTZUSD":{"bids":[["price","volume",ts]],"asks":[...]}}}
/// ```
#[derive(Debug, Deserialize)]
pub struct DepthResponse {
    #[serde(default)]
    pub error: Vec<String>,
    #[serde(default)]
    pub result: Option<BTreeMap<String, PairDepth>>,
}

/// Book sides for one pair. Entries are `[price, volume, timestamp]`.
#[derive(Debug, Deserialize)]
pub struct PairDepth {
    #[serde(default)]
    pub bids: Option<Vec<Vec<Value>>>,
    #[serde(default)]
    pub asks: Option<Vec<Vec<Value>>>,
}

impl DepthResponse {
    /// Turn the first pair's levels into a full-book snapshot.
    pub fn into_snapshot(self) -> Result<BookEvent, KrakenError> {
        if !self.error.is_empty() {
            return Err(KrakenError::Api(self.error));
        }

        let (pair, depth) = self
            .result
            .and_then(|result| result.into_iter().next())
            .ok_or(KrakenError::MissingResult)?;

        let raw_bids = depth.bids.ok_or(KrakenError::MissingSide("bids"))?;
        let raw_asks = depth.asks.ok_or(KrakenError::MissingSide("asks"))?;

        let (bids, dropped_bids) = parse_levels(&raw_bids);
        let (asks, dropped_asks) = parse_levels(&raw_asks);

        debug!(
            pair = %pair,
            bids = bids.len(),
            asks = asks.len(),
            dropped = dropped_bids + dropped_asks,
            "Depth snapshot parsed"
        );

        Ok(BookEvent::Snapshot { bids, asks })
    }
}

/// Parse a raw Depth body into a snapshot event.
pub fn parse_depth_response(body: &str) -> Result<BookEvent, KrakenError> {
    let response: DepthResponse = serde_json::from_str(body)?;
    response.into_snapshot()
}
