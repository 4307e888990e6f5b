//! Kraken public Depth polling source.

use async_trait::async_trait;
use connector_core::{ConnectorConfig, ConnectorError, SnapshotSource};
use model::BookEvent;
use rest_client::RestClient;
use tracing::debug;

use crate::error::KrakenError;
use crate::responses::DepthResponse;

/// Public REST API base URL.
pub const DEFAULT_REST_URL: &str = "https://api.kraken.com";

const DEPTH_PATH: &str = "/0/public/Depth";

/// Convert a command-line symbol into a Kraken pair name.
///
/// `USDT` quotes map to `USD` and `BTC` is spelled `XBT`, so both `BTCUSDT`
/// and `BTCUSD` become `XBTUSD`. Anything else passes through.
pub fn pair_for_symbol(symbol: &str) -> String {
    let symbol = symbol.trim().to_uppercase();

    let symbol = match symbol.strip_suffix("USDT") {
        Some(base) if !base.is_empty() => format!("{}USD", base),
        _ => symbol,
    };

    match symbol.strip_prefix("BTC") {
        Some(rest) => format!("XBT{}", rest),
        None => symbol,
    }
}

/// Polls `/0/public/Depth` for one pair.
#[derive(Debug, Clone)]
pub struct KrakenDepthSource {
    client: RestClient,
    pair: String,
    depth: u32,
}

impl KrakenDepthSource {
    pub fn new(client: RestClient, pair: impl Into<String>, depth: u32) -> Self {
        Self {
            client,
            pair: pair.into(),
            depth,
        }
    }

    /// Build a source from connector settings; the endpoint is the REST base URL.
    pub fn from_config(config: &ConnectorConfig) -> Result<Self, KrakenError> {
        let client = RestClient::with_default_timeout(&config.endpoint)?;
        Ok(Self::new(client, pair_for_symbol(&config.symbol), config.depth))
    }

    pub fn pair(&self) -> &str {
        &self.pair
    }

    fn query(&self) -> String {
        format!("pair={}&count={}", self.pair, self.depth)
    }

    /// GET /0/public/Depth and normalize the first pair into a snapshot.
    pub async fn fetch_depth(&self) -> Result<BookEvent, KrakenError> {
        debug!(pair = %self.pair, count = self.depth, "Fetching depth snapshot");

        let response: DepthResponse = self.client.get(DEPTH_PATH, Some(&self.query())).await?;
        response.into_snapshot()
    }
}

#[async_trait]
impl SnapshotSource for KrakenDepthSource {
    fn name(&self) -> &str {
        "kraken"
    }

    async fn fetch_snapshot(&mut self) -> Result<BookEvent, ConnectorError> {
        Ok(self.fetch_depth().await?)
    }
}
