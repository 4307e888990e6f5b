mod levels;
mod poller;

pub use levels::{parse_decimal, parse_level, parse_levels};
pub use poller::{run_poller, SnapshotSource};

use common::{env_string, parse_env, parse_env_millis};
use model::BookEvent;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    #[error("Parse error: {0}")]
    Parse(String),

    /// The venue answered but reported a failure or an unusable payload.
    #[error("Venue error: {0}")]
    Venue(String),

    /// HTTP-level failure while polling.
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Channel closed")]
    ChannelClosed,

    #[error("Connection closed")]
    ConnectionClosed,

    /// The venue asked us to back off.
    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },
}

impl ConnectorError {
    /// Minimum wait the venue asked for before the next request, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            ConnectorError::RateLimited { retry_after } => Some(*retry_after),
            _ => None,
        }
    }
}

/// Default capacity of the event channel between a connector and the book.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Default number of levels requested per side from a polled venue.
pub const DEFAULT_DEPTH: u32 = 20;

/// Default delay between polls of a snapshot venue.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct ConnectorConfig {
    /// Symbol as given on the command line, upper-cased.
    pub symbol: String,
    /// WebSocket URL or REST base URL of the venue.
    pub endpoint: String,
    /// Channel buffer capacity.
    pub channel_capacity: usize,
    /// Delay between polls (poll venues only).
    pub poll_interval: Duration,
    /// Levels per side to request (poll venues only).
    pub depth: u32,
}

impl ConnectorConfig {
    pub fn new(symbol: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            endpoint: endpoint.into(),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            poll_interval: DEFAULT_POLL_INTERVAL,
            depth: DEFAULT_DEPTH,
        }
    }

    /// Apply `ORDERBOOK_*` environment overrides on top of the current values.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(endpoint) = env_string("ORDERBOOK_ENDPOINT") {
            self.endpoint = endpoint;
        }
        if let Some(capacity) = parse_env::<usize>("ORDERBOOK_CHANNEL_CAPACITY") {
            self.channel_capacity = capacity.max(1);
        }
        match parse_env_millis("ORDERBOOK_POLL_MS") {
            Some(interval) if interval.is_zero() => {
                warn!("ORDERBOOK_POLL_MS must be positive, keeping {:?}", self.poll_interval);
            }
            Some(interval) => self.poll_interval = interval,
            None => {}
        }
        if let Some(depth) = parse_env::<u32>("ORDERBOOK_DEPTH") {
            self.depth = depth.max(1);
        }
        self
    }

    /// Builder method to set the poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Builder method to set the requested depth.
    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }
}

pub type EventSender = mpsc::Sender<BookEvent>;
pub type EventReceiver = mpsc::Receiver<BookEvent>;

pub fn create_event_channel(capacity: usize) -> (EventSender, EventReceiver) {
    mpsc::channel(capacity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ConnectorConfig::new("BTCUSD", "https://api.kraken.com");
        assert_eq!(config.symbol, "BTCUSD");
        assert_eq!(config.channel_capacity, DEFAULT_CHANNEL_CAPACITY);
        assert_eq!(config.poll_interval, Duration::from_secs(2));
        assert_eq!(config.depth, 20);
    }

    #[test]
    fn test_config_builders() {
        let config = ConnectorConfig::new("ETHUSD", "wss://example.test")
            .with_poll_interval(Duration::from_millis(500))
            .with_depth(50);
        assert_eq!(config.poll_interval, Duration::from_millis(500));
        assert_eq!(config.depth, 50);
        assert_eq!(config.endpoint, "wss://example.test");
    }

    #[test]
    fn test_zero_poll_interval_from_env_keeps_default() {
        std::env::set_var("ORDERBOOK_POLL_MS", "0");
        let config = ConnectorConfig::new("BTCUSD", "https://api.kraken.com").with_env_overrides();
        std::env::remove_var("ORDERBOOK_POLL_MS");

        assert_eq!(config.poll_interval, DEFAULT_POLL_INTERVAL);
    }

    #[test]
    fn test_retry_after_only_for_rate_limited() {
        let limited = ConnectorError::RateLimited {
            retry_after: Duration::from_secs(3),
        };
        assert_eq!(limited.retry_after(), Some(Duration::from_secs(3)));
        assert_eq!(ConnectorError::Transport("timeout".into()).retry_after(), None);
    }
}
