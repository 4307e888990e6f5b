//! Kraken depth polling error types.

use connector_core::ConnectorError;
use rest_client::RestError;
use thiserror::Error;

/// Errors that can occur while fetching or normalizing a depth snapshot.
#[derive(Debug, Error)]
pub enum KrakenError {
    /// REST client error (network, timeout, HTTP status).
    #[error("REST client error: {0}")]
    Rest(#[from] RestError),

    /// Kraken answered with a non-empty `error` array.
    #[error("Kraken API error: {}", .0.join(", "))]
    Api(Vec<String>),

    /// `result` was absent or held no pair.
    #[error("Response has no result data")]
    MissingResult,

    /// The pair entry lacked `bids` or `asks`.
    #[error("Response missing {0} data")]
    MissingSide(&'static str),

    /// Body was not the expected JSON shape.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for KrakenError {
    fn from(err: serde_json::Error) -> Self {
        KrakenError::Parse(err.to_string())
    }
}

impl From<KrakenError> for ConnectorError {
    fn from(err: KrakenError) -> Self {
        match err {
            KrakenError::Rest(e) => match e.retry_after() {
                Some(retry_after) => ConnectorError::RateLimited { retry_after },
                None => ConnectorError::Transport(e.to_string()),
            },
            KrakenError::Parse(e) => ConnectorError::Parse(e),
            other => ConnectorError::Venue(other.to_string()),
        }
    }
}
