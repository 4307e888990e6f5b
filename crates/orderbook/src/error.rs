//! Order book error types.

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur during order book operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrderBookError {
    /// Invalid price level (zero or negative price).
    #[error("invalid price: {0}")]
    InvalidPrice(Decimal),

    /// Invalid size (negative size).
    #[error("invalid size: {0}")]
    InvalidSize(Decimal),
}
