//! Order book implementation with sorted price levels.

use model::{PriceLevelUpdate, Side};
use rust_decimal::Decimal;
use tracing::debug;

use crate::error::OrderBookError;
use crate::level::PriceLevel;
use crate::level_map::{AskLevels, BidLevels};

/// Local order book maintaining sorted bid and ask levels.
///
/// Uses `Decimal` keys so prices are compared exactly.
/// - Bids iterate highest price first
/// - Asks iterate lowest price first
///
/// A crossed book (best bid >= best ask) is representable and never
/// corrected here; it mirrors whatever the venue sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBook {
    symbol: String,
    bids: BidLevels,
    asks: AskLevels,
}

impl OrderBook {
    /// Creates a new empty order book for the given symbol.
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            bids: BidLevels::new(),
            asks: AskLevels::new(),
        }
    }

    /// Returns the symbol this order book tracks.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bids(&self) -> &BidLevels {
        &self.bids
    }

    pub fn asks(&self) -> &AskLevels {
        &self.asks
    }

    /// Applies a full snapshot, replacing all existing data.
    ///
    /// Levels with a non-positive price or size are dropped.
    /// Returns the number of levels dropped.
    pub fn apply_snapshot(
        &mut self,
        bids: &[PriceLevelUpdate],
        asks: &[PriceLevelUpdate],
    ) -> usize {
        self.bids.clear();
        self.asks.clear();

        let mut dropped = 0;

        for (price, size) in bids {
            if is_resting(*price, *size) {
                self.bids.upsert(*price, *size);
            } else {
                dropped += 1;
            }
        }

        for (price, size) in asks {
            if is_resting(*price, *size) {
                self.asks.upsert(*price, *size);
            } else {
                dropped += 1;
            }
        }

        if dropped > 0 {
            debug!(symbol = %self.symbol, dropped, "dropped empty snapshot levels");
        }

        dropped
    }

    /// Applies a single level change.
    ///
    /// A zero size removes the level (absent levels are a no-op); a positive
    /// size replaces whatever was resting at that price.
    pub fn apply_delta(
        &mut self,
        side: Side,
        price: Decimal,
        size: Decimal,
    ) -> Result<(), OrderBookError> {
        if price <= Decimal::ZERO {
            return Err(OrderBookError::InvalidPrice(price));
        }
        if size < Decimal::ZERO {
            return Err(OrderBookError::InvalidSize(size));
        }

        match side {
            Side::Bid => self.bids.upsert(price, size),
            Side::Ask => self.asks.upsert(price, size),
        }

        Ok(())
    }

    /// Returns the best (highest) bid price level.
    pub fn best_bid(&self) -> Option<PriceLevel> {
        self.bids.best()
    }

    /// Returns the best (lowest) ask price level.
    pub fn best_ask(&self) -> Option<PriceLevel> {
        self.asks.best()
    }

    /// Returns the spread (best ask - best bid). Negative on a crossed book.
    pub fn spread(&self) -> Option<Decimal> {
        let bid = self.best_bid()?;
        let ask = self.best_ask()?;
        Some(ask.price - bid.price)
    }

    /// Returns true if the best bid is at or above the best ask.
    pub fn is_crossed(&self) -> bool {
        matches!(self.spread(), Some(spread) if spread <= Decimal::ZERO)
    }

    /// Returns the top N bid price levels (highest to lowest).
    pub fn top_bids(&self, n: usize) -> Vec<PriceLevel> {
        self.bids.top(n)
    }

    /// Returns the top N ask price levels (lowest to highest).
    pub fn top_asks(&self, n: usize) -> Vec<PriceLevel> {
        self.asks.top(n)
    }

    /// Returns the total number of bid levels.
    pub fn bid_levels(&self) -> usize {
        self.bids.len()
    }

    /// Returns the total number of ask levels.
    pub fn ask_levels(&self) -> usize {
        self.asks.len()
    }
}

fn is_resting(price: Decimal, size: Decimal) -> bool {
    price > Decimal::ZERO && size > Decimal::ZERO
}
