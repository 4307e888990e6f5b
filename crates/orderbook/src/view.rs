//! Point-in-time copies of the book handed to readers.

use std::time::{Duration, Instant};

use rust_decimal::Decimal;

use crate::level::PriceLevel;

/// Distance between the best ask and the best bid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spread {
    /// best ask - best bid. Negative when the book is crossed.
    pub absolute: Decimal,
    /// 100 * absolute / best bid.
    pub percent: Decimal,
}

impl Spread {
    /// Computes the spread for a top of book. `None` if the bid price is zero
    /// or the arithmetic overflows.
    pub fn between(best_bid: Decimal, best_ask: Decimal) -> Option<Self> {
        let absolute = best_ask.checked_sub(best_bid)?;
        let percent = absolute
            .checked_mul(Decimal::ONE_HUNDRED)?
            .checked_div(best_bid)?;
        Some(Self { absolute, percent })
    }
}

/// Consistent copy of the top of a book plus its bookkeeping fields.
///
/// Produced under the store lock; everything here is owned so formatting
/// happens after the lock is released.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookView {
    pub symbol: String,
    /// Best bids, highest first, truncated to the requested depth.
    pub bids: Vec<PriceLevel>,
    /// Best asks, lowest first, truncated to the requested depth.
    pub asks: Vec<PriceLevel>,
    /// Total bid levels in the book, not just the copied ones.
    pub bid_levels: usize,
    /// Total ask levels in the book, not just the copied ones.
    pub ask_levels: usize,
    pub update_count: u64,
    pub last_update_at: Option<Instant>,
}

impl BookView {
    pub fn best_bid(&self) -> Option<PriceLevel> {
        self.bids.first().copied()
    }

    pub fn best_ask(&self) -> Option<PriceLevel> {
        self.asks.first().copied()
    }

    /// Defined only when both sides have at least one level.
    pub fn spread(&self) -> Option<Spread> {
        let bid = self.best_bid()?;
        let ask = self.best_ask()?;
        Spread::between(bid.price, ask.price)
    }

    /// Time since the last applied update, or `None` if nothing was applied yet.
    pub fn age(&self, now: Instant) -> Option<Duration> {
        self.last_update_at
            .map(|at| now.saturating_duration_since(at))
    }
}
