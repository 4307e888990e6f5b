//! One side of the book: an ordered price -> size map.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::level::PriceLevel;

/// Key type that fixes the iteration order of a side.
///
/// `Decimal` iterates ascending (asks), `Reverse<Decimal>` iterates
/// descending (bids), so the best level is always the first entry.
pub trait PriceKey: Ord + Copy {
    fn from_price(price: Decimal) -> Self;
    fn price(&self) -> Decimal;
}

impl PriceKey for Decimal {
    fn from_price(price: Decimal) -> Self {
        price
    }

    fn price(&self) -> Decimal {
        *self
    }
}

impl PriceKey for Reverse<Decimal> {
    fn from_price(price: Decimal) -> Self {
        Reverse(price)
    }

    fn price(&self) -> Decimal {
        self.0
    }
}

/// Ordered mapping from price to resting size for one side.
///
/// Zero sizes are never stored: writing a zero size removes the level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceLevelMap<K> {
    levels: BTreeMap<K, Decimal>,
}

/// Bid side, highest price first.
pub type BidLevels = PriceLevelMap<Reverse<Decimal>>;

/// Ask side, lowest price first.
pub type AskLevels = PriceLevelMap<Decimal>;

impl<K: PriceKey> Default for PriceLevelMap<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: PriceKey> PriceLevelMap<K> {
    pub fn new() -> Self {
        Self {
            levels: BTreeMap::new(),
        }
    }

    /// Sets the size at `price`, replacing any previous size.
    /// A zero size removes the level instead.
    pub fn upsert(&mut self, price: Decimal, size: Decimal) {
        if size.is_zero() {
            self.remove(price);
        } else {
            self.levels.insert(K::from_price(price), size);
        }
    }

    /// Removes the level at `price`, returning its size if it existed.
    pub fn remove(&mut self, price: Decimal) -> Option<Decimal> {
        self.levels.remove(&K::from_price(price))
    }

    #[cfg(test)]
    fn get(&self, price: Decimal) -> Option<Decimal> {
        self.levels.get(&K::from_price(price)).copied()
    }

    /// Returns the best level on this side.
    pub fn best(&self) -> Option<PriceLevel> {
        self.iter().next()
    }

    /// Returns up to `n` levels, best first.
    pub fn top(&self, n: usize) -> Vec<PriceLevel> {
        self.iter().take(n).collect()
    }

    /// Iterates levels best first.
    pub fn iter(&self) -> impl Iterator<Item = PriceLevel> + '_ {
        self.levels
            .iter()
            .map(|(key, size)| PriceLevel::new(key.price(), *size))
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn clear(&mut self) {
        self.levels.clear();
    }
}
