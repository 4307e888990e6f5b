//! Thread-safe owner of one symbol's book.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use model::{BookEvent, PriceLevelUpdate, Side};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::book::OrderBook;
use crate::view::{BookView, Spread};

/// Shared handle passed to the ingestion and display tasks.
pub type SharedOrderBookStore = Arc<OrderBookStore>;

#[derive(Debug)]
struct StoreState {
    book: OrderBook,
    update_count: u64,
    last_update_at: Option<Instant>,
}

/// Single source of truth for one symbol's two-sided book.
///
/// Every mutation and every multi-field read takes the same lock, so a
/// reader never sees the bid/ask pair half-updated or an update count that
/// disagrees with the levels it describes. Critical sections only touch the
/// maps; copying out for display and building replacement snapshots happen
/// outside the lock.
#[derive(Debug)]
pub struct OrderBookStore {
    symbol: String,
    state: Mutex<StoreState>,
    active: AtomicBool,
}

impl OrderBookStore {
    /// Creates an empty, active store for `symbol`.
    pub fn new(symbol: impl Into<String>) -> Self {
        let symbol = symbol.into();
        Self {
            state: Mutex::new(StoreState {
                book: OrderBook::new(symbol.clone()),
                update_count: 0,
                last_update_at: None,
            }),
            symbol,
            active: AtomicBool::new(true),
        }
    }

    /// Creates a store already wrapped for sharing.
    pub fn shared(symbol: impl Into<String>) -> SharedOrderBookStore {
        Arc::new(Self::new(symbol))
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Applies a canonical event. Returns whether the book was updated.
    pub fn apply(&self, event: BookEvent) -> bool {
        match event {
            BookEvent::Snapshot { bids, asks } => {
                self.apply_snapshot(&bids, &asks);
                true
            }
            BookEvent::Delta { side, price, size } => self.apply_delta(side, price, size),
        }
    }

    /// Replaces both sides. Readers see either the old book or the new one.
    pub fn apply_snapshot(&self, bids: &[PriceLevelUpdate], asks: &[PriceLevelUpdate]) {
        let mut fresh = OrderBook::new(self.symbol.clone());
        fresh.apply_snapshot(bids, asks);

        let mut state = self.state.lock();
        state.book = fresh;
        state.update_count += 1;
        state.last_update_at = Some(Instant::now());
    }

    /// Upserts or removes one level.
    ///
    /// Returns `false` without touching the book if the level violates the
    /// price/size contract; such deltas are logged and not counted.
    pub fn apply_delta(&self, side: Side, price: Decimal, size: Decimal) -> bool {
        let (result, crossed) = {
            let mut state = self.state.lock();
            let result = state.book.apply_delta(side, price, size);
            if result.is_ok() {
                state.update_count += 1;
                state.last_update_at = Some(Instant::now());
            }
            (result, state.book.is_crossed())
        };

        match result {
            Ok(()) => {
                if crossed {
                    debug!(symbol = %self.symbol, ?side, %price, "book is crossed");
                }
                true
            }
            Err(e) => {
                warn!(symbol = %self.symbol, ?side, error = %e, "ignoring invalid delta");
                false
            }
        }
    }

    /// Copies the top `depth` levels of each side and the bookkeeping fields.
    pub fn snapshot_view(&self, depth: usize) -> BookView {
        let state = self.state.lock();
        BookView {
            symbol: self.symbol.clone(),
            bids: state.book.top_bids(depth),
            asks: state.book.top_asks(depth),
            bid_levels: state.book.bid_levels(),
            ask_levels: state.book.ask_levels(),
            update_count: state.update_count,
            last_update_at: state.last_update_at,
        }
    }

    /// Returns (highest bid, lowest ask); either is `None` when its side is empty.
    pub fn best_bid_ask(&self) -> (Option<Decimal>, Option<Decimal>) {
        let state = self.state.lock();
        (
            state.book.best_bid().map(|l| l.price),
            state.book.best_ask().map(|l| l.price),
        )
    }

    /// Defined only when both sides are non-empty. May be negative.
    pub fn spread(&self) -> Option<Spread> {
        match self.best_bid_ask() {
            (Some(bid), Some(ask)) => Spread::between(bid, ask),
            _ => None,
        }
    }

    pub fn update_count(&self) -> u64 {
        self.state.lock().update_count
    }

    pub fn last_update_at(&self) -> Option<Instant> {
        self.state.lock().last_update_at
    }

    /// Whether the feed feeding this book is still live.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Marks the book as no longer live; display loops stop on this.
    pub fn deactivate(&self) {
        self.active.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::thread;

    #[test]
    fn test_new_store_is_empty() {
        let store = OrderBookStore::new("BTC-USD");
        assert_eq!(store.symbol(), "BTC-USD");
        assert_eq!(store.update_count(), 0);
        assert!(store.last_update_at().is_none());
        assert_eq!(store.best_bid_ask(), (None, None));
        assert!(store.spread().is_none());
        assert!(store.is_active());
    }

    #[test]
    fn test_snapshot_counts_and_timestamps() {
        let store = OrderBookStore::new("BTC-USD");
        store.apply_snapshot(&[(dec!(100), dec!(1))], &[(dec!(101), dec!(2))]);

        assert_eq!(store.update_count(), 1);
        assert!(store.last_update_at().is_some());
        assert_eq!(store.best_bid_ask(), (Some(dec!(100)), Some(dec!(101))));
    }

    #[test]
    fn test_snapshot_idempotent() {
        let bids = vec![(dec!(100), dec!(1)), (dec!(99), dec!(2))];
        let asks = vec![(dec!(101), dec!(3))];

        let store = OrderBookStore::new("BTC-USD");
        store.apply_snapshot(&bids, &asks);
        let once = store.snapshot_view(50);
        store.apply_snapshot(&bids, &asks);
        let twice = store.snapshot_view(50);

        assert_eq!(once.bids, twice.bids);
        assert_eq!(once.asks, twice.asks);
        assert_eq!(twice.update_count, 2);
    }

    #[test]
    fn test_snapshot_replaces_not_merges() {
        let store = OrderBookStore::new("BTC-USD");
        store.apply_snapshot(&[(dec!(100), dec!(1)), (dec!(99), dec!(2))], &[]);
        store.apply_snapshot(&[(dec!(98), dec!(3))], &[]);

        let view = store.snapshot_view(10);
        assert_eq!(view.bid_levels, 1);
        assert_eq!(view.bids[0].price, dec!(98));
        assert_eq!(view.bids[0].size, dec!(3));
    }

    #[test]
    fn test_delta_removal_moves_best_bid() {
        let store = OrderBookStore::new("BTC-USD");
        store.apply_delta(Side::Bid, dec!(99.50), dec!(2));
        store.apply_delta(Side::Bid, dec!(100.00), dec!(5));
        assert_eq!(store.best_bid_ask().0, Some(dec!(100.00)));

        assert!(store.apply_delta(Side::Bid, dec!(100.00), dec!(0)));

        assert_eq!(store.best_bid_ask().0, Some(dec!(99.50)));
        assert_eq!(store.update_count(), 3);
    }

    #[test]
    fn test_delta_overwrite() {
        let store = OrderBookStore::new("BTC-USD");
        store.apply_delta(Side::Ask, dec!(50.25), dec!(2));
        store.apply_delta(Side::Ask, dec!(50.25), dec!(7));

        let view = store.snapshot_view(10);
        assert_eq!(view.ask_levels, 1);
        assert_eq!(view.asks[0].price, dec!(50.25));
        assert_eq!(view.asks[0].size, dec!(7));
    }

    #[test]
    fn test_removing_absent_level_still_counts() {
        let store = OrderBookStore::new("BTC-USD");
        assert!(store.apply_delta(Side::Ask, dec!(10), dec!(0)));
        assert_eq!(store.update_count(), 1);
        assert_eq!(store.snapshot_view(10).ask_levels, 0);
    }

    #[test]
    fn test_invalid_delta_is_not_counted() {
        let store = OrderBookStore::new("BTC-USD");
        assert!(!store.apply_delta(Side::Bid, dec!(-1), dec!(1)));
        assert!(!store.apply(BookEvent::Delta {
            side: Side::Ask,
            price: dec!(10),
            size: dec!(-3),
        }));
        assert_eq!(store.update_count(), 0);
        assert!(store.last_update_at().is_none());
    }

    #[test]
    fn test_spread() {
        let store = OrderBookStore::new("BTC-USD");
        store.apply_delta(Side::Bid, dec!(100), dec!(1));
        assert!(store.spread().is_none());

        store.apply_delta(Side::Ask, dec!(101), dec!(2));
        let spread = store.spread().unwrap();
        assert_eq!(spread.absolute, dec!(1));
        assert_eq!(spread.percent, dec!(1.0));
    }

    #[test]
    fn test_crossed_book_spread_is_negative() {
        let store = OrderBookStore::new("BTC-USD");
        store.apply_snapshot(&[(dec!(100), dec!(1))], &[(dec!(101), dec!(1))]);
        assert!(store.apply_delta(Side::Bid, dec!(102), dec!(1)));
        assert_eq!(store.update_count(), 2);
        assert_eq!(store.best_bid_ask(), (Some(dec!(102)), Some(dec!(101))));

        let spread = store.spread().unwrap();
        assert_eq!(spread.absolute, dec!(-1));
        assert_eq!(spread.percent, dec!(-100) / dec!(102));
    }

    #[test]
    fn test_view_depth_truncates_but_reports_totals() {
        let store = OrderBookStore::new("BTC-USD");
        let bids: Vec<_> = (1..=30).map(|p| (Decimal::from(p), dec!(1))).collect();
        store.apply_snapshot(&bids, &[]);

        let view = store.snapshot_view(5);
        assert_eq!(view.bids.len(), 5);
        assert_eq!(view.bid_levels, 30);
        assert_eq!(view.bids[0].price, dec!(30));
        assert!(view.asks.is_empty());
    }

    #[test]
    fn test_deactivate() {
        let store = OrderBookStore::new("BTC-USD");
        store.deactivate();
        assert!(!store.is_active());
    }

    #[test]
    fn test_concurrent_readers_never_see_partial_updates() {
        // Every delta adds a brand-new bid level, so a consistent view always
        // has exactly as many bid levels as applied updates.
        const UPDATES: u64 = 2_000;

        let store = OrderBookStore::shared("BTC-USD");

        let writer = {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 1..=UPDATES {
                    store.apply_delta(Side::Bid, Decimal::from(i), dec!(1));
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || loop {
                    let view = store.snapshot_view(3);
                    assert_eq!(view.bid_levels as u64, view.update_count);
                    if let Some(best) = view.best_bid() {
                        assert_eq!(best.price, Decimal::from(view.update_count));
                    }
                    if view.update_count == UPDATES {
                        break;
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }

        assert_eq!(store.update_count(), UPDATES);
    }
}
