//! Local order book maintenance for live market depth.
//!
//! This crate provides the canonical two-sided book used by every feed:
//! sorted `BTreeMap` price levels per side, snapshot replacement, delta
//! application, and a lock-guarded store shared between the ingestion and
//! display tasks.
//!
//! # Example
//!
//! ```rust
//! use model::Side;
//! use orderbook::OrderBookStore;
//! use rust_decimal_macros::dec;
//!
//! let store = OrderBookStore::new("BTC-USD");
//!
//! // Apply initial snapshot
//! let bids = vec![(dec!(100.0), dec!(1.0)), (dec!(99.0), dec!(2.0))];
//! let asks = vec![(dec!(101.0), dec!(1.5)), (dec!(102.0), dec!(2.5))];
//! store.apply_snapshot(&bids, &asks);
//!
//! // Incremental change
//! store.apply_delta(Side::Bid, dec!(100.0), dec!(0));
//!
//! let view = store.snapshot_view(10);
//! println!("Best bid: {:?}", view.best_bid());
//! println!("Spread: {:?}", store.spread());
//! ```

mod book;
mod error;
mod level;
mod level_map;
mod store;
mod view;

pub use book::OrderBook;
pub use error::OrderBookError;
pub use level::PriceLevel;
pub use level_map::{AskLevels, BidLevels, PriceKey, PriceLevelMap};
pub use store::{OrderBookStore, SharedOrderBookStore};
pub use view::{BookView, Spread};
