//! Streaming level2 connector for Coinbase Exchange.
//!
//! The feed sends one `snapshot` after subscribing and `l2update` frames
//! afterwards. Both are normalized into [`model::BookEvent`]s and pushed
//! onto the event channel.

mod client;
mod parser;
mod symbol;

pub use client::{run_connector, DEFAULT_WS_URL};
pub use parser::{parse_message, CoinbaseSnapshotRaw, CoinbaseUpdateRaw, ParsedMessage};
pub use symbol::{product_id, subscribe_message};
