//! Terminal rendering of an order book.
//!
//! [`render`] turns a [`orderbook::BookView`] into a text frame and never
//! touches the store. [`run_display`] is the refresh loop that copies a view
//! out of the shared store and redraws stdout.

mod config;
mod render;
mod task;

pub use config::{DisplayConfig, DEFAULT_REFRESH_INTERVAL, DEFAULT_ROWS};
pub use render::render;
pub use task::run_display;
