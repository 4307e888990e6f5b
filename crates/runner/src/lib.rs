//! Process wiring shared by the `coinbase-book` and `kraken-book` binaries.

mod app;
mod cli;

pub use app::{ingest, run, run_with, settings_for};
pub use cli::{parse_symbol, usage, UsageError};

use model::Venue;
use std::process::ExitCode;
use tracing::{debug, error};

/// Entry point for a venue binary: parse the command line and run.
///
/// A bad command line prints usage on stdout and exits with status 1.
pub async fn launch(venue: Venue) -> ExitCode {
    common::init_logging();

    let mut args = std::env::args();
    let program = args.next().unwrap_or_else(|| "orderbook".to_string());

    let symbol = match parse_symbol(args) {
        Ok(symbol) => symbol,
        Err(e) => {
            debug!(error = %e, "Invalid command line");
            print!("{}", usage(&program, venue));
            return ExitCode::from(1);
        }
    };

    match run(venue, symbol).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Order book stopped with an error");
            eprintln!("Error: {}", e);
            ExitCode::from(1)
        }
    }
}
