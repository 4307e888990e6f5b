use std::io::Write;
use std::time::Instant;

use orderbook::SharedOrderBookStore;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::{DisplayConfig, DEFAULT_REFRESH_INTERVAL};
use crate::render::render;

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

fn write_frame(frame: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(CLEAR_SCREEN.as_bytes())?;
    stdout.write_all(frame.as_bytes())?;
    stdout.flush()
}

/// Redraw the book on stdout every `refresh_interval`.
///
/// The store lock is held only while copying the view; formatting and the
/// write happen after it is released. Stops on shutdown, when the store is
/// deactivated, or when stdout can no longer be written.
pub async fn run_display(
    store: SharedOrderBookStore,
    config: DisplayConfig,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let period = if config.refresh_interval.is_zero() {
        DEFAULT_REFRESH_INTERVAL
    } else {
        config.refresh_interval
    };
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(
        symbol = %store.symbol(),
        rows = config.rows,
        refresh_ms = period.as_millis() as u64,
        "Starting display"
    );

    loop {
        if *shutdown_rx.borrow() {
            debug!("Shutdown requested, stopping display");
            return;
        }

        tokio::select! {
            biased;

            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    debug!("Shutdown requested, stopping display");
                    return;
                }
            }

            _ = interval.tick() => {
                if !store.is_active() {
                    debug!("Store deactivated, stopping display");
                    return;
                }

                let view = store.snapshot_view(config.rows);
                let frame = render(&view, &config, Instant::now());

                if let Err(e) = write_frame(&frame) {
                    warn!(error = %e, "Failed to write to stdout, stopping display");
                    return;
                }
            }
        }
    }
}
