//! Poll loop for venues that only offer full-depth snapshots.

use async_trait::async_trait;
use metrics::SharedMetrics;
use model::BookEvent;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{ConnectorError, EventSender};

/// A venue that can be asked for its current full book.
///
/// Every successful fetch is a complete resync: the returned event must be
/// a `BookEvent::Snapshot`.
#[async_trait]
pub trait SnapshotSource: Send {
    /// Short label used in logs.
    fn name(&self) -> &str;

    /// Fetch and normalize one full-depth snapshot.
    async fn fetch_snapshot(&mut self) -> Result<BookEvent, ConnectorError>;
}

/// Poll `source` every `interval` until shutdown.
///
/// A failed cycle is logged and counted and produces no event. The next
/// cycle runs after the normal interval, or after the venue's requested
/// back-off when that is longer. Returns `Ok(())` on shutdown and
/// `Err(ChannelClosed)` once nobody is receiving events.
pub async fn run_poller<S: SnapshotSource>(
    mut source: S,
    interval: Duration,
    sender: EventSender,
    mut shutdown_rx: watch::Receiver<bool>,
    metrics: SharedMetrics,
) -> Result<(), ConnectorError> {
    let name = source.name().to_string();
    info!(source = %name, interval_ms = interval.as_millis() as u64, "Starting poller");

    loop {
        if *shutdown_rx.borrow() {
            info!(source = %name, "Shutdown requested, exiting poller");
            return Ok(());
        }

        let result = {
            let fetch = source.fetch_snapshot();
            tokio::pin!(fetch);

            loop {
                tokio::select! {
                    biased;

                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            info!(source = %name, "Shutdown requested during poll");
                            return Ok(());
                        }
                    }

                    result = &mut fetch => break result,
                }
            }
        };

        let wait = match result {
            Ok(event) => {
                metrics.inc_messages_received();
                if event.is_snapshot() {
                    metrics.inc_snapshots_received();
                } else {
                    metrics.add_deltas_received(1);
                }
                if sender.send(event).await.is_err() {
                    info!(source = %name, "Receiver dropped, stopping poller");
                    return Err(ConnectorError::ChannelClosed);
                }
                debug!(source = %name, "Snapshot delivered");
                interval
            }
            Err(e) => {
                metrics.inc_poll_failures();
                warn!(source = %name, error = %e, "Poll cycle failed");
                e.retry_after().map_or(interval, |retry_after| retry_after.max(interval))
            }
        };

        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    info!(source = %name, "Shutdown requested while waiting");
                    return Ok(());
                }
            }
        }
    }
}
