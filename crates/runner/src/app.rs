use connector_core::{
    create_event_channel, run_poller, ConnectorConfig, ConnectorError, EventReceiver,
};
use connector_kraken::{pair_for_symbol, KrakenDepthSource};
use display::{run_display, DisplayConfig};
use metrics::{create_metrics, SharedMetrics};
use model::Venue;
use orderbook::{OrderBookStore, SharedOrderBookStore};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info};

/// Interval for periodic health status logging.
const HEALTH_LOG_INTERVAL: Duration = Duration::from_secs(60);

const COINBASE_ROWS: usize = 20;
const COINBASE_REFRESH: Duration = Duration::from_millis(100);
const KRAKEN_ROWS: usize = 15;

/// Connector and display settings for `venue`, with env overrides applied.
pub fn settings_for(venue: Venue, symbol: &str) -> (ConnectorConfig, DisplayConfig) {
    match venue {
        Venue::Coinbase => {
            let connector =
                ConnectorConfig::new(symbol, connector_coinbase::DEFAULT_WS_URL).with_env_overrides();
            let display = DisplayConfig::new(format!("Coinbase Order Book for {}", symbol))
                .with_subtitle("Connected via WebSocket - Real-time updates")
                .with_rows(COINBASE_ROWS)
                .with_refresh_interval(COINBASE_REFRESH)
                .with_env_overrides();
            (connector, display)
        }
        Venue::Kraken => {
            let connector =
                ConnectorConfig::new(symbol, connector_kraken::DEFAULT_REST_URL).with_env_overrides();
            let display = DisplayConfig::new(format!(
                "Kraken Order Book for {} ({})",
                symbol,
                pair_for_symbol(symbol)
            ))
            .with_rows(KRAKEN_ROWS)
            .with_refresh_interval(connector.poll_interval)
            .with_env_overrides();
            (connector, display)
        }
    }
}

/// Apply events to the store in arrival order until every sender is gone.
///
/// Returns the number of events that changed the book.
pub async fn ingest(mut receiver: EventReceiver, store: SharedOrderBookStore) -> u64 {
    let mut applied = 0u64;

    while let Some(event) = receiver.recv().await {
        if store.apply(event) {
            applied += 1;
        }
    }

    debug!(symbol = %store.symbol(), applied, "Event channel closed, ingestion finished");
    applied
}

async fn run_health_logger(
    metrics: SharedMetrics,
    store: SharedOrderBookStore,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut interval = tokio::time::interval(HEALTH_LOG_INTERVAL);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let snapshot = metrics.snapshot();
                info!(
                    status = %snapshot.health_status(),
                    messages = snapshot.messages_received,
                    messages_per_sec = format!("{:.1}", snapshot.messages_per_second),
                    book_updates = store.update_count(),
                    errors = snapshot.total_errors(),
                    reconnects = snapshot.reconnect_attempts,
                    "Health check"
                );
            }
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }
        }
    }
}

/// Wire source, ingestion, display and health logging for one symbol, and
/// run until `shutdown_tx` fires or the source stops.
///
/// Returns the metrics so the caller can report them.
pub async fn run_with(
    venue: Venue,
    connector_config: ConnectorConfig,
    display_config: DisplayConfig,
    shutdown_tx: watch::Sender<bool>,
) -> Result<SharedMetrics, ConnectorError> {
    info!(venue = %venue, symbol = %connector_config.symbol, "Starting order book");

    let metrics = create_metrics();
    let store = OrderBookStore::shared(connector_config.symbol.clone());
    let (sender, receiver) = create_event_channel(connector_config.channel_capacity);
    let shutdown_rx = shutdown_tx.subscribe();

    let connector_handle = match venue {
        Venue::Coinbase => tokio::spawn(connector_coinbase::run_connector(
            connector_config.clone(),
            sender,
            shutdown_rx.clone(),
            metrics.clone(),
        )),
        Venue::Kraken => {
            let source = KrakenDepthSource::from_config(&connector_config)?;
            tokio::spawn(run_poller(
                source,
                connector_config.poll_interval,
                sender,
                shutdown_rx.clone(),
                metrics.clone(),
            ))
        }
    };

    let ingest_handle = tokio::spawn(ingest(receiver, store.clone()));
    let display_handle = tokio::spawn(run_display(
        store.clone(),
        display_config,
        shutdown_rx.clone(),
    ));
    let health_handle = tokio::spawn(run_health_logger(
        metrics.clone(),
        store.clone(),
        shutdown_rx,
    ));

    let result = match connector_handle.await {
        Ok(result) => result,
        Err(e) => {
            error!(error = %e, "Connector task failed");
            Ok(())
        }
    };
    if let Err(e) = &result {
        error!(error = %e, "Connector error");
    }

    // The source has stopped; make sure every other task stops too.
    let _ = shutdown_tx.send(true);

    match ingest_handle.await {
        Ok(applied) => info!(applied, "Ingestion finished"),
        Err(e) => error!(error = %e, "Ingestion task failed"),
    }

    store.deactivate();
    let _ = display_handle.await;
    let _ = health_handle.await;

    info!(updates = store.update_count(), "Shutdown complete");
    result.map(|_| metrics)
}

/// Run one venue for `symbol` until Ctrl+C, then print final metrics to stderr.
pub async fn run(venue: Venue, symbol: String) -> Result<(), ConnectorError> {
    let (connector_config, display_config) = settings_for(venue, &symbol);
    let (shutdown_tx, _shutdown_rx) = watch::channel(false);

    let ctrl_c_tx = shutdown_tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, initiating shutdown");
            let _ = ctrl_c_tx.send(true);
        }
    });

    let metrics = run_with(venue, connector_config, display_config, shutdown_tx).await?;
    eprintln!("\n{}", metrics.snapshot());
    Ok(())
}
