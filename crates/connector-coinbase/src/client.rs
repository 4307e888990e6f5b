use common::ExponentialBackoff;
use connector_core::{ConnectorConfig, ConnectorError, EventSender};
use futures_util::{SinkExt, StreamExt};
use metrics::SharedMetrics;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

use crate::parser::{parse_message, ParsedMessage};
use crate::symbol::{product_id, subscribe_message};

/// Public market data feed.
pub const DEFAULT_WS_URL: &str = "wss://ws-feed.exchange.coinbase.com";

/// Duration of stable connection before resetting backoff.
const STABLE_CONNECTION_THRESHOLD: Duration = Duration::from_secs(300);

/// Timeout for WebSocket connection attempts.
const CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

enum ConnectResult {
    Connected(WsStream),
    Shutdown,
    Error(ConnectorError),
}

/// Connect with a timeout, giving up early if shutdown is requested.
async fn connect_with_timeout(url: &str, shutdown_rx: &mut watch::Receiver<bool>) -> ConnectResult {
    let connect = tokio::time::timeout(CONNECTION_TIMEOUT, connect_async(url));
    tokio::pin!(connect);

    loop {
        tokio::select! {
            biased;

            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    return ConnectResult::Shutdown;
                }
            }

            result = &mut connect => {
                return match result {
                    Ok(Ok((stream, _))) => ConnectResult::Connected(stream),
                    Ok(Err(e)) => ConnectResult::Error(ConnectorError::WebSocket(e.to_string())),
                    Err(_) => ConnectResult::Error(ConnectorError::WebSocket(
                        "connection timeout".to_string(),
                    )),
                };
            }
        }
    }
}

enum SessionResult {
    Shutdown,
    /// Session was established and later ended.
    Connected {
        duration: Duration,
        error: ConnectorError,
    },
    ConnectFailed(ConnectorError),
}

/// Normalize one text frame and forward its events in received order.
///
/// Only a closed channel is an error; malformed frames are counted and
/// dropped.
pub(crate) async fn handle_text(
    text: &str,
    sender: &EventSender,
    metrics: &SharedMetrics,
) -> Result<(), ConnectorError> {
    metrics.inc_messages_received();

    let events = match parse_message(text) {
        Ok(ParsedMessage::Snapshot(event)) => {
            metrics.inc_snapshots_received();
            vec![event]
        }
        Ok(ParsedMessage::Deltas(events)) => {
            metrics.add_deltas_received(events.len() as u64);
            events
        }
        Ok(ParsedMessage::Subscribed) => {
            info!("Subscription confirmed");
            return Ok(());
        }
        Ok(ParsedMessage::VenueError(message)) => {
            warn!(message = %message, "Venue reported an error");
            return Ok(());
        }
        Ok(ParsedMessage::Unknown) => return Ok(()),
        Err(e) => {
            metrics.inc_parse_errors();
            debug!(error = %e, "Failed to parse message");
            return Ok(());
        }
    };

    for event in events {
        if sender.send(event).await.is_err() {
            return Err(ConnectorError::ChannelClosed);
        }
    }

    Ok(())
}

/// Run one connection: subscribe, then pump frames until the socket ends.
async fn run_session(
    url: &str,
    product_id: &str,
    sender: &EventSender,
    shutdown_rx: &mut watch::Receiver<bool>,
    metrics: &SharedMetrics,
) -> SessionResult {
    info!(url = %url, product_id = %product_id, "Connecting to Coinbase WebSocket");

    let ws_stream = match connect_with_timeout(url, shutdown_rx).await {
        ConnectResult::Connected(stream) => stream,
        ConnectResult::Shutdown => return SessionResult::Shutdown,
        ConnectResult::Error(e) => return SessionResult::ConnectFailed(e),
    };

    info!("Connected to Coinbase WebSocket");
    let connected_at = Instant::now();

    let (mut write, mut read) = ws_stream.split();

    if let Err(e) = write.send(Message::Text(subscribe_message(product_id))).await {
        metrics.inc_websocket_errors();
        return SessionResult::Connected {
            duration: connected_at.elapsed(),
            error: ConnectorError::WebSocket(e.to_string()),
        };
    }

    loop {
        tokio::select! {
            biased;

            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    info!("Shutdown signal received, closing connection");
                    let _ = write.close().await;
                    return SessionResult::Shutdown;
                }
            }

            msg_opt = read.next() => {
                let msg = match msg_opt {
                    Some(Ok(m)) => m,
                    Some(Err(e)) => {
                        error!(error = %e, "WebSocket error");
                        metrics.inc_websocket_errors();
                        return SessionResult::Connected {
                            duration: connected_at.elapsed(),
                            error: ConnectorError::WebSocket(e.to_string()),
                        };
                    }
                    None => {
                        info!("WebSocket stream ended");
                        return SessionResult::Connected {
                            duration: connected_at.elapsed(),
                            error: ConnectorError::ConnectionClosed,
                        };
                    }
                };

                match msg {
                    Message::Text(text) => {
                        if let Err(e) = handle_text(&text, sender, metrics).await {
                            info!("Receiver dropped, stopping connector");
                            return SessionResult::Connected {
                                duration: connected_at.elapsed(),
                                error: e,
                            };
                        }
                    }
                    Message::Ping(data) => {
                        debug!("Received Ping, sending Pong");
                        if let Err(e) = write.send(Message::Pong(data)).await {
                            warn!(error = %e, "Failed to send Pong");
                            metrics.inc_websocket_errors();
                            return SessionResult::Connected {
                                duration: connected_at.elapsed(),
                                error: ConnectorError::WebSocket(e.to_string()),
                            };
                        }
                    }
                    Message::Close(_) => {
                        info!("WebSocket closed by server");
                        return SessionResult::Connected {
                            duration: connected_at.elapsed(),
                            error: ConnectorError::ConnectionClosed,
                        };
                    }
                    _ => {}
                }
            }
        }
    }
}

/// Sleep for `delay`; returns `true` if shutdown was requested meanwhile.
async fn wait_or_shutdown(delay: Duration, shutdown_rx: &mut watch::Receiver<bool>) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(delay) => false,
        changed = shutdown_rx.changed() => changed.is_err() || *shutdown_rx.borrow(),
    }
}

/// Stream the level2 book for `config.symbol` with automatic reconnection.
///
/// Every new session resubscribes, so the venue's first message after a
/// reconnect is a fresh snapshot that replaces whatever the book held.
/// Returns `Ok(())` on shutdown and `Err(ChannelClosed)` once nobody is
/// receiving events.
pub async fn run_connector(
    config: ConnectorConfig,
    sender: EventSender,
    mut shutdown_rx: watch::Receiver<bool>,
    metrics: SharedMetrics,
) -> Result<(), ConnectorError> {
    let product_id = product_id(&config.symbol);
    let mut backoff = ExponentialBackoff::default();
    let mut reconnecting = false;

    loop {
        if *shutdown_rx.borrow() {
            info!("Shutdown requested, exiting connector");
            return Ok(());
        }

        let delay = match run_session(
            &config.endpoint,
            &product_id,
            &sender,
            &mut shutdown_rx,
            &metrics,
        )
        .await
        {
            SessionResult::Shutdown => {
                info!("Connector shutdown complete");
                return Ok(());
            }
            SessionResult::Connected { duration, error } => {
                if reconnecting {
                    metrics.inc_reconnect_successes();
                }
                reconnecting = true;

                if matches!(error, ConnectorError::ChannelClosed) {
                    info!("Channel closed, exiting connector");
                    return Err(ConnectorError::ChannelClosed);
                }

                if duration >= STABLE_CONNECTION_THRESHOLD {
                    info!(
                        duration_secs = duration.as_secs(),
                        "Connection was stable, resetting backoff"
                    );
                    backoff.reset();
                }

                metrics.inc_reconnect_attempts();

                let delay = backoff.next_delay();
                warn!(
                    error = %error,
                    attempt = backoff.attempt(),
                    delay_secs = delay.as_secs_f64(),
                    "Connection lost, reconnecting"
                );
                delay
            }
            SessionResult::ConnectFailed(e) => {
                metrics.inc_connection_failures();
                reconnecting = true;

                let delay = backoff.next_delay();
                warn!(
                    error = %e,
                    attempt = backoff.attempt(),
                    delay_secs = delay.as_secs_f64(),
                    "Connection failed, retrying"
                );
                delay
            }
        };

        if wait_or_shutdown(delay, &mut shutdown_rx).await {
            info!("Shutdown requested during backoff");
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use connector_core::create_event_channel;
    use metrics::create_metrics;
    use model::{BookEvent, Side};
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_handle_text_forwards_snapshot() {
        let (sender, mut receiver) = create_event_channel(8);
        let metrics = create_metrics();

        let text = r#"{"type":"snapshot","product_id":"BTC-USD","bids":[["100","1"]],"asks":[["101","2"]]}"#;
        handle_text(text, &sender, &metrics).await.unwrap();

        assert_eq!(
            receiver.recv().await,
            Some(BookEvent::Snapshot {
                bids: vec![(dec!(100), dec!(1))],
                asks: vec![(dec!(101), dec!(2))],
            })
        );
        assert_eq!(metrics.messages_received(), 1);
        assert_eq!(metrics.snapshots_received(), 1);
    }

    #[tokio::test]
    async fn test_handle_text_forwards_deltas_in_order() {
        let (sender, mut receiver) = create_event_channel(8);
        let metrics = create_metrics();

        let text = r#"{"type":"l2update","changes":[["buy","100","3"],["sell","101","0"]]}"#;
        handle_text(text, &sender, &metrics).await.unwrap();

        assert_eq!(
            receiver.recv().await,
            Some(BookEvent::Delta {
                side: Side::Bid,
                price: dec!(100),
                size: dec!(3),
            })
        );
        assert_eq!(
            receiver.recv().await,
            Some(BookEvent::Delta {
                side: Side::Ask,
                price: dec!(101),
                size: dec!(0),
            })
        );
        assert_eq!(metrics.deltas_received(), 2);
    }

    #[tokio::test]
    async fn test_handle_text_discards_garbage() {
        let (sender, mut receiver) = create_event_channel(8);
        let metrics = create_metrics();

        handle_text("{not json", &sender, &metrics).await.unwrap();
        handle_text(r#"{"type":"heartbeat"}"#, &sender, &metrics).await.unwrap();
        handle_text(r#"{"type":"error","message":"bad"}"#, &sender, &metrics)
            .await
            .unwrap();

        drop(sender);
        assert!(receiver.recv().await.is_none());
        assert_eq!(metrics.parse_errors(), 1);
        assert_eq!(metrics.messages_received(), 3);
    }

    #[tokio::test]
    async fn test_handle_text_reports_closed_channel() {
        let (sender, receiver) = create_event_channel(8);
        drop(receiver);
        let metrics = create_metrics();

        let text = r#"{"type":"update","changes":[["buy","100","1"]]}"#;
        let result = handle_text(text, &sender, &metrics).await;
        assert!(matches!(result, Err(ConnectorError::ChannelClosed)));
    }

    #[tokio::test]
    async fn test_run_connector_exits_when_already_shut_down() {
        let (sender, _receiver) = create_event_channel(8);
        let (_shutdown_tx, shutdown_rx) = watch::channel(true);
        let config = ConnectorConfig::new("BTCUSD", "ws://127.0.0.1:1");

        let result = run_connector(config, sender, shutdown_rx, create_metrics()).await;
        assert!(result.is_ok());
    }
}
