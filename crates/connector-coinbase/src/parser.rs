use connector_core::{parse_level, parse_levels};
use model::{BookEvent, Side};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// Raw level2 snapshot: full bid and ask arrays of `[price, size]`.
#[derive(Debug, Deserialize)]
pub struct CoinbaseSnapshotRaw {
    #[serde(default)]
    pub product_id: Option<String>,
    pub bids: Vec<Vec<Value>>,
    pub asks: Vec<Vec<Value>>,
}

/// Raw level2 update: `changes` is a list of `[side, price, size]`.
#[derive(Debug, Deserialize)]
pub struct CoinbaseUpdateRaw {
    #[serde(default)]
    pub product_id: Option<String>,
    pub changes: Vec<Vec<Value>>,
}

/// Error frame the feed sends, e.g. for a rejected subscription.
#[derive(Debug, Deserialize)]
pub struct CoinbaseErrorRaw {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum ParsedMessage {
    /// Full book replacement.
    Snapshot(BookEvent),
    /// Level changes in the order the venue listed them.
    Deltas(Vec<BookEvent>),
    /// Subscription acknowledged.
    Subscribed,
    /// The venue reported a problem.
    VenueError(String),
    /// Heartbeats, tickers and anything else not relevant to the book.
    Unknown,
}

impl From<CoinbaseSnapshotRaw> for BookEvent {
    fn from(raw: CoinbaseSnapshotRaw) -> Self {
        let (bids, dropped_bids) = parse_levels(&raw.bids);
        let (asks, dropped_asks) = parse_levels(&raw.asks);

        if dropped_bids + dropped_asks > 0 {
            debug!(
                product_id = ?raw.product_id,
                dropped = dropped_bids + dropped_asks,
                "Dropped malformed snapshot levels"
            );
        }

        BookEvent::Snapshot { bids, asks }
    }
}

/// Map one `[side, price, size]` change to a delta.
fn parse_change(change: &[Value]) -> Option<BookEvent> {
    let [side, price, size, ..] = change else {
        return None;
    };
    let side = Side::from_token(side.as_str()?)?;
    let (price, size) = parse_level(price, size)?;
    Some(BookEvent::Delta { side, price, size })
}

impl CoinbaseUpdateRaw {
    /// Deltas in received order; a later change for the same price wins
    /// because it is applied later.
    pub fn into_deltas(self) -> Vec<BookEvent> {
        let total = self.changes.len();
        let deltas: Vec<BookEvent> = self
            .changes
            .iter()
            .filter_map(|change| parse_change(change))
            .collect();

        if deltas.len() < total {
            debug!(
                product_id = ?self.product_id,
                dropped = total - deltas.len(),
                "Dropped malformed changes"
            );
        }

        deltas
    }
}

/// Normalize one text frame from the incremental feed.
///
/// Invalid JSON and malformed known messages return `Err`; the caller
/// discards them. Unrelated message types are `Ok(ParsedMessage::Unknown)`.
pub fn parse_message(text: &str) -> Result<ParsedMessage, serde_json::Error> {
    let raw: Value = serde_json::from_str(text)?;

    let kind = match raw.get("type").and_then(Value::as_str) {
        Some(kind) => kind.to_owned(),
        None => return Ok(ParsedMessage::Unknown),
    };

    match kind.as_str() {
        "snapshot" => {
            let snapshot: CoinbaseSnapshotRaw = serde_json::from_value(raw)?;
            Ok(ParsedMessage::Snapshot(snapshot.into()))
        }
        "update" | "l2update" => {
            let update: CoinbaseUpdateRaw = serde_json::from_value(raw)?;
            Ok(ParsedMessage::Deltas(update.into_deltas()))
        }
        "subscriptions" => Ok(ParsedMessage::Subscribed),
        "error" => {
            let error: CoinbaseErrorRaw = serde_json::from_value(raw)?;
            let message = match error.reason {
                Some(reason) => format!("{}: {}", error.message, reason),
                None => error.message,
            };
            Ok(ParsedMessage::VenueError(message))
        }
        _ => Ok(ParsedMessage::Unknown),
    }
}
