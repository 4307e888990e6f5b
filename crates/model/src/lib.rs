use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Venue {
    Coinbase,
    Kraken,
}

impl fmt::Display for Venue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Venue::Coinbase => write!(f, "Coinbase"),
            Venue::Kraken => write!(f, "Kraken"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Bid,
    Ask,
}

impl Side {
    /// Maps the incremental feed's side token ("buy"/"sell") to a book side.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "buy" => Some(Side::Bid),
            "sell" => Some(Side::Ask),
            _ => None,
        }
    }
}

/// (price, size) as received from a venue. A size of zero means "remove".
pub type PriceLevelUpdate = (Decimal, Decimal);

/// Canonical update produced by every venue normalizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BookEvent {
    /// Full replacement of both sides.
    Snapshot {
        bids: Vec<PriceLevelUpdate>,
        asks: Vec<PriceLevelUpdate>,
    },
    /// Upsert (size > 0) or removal (size == 0) of one level.
    Delta {
        side: Side,
        price: Decimal,
        size: Decimal,
    },
}

impl BookEvent {
    pub fn is_snapshot(&self) -> bool {
        matches!(self, BookEvent::Snapshot { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_side_tokens() {
        assert_eq!(Side::from_token("buy"), Some(Side::Bid));
        assert_eq!(Side::from_token("sell"), Some(Side::Ask));
        assert_eq!(Side::from_token("BUY"), None);
        assert_eq!(Side::from_token("offer"), None);
    }

    #[test]
    fn test_event_serde() {
        let event = BookEvent::Delta {
            side: Side::Ask,
            price: dec!(50.25),
            size: dec!(7),
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: BookEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
        assert!(!back.is_snapshot());
    }
}
