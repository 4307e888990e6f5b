/// Quote suffixes that map onto the venue's USD books, longest first.
const USD_QUOTES: [&str; 2] = ["USDT", "USD"];

/// Convert a command-line symbol into a product id.
///
/// `BTCUSDT` and `BTCUSD` both become `BTC-USD`. Ids that already contain a
/// dash, or that carry no recognised quote, are passed through unchanged.
pub fn product_id(symbol: &str) -> String {
    let symbol = symbol.trim().to_uppercase();

    if symbol.contains('-') {
        return symbol;
    }

    for quote in USD_QUOTES {
        if let Some(base) = symbol.strip_suffix(quote) {
            if !base.is_empty() {
                return format!("{}-USD", base);
            }
        }
    }

    symbol
}

/// Level2 subscription request for one product.
pub fn subscribe_message(product_id: &str) -> String {
    serde_json::json!({
        "type": "subscribe",
        "product_ids": [product_id],
        "channels": ["level2"],
    })
    .to_string()
}
