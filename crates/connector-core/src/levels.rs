//! Numeric parsing of venue price levels.

use model::PriceLevelUpdate;
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

/// Parse a JSON string or number as a `Decimal`.
pub fn parse_decimal(value: &Value) -> Option<Decimal> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };

    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

/// Parse one `(price, size)` pair.
///
/// Returns `None` if either field isn't numeric, the price isn't positive,
/// or the size is negative. A zero size is kept: it means "remove".
pub fn parse_level(price: &Value, size: &Value) -> Option<PriceLevelUpdate> {
    let price = parse_decimal(price)?;
    let size = parse_decimal(size)?;

    if price <= Decimal::ZERO || size < Decimal::ZERO {
        return None;
    }

    Some((price, size))
}

/// Parse `[price, size, ...]` entries, dropping malformed ones individually.
///
/// Extra trailing fields (e.g. a timestamp) are ignored. Returns the parsed
/// levels and the number of entries dropped.
pub fn parse_levels(entries: &[Vec<Value>]) -> (Vec<PriceLevelUpdate>, usize) {
    let mut levels = Vec::with_capacity(entries.len());
    let mut dropped = 0;

    for entry in entries {
        match entry.as_slice() {
            [price, size, ..] => match parse_level(price, size) {
                Some(level) => levels.push(level),
                None => dropped += 1,
            },
            _ => dropped += 1,
        }
    }

    (levels, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_parse_decimal_strings_and_numbers() {
        assert_eq!(parse_decimal(&json!("23456.78")), Some(dec!(23456.78)));
        assert_eq!(parse_decimal(&json!(" 0.001 ")), Some(dec!(0.001)));
        assert_eq!(parse_decimal(&json!(42)), Some(dec!(42)));
        assert_eq!(parse_decimal(&json!("1e-5")), Some(dec!(0.00001)));
        assert_eq!(parse_decimal(&json!("abc")), None);
        assert_eq!(parse_decimal(&json!(null)), None);
    }

    #[test]
    fn test_parse_level_rejects_non_positive_price() {
        assert_eq!(parse_level(&json!("0"), &json!("1")), None);
        assert_eq!(parse_level(&json!("-5"), &json!("1")), None);
        assert_eq!(parse_level(&json!("5"), &json!("-1")), None);
        assert_eq!(
            parse_level(&json!("5"), &json!("0")),
            Some((dec!(5), dec!(0)))
        );
    }

    #[test]
    fn test_parse_levels_drops_bad_entries_individually() {
        let entries: Vec<Vec<Value>> = vec![
            vec![json!("100.5"), json!("1.25")],
            vec![json!("oops"), json!("1")],
            vec![json!("99.0")],
            vec![json!("98.0"), json!("2"), json!(1688671955)],
        ];

        let (levels, dropped) = parse_levels(&entries);

        assert_eq!(dropped, 2);
        assert_eq!(levels, vec![(dec!(100.5), dec!(1.25)), (dec!(98.0), dec!(2))]);
    }
}
