//! Text rendering of a book view.

use std::fmt::Write;
use std::time::Instant;

use orderbook::{BookView, PriceLevel};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::config::DisplayConfig;

const COLUMN_WIDTH: usize = 15;
const SEPARATOR_WIDTH: usize = 70;
const PRICE_DP: u32 = 2;
const SIZE_DP: u32 = 8;
const PERCENT_DP: u32 = 4;

/// Fixed-point text with half-away-from-zero rounding.
fn fixed(value: Decimal, dp: u32) -> String {
    let rounded = value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.*}", dp as usize, rounded)
}

/// Price and size columns for one level, or blanks of the same width.
fn level_cells(level: Option<&PriceLevel>) -> String {
    match level {
        Some(level) => format!(
            "{:<width$}{:<width$}",
            fixed(level.price, PRICE_DP),
            fixed(level.size, SIZE_DP),
            width = COLUMN_WIDTH
        ),
        None => " ".repeat(COLUMN_WIDTH * 2),
    }
}

/// Format one frame. Pure: the same view, config and `now` give the same text.
///
/// Rows pair the i-th best bid with the i-th best ask. The best bid/ask and
/// spread block only appears when both sides have a level.
pub fn render(view: &BookView, config: &DisplayConfig, now: Instant) -> String {
    let mut out = String::new();

    let age = match view.age(now) {
        Some(age) => format!("{}ms ago", age.as_millis()),
        None => "never".to_string(),
    };

    let _ = writeln!(out, "=== {} ===", config.title);
    let _ = writeln!(out, "Updates: {} | Last update: {}", view.update_count, age);
    if let Some(subtitle) = &config.subtitle {
        let _ = writeln!(out, "{}", subtitle);
    }
    out.push('\n');

    let _ = writeln!(
        out,
        "{:<w$}{:<w$}{:<5}{:<w$}{:<w$}",
        "Bid Price",
        "Bid Size",
        " | ",
        "Ask Price",
        "Ask Size",
        w = COLUMN_WIDTH
    );
    let _ = writeln!(out, "{}", "-".repeat(SEPARATOR_WIDTH));

    let rows = config.rows.min(view.bids.len().max(view.asks.len()));
    for i in 0..rows {
        let _ = writeln!(
            out,
            "{} | {}",
            level_cells(view.bids.get(i)),
            level_cells(view.asks.get(i))
        );
    }

    if let (Some(bid), Some(ask)) = (view.best_bid(), view.best_ask()) {
        out.push('\n');
        let _ = writeln!(out, "Best Bid: ${}", fixed(bid.price, PRICE_DP));
        let _ = writeln!(out, "Best Ask: ${}", fixed(ask.price, PRICE_DP));
        if let Some(spread) = view.spread() {
            let _ = writeln!(
                out,
                "Spread: ${} ({}%)",
                fixed(spread.absolute, PRICE_DP),
                fixed(spread.percent, PERCENT_DP)
            );
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    fn level(price: Decimal, size: Decimal) -> PriceLevel {
        PriceLevel::new(price, size)
    }

    fn view(bids: Vec<PriceLevel>, asks: Vec<PriceLevel>, updates: u64) -> BookView {
        BookView {
            symbol: "BTC-USD".to_string(),
            bid_levels: bids.len(),
            ask_levels: asks.len(),
            bids,
            asks,
            update_count: updates,
            last_update_at: None,
        }
    }

    fn config() -> DisplayConfig {
        DisplayConfig::new("Order Book for BTCUSD")
    }

    #[test]
    fn test_fixed_rounding() {
        assert_eq!(fixed(dec!(100), 2), "100.00");
        assert_eq!(fixed(dec!(1.005), 2), "1.01");
        assert_eq!(fixed(dec!(0.5), 8), "0.50000000");
        assert_eq!(fixed(dec!(-1.5), 2), "-1.50");
    }

    #[test]
    fn test_render_pairs_rows_and_spread() {
        let view = view(
            vec![level(dec!(100), dec!(1)), level(dec!(99.5), dec!(2.25))],
            vec![level(dec!(101), dec!(0.5))],
            7,
        );

        let text = render(&view, &config(), Instant::now());
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "=== Order Book for BTCUSD ===");
        assert_eq!(lines[1], "Updates: 7 | Last update: never");
        assert_eq!(lines[2], "");
        assert!(lines[3].starts_with("Bid Price      Bid Size        |   Ask Price"));
        assert_eq!(lines[4], "-".repeat(70));
        assert_eq!(
            lines[5],
            "100.00         1.00000000      | 101.00         0.50000000     "
        );
        assert_eq!(
            lines[6],
            format!("99.50          2.25000000      | {}", " ".repeat(30))
        );
        assert_eq!(lines[7], "");
        assert_eq!(lines[8], "Best Bid: $100.00");
        assert_eq!(lines[9], "Best Ask: $101.00");
        assert_eq!(lines[10], "Spread: $1.00 (1.0000%)");
        assert_eq!(lines.len(), 11);
    }

    #[test]
    fn test_render_limits_rows() {
        let bids: Vec<PriceLevel> = (1..=30).rev().map(|p| level(Decimal::from(p), dec!(1))).collect();
        let asks: Vec<PriceLevel> = (31..=60).map(|p| level(Decimal::from(p), dec!(1))).collect();
        let view = view(bids, asks, 1);

        let text = render(&view, &config().with_rows(15), Instant::now());
        let rows = text
            .lines()
            .skip_while(|line| !line.starts_with("---"))
            .skip(1)
            .take_while(|line| !line.is_empty())
            .count();
        assert_eq!(rows, 15);
        assert!(text.contains("Best Bid: $30.00"));
    }

    #[test]
    fn test_render_one_sided_book_omits_spread() {
        let view = view(vec![], vec![level(dec!(101), dec!(3))], 1);

        let text = render(&view, &config(), Instant::now());
        assert!(text.contains(&format!("{} | 101.00", " ".repeat(30))));
        assert!(!text.contains("Best Bid"));
        assert!(!text.contains("Spread"));
    }

    #[test]
    fn test_render_empty_book() {
        let view = view(vec![], vec![], 0);

        let text = render(&view, &config(), Instant::now());
        assert!(text.contains("Updates: 0 | Last update: never"));
        assert!(text.ends_with(&format!("{}\n", "-".repeat(70))));
    }

    #[test]
    fn test_render_age_and_subtitle() {
        let now = Instant::now();
        let mut view = view(vec![level(dec!(10), dec!(1))], vec![], 3);
        view.last_update_at = Some(now.checked_sub(Duration::from_millis(250)).unwrap());

        let config = config().with_subtitle("Connected via WebSocket");
        let text = render(&view, &config, now);

        assert!(text.contains("Updates: 3 | Last update: 250ms ago"));
        assert_eq!(text.lines().nth(2), Some("Connected via WebSocket"));
    }

    #[test]
    fn test_render_crossed_book_negative_spread() {
        let view = view(
            vec![level(dec!(102), dec!(1))],
            vec![level(dec!(101), dec!(1))],
            2,
        );

        let text = render(&view, &config(), Instant::now());
        assert!(text.contains("Spread: $-1.00 (-0.9804%)"));
    }
}
