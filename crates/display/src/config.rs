use common::{parse_env, parse_env_millis};
use std::time::Duration;

/// Rows per side shown when nothing else is configured.
pub const DEFAULT_ROWS: usize = 20;

/// Delay between redraws when nothing else is configured.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_millis(100);

/// Terminal rendering settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayConfig {
    /// Maximum number of bid/ask rows.
    pub rows: usize,
    /// Delay between redraws.
    pub refresh_interval: Duration,
    /// Heading text, shown as `=== title ===`.
    pub title: String,
    /// Optional line under the update counter.
    pub subtitle: Option<String>,
}

impl DisplayConfig {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            rows: DEFAULT_ROWS,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            title: title.into(),
            subtitle: None,
        }
    }

    pub fn with_rows(mut self, rows: usize) -> Self {
        self.rows = rows;
        self
    }

    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    /// Apply `ORDERBOOK_ROWS` and `ORDERBOOK_REFRESH_MS` on top of the current values.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(rows) = parse_env::<usize>("ORDERBOOK_ROWS") {
            self.rows = rows;
        }
        if let Some(interval) = parse_env_millis("ORDERBOOK_REFRESH_MS") {
            if !interval.is_zero() {
                self.refresh_interval = interval;
            }
        }
        self
    }
}
