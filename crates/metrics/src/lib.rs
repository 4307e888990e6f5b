use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// Thread-safe counters for one market-data feed.
#[derive(Debug)]
pub struct FeedMetrics {
    messages_received: AtomicU64,
    snapshots_received: AtomicU64,
    deltas_received: AtomicU64,
    parse_errors: AtomicU64,
    websocket_errors: AtomicU64,
    poll_failures: AtomicU64,
    connection_failures: AtomicU64,
    reconnect_attempts: AtomicU64,
    reconnect_successes: AtomicU64,

    clock: RwLock<FeedClock>,
}

/// Instants behind the freshness figures.
#[derive(Debug)]
struct FeedClock {
    started_at: Instant,
    last_message_at: Option<Instant>,
    last_error_at: Option<Instant>,
}

impl Default for FeedMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedMetrics {
    pub fn new() -> Self {
        Self {
            messages_received: AtomicU64::new(0),
            snapshots_received: AtomicU64::new(0),
            deltas_received: AtomicU64::new(0),
            parse_errors: AtomicU64::new(0),
            websocket_errors: AtomicU64::new(0),
            poll_failures: AtomicU64::new(0),
            connection_failures: AtomicU64::new(0),
            reconnect_attempts: AtomicU64::new(0),
            reconnect_successes: AtomicU64::new(0),
            clock: RwLock::new(FeedClock {
                started_at: Instant::now(),
                last_message_at: None,
                last_error_at: None,
            }),
        }
    }

    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn bump_error(&self, counter: &AtomicU64) {
        Self::bump(counter);
        self.clock.write().last_error_at = Some(Instant::now());
    }

    /// A raw frame or poll response arrived, whether or not it was useful.
    pub fn inc_messages_received(&self) {
        Self::bump(&self.messages_received);
        self.clock.write().last_message_at = Some(Instant::now());
    }

    pub fn inc_snapshots_received(&self) {
        Self::bump(&self.snapshots_received);
    }

    pub fn add_deltas_received(&self, count: u64) {
        self.deltas_received.fetch_add(count, Ordering::Relaxed);
    }

    /// A frame that could not be decoded.
    pub fn inc_parse_errors(&self) {
        self.bump_error(&self.parse_errors);
    }

    pub fn inc_websocket_errors(&self) {
        self.bump_error(&self.websocket_errors);
    }

    /// A poll cycle that produced no snapshot.
    pub fn inc_poll_failures(&self) {
        self.bump_error(&self.poll_failures);
    }

    pub fn inc_connection_failures(&self) {
        self.bump_error(&self.connection_failures);
    }

    pub fn inc_reconnect_attempts(&self) {
        Self::bump(&self.reconnect_attempts);
    }

    pub fn inc_reconnect_successes(&self) {
        Self::bump(&self.reconnect_successes);
    }

    pub fn messages_received(&self) -> u64 {
        self.messages_received.load(Ordering::Relaxed)
    }

    pub fn snapshots_received(&self) -> u64 {
        self.snapshots_received.load(Ordering::Relaxed)
    }

    pub fn deltas_received(&self) -> u64 {
        self.deltas_received.load(Ordering::Relaxed)
    }

    pub fn parse_errors(&self) -> u64 {
        self.parse_errors.load(Ordering::Relaxed)
    }

    pub fn websocket_errors(&self) -> u64 {
        self.websocket_errors.load(Ordering::Relaxed)
    }

    pub fn poll_failures(&self) -> u64 {
        self.poll_failures.load(Ordering::Relaxed)
    }

    pub fn connection_failures(&self) -> u64 {
        self.connection_failures.load(Ordering::Relaxed)
    }

    pub fn reconnect_attempts(&self) -> u64 {
        self.reconnect_attempts.load(Ordering::Relaxed)
    }

    pub fn reconnect_successes(&self) -> u64 {
        self.reconnect_successes.load(Ordering::Relaxed)
    }

    pub fn uptime_secs(&self) -> f64 {
        self.clock.read().started_at.elapsed().as_secs_f64()
    }

    pub fn secs_since_last_message(&self) -> Option<f64> {
        let last = self.clock.read().last_message_at;
        last.map(|at| at.elapsed().as_secs_f64())
    }

    pub fn secs_since_last_error(&self) -> Option<f64> {
        let last = self.clock.read().last_error_at;
        last.map(|at| at.elapsed().as_secs_f64())
    }

    /// Average message rate since the metrics were created.
    pub fn messages_per_second(&self) -> f64 {
        match self.uptime_secs() {
            uptime if uptime > 0.0 => self.messages_received() as f64 / uptime,
            _ => 0.0,
        }
    }

    /// Copy every counter and derived figure at once.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            messages_received: self.messages_received(),
            snapshots_received: self.snapshots_received(),
            deltas_received: self.deltas_received(),
            parse_errors: self.parse_errors(),
            websocket_errors: self.websocket_errors(),
            poll_failures: self.poll_failures(),
            connection_failures: self.connection_failures(),
            reconnect_attempts: self.reconnect_attempts(),
            reconnect_successes: self.reconnect_successes(),
            uptime_secs: self.uptime_secs(),
            messages_per_second: self.messages_per_second(),
            secs_since_last_message: self.secs_since_last_message(),
            secs_since_last_error: self.secs_since_last_error(),
        }
    }
}

/// Plain-value copy of [`FeedMetrics`], used for health checks and the
/// final report.
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    pub messages_received: u64,
    pub snapshots_received: u64,
    pub deltas_received: u64,
    pub parse_errors: u64,
    pub websocket_errors: u64,
    pub poll_failures: u64,
    pub connection_failures: u64,
    pub reconnect_attempts: u64,
    pub reconnect_successes: u64,
    pub uptime_secs: f64,
    pub messages_per_second: f64,
    pub secs_since_last_message: Option<f64>,
    pub secs_since_last_error: Option<f64>,
}

/// Health status of a feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    /// Feed is delivering data.
    Healthy,
    /// Feed has gone quiet for a while.
    Degraded,
    /// No data for an extended period.
    Unhealthy,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "HEALTHY",
            HealthStatus::Degraded => "DEGRADED",
            HealthStatus::Unhealthy => "UNHEALTHY",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl MetricsSnapshot {
    /// Quiet period after which the feed is degraded.
    const DEGRADED_AFTER_SECS: f64 = 30.0;
    /// Quiet period after which the feed is unhealthy.
    const UNHEALTHY_AFTER_SECS: f64 = 60.0;

    /// Total errors of every kind.
    pub fn total_errors(&self) -> u64 {
        self.parse_errors + self.websocket_errors + self.poll_failures + self.connection_failures
    }

    /// Determine the health status from data freshness.
    pub fn health_status(&self) -> HealthStatus {
        // Before the first message, judge by how long we've been waiting
        let quiet_secs = self.secs_since_last_message.unwrap_or(self.uptime_secs);

        if quiet_secs > Self::UNHEALTHY_AFTER_SECS {
            HealthStatus::Unhealthy
        } else if quiet_secs > Self::DEGRADED_AFTER_SECS {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        }
    }
}

impl fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Feed Metrics ({}) ===", self.health_status())?;
        writeln!(
            f,
            "Uptime {:.1}s | {} messages ({:.2}/s) | {} snapshots | {} deltas",
            self.uptime_secs,
            self.messages_received,
            self.messages_per_second,
            self.snapshots_received,
            self.deltas_received
        )?;
        writeln!(
            f,
            "Errors: parse {} | websocket {} | poll {} | connect {}",
            self.parse_errors, self.websocket_errors, self.poll_failures, self.connection_failures
        )?;
        writeln!(
            f,
            "Reconnects: {} attempted, {} succeeded",
            self.reconnect_attempts, self.reconnect_successes
        )?;
        if let Some(secs) = self.secs_since_last_message {
            writeln!(f, "Last message {:.1}s ago", secs)?;
        }
        if let Some(secs) = self.secs_since_last_error {
            writeln!(f, "Last error {:.1}s ago", secs)?;
        }
        Ok(())
    }
}

/// Shared handle to metrics.
pub type SharedMetrics = Arc<FeedMetrics>;

pub fn create_metrics() -> SharedMetrics {
    Arc::new(FeedMetrics::new())
}
