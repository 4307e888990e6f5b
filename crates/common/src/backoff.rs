use rand::Rng;
use std::time::Duration;

/// Exponential backoff with jitter between feed reconnection attempts.
///
/// Formula: min(max_delay, base * 2^attempt) +/- jitter
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    base: Duration,
    max_delay: Duration,
    jitter_factor: f64,
    attempt: u32,
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self::new(Duration::from_millis(500), Duration::from_secs(30), 0.1)
    }
}

impl ExponentialBackoff {
    /// Create a new ExponentialBackoff.
    ///
    /// # Arguments
    /// * `base` - Delay before the first retry
    /// * `max_delay` - Upper bound before jitter is applied
    /// * `jitter_factor` - Fraction of the delay to randomize (clamped to 0.0..=1.0)
    pub fn new(base: Duration, max_delay: Duration, jitter_factor: f64) -> Self {
        Self {
            base,
            max_delay,
            jitter_factor: jitter_factor.clamp(0.0, 1.0),
            attempt: 0,
        }
    }

    /// Delay for the current attempt without jitter.
    pub fn current_base_delay(&self) -> Duration {
        self.base
            .saturating_mul(2u32.saturating_pow(self.attempt))
            .min(self.max_delay)
    }

    /// Calculate the next delay and increment the attempt counter.
    pub fn next_delay(&mut self) -> Duration {
        let capped = self.current_base_delay();

        let jitter_range = capped.as_secs_f64() * self.jitter_factor;
        let jitter = if jitter_range > 0.0 {
            rand::thread_rng().gen_range(-jitter_range..=jitter_range)
        } else {
            0.0
        };

        self.attempt = self.attempt.saturating_add(1);

        Duration::from_secs_f64((capped.as_secs_f64() + jitter).max(0.0))
    }

    /// Reset after a session that stayed up long enough.
    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_jitter(base_ms: u64, max_ms: u64) -> ExponentialBackoff {
        ExponentialBackoff::new(
            Duration::from_millis(base_ms),
            Duration::from_millis(max_ms),
            0.0,
        )
    }

    #[test]
    fn test_delays_double_until_capped() {
        let mut backoff = no_jitter(500, 3_000);

        let delays: Vec<_> = (0..5).map(|_| backoff.next_delay().as_millis()).collect();

        assert_eq!(delays, vec![500, 1_000, 2_000, 3_000, 3_000]);
        assert_eq!(backoff.attempt(), 5);
    }

    #[test]
    fn test_reset_restarts_sequence() {
        let mut backoff = no_jitter(500, 30_000);
        backoff.next_delay();
        backoff.next_delay();

        backoff.reset();

        assert_eq!(backoff.attempt(), 0);
        assert_eq!(backoff.next_delay(), Duration::from_millis(500));
    }

    #[test]
    fn test_many_attempts_do_not_overflow() {
        let mut backoff = no_jitter(500, 30_000);
        for _ in 0..100 {
            backoff.next_delay();
        }
        assert_eq!(backoff.current_base_delay(), Duration::from_secs(30));
    }

    #[test]
    fn test_jitter_stays_in_range() {
        let mut backoff =
            ExponentialBackoff::new(Duration::from_secs(10), Duration::from_secs(60), 0.2);

        for _ in 0..20 {
            backoff.reset();
            let secs = backoff.next_delay().as_secs_f64();
            assert!((8.0..=12.0).contains(&secs), "delay was {}", secs);
        }
    }

    #[test]
    fn test_out_of_range_jitter_is_clamped() {
        let mut backoff =
            ExponentialBackoff::new(Duration::from_secs(1), Duration::from_secs(60), -0.5);
        assert_eq!(backoff.next_delay(), Duration::from_secs(1));
    }
}
