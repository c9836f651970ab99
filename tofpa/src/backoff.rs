//! Exponential backoff with jitter for retrying elevation lookups.

use rand::Rng;
use std::time::Duration;

/// Largest random extension of a delay, as a fraction of it.
const JITTER_RATIO: f64 = 0.2;

#[derive(Debug, Clone)]
pub struct Backoff {
    max: Duration,
    next: Duration,
}

impl Backoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            max: max.max(base),
            next: base,
        }
    }

    /// Returns the delay to wait before the next attempt and doubles
    /// the following one, up to `max`.
    pub fn fail(&mut self) -> Duration {
        let delay = self.next;
        self.next = self.next.saturating_mul(2).min(self.max);
        delay.mul_f64(1.0 + rand::rng().random_range(0.0..=JITTER_RATIO))
    }
}
