//! Jittered exponential backoff for the drain poll loop.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// First base interval.
pub const INITIAL_INTERVAL: Duration = Duration::from_millis(1);

/// Ceiling for the base interval.
pub const MAX_INTERVAL: Duration = Duration::from_millis(500);

/// Yields poll intervals: the current base plus up to 10% jitter, after
/// which the base doubles, capped at [`MAX_INTERVAL`].
///
/// The jitter comes from a seeded RNG so a given seed always produces the
/// same sequence.
#[derive(Debug, Clone)]
pub struct Backoff {
    base: Duration,
    rng: StdRng,
}

impl Backoff {
    /// Create a backoff starting at [`INITIAL_INTERVAL`].
    pub fn new(seed: u64) -> Self {
        Self {
            base: INITIAL_INTERVAL,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Next interval to wait.
    pub fn next_interval(&mut self) -> Duration {
        let jitter_cap = u64::try_from((self.base / 10).as_nanos()).unwrap_or(u64::MAX);
        let jitter = if jitter_cap == 0 {
            0
        } else {
            self.rng.random_range(0..jitter_cap)
        };

        let interval = self.base + Duration::from_nanos(jitter);
        self.base = (self.base * 2).min(MAX_INTERVAL);
        interval
    }
}

impl Iterator for Backoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        Some(self.next_interval())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_interval_has_bounded_jitter() {
        let interval = Backoff::new(1).next_interval();
        assert!(interval >= Duration::from_millis(1));
        assert!(interval < Duration::from_micros(1100));
    }

    #[test]
    fn test_base_doubles_then_caps() {
        let intervals: Vec<Duration> = Backoff::new(42).take(14).collect();

        let mut base = INITIAL_INTERVAL;
        for interval in &intervals {
            assert!(*interval >= base, "{interval:?} below base {base:?}");
            assert!(*interval < base + base / 10, "{interval:?} over jitter cap");
            base = (base * 2).min(MAX_INTERVAL);
        }

        // 1ms doubled nine times passes 500ms, so the tail sits at the cap.
        for interval in &intervals[10..] {
            assert!(*interval >= MAX_INTERVAL);
            assert!(*interval < MAX_INTERVAL + MAX_INTERVAL / 10);
        }
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let a: Vec<Duration> = Backoff::new(9).take(8).collect();
        let b: Vec<Duration> = Backoff::new(9).take(8).collect();
        assert_eq!(a, b);
    }
}
