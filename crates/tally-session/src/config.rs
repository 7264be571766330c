//! Configuration for the session store.

use std::time::Duration;

/// Default time-to-live for a session after its last write.
pub const DEFAULT_TTL: Duration = Duration::from_secs(20 * 60);

/// Default interval between reaper sweeps.
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// Default seed for the drain backoff jitter.
pub const DEFAULT_JITTER_SEED: u64 = 0x7a11_5e55;

/// Configuration for the session store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// How long a session lives after its last write.
    pub ttl: Duration,

    /// Whether to run the periodic reaper.
    /// If false, expired sessions are only removed on access or during drain.
    pub enable_cleanup_task: bool,

    /// Interval between reaper sweeps (if enabled).
    pub cleanup_interval: Duration,

    /// Seed for the jitter added to drain backoff intervals.
    pub jitter_seed: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            enable_cleanup_task: true,
            cleanup_interval: DEFAULT_CLEANUP_INTERVAL,
            jitter_seed: DEFAULT_JITTER_SEED,
        }
    }
}

impl StoreConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the session TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Enable or disable the background reaper.
    pub fn with_cleanup_task(mut self, enabled: bool) -> Self {
        self.enable_cleanup_task = enabled;
        self
    }

    /// Set the reaper interval.
    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }

    /// Set the drain backoff jitter seed.
    pub fn with_jitter_seed(mut self, seed: u64) -> Self {
        self.jitter_seed = seed;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.ttl, Duration::from_secs(1200));
        assert_eq!(config.cleanup_interval, Duration::from_secs(60));
        assert!(config.enable_cleanup_task);
    }

    #[test]
    fn test_builder() {
        let config = StoreConfig::new()
            .with_ttl(Duration::from_millis(20))
            .with_cleanup_interval(Duration::from_millis(5))
            .with_cleanup_task(false)
            .with_jitter_seed(7);
        assert_eq!(config.ttl, Duration::from_millis(20));
        assert_eq!(config.cleanup_interval, Duration::from_millis(5));
        assert!(!config.enable_cleanup_task);
        assert_eq!(config.jitter_seed, 7);
    }
}
