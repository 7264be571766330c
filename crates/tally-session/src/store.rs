//! Session store with TTL expiry, background reaping and drain-on-shutdown.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::backoff::Backoff;
use crate::config::StoreConfig;
use crate::error::{Error, Result};

/// Shortest reaper period; a zero interval would spin.
const MIN_CLEANUP_INTERVAL: Duration = Duration::from_millis(1);

/// Entry stored in the session map.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// Stored value.
    pub value: V,

    /// Absolute expiry: last write time plus TTL. `None` when the TTL is
    /// too large to represent, which means the entry never expires.
    pub expire_at: Option<Instant>,
}

impl<V> CacheEntry<V> {
    fn new(value: V, ttl: Duration) -> Self {
        Self {
            value,
            expire_at: Instant::now().checked_add(ttl),
        }
    }

    /// Whether the entry has expired as of `now`.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        self.expire_at.is_some_and(|expire_at| now > expire_at)
    }
}

/// Lifecycle of a store.
///
/// `Running` admits new sessions. `Draining` only refreshes sessions that
/// already exist and waits for them to expire. `Stopped` holds nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Running,
    Draining,
    Stopped,
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Inner state protected by RwLock.
struct StoreInner<V> {
    entries: HashMap<String, CacheEntry<V>>,
    state: Lifecycle,
}

impl<V> StoreInner<V> {
    /// Remove every entry expired as of `now`, returning how many went.
    fn sweep(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired_at(now));
        before - self.entries.len()
    }
}

/// In-memory session store with per-entry TTL.
///
/// This store provides:
/// - TTL-based expiry, refreshed by every `set` (reads never refresh)
/// - Lazy removal of expired entries seen by `get`
/// - A background reaper sweeping expired entries every cleanup interval
/// - A drain protocol (`shutdown`) and a hard stop (`close`)
///
/// The value type is opaque to the store. Handles are cheap to clone and
/// share one map; the reaper holds only a weak reference, so it ends when
/// the last handle is dropped.
pub struct SessionStore<V> {
    inner: Arc<RwLock<StoreInner<V>>>,
    reaper: CancellationToken,
    config: StoreConfig,
}

impl<V> SessionStore<V>
where
    V: Send + Sync + 'static,
{
    /// Create an empty store and start its reaper.
    ///
    /// The reaper is spawned on the current Tokio runtime. Outside a
    /// runtime the store still works, with expiry handled lazily.
    pub fn new(config: StoreConfig) -> Self {
        let inner = Arc::new(RwLock::new(StoreInner {
            entries: HashMap::new(),
            state: Lifecycle::Running,
        }));
        let reaper = CancellationToken::new();

        let period = config.cleanup_interval.max(MIN_CLEANUP_INTERVAL);
        if config.enable_cleanup_task {
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => match Instant::now().checked_add(period) {
                    Some(first_tick) => {
                        handle.spawn(reap(
                            Arc::downgrade(&inner),
                            first_tick,
                            period,
                            reaper.clone(),
                        ));
                    }
                    None => {
                        debug!(period = ?period, "Cleanup interval out of range, reaper not started");
                    }
                },
                Err(_) => {
                    warn!("No Tokio runtime, session reaper not started");
                }
            }
        }

        Self {
            inner,
            reaper,
            config,
        }
    }

    /// Get the store configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> Lifecycle {
        self.inner.read().await.state
    }

    /// Number of entries held, including expired ones not yet swept.
    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    /// Check whether the store holds no entries.
    ///
    /// Expired entries count until a sweep (the reaper, a drain poll or
    /// [`SessionStore::cleanup_expired`]) or a `get` removes them.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.entries.is_empty()
    }

    /// Insert or overwrite a session, refreshing its expiry.
    ///
    /// Once the store is draining or stopped, a key that is not already
    /// present is silently ignored.
    pub async fn set(&self, key: &str, value: V) {
        let mut inner = self.inner.write().await;

        if inner.state != Lifecycle::Running && !inner.entries.contains_key(key) {
            debug!(key = %key, state = %inner.state, "Ignoring new session while not running");
            return;
        }

        inner
            .entries
            .insert(key.to_string(), CacheEntry::new(value, self.config.ttl));

        trace!(key = %key, size = inner.entries.len(), "Session stored");
    }

    /// Remove every expired entry now.
    ///
    /// This is what the reaper runs each interval. Returns the number of
    /// entries removed.
    pub async fn cleanup_expired(&self) -> usize {
        let removed = self.inner.write().await.sweep(Instant::now());
        if removed > 0 {
            debug!(count = removed, "Cleaned up expired sessions");
        }
        removed
    }

    /// Get store statistics.
    pub async fn stats(&self) -> StoreStats {
        let inner = self.inner.read().await;
        StoreStats {
            size: inner.entries.len(),
            state: inner.state,
        }
    }

    /// Drain the store, waiting at most `deadline`.
    ///
    /// See [`SessionStore::shutdown_with_cancel`].
    pub async fn shutdown(&self, deadline: Duration) -> Result<()> {
        self.shutdown_with_cancel(deadline, CancellationToken::new())
            .await
    }

    /// Drain the store, waiting at most `deadline` or until `cancel` fires.
    ///
    /// Stops admitting new sessions and stops the reaper, then sweeps and
    /// polls with jittered exponential backoff until no session is left.
    /// On success the store is `Stopped`. On timeout or cancellation it
    /// stays `Draining`; follow up with [`SessionStore::close`] for a hard
    /// stop. Calling this again, or concurrently, is safe.
    pub async fn shutdown_with_cancel(
        &self,
        deadline: Duration,
        cancel: CancellationToken,
    ) -> Result<()> {
        let started = Instant::now();
        // A deadline past the clock's range means no deadline at all.
        let deadline_at = started.checked_add(deadline);

        {
            let mut inner = self.inner.write().await;
            match inner.state {
                Lifecycle::Stopped => return Ok(()),
                Lifecycle::Running => {
                    inner.state = Lifecycle::Draining;
                    info!(sessions = inner.entries.len(), "Draining session store");
                }
                Lifecycle::Draining => {}
            }
        }
        self.reaper.cancel();

        let mut backoff = Backoff::new(self.config.jitter_seed);
        loop {
            // Sweep and emptiness check share one lock acquisition, so no
            // `set` can slip in between them.
            let remaining = {
                let mut inner = self.inner.write().await;
                inner.sweep(Instant::now());
                if inner.entries.is_empty() {
                    if inner.state == Lifecycle::Draining {
                        inner.state = Lifecycle::Stopped;
                        info!(elapsed = ?started.elapsed(), "Session store drained");
                    }
                    return Ok(());
                }
                inner.entries.len()
            };

            let interval = backoff.next_interval();
            trace!(remaining, interval = ?interval, "Waiting for sessions to expire");

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    warn!(remaining, "Session store drain cancelled");
                    return Err(Error::Cancelled { remaining });
                }
                _ = wait_until(deadline_at) => {
                    let waited = started.elapsed();
                    warn!(remaining, waited = ?waited, "Session store drain timed out");
                    return Err(Error::Timeout { waited, remaining });
                }
                _ = tokio::time::sleep(interval) => {}
            }
        }
    }

    /// Stop the store immediately, dropping every session.
    ///
    /// Works from `Running` or from a `Draining` store whose drain did not
    /// finish, so a timed-out or cancelled [`SessionStore::shutdown`] can
    /// fall back to it. This is looser than refusing any close once a
    /// drain has started, and intentionally so. Fails with
    /// [`Error::AlreadyClosed`] once the store is `Stopped`.
    pub async fn close(&self) -> Result<()> {
        let mut inner = self.inner.write().await;
        if inner.state == Lifecycle::Stopped {
            return Err(Error::AlreadyClosed);
        }

        inner.state = Lifecycle::Stopped;
        self.reaper.cancel();

        let dropped = inner.entries.len();
        inner.entries.clear();
        info!(dropped, "Session store closed");
        Ok(())
    }
}

impl<V> SessionStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Get a live session's value.
    ///
    /// Returns `None` for a missing or expired key, whether or not the
    /// reaper has run yet; an expired entry seen here is removed.
    pub async fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        {
            let inner = self.inner.read().await;
            match inner.entries.get(key) {
                None => return None,
                Some(entry) if !entry.is_expired_at(now) => {
                    trace!(key = %key, "Session found");
                    return Some(entry.value.clone());
                }
                Some(_) => {}
            }
        }

        // Re-check: a concurrent `set` may have refreshed the entry.
        let mut inner = self.inner.write().await;
        if inner.entries.get(key).is_some_and(|e| e.is_expired_at(now)) {
            inner.entries.remove(key);
            debug!(key = %key, "Session expired, removed");
        }
        None
    }
}

impl<V> Clone for SessionStore<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            reaper: self.reaper.clone(),
            config: self.config.clone(),
        }
    }
}

/// Store statistics.
#[derive(Debug, Clone)]
pub struct StoreStats {
    /// Entries held, including expired ones not yet swept.
    pub size: usize,

    /// Lifecycle state.
    pub state: Lifecycle,
}

/// Sleep until `deadline`, or forever when there is none.
async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Reaper loop: sweep every `period` until stopped or the store is gone.
async fn reap<V>(
    inner: Weak<RwLock<StoreInner<V>>>,
    first_tick: Instant,
    period: Duration,
    stop: CancellationToken,
) {
    let mut ticker = tokio::time::interval_at(first_tick, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = stop.cancelled() => {
                debug!("Session reaper stopped");
                return;
            }
            _ = ticker.tick() => {
                let Some(inner) = inner.upgrade() else {
                    debug!("Session store dropped, reaper exiting");
                    return;
                };
                let removed = inner.write().await.sweep(Instant::now());
                if removed > 0 {
                    debug!(count = removed, "Reaped expired sessions");
                }
            }
        }
    }
}
