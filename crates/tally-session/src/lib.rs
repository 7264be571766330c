//! Session store with TTL expiry and a bounded graceful shutdown.
//!
//! This crate provides a payload-agnostic, in-memory session store with:
//! - Per-entry absolute expiry, refreshed on every write
//! - A periodic background reaper for expired entries
//! - A drain protocol that stops admitting new sessions and waits, with
//!   jittered exponential backoff, for live sessions to expire
//! - A hard `close` for when draining cannot finish in time
//!
//! # Example
//!
//! ```rust,ignore
//! use tally_session::{SessionStore, StoreConfig};
//!
//! let config = StoreConfig::default()
//!     .with_ttl(Duration::from_secs(1200))
//!     .with_cleanup_interval(Duration::from_secs(60));
//!
//! let store = SessionStore::new(config);
//! store.set("42_7", value).await;
//!
//! if store.shutdown(Duration::from_secs(120)).await.is_err() {
//!     store.close().await?;
//! }
//! ```

mod backoff;
mod config;
mod error;
mod store;

pub use backoff::{Backoff, INITIAL_INTERVAL, MAX_INTERVAL};
pub use config::StoreConfig;
pub use error::{Error, Result};
pub use store::{CacheEntry, Lifecycle, SessionStore, StoreStats};
pub use tokio_util::sync::CancellationToken;
