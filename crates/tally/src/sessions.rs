//! Calculator sessions on top of the session store.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex as SyncMutex;
use tally_calc::Calculator;
use tally_session::{SessionStore, StoreConfig};
use tokio::sync::Mutex;
use tracing::{debug, trace};

use crate::error::{Result, SessionError};

/// Identifies one session: one calculator per (chat, user) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey(String);

impl SessionKey {
    /// Key for a user within a chat.
    pub fn new(chat_id: i64, user_id: i64) -> Self {
        Self(format!("{chat_id}_{user_id}"))
    }

    /// The key as the store sees it.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Value held in the session store.
///
/// The store itself is payload-agnostic; this enum is what lets a reader
/// check what it got back instead of assuming.
#[derive(Clone)]
pub enum Payload {
    Calculator(Calculator),
    Opaque(Arc<dyn Any + Send + Sync>),
}

impl Payload {
    /// Extract the calculator, or fail with [`SessionError::PayloadMismatch`].
    pub fn into_calculator(self, key: &SessionKey) -> Result<Calculator> {
        match self {
            Self::Calculator(calculator) => Ok(calculator),
            Self::Opaque(_) => Err(SessionError::PayloadMismatch(key.to_string())),
        }
    }
}

impl From<Calculator> for Payload {
    fn from(calculator: Calculator) -> Self {
        Self::Calculator(calculator)
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Calculator(calculator) => f.debug_tuple("Calculator").field(calculator).finish(),
            Self::Opaque(_) => f.write_str("Opaque(..)"),
        }
    }
}

/// Apply one raw key token to a calculator.
///
/// `AC` replaces the calculator with a fresh one. A single digit or `.` is
/// an operand, any other single character an operator. Longer tokens are
/// rejected.
pub fn route_token(calculator: &mut Calculator, token: &str) -> tally_calc::Result<()> {
    if token == "AC" {
        *calculator = Calculator::new();
        return Ok(());
    }

    let mut chars = token.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_digit() || c == '.' => calculator.process_operand(c),
        (Some(c), None) => calculator.process_operator(c),
        _ => Err(tally_calc::Error::Unsupported(format!("token {token:?}"))),
    }
}

/// Calculator sessions keyed by [`SessionKey`].
///
/// Every token is a read-modify-write of one session: get the calculator,
/// apply the token, write it back (which refreshes the TTL). Cycles on the
/// same key are serialised by a per-key lock so two tokens for one session
/// never interleave; different sessions proceed independently. A rejected
/// token writes nothing, so the session keeps both its state and its
/// original expiry.
#[derive(Clone)]
pub struct CalculatorSessions {
    store: SessionStore<Payload>,
    /// Per-key write locks. Entries are weak so a lock lives only while a
    /// cycle holds it; dead entries are pruned when new ones are added.
    locks: Arc<SyncMutex<HashMap<SessionKey, Weak<Mutex<()>>>>>,
}

impl CalculatorSessions {
    /// Create sessions backed by a new store.
    pub fn new(config: StoreConfig) -> Self {
        Self {
            store: SessionStore::new(config),
            locks: Arc::new(SyncMutex::new(HashMap::new())),
        }
    }

    /// The write lock for `key`, shared by every cycle currently on it.
    fn key_lock(&self, key: &SessionKey) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock();
        if let Some(lock) = locks.get(key).and_then(Weak::upgrade) {
            return lock;
        }

        locks.retain(|_, lock| lock.strong_count() > 0);
        let lock = Arc::new(Mutex::new(()));
        locks.insert(key.clone(), Arc::downgrade(&lock));
        lock
    }

    /// The underlying store.
    pub fn store(&self) -> &SessionStore<Payload> {
        &self.store
    }

    /// Open a session with a fresh calculator, returning its display.
    ///
    /// Fails with [`SessionError::Active`] while an unexpired session
    /// exists, and with [`SessionError::ShuttingDown`] once the store has
    /// stopped admitting sessions.
    pub async fn open(&self, key: &SessionKey) -> Result<String> {
        let lock = self.key_lock(key);
        let _guard = lock.lock().await;

        if self.store.get(key.as_str()).await.is_some() {
            return Err(SessionError::Active(key.to_string()));
        }

        let calculator = Calculator::new();
        let display = calculator.display().to_string();
        self.store.set(key.as_str(), calculator.into()).await;

        if self.store.get(key.as_str()).await.is_none() {
            return Err(SessionError::ShuttingDown);
        }

        debug!(key = %key, "Session opened");
        Ok(display)
    }

    /// Apply one token to a session and return the new display.
    pub async fn apply(&self, key: &SessionKey, token: &str) -> Result<String> {
        let lock = self.key_lock(key);
        let _guard = lock.lock().await;

        let payload = self
            .store
            .get(key.as_str())
            .await
            .ok_or_else(|| SessionError::Expired(key.to_string()))?;
        let mut calculator = payload.into_calculator(key)?;

        route_token(&mut calculator, token)?;

        let text = calculator.display().to_string();
        trace!(key = %key, token = %token, display = %text, "Token applied");
        self.store.set(key.as_str(), calculator.into()).await;
        Ok(text)
    }

    /// Current display of a live session.
    pub async fn display(&self, key: &SessionKey) -> Option<String> {
        match self.store.get(key.as_str()).await? {
            Payload::Calculator(calculator) => Some(calculator.display().to_string()),
            Payload::Opaque(_) => None,
        }
    }

    /// Whether no session is live.
    pub async fn is_empty(&self) -> bool {
        self.store.is_empty().await
    }

    /// Drain: stop opening sessions and wait for live ones to expire.
    pub async fn shutdown(&self, deadline: Duration) -> Result<()> {
        Ok(self.store.shutdown(deadline).await?)
    }

    /// Drop every session immediately.
    pub async fn close(&self) -> Result<()> {
        Ok(self.store.close().await?)
    }
}
