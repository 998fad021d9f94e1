use crate::error::SessionError;
use crate::session::state::SessionRecord;
use base64::Engine;
use dashmap::DashMap;
use std::fmt;
use std::future::Future;
use std::sync::Mutex;
use time::{Duration, OffsetDateTime};

/// Minimum time between full sweeps of expired records.
pub const SWEEP_INTERVAL: Duration = Duration::minutes(5);

/// Opaque session identifier carried by the session cookie.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a fresh random identifier.
    pub fn generate() -> Result<Self, SessionError> {
        random_token().map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 32 random bytes, URL-safe base64 without padding.
pub fn random_token() -> Result<String, SessionError> {
    let mut bytes = [0u8; 32];
    getrandom::fill(&mut bytes).map_err(SessionError::Entropy)?;
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
}

/// Server-side persistence for session records.
///
/// Implementations must treat an expired record as absent: `load` never
/// returns a record whose `expires_at` has passed.
pub trait SessionStore: Send + Sync + 'static {
    fn load(
        &self,
        id: &SessionId,
    ) -> impl Future<Output = Result<Option<SessionRecord>, SessionError>> + Send;

    /// Insert or overwrite the record for `id`.
    fn save(
        &self,
        id: &SessionId,
        record: SessionRecord,
    ) -> impl Future<Output = Result<(), SessionError>> + Send;

    /// Remove the record for `id`. Returns whether a record existed.
    fn destroy(&self, id: &SessionId) -> impl Future<Output = Result<bool, SessionError>> + Send;
}

/// Process-held session store.
///
/// An expired record is evicted when it is looked up. Records nobody asks
/// for again are reclaimed by a sweep that runs on `save` at most once per
/// sweep interval.
#[derive(Debug)]
pub struct MemorySessionStore {
    records: DashMap<SessionId, SessionRecord>,
    sweep_interval: Duration,
    last_sweep: Mutex<OffsetDateTime>,
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::with_sweep_interval(SWEEP_INTERVAL)
    }
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sweep_interval(sweep_interval: Duration) -> Self {
        Self {
            records: DashMap::new(),
            sweep_interval,
            last_sweep: Mutex::new(OffsetDateTime::now_utc()),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn ids(&self) -> Vec<SessionId> {
        self.records.iter().map(|e| e.key().clone()).collect()
    }

    /// Raw lookup that ignores expiry.
    pub fn peek(&self, id: &SessionId) -> Option<SessionRecord> {
        self.records.get(id).map(|r| r.value().clone())
    }

    /// Drop every record expired at `now`. Returns how many were removed.
    pub fn purge_expired(&self, now: OffsetDateTime) -> usize {
        let before = self.records.len();
        self.records.retain(|_, record| !record.is_expired_at(now));
        before.saturating_sub(self.records.len())
    }

    fn maybe_sweep(&self, now: OffsetDateTime) {
        // Skip if another request is already sweeping.
        let Ok(mut last_sweep) = self.last_sweep.try_lock() else {
            return;
        };
        if now - *last_sweep < self.sweep_interval {
            return;
        }
        *last_sweep = now;
        drop(last_sweep);

        let removed = self.purge_expired(now);
        if removed > 0 {
            tracing::debug!(removed, remaining = self.records.len(), "Swept expired sessions");
        }
    }
}

impl SessionStore for MemorySessionStore {
    async fn load(&self, id: &SessionId) -> Result<Option<SessionRecord>, SessionError> {
        let now = OffsetDateTime::now_utc();
        match self.records.get(id) {
            None => return Ok(None),
            Some(record) if !record.is_expired_at(now) => return Ok(Some(record.clone())),
            // The read guard must be released before removing below.
            Some(_) => {}
        }
        self.records
            .remove_if(id, |_, record| record.is_expired_at(now));
        tracing::debug!("Evicted expired session");
        Ok(None)
    }

    async fn save(&self, id: &SessionId, record: SessionRecord) -> Result<(), SessionError> {
        self.maybe_sweep(OffsetDateTime::now_utc());
        self.records.insert(id.clone(), record);
        Ok(())
    }

    async fn destroy(&self, id: &SessionId) -> Result<bool, SessionError> {
        Ok(self.records.remove(id).is_some())
    }
}
