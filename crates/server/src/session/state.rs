//! Session lifecycle.
//!
//! A browser is `anonymous` while it has no live record. Starting a login
//! stores [`SessionState::PendingAuth`]; a successful callback replaces it with
//! [`SessionState::Authenticated`]. Logout or expiry returns it to anonymous.

use crate::oauth2::UserRecord;
use time::{Duration, OffsetDateTime};

/// Lifetime of an authenticated session; the cookie max age matches it.
pub const SESSION_TTL: Duration = Duration::hours(24);
/// How long the provider round trip may take before the pending login lapses.
pub const PENDING_AUTH_TTL: Duration = Duration::minutes(10);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// Redirected to the provider; `csrf_state` must come back on the callback.
    PendingAuth { csrf_state: String },
    Authenticated { user: UserRecord },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionRecord {
    pub state: SessionState,
    pub created_at: OffsetDateTime,
    pub expires_at: OffsetDateTime,
}

impl SessionRecord {
    pub fn pending(csrf_state: impl Into<String>, now: OffsetDateTime) -> Self {
        Self {
            state: SessionState::PendingAuth {
                csrf_state: csrf_state.into(),
            },
            created_at: now,
            expires_at: now + PENDING_AUTH_TTL,
        }
    }

    pub fn authenticated(user: UserRecord, now: OffsetDateTime) -> Self {
        Self {
            state: SessionState::Authenticated { user },
            created_at: now,
            expires_at: now + SESSION_TTL,
        }
    }

    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        now >= self.expires_at
    }

    pub fn user(&self) -> Option<&UserRecord> {
        match &self.state {
            SessionState::Authenticated { user } => Some(user),
            SessionState::PendingAuth { .. } => None,
        }
    }

    /// Whether this record is a pending login that `state` answers.
    pub fn accepts_callback_state(&self, state: &str) -> bool {
        matches!(&self.state, SessionState::PendingAuth { csrf_state } if csrf_state == state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> UserRecord {
        UserRecord {
            id: "user-1".into(),
            display_name: "Ada Lovelace".into(),
            email: "ada@example.com".into(),
            access_token: "at".into(),
            refresh_token: Some("rt".into()),
        }
    }

    #[test]
    fn pending_records_expire_quickly() {
        let now = OffsetDateTime::now_utc();
        let record = SessionRecord::pending("xyz", now);
        assert!(!record.is_expired_at(now + Duration::minutes(9)));
        assert!(record.is_expired_at(now + PENDING_AUTH_TTL));
        assert!(record.user().is_none());
    }

    #[test]
    fn authenticated_records_last_a_day() {
        let now = OffsetDateTime::now_utc();
        let record = SessionRecord::authenticated(user(), now);
        assert!(!record.is_expired_at(now + Duration::hours(23)));
        assert!(record.is_expired_at(now + Duration::hours(24)));
        assert_eq!(record.user().map(|u| u.email.as_str()), Some("ada@example.com"));
    }

    #[test]
    fn only_matching_pending_state_accepts_callback() {
        let now = OffsetDateTime::now_utc();
        let pending = SessionRecord::pending("xyz", now);
        assert!(pending.accepts_callback_state("xyz"));
        assert!(!pending.accepts_callback_state("abc"));

        let authenticated = SessionRecord::authenticated(user(), now);
        assert!(!authenticated.accepts_callback_state("xyz"));
    }
}
