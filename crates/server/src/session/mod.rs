//! Server-side sessions keyed by a signed cookie.

pub mod cookies;
pub mod state;
pub mod store;

pub use cookies::{SESSION_COOKIE_NAME, clear_session_cookie, session_cookie, session_id, signing_key};
pub use state::{PENDING_AUTH_TTL, SESSION_TTL, SessionRecord, SessionState};
pub use store::{MemorySessionStore, SessionId, SessionStore, random_token};

use crate::error::SessionError;
use crate::oauth2::UserRecord;
use axum_extra::extract::SignedCookieJar;

/// The user bound to the request's session, if it is authenticated and live.
///
/// A missing, tampered, expired or still-pending session all read as `None`.
pub async fn authenticated_user<S: SessionStore>(
    store: &S,
    jar: &SignedCookieJar,
) -> Result<Option<UserRecord>, SessionError> {
    let Some(id) = session_id(jar) else {
        return Ok(None);
    };
    Ok(store
        .load(&id)
        .await?
        .and_then(|record| record.user().cloned()))
}
