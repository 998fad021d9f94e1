use crate::session::state::SESSION_TTL;
use crate::session::store::SessionId;
use axum_extra::extract::SignedCookieJar;
use axum_extra::extract::cookie::{Cookie, Key, SameSite};
use sha2::{Digest, Sha512};

pub const SESSION_COOKIE_NAME: &str = "sso_session";

/// Derive the cookie signing key from the configured session secret.
///
/// SHA-512 yields exactly the 64 bytes `Key::from` requires, so secrets of any
/// length are accepted.
pub fn signing_key(secret: &str) -> Key {
    let digest = Sha512::digest(secret.as_bytes());
    Key::from(digest.as_slice())
}

/// Create the session cookie. `Secure` is only set outside development.
pub fn session_cookie(id: &SessionId, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, id.to_string()))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(SESSION_TTL)
        .build()
}

/// Create the removal cookie for the session.
pub fn clear_session_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, ""))
        .path("/")
        .max_age(time::Duration::ZERO)
        .build()
}

/// Session identifier from a cookie whose signature checked out.
pub fn session_id(jar: &SignedCookieJar) -> Option<SessionId> {
    jar.get(SESSION_COOKIE_NAME)
        .map(|c| SessionId::from(c.value().to_string()))
        .filter(|id| !id.as_str().is_empty())
}
