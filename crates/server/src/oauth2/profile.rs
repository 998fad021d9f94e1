use crate::error::ExchangeError;
use crate::oauth2::client::TokenResponse;
use serde::Deserialize;
use std::fmt;

/// Profile API response (`/v1.0/me`). Only the fields the gateway reads.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub mail: Option<String>,
    #[serde(default)]
    pub user_principal_name: Option<String>,
}

/// The signed-in user as held in the session. Replaced wholesale on
/// re-authentication, never edited in place.
#[derive(Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: String,
    pub display_name: String,
    pub email: String,
    pub access_token: String,
    pub refresh_token: Option<String>,
}

impl fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRecord")
            .field("id", &self.id)
            .field("display_name", &self.display_name)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl UserRecord {
    /// Normalise a profile into a user record.
    ///
    /// `mail` falls back to `userPrincipalName`. A record without an id or
    /// without either address is rejected rather than stored half-filled.
    pub fn from_profile(profile: Profile, tokens: TokenResponse) -> Result<Self, ExchangeError> {
        let id = non_empty(profile.id).ok_or(ExchangeError::IncompleteProfile("id"))?;
        let email = non_empty(profile.mail)
            .or_else(|| non_empty(profile.user_principal_name))
            .ok_or(ExchangeError::IncompleteProfile("mail"))?;
        let display_name = non_empty(profile.display_name).unwrap_or_else(|| email.clone());

        Ok(Self {
            id,
            display_name,
            email,
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        })
    }
}
