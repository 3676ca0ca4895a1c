//! Caller identity bound to a bearer token.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A long-lived caller identity.
///
/// A session is live while `now < expires_at`. The expiry is fixed at
/// creation and never slides; `last_used_at` records the most recent
/// successful validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    /// Opaque bearer token. Never serialized back to clients after minting.
    #[serde(skip_serializing, default)]
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub last_used_at: DateTime<Utc>,
    /// The banking user this session acts for.
    pub account_ref: String,
}

impl Session {
    /// Whether the session is still live at `now`.
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Response body returned when a session is minted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionGrant {
    pub token: String,
    pub session_id: String,
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
}

impl From<&Session> for SessionGrant {
    fn from(session: &Session) -> Self {
        Self {
            token: session.token.clone(),
            session_id: session.id.clone(),
            user_id: session.account_ref.clone(),
            expires_at: session.expires_at,
        }
    }
}
