//! In-memory token session store.
//!
//! Sessions are keyed by token so `validate` is a single map lookup. A
//! second index maps session id back to token for `delete` and `get`.
//! The token map is authoritative: once an entry leaves it, no validator
//! can observe the session again.
//!
//! Every session that leaves the store by expiry, whether found by a
//! validator, the limit purge or the reaper, is queued in `evicted` until
//! the reaper drains it and releases the state held under its id.

use std::sync::atomic::{AtomicUsize, Ordering};

use bankchat_types::error::SessionError;
use bankchat_types::session::Session;
use chrono::{DateTime, Duration, Utc};
use dashmap::{DashMap, DashSet};
use uuid::Uuid;

use super::token::{fingerprint, mint_token};

/// Maps opaque bearer tokens to caller identities.
///
/// Expiry is fixed at creation. The number of live entries is bounded by
/// `max_active`; creation first purges expired entries when the bound is hit.
pub struct TokenSessionStore {
    by_token: DashMap<String, Session>,
    token_by_id: DashMap<String, String>,
    evicted: DashSet<String>,
    active: AtomicUsize,
    ttl: Duration,
    max_active: usize,
}

impl TokenSessionStore {
    pub fn new(ttl: Duration, max_active: usize) -> Self {
        Self {
            by_token: DashMap::new(),
            token_by_id: DashMap::new(),
            evicted: DashSet::new(),
            active: AtomicUsize::new(0),
            ttl,
            max_active,
        }
    }

    /// Mint a new session for `account_ref`.
    pub fn create(&self, account_ref: &str) -> Result<Session, SessionError> {
        self.create_at(account_ref, Utc::now())
    }

    pub(crate) fn create_at(
        &self,
        account_ref: &str,
        now: DateTime<Utc>,
    ) -> Result<Session, SessionError> {
        if !self.try_reserve() {
            let purged = self.purge_expired_at(now).len();
            tracing::debug!(purged, "session limit hit, purged expired sessions");
            if !self.try_reserve() {
                tracing::warn!(limit = self.max_active, "active session limit reached");
                return Err(SessionError::LimitReached {
                    limit: self.max_active,
                });
            }
        }

        let token = mint_token();
        let session = Session {
            id: Uuid::now_v7().to_string(),
            token: token.clone(),
            created_at: now,
            expires_at: now + self.ttl,
            last_used_at: now,
            account_ref: account_ref.to_string(),
        };

        self.token_by_id.insert(session.id.clone(), token.clone());
        self.by_token.insert(token, session.clone());

        tracing::info!(
            session_id = %session.id,
            token = %fingerprint(&session.token),
            account = %account_ref,
            "session created"
        );
        Ok(session)
    }

    /// Resolve a token to its live session.
    ///
    /// Absent and expired tokens both yield [`SessionError::Invalid`]. An
    /// expired entry is removed on the way out, so a second call cannot
    /// resurrect it.
    pub fn validate(&self, token: &str) -> Result<Session, SessionError> {
        self.validate_at(token, Utc::now())
    }

    pub(crate) fn validate_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Session, SessionError> {
        {
            let Some(mut entry) = self.by_token.get_mut(token) else {
                return Err(SessionError::Invalid);
            };
            if entry.is_live_at(now) {
                entry.last_used_at = now;
                return Ok(entry.value().clone());
            }
        }

        if let Some(id) = self.remove_token_if_expired(token, now) {
            tracing::debug!(session_id = %id, "expired session removed on validation");
        }
        Err(SessionError::Invalid)
    }

    /// Look up a session by id without touching `last_used_at`.
    pub fn get(&self, session_id: &str) -> Option<Session> {
        let token = self.token_by_id.get(session_id)?.value().clone();
        self.by_token.get(&token).map(|entry| entry.value().clone())
    }

    /// Remove a session and its token index. Returns whether it existed.
    pub fn delete(&self, session_id: &str) -> bool {
        let Some((_, token)) = self.token_by_id.remove(session_id) else {
            return false;
        };
        if self.by_token.remove(&token).is_some() {
            self.active.fetch_sub(1, Ordering::AcqRel);
        }
        tracing::info!(session_id = %session_id, "session deleted");
        true
    }

    /// Remove the session a token belongs to (logout).
    pub fn delete_by_token(&self, token: &str) -> Option<Session> {
        let (_, session) = self.by_token.remove(token)?;
        self.active.fetch_sub(1, Ordering::AcqRel);
        self.token_by_id.remove(&session.id);
        tracing::info!(session_id = %session.id, "session logged out");
        Some(session)
    }

    /// Remove every expired session. Returns the ids removed.
    pub fn purge_expired(&self) -> Vec<String> {
        self.purge_expired_at(Utc::now())
    }

    pub(crate) fn purge_expired_at(&self, now: DateTime<Utc>) -> Vec<String> {
        // Collect first: removing while iterating would deadlock on the shard.
        let expired: Vec<String> = self
            .by_token
            .iter()
            .filter(|entry| !entry.is_live_at(now))
            .map(|entry| entry.key().clone())
            .collect();

        expired
            .iter()
            .filter_map(|token| self.remove_token_if_expired(token, now))
            .collect()
    }

    /// Take the ids of sessions that expired since the last drain.
    pub fn drain_evicted(&self) -> Vec<String> {
        let ids: Vec<String> = self.evicted.iter().map(|id| id.key().clone()).collect();
        ids.into_iter().filter(|id| self.evicted.remove(id).is_some()).collect()
    }

    /// Number of sessions currently held (live or not yet reaped).
    pub fn len(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn max_active(&self) -> usize {
        self.max_active
    }

    fn try_reserve(&self) -> bool {
        self.active
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < self.max_active).then_some(n + 1)
            })
            .is_ok()
    }

    fn remove_token_if_expired(&self, token: &str, now: DateTime<Utc>) -> Option<String> {
        let (_, session) = self
            .by_token
            .remove_if(token, |_, session| !session.is_live_at(now))?;
        self.active.fetch_sub(1, Ordering::AcqRel);
        self.token_by_id.remove(&session.id);
        self.evicted.insert(session.id.clone());
        Some(session.id)
    }
}

impl std::fmt::Debug for TokenSessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSessionStore")
            .field("active", &self.len())
            .field("max_active", &self.max_active)
            .field("ttl_secs", &self.ttl.num_seconds())
            .finish()
    }
}
