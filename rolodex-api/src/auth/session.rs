//! Process-local session bookkeeping.
//!
//! Holds PKCE verifiers between `/auth/login` and `/auth/callback`, caches
//! resolved access tokens so the middleware does not call the auth API on
//! every request, and fans session changes out to subscribers.

use super::pkce::random_token;
use super::{AuthEvent, AuthUser};
use dashmap::DashMap;
use rolodex_core::AuthError;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;

/// Logins older than this are discarded.
pub const PENDING_LOGIN_TTL: Duration = Duration::from_secs(10 * 60);

/// How long a resolved token is trusted without asking the auth API again.
pub const USER_CACHE_TTL: Duration = Duration::from_secs(60);

/// A login awaiting its callback.
#[derive(Clone)]
pub struct PendingLogin {
    pub code_verifier: String,
    /// Client page to return to after sign-in.
    pub redirect_to: Option<String>,
    created_at: Instant,
}

impl std::fmt::Debug for PendingLogin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingLogin")
            .field("redirect_to", &self.redirect_to)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub struct SessionStore {
    pending: DashMap<String, PendingLogin>,
    users: DashMap<String, (AuthUser, Instant)>,
    events: broadcast::Sender<AuthEvent>,
    pending_ttl: Duration,
    user_ttl: Duration,
}

impl SessionStore {
    /// `capacity` bounds how many events a slow subscriber may lag behind.
    pub fn new(capacity: usize) -> Self {
        Self::with_ttls(capacity, PENDING_LOGIN_TTL, USER_CACHE_TTL)
    }

    pub fn with_ttls(capacity: usize, pending_ttl: Duration, user_ttl: Duration) -> Self {
        let (events, _) = broadcast::channel(capacity.max(1));
        Self {
            pending: DashMap::new(),
            users: DashMap::new(),
            events,
            pending_ttl,
            user_ttl,
        }
    }

    /// Remember a verifier and return the opaque `state` that identifies it.
    pub fn begin_login(&self, code_verifier: String, redirect_to: Option<String>) -> String {
        self.prune_expired();
        let state = random_token(16);
        self.pending.insert(
            state.clone(),
            PendingLogin {
                code_verifier,
                redirect_to,
                created_at: Instant::now(),
            },
        );
        state
    }

    /// Consume a pending login. Each `state` is usable once.
    pub fn take_login(&self, state: &str) -> Result<PendingLogin, AuthError> {
        let (_, login) = self.pending.remove(state).ok_or(AuthError::UnknownState)?;
        if login.created_at.elapsed() > self.pending_ttl {
            return Err(AuthError::UnknownState);
        }
        Ok(login)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Cache a resolved token. Stale entries of other tokens are dropped first.
    pub fn cache_user(&self, access_token: &str, user: AuthUser) {
        let user_ttl = self.user_ttl;
        self.users.retain(|_, (_, at)| at.elapsed() <= user_ttl);
        self.users
            .insert(access_token.to_string(), (user, Instant::now()));
    }

    /// Cached user for a token, if still fresh.
    pub fn cached_user(&self, access_token: &str) -> Option<AuthUser> {
        let fresh = self
            .users
            .get(access_token)
            .filter(|entry| entry.1.elapsed() <= self.user_ttl)
            .map(|entry| entry.0.clone());
        if fresh.is_none() {
            self.users.remove(access_token);
        }
        fresh
    }

    pub fn cached_user_count(&self) -> usize {
        self.users.len()
    }

    /// Drop a token from the cache, returning its user if it was cached.
    pub fn forget(&self, access_token: &str) -> Option<AuthUser> {
        self.users.remove(access_token).map(|(_, (user, _))| user)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    /// Notify subscribers. Having none is not an error.
    pub fn publish(&self, event: AuthEvent) {
        let user_id = event.user_id();
        if self.events.send(event).is_err() {
            tracing::trace!(%user_id, "No auth event subscribers");
        }
    }

    pub fn prune_expired(&self) {
        let pending_ttl = self.pending_ttl;
        self.pending
            .retain(|_, login| login.created_at.elapsed() <= pending_ttl);
        let user_ttl = self.user_ttl;
        self.users.retain(|_, (_, at)| at.elapsed() <= user_ttl);
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(64)
    }
}
