//! Authentication for the Rolodex API
//!
//! Sign-in is delegated to the BaaS auth API through an OAuth redirect flow
//! with PKCE. Requests then carry the resulting access token as a bearer
//! token; the middleware resolves it into an [`AuthContext`].
//!
//! - `provider`: the [`AuthProvider`] seam plus GoTrue and mock implementations
//! - `pkce`: verifier/challenge generation
//! - `session`: pending logins, resolved-token cache and session change events

pub mod pkce;
pub mod provider;
pub mod session;

pub use pkce::{challenge_for, random_token, PkcePair};
pub use provider::{AuthProvider, GoTrueAuthProvider, MockAuthProvider};
pub use session::{PendingLogin, SessionStore};

use rolodex_core::UserId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A signed-in user as reported by the auth API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AuthUser {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: UserId,
    #[serde(default)]
    pub email: Option<String>,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// Tokens issued by a successful code exchange.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub user: AuthUser,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"<redacted>")
            .field("expires_in", &self.expires_in)
            .field("user", &self.user)
            .finish()
    }
}

/// Authenticated caller, injected into request extensions by the middleware.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: UserId,
    pub email: Option<String>,
    /// Bearer token the request arrived with; forwarded to the backend.
    pub access_token: String,
}

impl AuthContext {
    pub fn new(user: &AuthUser, access_token: impl Into<String>) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
            access_token: access_token.into(),
        }
    }
}

impl fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthContext")
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Session change notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuthEvent {
    SignedIn {
        #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
        user_id: UserId,
        email: Option<String>,
    },
    SignedOut {
        #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
        user_id: UserId,
    },
}

impl AuthEvent {
    pub fn user_id(&self) -> UserId {
        match self {
            AuthEvent::SignedIn { user_id, .. } | AuthEvent::SignedOut { user_id } => *user_id,
        }
    }
}
